//! Resolves a device interface to its path with the size-then-fetch protocol.
use crate::api::{DetailFill, DiskApi};
use crate::error::{Operation, ProbeError, Reason, Result, codes};
use tracing::trace;

/// Byte offset of the UTF-16 path inside the detail record, just past `cbSize`.
pub const DEVICE_PATH_OFFSET: usize = 4;

enum Step {
    NeedSize,
    Fetch { required: u32 },
    Done(String),
}

/// Queries the detail record for `interface` and returns its device path.
///
/// The first query passes an empty buffer and must come back with
/// `ERROR_INSUFFICIENT_BUFFER` and the required size. The second query uses a
/// zeroed buffer of exactly that size and must succeed.
pub fn resolve_path<A: DiskApi>(api: &mut A, interface: &A::Interface) -> Result<String> {
    let mut step = Step::NeedSize;
    loop {
        step = match step {
            Step::NeedSize => match api.interface_detail(interface, &mut []) {
                Ok(DetailFill::Insufficient { required }) => Step::Fetch { required },
                Ok(DetailFill::Complete) => {
                    return Err(ProbeError::new(
                        Operation::InterfaceDetailSize,
                        codes::ERROR_INVALID_DATA,
                        Reason::UnexpectedSuccess,
                    ));
                }
                Err(e) => return Err(ProbeError::os(Operation::InterfaceDetailSize, e)),
            },
            Step::Fetch { required } => {
                trace!(required, "fetching interface detail");
                let mut buf = vec![0u8; required as usize];
                if buf.len() < DEVICE_PATH_OFFSET {
                    return Err(ProbeError::new(
                        Operation::InterfaceDetail,
                        codes::ERROR_INVALID_DATA,
                        Reason::TruncatedDetail,
                    ));
                }
                buf[..DEVICE_PATH_OFFSET].copy_from_slice(&api.detail_header_size().to_le_bytes());

                match api.interface_detail(interface, &mut buf) {
                    Ok(DetailFill::Complete) => Step::Done(decode_path(&buf)?),
                    Ok(DetailFill::Insufficient { .. }) => {
                        return Err(ProbeError::new(
                            Operation::InterfaceDetail,
                            codes::ERROR_INSUFFICIENT_BUFFER,
                            Reason::Os,
                        ));
                    }
                    Err(e) => return Err(ProbeError::os(Operation::InterfaceDetail, e)),
                }
            }
            Step::Done(path) => return Ok(path),
        };
    }
}

/// Decodes the NUL-terminated UTF-16LE path that follows the `cbSize` header.
fn decode_path(record: &[u8]) -> Result<String> {
    let units: Vec<u16> = record[DEVICE_PATH_OFFSET..]
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&unit| unit != 0)
        .collect();

    String::from_utf16(&units).map_err(|_| {
        ProbeError::new(
            Operation::InterfaceDetail,
            codes::ERROR_INVALID_DATA,
            Reason::InvalidPath,
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> Vec<u8> {
        let mut buf = 8u32.to_le_bytes().to_vec();
        for unit in path.encode_utf16().chain(Some(0)) {
            buf.extend_from_slice(&unit.to_le_bytes());
        }
        buf
    }

    #[test]
    fn decodes_path_up_to_nul() {
        let mut buf = record(r"\\?\scsi#disk&ven_nvme#5&1");
        buf.extend_from_slice(&[0x41, 0x00, 0x42, 0x00]);
        assert_eq!(decode_path(&buf).unwrap(), r"\\?\scsi#disk&ven_nvme#5&1");
    }

    #[test]
    fn decodes_unterminated_path() {
        let mut buf = record("ab");
        buf.truncate(buf.len() - 2);
        assert_eq!(decode_path(&buf).unwrap(), "ab");
    }

    #[test]
    fn rejects_lone_surrogate() {
        let mut buf = 8u32.to_le_bytes().to_vec();
        buf.extend_from_slice(&0xD800u16.to_le_bytes());
        let err = decode_path(&buf).unwrap_err();
        assert_eq!(err.reason, Reason::InvalidPath);
        assert_eq!(err.code, codes::ERROR_INVALID_DATA);
    }
}
