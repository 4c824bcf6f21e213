//! Reads and parses the storage device descriptor.
//!
//! The descriptor is a fixed header followed by a string area. The header
//! carries its own `Size`, which may exceed the buffer the query was given,
//! so reading it is a grow-and-retry loop.
use crate::api::DiskApi;
use crate::error::{Operation, ProbeError, Reason, Result, codes};
use tracing::{debug, trace};

/// Size of the fixed descriptor header on every Windows target.
pub const HEADER_SIZE: u32 = 40;
/// Extra room given to the first query for the string area.
pub const INITIAL_SLACK: u32 = 256;
/// Upper bound on descriptor queries for a single device.
pub const MAX_QUERIES: u32 = 4;

const VERSION: usize = 0;
const SIZE: usize = 4;
const REMOVABLE_MEDIA: usize = 10;
const VENDOR_ID_OFFSET: usize = 12;
const PRODUCT_ID_OFFSET: usize = 16;
const PRODUCT_REVISION_OFFSET: usize = 20;
const SERIAL_NUMBER_OFFSET: usize = 24;
const BUS_TYPE: usize = 28;

/// The parts of a storage device descriptor this crate reports.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Descriptor {
    pub serial: Option<String>,
    pub vendor: Option<String>,
    pub product: Option<String>,
    pub revision: Option<String>,
    pub bus_type: u32,
    pub removable: bool,
}

/// Header fields needed to decide whether the buffer held everything.
#[derive(Clone, Copy, Debug)]
struct Header {
    version: u32,
    size: u32,
}

enum Step {
    NeedSize,
    NeedLargerBuffer(u32),
    Done(Descriptor),
}

/// Runs the descriptor query against `handle`, growing the buffer when the
/// descriptor reports a larger `Size` than the buffer it was given.
///
/// Only the "larger `Size`" case is retried, and at most [`MAX_QUERIES`]
/// queries are issued. A `Version` older than the header is a generic failure.
pub fn read_descriptor<A: DiskApi>(api: &mut A, handle: &A::Handle) -> Result<Descriptor> {
    let mut queries = 0;
    let mut step = Step::NeedSize;
    loop {
        let size = match step {
            Step::NeedSize => HEADER_SIZE + INITIAL_SLACK,
            Step::NeedLargerBuffer(size) => size,
            Step::Done(descriptor) => return Ok(descriptor),
        };

        if queries == MAX_QUERIES {
            return Err(ProbeError::new(
                Operation::QueryDescriptor,
                codes::ERROR_MORE_DATA,
                Reason::DescriptorGrowth { attempts: queries },
            ));
        }
        queries += 1;

        trace!(size, attempt = queries, "querying storage descriptor");
        let mut buf = vec![0u8; size as usize];
        api.query_descriptor(handle, &mut buf)
            .map_err(|e| ProbeError::os(Operation::QueryDescriptor, e))?;

        let header = read_header(&buf)?;
        step = if header.size > size {
            debug!(have = size, want = header.size, "storage descriptor needs a larger buffer");
            Step::NeedLargerBuffer(header.size)
        } else {
            Step::Done(parse(&buf)?)
        };
    }
}

fn read_header(buf: &[u8]) -> Result<Header> {
    let version = read_u32(buf, VERSION);
    if version < HEADER_SIZE || buf.len() < HEADER_SIZE as usize {
        return Err(ProbeError::new(
            Operation::QueryDescriptor,
            codes::ERROR_GEN_FAILURE,
            Reason::DescriptorVersion {
                version,
                expected: HEADER_SIZE,
            },
        ));
    }
    Ok(Header {
        version,
        size: read_u32(buf, SIZE),
    })
}

/// Parses a complete descriptor held in `buf`.
pub fn parse(buf: &[u8]) -> Result<Descriptor> {
    let header = read_header(buf)?;
    trace!(version = header.version, size = header.size, "parsing storage descriptor");

    Ok(Descriptor {
        serial: string_at(buf, read_u32(buf, SERIAL_NUMBER_OFFSET))?,
        vendor: string_at(buf, read_u32(buf, VENDOR_ID_OFFSET))?,
        product: string_at(buf, read_u32(buf, PRODUCT_ID_OFFSET))?,
        revision: string_at(buf, read_u32(buf, PRODUCT_REVISION_OFFSET))?,
        bus_type: read_u32(buf, BUS_TYPE),
        removable: buf[REMOVABLE_MEDIA] != 0,
    })
}

/// Reads a little-endian `u32`; bytes past the end of `buf` read as zero.
fn read_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    if let Some(src) = buf.get(at..) {
        let n = src.len().min(4);
        bytes[..n].copy_from_slice(&src[..n]);
    }
    u32::from_le_bytes(bytes)
}

/// Returns the NUL-terminated ASCII string at `offset`, or `None` when the
/// offset is zero. Surrounding whitespace is trimmed; many drives pad their
/// identity fields with spaces.
fn string_at(buf: &[u8], offset: u32) -> Result<Option<String>> {
    if offset == 0 {
        return Ok(None);
    }
    let tail = buf.get(offset as usize..).ok_or_else(|| {
        ProbeError::new(
            Operation::QueryDescriptor,
            codes::ERROR_GEN_FAILURE,
            Reason::DescriptorOffset {
                offset,
                len: buf.len(),
            },
        )
    })?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    let text = String::from_utf8_lossy(&tail[..end]);
    Ok(Some(text.trim().to_string()))
}
