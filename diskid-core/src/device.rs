use crate::api::DeviceNumber;
use crate::descriptor::Descriptor;
use std::fmt;

/// Prefix of the Win32 path for a physical drive index.
pub const PHYSICAL_DRIVE_PREFIX: &str = r"\\?\PhysicalDrive";

/// Everything learned about one disk interface.
///
/// Built by [`crate::probe`] and written out by [`crate::report`]. The
/// `Display` impl renders the plain stanza without the detailed lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceReport {
    /// The device interface path (e.g., `\\?\scsi#disk&ven_...#{53f56307-...}`).
    pub path: String,
    /// The drive number assigned by the storage stack.
    pub number: DeviceNumber,
    /// Fields read from the storage device descriptor.
    pub descriptor: Descriptor,
    /// The disk length in bytes, when it was requested and could be read.
    pub capacity: Option<u64>,
}

impl DeviceReport {
    /// The `\\?\PhysicalDriveN` path for this disk.
    pub fn physical_drive(&self) -> String {
        format!("{}{}", PHYSICAL_DRIVE_PREFIX, self.number.device_number)
    }

    /// The trimmed serial number, or `None` when the descriptor has none.
    pub fn serial(&self) -> Option<&str> {
        self.descriptor.serial.as_deref()
    }
}

impl fmt::Display for DeviceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.path)?;
        writeln!(f, "{}", self.physical_drive())?;
        if let Some(serial) = self.serial() {
            writeln!(f, "SerialNumber = {}", serial)?;
        }
        Ok(())
    }
}
