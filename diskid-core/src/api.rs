//! The boundary between the probing pipeline and the operating system.
//!
//! [`DiskApi`] exposes the raw calls the pipeline needs, one method per OS
//! call, with no retry or size negotiation of its own. The protocols built on
//! top of it live in [`crate::detail`] and [`crate::descriptor`], so they can
//! be driven by a scripted backend in tests.
use crate::error::OsError;

/// Outcome of a successful-or-undersized interface detail query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DetailFill {
    /// The buffer was large enough and now holds the detail record.
    Complete,
    /// The buffer was too small; `required` is the size the OS asked for.
    Insufficient { required: u32 },
}

/// The physical drive index assigned to an open device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceNumber {
    /// The `N` in `\\?\PhysicalDriveN`.
    pub device_number: u32,
}

pub trait DiskApi {
    /// One enumerated device interface.
    type Interface;
    /// An open device. Dropping it closes the OS handle.
    type Handle;

    /// Fetches the interface at `index`.
    ///
    /// The end of the list is reported as an error whose code is
    /// `ERROR_NO_MORE_ITEMS`.
    fn enum_interface(&mut self, index: u32) -> Result<Self::Interface, OsError>;

    /// The value the detail record's leading `cbSize` field must hold.
    fn detail_header_size(&self) -> u32;

    /// Queries the detail record for `interface` into `buf`.
    fn interface_detail(
        &mut self,
        interface: &Self::Interface,
        buf: &mut [u8],
    ) -> Result<DetailFill, OsError>;

    /// Opens `path` for read-only metadata queries, shared for read and write.
    fn open(&mut self, path: &str) -> Result<Self::Handle, OsError>;

    /// Reads the storage stack's drive number for an open device.
    fn device_number(&mut self, handle: &Self::Handle) -> Result<DeviceNumber, OsError>;

    /// Issues the standard storage device property query into `buf`.
    fn query_descriptor(&mut self, handle: &Self::Handle, buf: &mut [u8]) -> Result<(), OsError>;

    /// Reads the disk length in bytes.
    fn read_capacity(&mut self, handle: &Self::Handle) -> Result<u64, OsError>;
}
