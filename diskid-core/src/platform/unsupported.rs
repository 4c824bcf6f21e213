use crate::api::{DetailFill, DeviceNumber, DiskApi};
use crate::error::{OsError, Operation, ProbeError, Reason, Result, codes};

/// Stand-in backend for targets without SetupAPI. It cannot be constructed,
/// so [`open`] is the only reachable item.
pub enum System {}

pub fn open() -> Result<System> {
    Err(ProbeError::new(
        Operation::ClassDevices,
        codes::ERROR_NOT_SUPPORTED,
        Reason::Unsupported,
    ))
}

impl DiskApi for System {
    type Interface = ();
    type Handle = ();

    fn enum_interface(&mut self, _index: u32) -> std::result::Result<(), OsError> {
        match *self {}
    }

    fn detail_header_size(&self) -> u32 {
        match *self {}
    }

    fn interface_detail(
        &mut self,
        _: &(),
        _: &mut [u8],
    ) -> std::result::Result<DetailFill, OsError> {
        match *self {}
    }

    fn open(&mut self, _path: &str) -> std::result::Result<(), OsError> {
        match *self {}
    }

    fn device_number(&mut self, _: &()) -> std::result::Result<DeviceNumber, OsError> {
        match *self {}
    }

    fn query_descriptor(&mut self, _: &(), _: &mut [u8]) -> std::result::Result<(), OsError> {
        match *self {}
    }

    fn read_capacity(&mut self, _: &()) -> std::result::Result<u64, OsError> {
        match *self {}
    }
}
