#![allow(dead_code)]

use diskid_core::api::{DetailFill, DeviceNumber, DiskApi};
use diskid_core::descriptor::HEADER_SIZE;
use diskid_core::error::{OsError, codes};
use std::cell::Cell;
use std::rc::Rc;

pub const ERROR_ACCESS_DENIED: u32 = 5;
pub const ERROR_INVALID_HANDLE: u32 = 6;
pub const ERROR_IO_DEVICE: u32 = 1117;

/// The `cbSize` a 64-bit SetupAPI expects for the detail record.
pub const DETAIL_HEADER: u32 = 8;

/// How the scripted descriptor query behaves.
#[derive(Clone)]
pub enum DescriptorScript {
    /// Copies these bytes into the caller's buffer, truncated to fit.
    Bytes(Vec<u8>),
    /// Always claims to need more than the buffer it was given.
    Growing,
    Fail(u32),
}

#[derive(Clone)]
pub struct MockDisk {
    pub path: String,
    pub number: u32,
    pub descriptor: DescriptorScript,
    /// Replaces the answer to the zero-size detail query.
    pub size_query: Option<Result<DetailFill, OsError>>,
    /// Replaces the answer to the filling detail query.
    pub detail_fetch: Option<Result<DetailFill, OsError>>,
    pub open_error: Option<u32>,
    pub number_error: Option<u32>,
    pub capacity: Option<u64>,
}

impl MockDisk {
    pub fn new(path: &str, number: u32, serial: Option<&str>) -> Self {
        Self {
            path: path.to_string(),
            number,
            descriptor: DescriptorScript::Bytes(DescriptorBuilder::new().serial(serial).build()),
            size_query: None,
            detail_fetch: None,
            open_error: None,
            number_error: None,
            capacity: None,
        }
    }

    fn detail_size(&self) -> u32 {
        4 + (self.path.encode_utf16().count() as u32 + 1) * 2
    }
}

/// Builds storage device descriptor bytes in the OS layout.
pub struct DescriptorBuilder {
    version: u32,
    padding: usize,
    strings: Vec<(usize, String)>,
    removable: bool,
    bus_type: u32,
}

impl DescriptorBuilder {
    pub fn new() -> Self {
        Self {
            version: HEADER_SIZE,
            padding: 0,
            strings: Vec::new(),
            removable: false,
            bus_type: 0,
        }
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Inserts raw property bytes ahead of the strings.
    pub fn padding(mut self, padding: usize) -> Self {
        self.padding = padding;
        self
    }

    pub fn serial(self, serial: Option<&str>) -> Self {
        match serial {
            Some(serial) => self.string(24, serial),
            None => self,
        }
    }

    pub fn vendor(self, vendor: &str) -> Self {
        self.string(12, vendor)
    }

    pub fn product(self, product: &str) -> Self {
        self.string(16, product)
    }

    pub fn revision(self, revision: &str) -> Self {
        self.string(20, revision)
    }

    pub fn removable(mut self, removable: bool) -> Self {
        self.removable = removable;
        self
    }

    pub fn bus_type(mut self, bus_type: u32) -> Self {
        self.bus_type = bus_type;
        self
    }

    fn string(mut self, field: usize, text: &str) -> Self {
        self.strings.push((field, text.to_string()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE as usize + self.padding];
        put_u32(&mut buf, 0, self.version);
        buf[10] = self.removable as u8;
        put_u32(&mut buf, 28, self.bus_type);
        for (field, text) in &self.strings {
            let offset = buf.len() as u32;
            put_u32(&mut buf, *field, offset);
            buf.extend_from_slice(text.as_bytes());
            buf.push(0);
        }
        let size = buf.len() as u32;
        put_u32(&mut buf, 4, size);
        buf
    }
}

fn put_u32(buf: &mut [u8], at: usize, value: u32) {
    buf[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// A device handle that counts its own release.
pub struct MockHandle {
    disk: usize,
    closed: Rc<Cell<usize>>,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.closed.set(self.closed.get() + 1);
    }
}

/// A scripted `DiskApi` that records every call the pipeline makes.
pub struct MockApi {
    pub disks: Vec<MockDisk>,
    /// Fails enumeration at this index with this code.
    pub enum_error: Option<(u32, u32)>,
    pub opened: usize,
    pub closed: Rc<Cell<usize>>,
    /// Buffer length passed to each descriptor query, in order.
    pub descriptor_queries: Vec<usize>,
    /// The `cbSize` header seen by each filling detail query.
    pub detail_headers: Vec<u32>,
}

impl MockApi {
    pub fn new(disks: Vec<MockDisk>) -> Self {
        Self {
            disks,
            enum_error: None,
            opened: 0,
            closed: Rc::new(Cell::new(0)),
            descriptor_queries: Vec::new(),
            detail_headers: Vec::new(),
        }
    }

    pub fn closed(&self) -> usize {
        self.closed.get()
    }
}

impl DiskApi for MockApi {
    type Interface = usize;
    type Handle = MockHandle;

    fn enum_interface(&mut self, index: u32) -> Result<usize, OsError> {
        if let Some((at, code)) = self.enum_error {
            if index == at {
                return Err(OsError(code));
            }
        }
        if (index as usize) < self.disks.len() {
            Ok(index as usize)
        } else {
            Err(OsError(codes::ERROR_NO_MORE_ITEMS))
        }
    }

    fn detail_header_size(&self) -> u32 {
        DETAIL_HEADER
    }

    fn interface_detail(
        &mut self,
        interface: &usize,
        buf: &mut [u8],
    ) -> Result<DetailFill, OsError> {
        let disk = &self.disks[*interface];
        let required = disk.detail_size();

        if buf.is_empty() {
            return disk
                .size_query
                .clone()
                .unwrap_or(Ok(DetailFill::Insufficient { required }));
        }
        if let Some(fetch) = disk.detail_fetch.clone() {
            return fetch;
        }
        if (buf.len() as u32) < required {
            return Ok(DetailFill::Insufficient { required });
        }

        self.detail_headers
            .push(u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]));
        for (i, unit) in disk.path.encode_utf16().chain(Some(0)).enumerate() {
            let at = 4 + i * 2;
            buf[at..at + 2].copy_from_slice(&unit.to_le_bytes());
        }
        Ok(DetailFill::Complete)
    }

    fn open(&mut self, path: &str) -> Result<MockHandle, OsError> {
        let disk = self
            .disks
            .iter()
            .position(|d| d.path == path)
            .expect("open called with an unknown path");
        if let Some(code) = self.disks[disk].open_error {
            return Err(OsError(code));
        }
        self.opened += 1;
        Ok(MockHandle {
            disk,
            closed: Rc::clone(&self.closed),
        })
    }

    fn device_number(&mut self, handle: &MockHandle) -> Result<DeviceNumber, OsError> {
        let disk = &self.disks[handle.disk];
        match disk.number_error {
            Some(code) => Err(OsError(code)),
            None => Ok(DeviceNumber {
                device_number: disk.number,
            }),
        }
    }

    fn query_descriptor(&mut self, handle: &MockHandle, buf: &mut [u8]) -> Result<(), OsError> {
        self.descriptor_queries.push(buf.len());
        match &self.disks[handle.disk].descriptor {
            DescriptorScript::Bytes(bytes) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(())
            }
            DescriptorScript::Growing => {
                let claimed = buf.len() as u32 + 100;
                put_u32(buf, 0, HEADER_SIZE);
                put_u32(buf, 4, claimed);
                Ok(())
            }
            DescriptorScript::Fail(code) => Err(OsError(*code)),
        }
    }

    fn read_capacity(&mut self, handle: &MockHandle) -> Result<u64, OsError> {
        self.disks[handle.disk]
            .capacity
            .ok_or(OsError(codes::ERROR_NOT_SUPPORTED))
    }
}
