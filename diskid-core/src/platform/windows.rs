use crate::api::{DetailFill, DeviceNumber, DiskApi};
use crate::error::{OsError, Operation, ProbeError, Result};
use std::ffi::c_void;
use std::mem::{size_of, zeroed};
use std::ptr::{null, null_mut};
use tracing::debug;
use windows_sys::Win32::{
    Devices::DeviceAndDriverInstallation::{
        DIGCF_DEVICEINTERFACE, DIGCF_PRESENT, HDEVINFO, SP_DEVICE_INTERFACE_DATA,
        SP_DEVICE_INTERFACE_DETAIL_DATA_W, SetupDiDestroyDeviceInfoList,
        SetupDiEnumDeviceInterfaces, SetupDiGetClassDevsW, SetupDiGetDeviceInterfaceDetailW,
    },
    Foundation::{
        CloseHandle, ERROR_INSUFFICIENT_BUFFER, GENERIC_READ, GetLastError, HANDLE,
        INVALID_HANDLE_VALUE,
    },
    Storage::FileSystem::{
        CreateFileW, FILE_ATTRIBUTE_NORMAL, FILE_SHARE_READ, FILE_SHARE_WRITE, OPEN_EXISTING,
    },
    System::IO::DeviceIoControl,
    System::Ioctl::{
        IOCTL_STORAGE_GET_DEVICE_NUMBER, IOCTL_STORAGE_QUERY_PROPERTY,
        IOCTL_STORAGE_READ_CAPACITY, PropertyStandardQuery, STORAGE_DEVICE_NUMBER,
        STORAGE_PROPERTY_QUERY, STORAGE_READ_CAPACITY, StorageDeviceProperty,
    },
};
use windows_sys::core::GUID;

/// `GUID_DEVINTERFACE_DISK`.
const DISK_INTERFACE_CLASS: GUID = GUID::from_u128(0x53f56307_b6bf_11d0_94f2_00a0c91efb8b);

fn last_error() -> OsError {
    OsError(unsafe { GetLastError() })
}

/// Owns a device information set and destroys it on drop.
struct DeviceInfoSet(HDEVINFO);

impl Drop for DeviceInfoSet {
    fn drop(&mut self) {
        unsafe { SetupDiDestroyDeviceInfoList(self.0) };
    }
}

/// An open device handle, closed on drop.
pub struct DeviceHandle(HANDLE);

impl Drop for DeviceHandle {
    fn drop(&mut self) {
        if self.0 != INVALID_HANDLE_VALUE {
            unsafe { CloseHandle(self.0) };
        }
    }
}

/// One entry of the disk interface list.
pub struct Interface(SP_DEVICE_INTERFACE_DATA);

/// SetupAPI and `DeviceIoControl` backed access to present disk interfaces.
pub struct System {
    devices: DeviceInfoSet,
}

/// Opens the set of present devices that expose an enabled disk interface.
pub fn open() -> Result<System> {
    let devices = unsafe {
        SetupDiGetClassDevsW(
            &DISK_INTERFACE_CLASS,
            null(),
            0,
            DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
        )
    };
    if devices == INVALID_HANDLE_VALUE {
        return Err(ProbeError::os(Operation::ClassDevices, last_error()));
    }
    debug!("opened disk interface device information set");
    Ok(System {
        devices: DeviceInfoSet(devices),
    })
}

/// Issues a `DeviceIoControl` with no input into `out`.
fn ioctl_out(
    handle: &DeviceHandle,
    code: u32,
    out: *mut c_void,
    len: usize,
) -> std::result::Result<(), OsError> {
    ioctl(handle, code, null(), 0, out, len)
}

fn ioctl(
    handle: &DeviceHandle,
    code: u32,
    input: *const c_void,
    input_len: usize,
    out: *mut c_void,
    out_len: usize,
) -> std::result::Result<(), OsError> {
    let mut bytes_returned: u32 = 0;
    let ok = unsafe {
        DeviceIoControl(
            handle.0,
            code,
            input,
            input_len as u32,
            out,
            out_len as u32,
            &mut bytes_returned,
            null_mut(),
        )
    };
    if ok == 0 { Err(last_error()) } else { Ok(()) }
}

impl DiskApi for System {
    type Interface = Interface;
    type Handle = DeviceHandle;

    fn enum_interface(&mut self, index: u32) -> std::result::Result<Interface, OsError> {
        let mut data: SP_DEVICE_INTERFACE_DATA = unsafe { zeroed() };
        data.cbSize = size_of::<SP_DEVICE_INTERFACE_DATA>() as u32;

        let ok = unsafe {
            SetupDiEnumDeviceInterfaces(
                self.devices.0,
                null(),
                &DISK_INTERFACE_CLASS,
                index,
                &mut data,
            )
        };
        if ok == 0 { Err(last_error()) } else { Ok(Interface(data)) }
    }

    fn detail_header_size(&self) -> u32 {
        size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32
    }

    fn interface_detail(
        &mut self,
        interface: &Interface,
        buf: &mut [u8],
    ) -> std::result::Result<DetailFill, OsError> {
        let mut required: u32 = 0;

        // The record is read through a `u32` header, so it goes through an
        // aligned scratch copy rather than the caller's byte buffer.
        let mut scratch = vec![0u64; buf.len().div_ceil(size_of::<u64>())];
        let detail = if buf.is_empty() {
            null_mut()
        } else {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    buf.as_ptr(),
                    scratch.as_mut_ptr().cast::<u8>(),
                    buf.len(),
                );
            }
            scratch.as_mut_ptr().cast::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>()
        };

        let ok = unsafe {
            SetupDiGetDeviceInterfaceDetailW(
                self.devices.0,
                &interface.0,
                detail,
                buf.len() as u32,
                &mut required,
                null_mut(),
            )
        };
        if ok == 0 {
            let err = last_error();
            return if err.code() == ERROR_INSUFFICIENT_BUFFER {
                Ok(DetailFill::Insufficient { required })
            } else {
                Err(err)
            };
        }

        if !buf.is_empty() {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    scratch.as_ptr().cast::<u8>(),
                    buf.as_mut_ptr(),
                    buf.len(),
                );
            }
        }
        Ok(DetailFill::Complete)
    }

    fn open(&mut self, path: &str) -> std::result::Result<DeviceHandle, OsError> {
        let wide_path: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();
        let handle = unsafe {
            CreateFileW(
                wide_path.as_ptr(),
                GENERIC_READ,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                null(),
                OPEN_EXISTING,
                FILE_ATTRIBUTE_NORMAL,
                0,
            )
        };
        if handle == INVALID_HANDLE_VALUE {
            Err(last_error())
        } else {
            Ok(DeviceHandle(handle))
        }
    }

    fn device_number(
        &mut self,
        handle: &DeviceHandle,
    ) -> std::result::Result<DeviceNumber, OsError> {
        let mut number: STORAGE_DEVICE_NUMBER = unsafe { zeroed() };
        ioctl_out(
            handle,
            IOCTL_STORAGE_GET_DEVICE_NUMBER,
            (&mut number as *mut STORAGE_DEVICE_NUMBER).cast(),
            size_of::<STORAGE_DEVICE_NUMBER>(),
        )?;
        Ok(DeviceNumber {
            device_number: number.DeviceNumber,
        })
    }

    fn query_descriptor(
        &mut self,
        handle: &DeviceHandle,
        buf: &mut [u8],
    ) -> std::result::Result<(), OsError> {
        let mut query: STORAGE_PROPERTY_QUERY = unsafe { zeroed() };
        query.PropertyId = StorageDeviceProperty;
        query.QueryType = PropertyStandardQuery;

        ioctl(
            handle,
            IOCTL_STORAGE_QUERY_PROPERTY,
            (&query as *const STORAGE_PROPERTY_QUERY).cast(),
            size_of::<STORAGE_PROPERTY_QUERY>(),
            buf.as_mut_ptr().cast(),
            buf.len(),
        )
    }

    fn read_capacity(&mut self, handle: &DeviceHandle) -> std::result::Result<u64, OsError> {
        let mut capacity: STORAGE_READ_CAPACITY = unsafe { zeroed() };
        capacity.Version = size_of::<STORAGE_READ_CAPACITY>() as u32;
        ioctl_out(
            handle,
            IOCTL_STORAGE_READ_CAPACITY,
            (&mut capacity as *mut STORAGE_READ_CAPACITY).cast(),
            size_of::<STORAGE_READ_CAPACITY>(),
        )?;
        Ok(capacity.DiskLength as u64)
    }
}
