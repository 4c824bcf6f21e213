//! Error types shared by the probing pipeline and the platform backends.
use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// Win32 error codes the pipeline interprets. The values match `winerror.h`
/// so the platform backend can pass `GetLastError` results through unchanged.
pub mod codes {
    pub const ERROR_INVALID_DATA: u32 = 13;
    pub const ERROR_GEN_FAILURE: u32 = 31;
    pub const ERROR_NOT_SUPPORTED: u32 = 50;
    pub const ERROR_INSUFFICIENT_BUFFER: u32 = 122;
    pub const ERROR_MORE_DATA: u32 = 234;
    pub const ERROR_NO_MORE_ITEMS: u32 = 259;
}

/// A raw error code reported by the operating system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OsError(pub u32);

impl OsError {
    pub fn code(self) -> u32 {
        self.0
    }

    pub fn is_no_more_items(self) -> bool {
        self.0 == codes::ERROR_NO_MORE_ITEMS
    }
}

impl fmt::Display for OsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OS error {}", self.0)
    }
}

impl std::error::Error for OsError {}

/// The OS call a [`ProbeError`] originated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    ClassDevices,
    EnumerateInterfaces,
    InterfaceDetailSize,
    InterfaceDetail,
    Open,
    DeviceNumber,
    QueryDescriptor,
    ReadCapacity,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::ClassDevices => "SetupDiGetClassDevs",
            Operation::EnumerateInterfaces => "SetupDiEnumDeviceInterfaces",
            Operation::InterfaceDetailSize => "SetupDiGetDeviceInterfaceDetail - 1",
            Operation::InterfaceDetail => "SetupDiGetDeviceInterfaceDetail - 2",
            Operation::Open => "CreateFile",
            Operation::DeviceNumber => "IOCTL_STORAGE_GET_DEVICE_NUMBER",
            Operation::QueryDescriptor => "IOCTL_STORAGE_QUERY_PROPERTY",
            Operation::ReadCapacity => "IOCTL_STORAGE_READ_CAPACITY",
        };
        f.write_str(name)
    }
}

/// Why a probe step failed.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Reason {
    #[error("the call failed")]
    Os,
    #[error("size query succeeded with an empty buffer")]
    UnexpectedSuccess,
    #[error("detail record is too short to hold a path")]
    TruncatedDetail,
    #[error("device path is not valid UTF-16")]
    InvalidPath,
    #[error("descriptor version {version} is older than the {expected}-byte header")]
    DescriptorVersion { version: u32, expected: u32 },
    #[error("descriptor string offset {offset} is outside the {len}-byte buffer")]
    DescriptorOffset { offset: u32, len: usize },
    #[error("descriptor kept growing after {attempts} queries")]
    DescriptorGrowth { attempts: u32 },
    #[error("this platform has no disk enumeration backend")]
    Unsupported,
}

/// A failed step of disk enumeration or device probing.
///
/// Displays as the one-line diagnostic printed by the CLI:
/// `<operation> failed at <file>:<line> : Error Code - <code>`.
#[derive(Clone, Debug, Error)]
#[error("{operation} failed at {site} : Error Code - {code}")]
pub struct ProbeError {
    pub operation: Operation,
    pub site: &'static Location<'static>,
    pub code: u32,
    #[source]
    pub reason: Reason,
}

impl ProbeError {
    /// Wraps an OS failure, recording the caller as the failure site.
    #[track_caller]
    pub fn os(operation: Operation, err: OsError) -> Self {
        Self {
            operation,
            site: Location::caller(),
            code: err.code(),
            reason: Reason::Os,
        }
    }

    #[track_caller]
    pub fn new(operation: Operation, code: u32, reason: Reason) -> Self {
        Self {
            operation,
            site: Location::caller(),
            code,
            reason,
        }
    }

    /// Whether this error comes from enumeration itself, after which no
    /// further devices can be reached.
    pub fn ends_scan(&self) -> bool {
        matches!(
            self.operation,
            Operation::ClassDevices | Operation::EnumerateInterfaces
        )
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;
