//! Provides the operating system backend for [`DiskApi`](crate::api::DiskApi).
//!
//! Conditional compilation (`#[cfg]`) selects the implementation for the
//! target OS. Each submodule exposes the same surface: a `System` type that
//! implements `DiskApi` and an `open()` function that creates it. On targets
//! other than Windows, `open()` always fails with `ERROR_NOT_SUPPORTED`.

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use self::windows::*;

#[cfg(not(target_os = "windows"))]
mod unsupported;
#[cfg(not(target_os = "windows"))]
pub use self::unsupported::*;
