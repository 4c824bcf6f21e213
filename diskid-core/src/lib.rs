//! The core, UI-agnostic library for the `diskid` utility.
//!
//! `diskid-core` walks the disk-class device interfaces the OS reports and,
//! for each one, resolves its device path, opens it read-only, and reads its
//! physical drive number and storage device descriptor (serial number,
//! vendor, product, revision).
//!
//! The library is structured into several key modules:
//! - [`api`]: The [`DiskApi`](api::DiskApi) trait, one method per OS call.
//! - [`platform`]: The SetupAPI / `DeviceIoControl` backend for Windows.
//! - [`enumerate`], [`detail`], [`descriptor`]: The enumeration walk, the
//!   size-then-fetch path lookup, and the grow-and-retry descriptor read.
//! - [`mod@probe`]: The per-device pipeline and the [`probe::run`] driver.
//! - [`device`], [`report`]: The per-device result and its text rendering.
//!
//! ## Example: Listing Disks
//!
//! ```rust,no_run
//! use diskid_core::{platform, probe, report::Reporter};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut system = platform::open()?;
//!     let mut reporter = Reporter::new(std::io::stdout().lock(), false);
//!
//!     let summary = probe::run(
//!         &mut system,
//!         probe::ScanOptions::default(),
//!         &mut reporter,
//!         |e| eprintln!("{}", e),
//!     )?;
//!
//!     println!("{} disks reported", summary.reported);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod descriptor;
pub mod detail;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod platform;
pub mod probe;
pub mod report;
