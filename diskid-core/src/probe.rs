//! Drives the per-device pipeline: resolve the path, open the device, read
//! its drive number and descriptor, and hand the result to the reporter.
use crate::api::DiskApi;
use crate::descriptor;
use crate::detail;
use crate::device::DeviceReport;
use crate::enumerate::Interfaces;
use crate::error::{Operation, ProbeError};
use crate::report::Reporter;
use std::io::{self, Write};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Knobs for a scan.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanOptions {
    /// Stop at the first device that fails instead of moving on to the next.
    pub fail_fast: bool,
    /// Also read the disk capacity and print identity strings.
    pub details: bool,
}

/// Probes a single interface.
///
/// The device handle is dropped before this returns, whichever step fails.
pub fn probe_device<A: DiskApi>(
    api: &mut A,
    interface: &A::Interface,
    options: &ScanOptions,
) -> Result<DeviceReport, ProbeError> {
    let path = detail::resolve_path(api, interface)?;
    debug!(%path, "opening disk interface");

    let handle = api
        .open(&path)
        .map_err(|e| ProbeError::os(Operation::Open, e))?;
    let number = api
        .device_number(&handle)
        .map_err(|e| ProbeError::os(Operation::DeviceNumber, e))?;
    let descriptor = descriptor::read_descriptor(api, &handle)?;
    if descriptor.serial.is_none() {
        debug!(%path, "device reports no serial number");
    }

    let capacity = if options.details {
        match api.read_capacity(&handle) {
            Ok(length) => Some(length),
            Err(e) => {
                warn!(
                    %path,
                    operation = %Operation::ReadCapacity,
                    code = e.code(),
                    "could not read disk capacity"
                );
                None
            }
        }
    } else {
        None
    };

    Ok(DeviceReport {
        path,
        number,
        descriptor,
        capacity,
    })
}

/// A lazy scan over every disk interface, yielding one result per device.
///
/// An enumeration failure is yielded as the final item; see
/// [`ProbeError::ends_scan`].
pub struct Scan<'a, A: DiskApi> {
    interfaces: Interfaces<'a, A>,
    options: ScanOptions,
}

impl<'a, A: DiskApi> Scan<'a, A> {
    pub fn new(api: &'a mut A, options: ScanOptions) -> Self {
        Self {
            interfaces: Interfaces::new(api),
            options,
        }
    }
}

impl<A: DiskApi> Iterator for Scan<'_, A> {
    type Item = Result<DeviceReport, ProbeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let interface = match self.interfaces.next()? {
            Ok(interface) => interface,
            Err(e) => return Some(Err(e)),
        };
        Some(probe_device(self.interfaces.api(), &interface, &self.options))
    }
}

/// What a completed scan saw.
#[derive(Debug, Default)]
pub struct Summary {
    pub reported: usize,
    pub failures: Vec<ProbeError>,
}

impl Summary {
    /// The process exit status for this scan: the code of the first device
    /// failure, or zero.
    pub fn exit_code(&self) -> u32 {
        self.failures.first().map_or(0, |e| e.code)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Probe(#[from] ProbeError),
    #[error("failed to write report: {0}")]
    Output(#[from] io::Error),
}

/// Scans every disk interface and writes a stanza for each device probed.
///
/// `on_failure` is called for each device that could not be probed and is
/// the only place a skipped device is surfaced above debug level. With
/// `fail_fast` set the first such failure ends the run with that error;
/// otherwise the scan moves on and the failure is recorded in the
/// [`Summary`]. Enumeration failures always end the run.
pub fn run<A, W, F>(
    api: &mut A,
    options: ScanOptions,
    reporter: &mut Reporter<W>,
    mut on_failure: F,
) -> Result<Summary, RunError>
where
    A: DiskApi,
    W: Write,
    F: FnMut(&ProbeError),
{
    let mut summary = Summary::default();

    for result in Scan::new(api, options) {
        match result {
            Ok(report) => {
                reporter.device(&report)?;
                summary.reported += 1;
            }
            Err(e) if e.ends_scan() || options.fail_fast => {
                debug!(operation = %e.operation, code = e.code, "aborting disk scan");
                reporter.flush()?;
                return Err(e.into());
            }
            Err(e) => {
                debug!(
                    operation = %e.operation,
                    code = e.code,
                    reason = %e.reason,
                    "skipping device"
                );
                on_failure(&e);
                summary.failures.push(e);
            }
        }
    }

    reporter.flush()?;
    info!(
        reported = summary.reported,
        failed = summary.failures.len(),
        "disk scan complete"
    );
    Ok(summary)
}
