//! Writes device reports as plain console text.
use crate::device::DeviceReport;
use std::io::{self, Write};

/// Writes one stanza per device to `out`, each followed by a blank line.
pub struct Reporter<W: Write> {
    out: W,
    details: bool,
}

impl<W: Write> Reporter<W> {
    pub fn new(out: W, details: bool) -> Self {
        Self { out, details }
    }

    pub fn device(&mut self, report: &DeviceReport) -> io::Result<()> {
        write!(self.out, "{}", report)?;

        if self.details {
            let descriptor = &report.descriptor;
            if let Some(vendor) = &descriptor.vendor {
                writeln!(self.out, "VendorId = {}", vendor)?;
            }
            if let Some(product) = &descriptor.product {
                writeln!(self.out, "ProductId = {}", product)?;
            }
            if let Some(revision) = &descriptor.revision {
                writeln!(self.out, "ProductRevision = {}", revision)?;
            }
            writeln!(self.out, "BusType = {}", descriptor.bus_type)?;
            writeln!(self.out, "Removable = {}", descriptor.removable)?;
            if let Some(length) = report.capacity {
                writeln!(self.out, "DiskLength = {}", length)?;
            }
        }

        writeln!(self.out)
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
