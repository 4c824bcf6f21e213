use crate::api::DiskApi;
use crate::error::{Operation, ProbeError};
use tracing::debug;

/// A lazy walk over the device interfaces a [`DiskApi`] reports.
///
/// Ends cleanly when the OS signals `ERROR_NO_MORE_ITEMS`. Any other failure
/// is yielded once and ends the walk.
pub struct Interfaces<'a, A: DiskApi> {
    api: &'a mut A,
    index: u32,
    done: bool,
}

impl<'a, A: DiskApi> Interfaces<'a, A> {
    pub fn new(api: &'a mut A) -> Self {
        Self {
            api,
            index: 0,
            done: false,
        }
    }

    /// Gives access to the backend between items, for probing the interface
    /// just yielded.
    pub fn api(&mut self) -> &mut A {
        &mut *self.api
    }
}

impl<A: DiskApi> Iterator for Interfaces<'_, A> {
    type Item = Result<A::Interface, ProbeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.api.enum_interface(self.index) {
            Ok(interface) => {
                self.index += 1;
                Some(Ok(interface))
            }
            Err(e) if e.is_no_more_items() => {
                debug!(count = self.index, "end of disk interface list");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(ProbeError::os(Operation::EnumerateInterfaces, e)))
            }
        }
    }
}
