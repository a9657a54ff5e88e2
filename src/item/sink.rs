use std::{cell::Cell, fmt::Debug};

use log::debug;

use crate::{core::item::ItemWriter, error::SiftError};

/// Accepts every item, counts it, and drops it.
///
/// The consumer for measured runs: each record is observed and released
/// immediately, so the pipeline never holds more than the chunk in flight.
/// Records are echoed at `debug!` level for inspection.
#[derive(Default)]
pub struct SinkWriter {
    count: Cell<usize>,
}

impl SinkWriter {
    pub fn new() -> SinkWriter {
        SinkWriter::default()
    }

    /// Number of items written so far.
    pub fn items_written(&self) -> usize {
        self.count.get()
    }
}

impl<T: Debug> ItemWriter<T> for SinkWriter {
    fn write(&self, items: &[T]) -> Result<(), SiftError> {
        for item in items {
            debug!("record: {:?}", item);
        }
        self.count.set(self.count.get() + items.len());
        Ok(())
    }
}
