use std::{
    cell::Cell,
    time::{Duration, Instant},
};

use log::{debug, error, info};

use crate::error::SiftError;

use super::{
    build_name,
    item::{ItemProcessor, ItemReader, ItemWriter, PassthroughProcessor},
};

/// Outcome of a completed step run.
///
/// `read_count` counts items pulled from the reader, `write_count` items
/// handed to the writer, `skip_count` items dropped by the processor under
/// the skip limit.
pub struct StepExecution {
    pub name: String,
    pub start: Instant,
    pub end: Instant,
    pub duration: Duration,
    pub read_count: usize,
    pub write_count: usize,
    pub skip_count: usize,
}

/// A chunk-oriented, strictly sequential read/process/write loop.
///
/// The reader is pulled one item at a time; processed items accumulate into a
/// chunk of at most `chunk_size` before being written and flushed, so peak
/// memory is bounded by one chunk regardless of how many items the reader
/// produces.
pub struct Step<'a, R, W> {
    name: String,
    reader: &'a dyn ItemReader<R>,
    processor: &'a dyn ItemProcessor<R, W>,
    writer: &'a dyn ItemWriter<W>,
    chunk_size: usize,
    skip_limit: usize,
    read_count: Cell<usize>,
    write_count: Cell<usize>,
    skip_count: Cell<usize>,
}

impl<R, W> Step<'_, R, W> {
    /// Drives the reader to exhaustion.
    ///
    /// Reader and writer failures abort immediately and propagate; items
    /// already written stay written. Processor failures are logged and
    /// skipped while `skip_count` stays within the configured limit.
    pub fn execute(&self) -> Result<StepExecution, SiftError> {
        let start = Instant::now();

        info!("start of step: {}", self.name);

        self.writer.open()?;

        let mut chunk: Vec<W> = Vec::with_capacity(self.chunk_size);

        loop {
            let exhausted = self.fill_chunk(&mut chunk)?;

            if !chunk.is_empty() {
                debug!("step {}: writing chunk of {} items", self.name, chunk.len());
                self.writer.write(&chunk)?;
                self.writer.flush()?;
                self.write_count.set(self.write_count.get() + chunk.len());
            }

            if exhausted {
                break;
            }
        }

        self.writer.close()?;

        info!("end of step: {}", self.name);

        Ok(StepExecution {
            name: self.name.clone(),
            start,
            end: Instant::now(),
            duration: start.elapsed(),
            read_count: self.read_count.get(),
            write_count: self.write_count.get(),
            skip_count: self.skip_count.get(),
        })
    }

    /// Reads and processes up to `chunk_size` items into `chunk`.
    ///
    /// Returns `true` once the reader reports exhaustion.
    fn fill_chunk(&self, chunk: &mut Vec<W>) -> Result<bool, SiftError> {
        chunk.clear();

        while chunk.len() < self.chunk_size {
            match self.reader.read()? {
                Some(item) => {
                    self.read_count.set(self.read_count.get() + 1);

                    match self.processor.process(&item) {
                        Ok(processed) => chunk.push(processed),
                        Err(err) => self.skip(err)?,
                    }
                }
                None => return Ok(true),
            }
        }

        Ok(false)
    }

    /// Records one skipped item, aborting once the limit is exceeded.
    ///
    /// Only processor failures reach this point: the streaming readers in
    /// this crate cannot resume after a failure, so treating reader errors as
    /// skippable would silently truncate the sequence.
    fn skip(&self, err: SiftError) -> Result<(), SiftError> {
        self.skip_count.set(self.skip_count.get() + 1);
        error!("step {}: skipping item: {}", self.name, err);

        if self.skip_count.get() > self.skip_limit {
            return Err(SiftError::Step(format!(
                "skip limit ({}) exceeded in step '{}'",
                self.skip_limit, self.name
            )));
        }

        Ok(())
    }
}

/// Builder for [`Step`].
///
/// A reader and a writer are required; the processor defaults to
/// [`PassthroughProcessor`] when the step moves items through unchanged.
pub struct StepBuilder<'a, R, W> {
    name: Option<String>,
    reader: Option<&'a dyn ItemReader<R>>,
    processor: Option<&'a dyn ItemProcessor<R, W>>,
    writer: Option<&'a dyn ItemWriter<W>>,
    chunk_size: usize,
    skip_limit: usize,
}

impl<'a, R, W> StepBuilder<'a, R, W> {
    pub fn new() -> StepBuilder<'a, R, W> {
        Self {
            name: None,
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
            skip_limit: 0,
        }
    }

    pub fn name(mut self, name: String) -> StepBuilder<'a, R, W> {
        self.name = Some(name);
        self
    }

    pub fn reader(mut self, reader: &'a impl ItemReader<R>) -> StepBuilder<'a, R, W> {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a impl ItemProcessor<R, W>) -> StepBuilder<'a, R, W> {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a impl ItemWriter<W>) -> StepBuilder<'a, R, W> {
        self.writer = Some(writer);
        self
    }

    pub fn chunk(mut self, chunk_size: usize) -> StepBuilder<'a, R, W> {
        self.chunk_size = chunk_size;
        self
    }

    pub fn skip_limit(mut self, skip_limit: usize) -> StepBuilder<'a, R, W> {
        self.skip_limit = skip_limit;
        self
    }

    /// Builds the step. Panics if the reader or writer was not set.
    pub fn build(self) -> Step<'a, R, W>
    where
        PassthroughProcessor: ItemProcessor<R, W>,
    {
        Step {
            name: self.name.unwrap_or_else(build_name),
            reader: self.reader.unwrap(),
            processor: self.processor.unwrap_or(&PassthroughProcessor),
            writer: self.writer.unwrap(),
            chunk_size: self.chunk_size.max(1),
            skip_limit: self.skip_limit,
            read_count: Cell::new(0),
            write_count: Cell::new(0),
            skip_count: Cell::new(0),
        }
    }
}

impl<R, W> Default for StepBuilder<'_, R, W> {
    fn default() -> Self {
        Self::new()
    }
}
