use crate::error::SiftError;

/// Result of a single pull from an [`ItemReader`].
///
/// - `Ok(Some(item))`: one item was produced.
/// - `Ok(None)`: the source is exhausted; no further items will be produced.
/// - `Err(_)`: the source failed. Readers over non-seekable streams are not
///   required to recover; callers should treat the sequence as ended.
pub type ReadResult<T> = Result<Option<T>, SiftError>;

/// Result of processing one item.
pub type ProcessResult<W> = Result<W, SiftError>;

/// Pull-based source of items.
///
/// `read` takes `&self`; implementations keep their cursor in interior
/// mutability so a reader can be shared with the step that drives it.
pub trait ItemReader<T> {
    fn read(&self) -> ReadResult<T>;
}

/// Per-item transformation applied between a reader and a writer.
pub trait ItemProcessor<R, W> {
    fn process(&self, item: &R) -> ProcessResult<W>;
}

/// Chunked sink for processed items.
///
/// `open` is invoked once before the first chunk and `close` once after the
/// last, on the success path; `flush` runs after every chunk so a partial run
/// leaves durable output for the items already written.
pub trait ItemWriter<W> {
    fn write(&self, items: &[W]) -> Result<(), SiftError>;

    fn open(&self) -> Result<(), SiftError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), SiftError> {
        Ok(())
    }

    fn close(&self) -> Result<(), SiftError> {
        Ok(())
    }
}

/// Identity processor for steps that move items through unchanged.
#[derive(Default)]
pub struct PassthroughProcessor;

impl<R: Clone> ItemProcessor<R, R> for PassthroughProcessor {
    fn process(&self, item: &R) -> ProcessResult<R> {
        Ok(item.clone())
    }
}
