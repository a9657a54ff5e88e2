use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use serde::Serialize;

use crate::{core::item::ItemWriter, error::SiftError};

/// Writes items out as a single JSON array.
///
/// `open` emits the opening bracket, written items are comma-separated, and
/// `close` emits the closing bracket and flushes. With `pretty` enabled each
/// element starts on its own line.
pub struct JsonItemWriter<W: Write> {
    stream: RefCell<BufWriter<W>>,
    pretty: bool,
    first_item: Cell<bool>,
}

impl<W: Write> JsonItemWriter<W> {
    fn new(wtr: W, pretty: bool) -> Self {
        Self {
            stream: RefCell::new(BufWriter::new(wtr)),
            pretty,
            first_item: Cell::new(true),
        }
    }

    fn write_raw(&self, bytes: &[u8]) -> Result<(), SiftError> {
        self.stream.borrow_mut().write_all(bytes)?;
        Ok(())
    }
}

impl<T: Serialize, W: Write> ItemWriter<T> for JsonItemWriter<W> {
    fn write(&self, items: &[T]) -> Result<(), SiftError> {
        for item in items {
            if self.first_item.get() {
                self.first_item.set(false);
                if self.pretty {
                    self.write_raw(b"\n")?;
                }
            } else {
                let separator: &[u8] = if self.pretty { b",\n" } else { b"," };
                self.write_raw(separator)?;
            }

            let json = if self.pretty {
                serde_json::to_string_pretty(item)
            } else {
                serde_json::to_string(item)
            }
            .map_err(|err| SiftError::ItemWriter(err.to_string()))?;

            self.write_raw(json.as_bytes())?;
        }

        Ok(())
    }

    fn open(&self) -> Result<(), SiftError> {
        self.write_raw(b"[")
    }

    fn flush(&self) -> Result<(), SiftError> {
        self.stream.borrow_mut().flush()?;
        Ok(())
    }

    fn close(&self) -> Result<(), SiftError> {
        let closing: &[u8] = if self.pretty { b"\n]" } else { b"]" };
        self.write_raw(closing)?;
        <Self as ItemWriter<T>>::flush(self)
    }
}

/// Builder for [`JsonItemWriter`].
#[derive(Default)]
pub struct JsonItemWriterBuilder {
    pretty: bool,
}

impl JsonItemWriterBuilder {
    pub fn new() -> JsonItemWriterBuilder {
        JsonItemWriterBuilder { pretty: false }
    }

    pub fn pretty(mut self, yes: bool) -> JsonItemWriterBuilder {
        self.pretty = yes;
        self
    }

    pub fn from_writer<W: Write>(self, wtr: W) -> JsonItemWriter<W> {
        JsonItemWriter::new(wtr, self.pretty)
    }

    /// Creates (or truncates) the file at `path` and writes into it.
    pub fn from_path(self, path: impl AsRef<Path>) -> Result<JsonItemWriter<File>, SiftError> {
        let file = File::create(path)?;
        Ok(self.from_writer(file))
    }
}
