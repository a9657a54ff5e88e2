use std::{
    cell::{Cell, RefCell},
    fs::File,
    io::{BufRead, BufReader, Read},
    marker::PhantomData,
    path::Path,
};

use log::debug;
use serde::de::DeserializeOwned;

use crate::{
    core::item::{ItemReader, ReadResult},
    error::SiftError,
};

const DEFAULT_CAPACITY: usize = 8 * 1024;

/// Scanner position within the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    /// Before the opening `[`.
    Start,
    /// Inside the array, before the first element: a value or `]` may follow.
    ElementOrEnd,
    /// Capturing the bytes of one element.
    Element,
    /// After a completed element: `,` or `]` may follow.
    DelimOrEnd,
    /// After a `,`: a value must follow.
    ElementRequired,
    /// The closing `]` was consumed, or a failure fused the stream.
    Done,
}

/// Streaming reader over a JSON document whose top level is an array.
///
/// The byte stream is scanned incrementally through a fixed-capacity
/// [`BufReader`]; element boundaries are recognized by tracking brace/bracket
/// depth together with string and escape state, and each completed element is
/// deserialized on its own with [`serde_json::from_slice`]. Peak memory is
/// therefore one element plus the read buffer, independent of document size.
///
/// The reader makes a single forward pass and is not restartable: re-reading
/// a document requires a fresh reader over a fresh handle. After exhaustion
/// or a failure the stream is fused and `read` returns `Ok(None)`. The
/// underlying handle is dropped with the reader on every exit path.
pub struct JsonArrayReader<R, T> {
    pd: PhantomData<T>,
    reader: RefCell<BufReader<R>>,
    state: Cell<ScanState>,
    depth: Cell<u32>,
    in_string: Cell<bool>,
    escaped: Cell<bool>,
    element: RefCell<Vec<u8>>,
}

impl<R: Read, T: DeserializeOwned> JsonArrayReader<R, T> {
    fn new(rdr: R, capacity: usize) -> Self {
        Self {
            pd: PhantomData,
            reader: RefCell::new(BufReader::with_capacity(capacity.max(1), rdr)),
            state: Cell::new(ScanState::Start),
            depth: Cell::new(0),
            in_string: Cell::new(false),
            escaped: Cell::new(false),
            element: RefCell::new(Vec::new()),
        }
    }

    /// Fuses the stream and produces a parse error.
    fn fail(&self, message: impl Into<String>) -> SiftError {
        self.state.set(ScanState::Done);
        SiftError::Parse(message.into())
    }

    /// Starts capturing a new element whose first byte is `byte`.
    fn begin_element(&self, byte: u8) {
        let mut element = self.element.borrow_mut();
        element.clear();
        element.push(byte);
        drop(element);

        self.in_string.set(byte == b'"');
        self.escaped.set(false);
        self.depth.set(match byte {
            b'{' | b'[' => 1,
            _ => 0,
        });
    }

    fn push(&self, byte: u8) {
        self.element.borrow_mut().push(byte);
    }

    /// Deserializes the captured element bytes.
    fn parse_element(&self) -> Result<T, SiftError> {
        let element = self.element.borrow();
        match serde_json::from_slice(&element) {
            Ok(item) => {
                debug!("element complete: {} bytes", element.len());
                Ok(item)
            }
            Err(err) => {
                drop(element);
                Err(self.fail(err.to_string()))
            }
        }
    }
}

impl<R: Read, T: DeserializeOwned> ItemReader<T> for JsonArrayReader<R, T> {
    fn read(&self) -> ReadResult<T> {
        loop {
            if self.state.get() == ScanState::Done {
                return Ok(None);
            }

            let mut reader = self.reader.borrow_mut();
            let buf = reader.fill_buf()?;

            if buf.is_empty() {
                return match self.state.get() {
                    ScanState::Start => {
                        Err(self.fail("expected a top-level JSON array, found end of input"))
                    }
                    _ => Err(self.fail("unexpected end of document")),
                };
            }

            let mut consumed = buf.len();
            let mut outcome: Option<ReadResult<T>> = None;

            for (i, &byte) in buf.iter().enumerate() {
                match self.state.get() {
                    ScanState::Start => {
                        if byte.is_ascii_whitespace() {
                            continue;
                        }
                        if byte == b'[' {
                            self.state.set(ScanState::ElementOrEnd);
                        } else {
                            consumed = i + 1;
                            outcome = Some(Err(self.fail(format!(
                                "expected a top-level JSON array, found '{}'",
                                byte as char
                            ))));
                            break;
                        }
                    }
                    ScanState::ElementOrEnd | ScanState::ElementRequired => {
                        if byte.is_ascii_whitespace() {
                            continue;
                        }
                        if byte == b']' {
                            consumed = i + 1;
                            if self.state.get() == ScanState::ElementRequired {
                                outcome = Some(Err(self.fail("trailing comma before ']'")));
                            } else {
                                self.state.set(ScanState::Done);
                                outcome = Some(Ok(None));
                            }
                            break;
                        }
                        if matches!(byte, b',' | b':' | b'}') {
                            consumed = i + 1;
                            outcome = Some(Err(self.fail(format!(
                                "expected a value, found '{}'",
                                byte as char
                            ))));
                            break;
                        }
                        self.begin_element(byte);
                        self.state.set(ScanState::Element);
                    }
                    ScanState::Element => {
                        if self.in_string.get() {
                            self.push(byte);
                            if self.escaped.get() {
                                self.escaped.set(false);
                            } else if byte == b'\\' {
                                self.escaped.set(true);
                            } else if byte == b'"' {
                                self.in_string.set(false);
                                if self.depth.get() == 0 {
                                    // A bare string element ends at its closing quote.
                                    self.state.set(ScanState::DelimOrEnd);
                                    consumed = i + 1;
                                    outcome = Some(self.parse_element().map(Some));
                                    break;
                                }
                            }
                            continue;
                        }

                        match byte {
                            b'"' => {
                                self.in_string.set(true);
                                self.push(byte);
                            }
                            b'{' | b'[' => {
                                self.depth.set(self.depth.get() + 1);
                                self.push(byte);
                            }
                            b'}' | b']' => {
                                if self.depth.get() == 0 {
                                    if byte == b'}' {
                                        consumed = i + 1;
                                        outcome = Some(Err(self.fail("unbalanced '}'")));
                                        break;
                                    }
                                    // The array's own `]` terminates a scalar element.
                                    self.state.set(ScanState::Done);
                                    consumed = i + 1;
                                    outcome = Some(self.parse_element().map(Some));
                                    break;
                                }
                                self.depth.set(self.depth.get() - 1);
                                self.push(byte);
                                if self.depth.get() == 0 {
                                    self.state.set(ScanState::DelimOrEnd);
                                    consumed = i + 1;
                                    outcome = Some(self.parse_element().map(Some));
                                    break;
                                }
                            }
                            b',' => {
                                if self.depth.get() == 0 {
                                    self.state.set(ScanState::ElementRequired);
                                    consumed = i + 1;
                                    outcome = Some(self.parse_element().map(Some));
                                    break;
                                }
                                self.push(byte);
                            }
                            b if b.is_ascii_whitespace() => {
                                if self.depth.get() == 0 {
                                    self.state.set(ScanState::DelimOrEnd);
                                    consumed = i + 1;
                                    outcome = Some(self.parse_element().map(Some));
                                    break;
                                }
                                self.push(byte);
                            }
                            _ => self.push(byte),
                        }
                    }
                    ScanState::DelimOrEnd => {
                        if byte.is_ascii_whitespace() {
                            continue;
                        }
                        match byte {
                            b',' => self.state.set(ScanState::ElementRequired),
                            b']' => {
                                self.state.set(ScanState::Done);
                                consumed = i + 1;
                                outcome = Some(Ok(None));
                                break;
                            }
                            other => {
                                consumed = i + 1;
                                outcome = Some(Err(self.fail(format!(
                                    "expected ',' or ']' after element, found '{}'",
                                    other as char
                                ))));
                                break;
                            }
                        }
                    }
                    ScanState::Done => {
                        consumed = i;
                        break;
                    }
                }
            }

            reader.consume(consumed);

            if let Some(result) = outcome {
                return result;
            }
        }
    }
}

/// Builder for [`JsonArrayReader`].
#[derive(Default)]
pub struct JsonArrayReaderBuilder<T> {
    pd: PhantomData<T>,
    capacity: Option<usize>,
}

impl<T: DeserializeOwned> JsonArrayReaderBuilder<T> {
    pub fn new() -> JsonArrayReaderBuilder<T> {
        Self {
            pd: PhantomData,
            capacity: None,
        }
    }

    /// Read buffer capacity in bytes. Defaults to 8 KiB.
    pub fn capacity(mut self, capacity: usize) -> JsonArrayReaderBuilder<T> {
        self.capacity = Some(capacity);
        self
    }

    pub fn from_reader<R: Read>(self, rdr: R) -> JsonArrayReader<R, T> {
        JsonArrayReader::new(rdr, self.capacity.unwrap_or(DEFAULT_CAPACITY))
    }

    pub fn from_path(self, path: impl AsRef<Path>) -> Result<JsonArrayReader<File, T>, SiftError> {
        let file = File::open(path)?;
        Ok(self.from_reader(file))
    }
}
