use thiserror::Error;

/// Extraction error.
#[derive(Error, Debug)]
pub enum SiftError {
    /// The byte stream was not well-formed JSON at the point of failure,
    /// or the document was not a top-level array.
    #[error("malformed JSON: {0}")]
    Parse(String),

    /// The underlying resource could not be read or written.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// An item processor rejected a record.
    #[error("item processor: {0}")]
    Processor(String),

    /// An item writer rejected a record.
    #[error("item writer: {0}")]
    ItemWriter(String),

    /// A step aborted before its reader was exhausted.
    #[error("step aborted: {0}")]
    Step(String),
}
