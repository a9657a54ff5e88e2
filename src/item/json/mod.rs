/// Streaming reader over top-level JSON arrays.
pub mod json_reader;

/// Writer that renders items as a single JSON array.
pub mod json_writer;
