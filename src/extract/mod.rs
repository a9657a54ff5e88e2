//! The streaming item extractor: projects the `id` field out of each element
//! of a top-level JSON array without materializing the document.

use std::{cell::Cell, fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    core::item::{ItemReader, ReadResult},
    error::SiftError,
    item::json::json_reader::{JsonArrayReader, JsonArrayReaderBuilder},
};

/// Minimal record extracted from one document element.
///
/// Created once per element and never updated; serializes as `{"id": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub id: Value,
}

/// What to do with elements that carry no `id` key.
///
/// A reader applies exactly one policy for its whole pass; the two variants
/// are never mixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingIdPolicy {
    /// Lenient (the default): every element yields a projection, a missing
    /// `id` becomes the empty string.
    #[default]
    EmptyString,
    /// Strict: elements without an `id` key yield nothing.
    Skip,
}

/// Lazily extracts [`Projection`]s from a JSON array document.
///
/// Items can be pulled through [`ItemReader::read`] by a step, or through
/// the [`Iterator`] implementation for direct consumption. Either way the
/// reader makes a single forward pass in document order, holding one element
/// at a time; the iterator is fused after exhaustion or failure. Each
/// projection may be used and dropped before the next element is parsed.
pub struct ProjectionReader<R> {
    inner: JsonArrayReader<R, Map<String, Value>>,
    policy: MissingIdPolicy,
    fused: Cell<bool>,
}

impl<R: Read> ProjectionReader<R> {
    pub fn policy(&self) -> MissingIdPolicy {
        self.policy
    }

    fn project(&self, mut item: Map<String, Value>) -> Option<Projection> {
        match item.remove("id") {
            Some(id) => Some(Projection { id }),
            None => match self.policy {
                MissingIdPolicy::EmptyString => Some(Projection {
                    id: Value::String(String::new()),
                }),
                MissingIdPolicy::Skip => None,
            },
        }
    }
}

impl<R: Read> ItemReader<Projection> for ProjectionReader<R> {
    fn read(&self) -> ReadResult<Projection> {
        loop {
            match self.inner.read()? {
                Some(item) => {
                    if let Some(projection) = self.project(item) {
                        return Ok(Some(projection));
                    }
                    // Skipped element; pull the next one.
                }
                None => return Ok(None),
            }
        }
    }
}

impl<R: Read> Iterator for ProjectionReader<R> {
    type Item = Result<Projection, SiftError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused.get() {
            return None;
        }

        match self.read() {
            Ok(Some(projection)) => Some(Ok(projection)),
            Ok(None) => {
                self.fused.set(true);
                None
            }
            Err(err) => {
                self.fused.set(true);
                Some(Err(err))
            }
        }
    }
}

/// Builder for [`ProjectionReader`].
#[derive(Default)]
pub struct ProjectionReaderBuilder {
    policy: MissingIdPolicy,
    capacity: Option<usize>,
}

impl ProjectionReaderBuilder {
    pub fn new() -> ProjectionReaderBuilder {
        ProjectionReaderBuilder::default()
    }

    pub fn policy(mut self, policy: MissingIdPolicy) -> ProjectionReaderBuilder {
        self.policy = policy;
        self
    }

    /// Read buffer capacity in bytes. Defaults to 8 KiB.
    pub fn capacity(mut self, capacity: usize) -> ProjectionReaderBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn from_reader<R: Read>(self, rdr: R) -> ProjectionReader<R> {
        let mut builder = JsonArrayReaderBuilder::new();
        if let Some(capacity) = self.capacity {
            builder = builder.capacity(capacity);
        }

        ProjectionReader {
            inner: builder.from_reader(rdr),
            policy: self.policy,
            fused: Cell::new(false),
        }
    }

    /// Opens a fresh scoped read over `path`. A second call on an unchanged
    /// file reproduces the identical sequence.
    pub fn from_path(self, path: impl AsRef<Path>) -> Result<ProjectionReader<File>, SiftError> {
        let file = File::open(path)?;
        Ok(self.from_reader(file))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::{MissingIdPolicy, Projection, ProjectionReaderBuilder};
    use crate::error::SiftError;

    #[test]
    fn lenient_policy_substitutes_the_empty_string() {
        let doc = r#"[{"id": "a"}, {"other": 1}]"#;
        let reader = ProjectionReaderBuilder::new()
            .policy(MissingIdPolicy::EmptyString)
            .from_reader(doc.as_bytes());

        let projections: Vec<Projection> = reader.map(Result::unwrap).collect();

        assert_eq!(
            projections,
            vec![
                Projection { id: json!("a") },
                Projection { id: json!("") },
            ]
        );
    }

    #[test]
    fn strict_policy_drops_elements_without_an_id() {
        let doc = r#"[{"id": "a"}, {"other": 1}, {"id": "b"}]"#;
        let reader = ProjectionReaderBuilder::new()
            .policy(MissingIdPolicy::Skip)
            .from_reader(doc.as_bytes());

        let ids: Vec<Value> = reader.map(|p| p.unwrap().id).collect();

        assert_eq!(ids, vec![json!("a"), json!("b")]);
    }

    #[test]
    fn numeric_ids_are_preserved_as_is() {
        let doc = r#"[{"id": 7}, {"id": "x"}]"#;
        let reader = ProjectionReaderBuilder::new().from_reader(doc.as_bytes());

        let ids: Vec<Value> = reader.map(|p| p.unwrap().id).collect();

        assert_eq!(ids, vec![json!(7), json!("x")]);
    }

    #[test]
    fn iterator_is_fused_after_a_parse_failure() {
        let doc = r#"[{"id": 1}, {bad}]"#;
        let mut reader = ProjectionReaderBuilder::new().from_reader(doc.as_bytes());

        assert_eq!(reader.next().unwrap().unwrap(), Projection { id: json!(1) });
        assert!(matches!(reader.next(), Some(Err(SiftError::Parse(_)))));
        assert!(reader.next().is_none());
        assert!(reader.next().is_none());
    }

    #[test]
    fn non_object_elements_are_a_parse_failure() {
        let doc = "[1, 2]";
        let mut reader = ProjectionReaderBuilder::new().from_reader(doc.as_bytes());

        assert!(matches!(reader.next(), Some(Err(SiftError::Parse(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn projection_serializes_with_the_id_field_only() {
        let projection = Projection { id: json!("a") };
        assert_eq!(
            serde_json::to_string(&projection).unwrap(),
            r#"{"id":"a"}"#
        );
    }
}
