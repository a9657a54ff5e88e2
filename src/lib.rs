/*!
 # jsonsift

 Memory-bounded streaming extraction of projections from large JSON
 documents. Given a document whose top level is an array of objects,
 `jsonsift` yields one minimal record per element — just the `id` field —
 while holding a single element in memory at a time, so a multi-gigabyte
 document costs the same peak footprint as a small one.

 ## Core Concepts

 - **ItemReader:** pull-based retrieval of input, one item at a time.
 - **ItemProcessor:** per-item transformation between reader and writer.
 - **ItemWriter:** chunked output sink with `open`/`flush`/`close` hooks.
 - **Step:** a strictly sequential read/process/write loop over fixed-size
   chunks, reporting counts and duration.
 - **ProjectionReader:** the streaming extractor itself; an `ItemReader` and
   a fused `Iterator` over `Projection` records.
 - **Measurement:** a scoped snapshot/run/snapshot session producing one
   structured report of item count, memory delta, and elapsed time.

 ## Extracting lazily

 ```rust
 use jsonsift::{MissingIdPolicy, ProjectionReaderBuilder};

 let doc = br#"[{"id": "a"}, {"other": 1}]"#;

 let reader = ProjectionReaderBuilder::new()
     .policy(MissingIdPolicy::EmptyString)
     .from_reader(&doc[..]);

 let ids: Vec<String> = reader
     .map(|p| p.unwrap().id.as_str().unwrap_or_default().to_owned())
     .collect();

 assert_eq!(ids, vec!["a", ""]);
 ```

 ## Driving a step

 ```rust
 use jsonsift::{
     core::step::{Step, StepBuilder},
     item::sink::SinkWriter,
     Projection, ProjectionReaderBuilder,
 };

 # fn main() -> Result<(), jsonsift::SiftError> {
 let doc = br#"[{"id": 1}, {"id": 2}, {"id": 3}]"#;

 let reader = ProjectionReaderBuilder::new().from_reader(&doc[..]);
 let writer = SinkWriter::new();

 let step: Step<Projection, Projection> = StepBuilder::new()
     .name("extract-ids".to_string())
     .reader(&reader)
     .writer(&writer)
     .chunk(2)
     .build();

 let execution = step.execute()?;

 assert_eq!(execution.read_count, 3);
 assert_eq!(writer.items_written(), 3);
 # Ok(())
 # }
 ```

 Missing-`id` handling is an explicit choice: the default
 [`MissingIdPolicy::EmptyString`](extract::MissingIdPolicy) substitutes `""`,
 while [`MissingIdPolicy::Skip`](extract::MissingIdPolicy) drops such
 elements. A reader never mixes the two.
*/

pub mod core;

pub mod error;

pub mod extract;

pub mod item;

pub mod metrics;

pub use error::SiftError;
pub use extract::{MissingIdPolicy, Projection, ProjectionReader, ProjectionReaderBuilder};
pub use item::json::json_reader::JsonArrayReaderBuilder;
pub use item::json::json_writer::JsonItemWriterBuilder;
