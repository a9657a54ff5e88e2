use std::{
    fs,
    io::{self, Write},
};

use anyhow::Result;
use mockall::mock;
use serde_json::json;
use tempfile::{tempdir, NamedTempFile};

use jsonsift::{
    core::{
        item::{ItemProcessor, ProcessResult},
        step::{Step, StepBuilder},
    },
    item::sink::SinkWriter,
    JsonItemWriterBuilder, MissingIdPolicy, Projection, ProjectionReaderBuilder, SiftError,
};

mock! {
    pub File {}
    impl Write for File {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
        fn flush(&mut self) -> io::Result<()>;
    }
}

fn write_document(content: &str) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn projections_flow_from_document_to_json_file() -> Result<()> {
    let input = write_document(r#"[{"id": "a"}, {"x": 1}, {"id": "c"}]"#)?;
    let out_dir = tempdir()?;
    let out_path = out_dir.path().join("ids.json");

    let reader = ProjectionReaderBuilder::new().from_path(input.path())?;
    let writer = JsonItemWriterBuilder::new().from_path(&out_path)?;

    let step: Step<Projection, Projection> = StepBuilder::new()
        .name("to-file".to_string())
        .reader(&reader)
        .writer(&writer)
        .chunk(2)
        .build();

    let execution = step.execute()?;

    assert_eq!(execution.read_count, 3);
    assert_eq!(execution.write_count, 3);
    assert_eq!(execution.skip_count, 0);
    assert!(execution.start <= execution.end);
    assert!(execution.duration.as_nanos() > 0);

    let content = fs::read_to_string(&out_path)?;
    assert_eq!(content, r#"[{"id":"a"},{"id":""},{"id":"c"}]"#);

    Ok(())
}

#[test]
fn sink_counts_match_the_execution_counts() -> Result<()> {
    let input = write_document(r#"[{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}, {"id": 5}]"#)?;

    let reader = ProjectionReaderBuilder::new().from_path(input.path())?;
    let writer = SinkWriter::new();

    let step: Step<Projection, Projection> = StepBuilder::new()
        .reader(&reader)
        .writer(&writer)
        .chunk(2)
        .build();

    let execution = step.execute()?;

    assert_eq!(execution.read_count, 5);
    assert_eq!(execution.write_count, 5);
    assert_eq!(writer.items_written(), 5);

    Ok(())
}

#[test]
fn strict_policy_filters_before_the_step_sees_items() -> Result<()> {
    let input = write_document(r#"[{"id": "a"}, {"other": 1}, {"id": "b"}]"#)?;

    let reader = ProjectionReaderBuilder::new()
        .policy(MissingIdPolicy::Skip)
        .from_path(input.path())?;
    let writer = SinkWriter::new();

    let step: Step<Projection, Projection> = StepBuilder::new()
        .reader(&reader)
        .writer(&writer)
        .chunk(10)
        .build();

    let execution = step.execute()?;

    assert_eq!(execution.read_count, 2);
    assert_eq!(execution.write_count, 2);
    assert_eq!(writer.items_written(), 2);

    Ok(())
}

#[test]
fn a_failing_writer_aborts_the_step() -> Result<()> {
    let input = write_document(r#"[{"id": 1}, {"id": 2}]"#)?;

    let reader = ProjectionReaderBuilder::new().from_path(input.path())?;

    let mut sink = MockFile::new();
    sink.expect_write()
        .returning(|_| Err(io::Error::other("disk full")));
    sink.expect_flush().returning(|| Ok(()));

    let writer = JsonItemWriterBuilder::new().from_writer(sink);

    let step: Step<Projection, Projection> = StepBuilder::new()
        .reader(&reader)
        .writer(&writer)
        .chunk(2)
        .build();

    assert!(matches!(step.execute(), Err(SiftError::Io(_))));

    Ok(())
}

struct RejectEmptyIds;

impl ItemProcessor<Projection, Projection> for RejectEmptyIds {
    fn process(&self, item: &Projection) -> ProcessResult<Projection> {
        if item.id == json!("") {
            return Err(SiftError::Processor("element has no id".to_string()));
        }
        Ok(item.clone())
    }
}

#[test]
fn processor_failures_are_skipped_within_the_limit() -> Result<()> {
    let input = write_document(r#"[{"id": "a"}, {"other": 1}, {"id": "b"}]"#)?;

    let reader = ProjectionReaderBuilder::new().from_path(input.path())?;
    let writer = SinkWriter::new();
    let processor = RejectEmptyIds;

    let step: Step<Projection, Projection> = StepBuilder::new()
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(2)
        .skip_limit(1)
        .build();

    let execution = step.execute()?;

    assert_eq!(execution.read_count, 3);
    assert_eq!(execution.write_count, 2);
    assert_eq!(execution.skip_count, 1);

    Ok(())
}

#[test]
fn exceeding_the_skip_limit_aborts_the_step() -> Result<()> {
    let input = write_document(r#"[{"id": "a"}, {"other": 1}, {"another": 2}]"#)?;

    let reader = ProjectionReaderBuilder::new().from_path(input.path())?;
    let writer = SinkWriter::new();
    let processor = RejectEmptyIds;

    let step: Step<Projection, Projection> = StepBuilder::new()
        .reader(&reader)
        .processor(&processor)
        .writer(&writer)
        .chunk(2)
        .skip_limit(1)
        .build();

    assert!(matches!(step.execute(), Err(SiftError::Step(_))));

    Ok(())
}

#[test]
fn a_parse_failure_in_the_reader_always_propagates() -> Result<()> {
    let input = write_document(r#"[{"id": 1}, {bad}]"#)?;

    let reader = ProjectionReaderBuilder::new().from_path(input.path())?;
    let writer = SinkWriter::new();

    let step: Step<Projection, Projection> = StepBuilder::new()
        .reader(&reader)
        .writer(&writer)
        .chunk(10)
        // A generous skip limit must not rescue a broken document.
        .skip_limit(100)
        .build();

    assert!(matches!(step.execute(), Err(SiftError::Parse(_))));

    Ok(())
}
