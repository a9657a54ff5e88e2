//! jsonsift-bench: stream a JSON array document and report id-extraction
//! throughput.
//!
//! Usage:
//!   # Count id projections (lenient policy), report on stdout
//!   jsonsift-bench large-file.json
//!
//!   # Drop elements without an id instead of substituting ""
//!   jsonsift-bench --strict large-file.json
//!
//!   # Also write the projections out as a JSON array
//!   jsonsift-bench large-file.json --out ids.json
//!
//! The report is a single JSON line on stdout:
//!   {"total_items_processed":1000,"memory_usage_mb":0.25,"elapsed_time_seconds":0.04}

use std::{fs::File, path::PathBuf};

use anyhow::Result;
use clap::Parser;

use jsonsift::{
    core::{
        item::ItemWriter,
        step::{Step, StepBuilder, StepExecution},
    },
    item::sink::SinkWriter,
    metrics::Measurement,
    JsonItemWriterBuilder, MissingIdPolicy, Projection, ProjectionReader,
    ProjectionReaderBuilder, SiftError,
};

#[derive(Parser, Debug)]
#[command(name = "jsonsift-bench")]
#[command(about = "Stream a JSON array and report id-extraction throughput", long_about = None)]
struct Args {
    /// Input JSON document (top-level array of objects)
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Drop elements without an `id` key instead of substituting ""
    #[arg(long)]
    strict: bool,

    /// Items per chunk handed to the writer
    #[arg(long, default_value_t = 1000)]
    chunk_size: usize,

    /// Read buffer capacity in bytes
    #[arg(long, default_value_t = 8192)]
    capacity: usize,

    /// Write the extracted projections to this file as a JSON array
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let policy = if args.strict {
        MissingIdPolicy::Skip
    } else {
        MissingIdPolicy::EmptyString
    };

    let reader = ProjectionReaderBuilder::new()
        .policy(policy)
        .capacity(args.capacity)
        .from_path(&args.input)?;

    let measurement = Measurement::start()?;

    let execution = match &args.out {
        Some(path) => {
            let writer = JsonItemWriterBuilder::new().from_path(path)?;
            run_extraction(&reader, &writer, args.chunk_size)?
        }
        None => {
            let writer = SinkWriter::new();
            run_extraction(&reader, &writer, args.chunk_size)?
        }
    };

    let report = measurement.finish(execution.write_count)?;

    println!("{}", serde_json::to_string(&report)?);

    Ok(())
}

/// Runs one measured step over the reader.
fn run_extraction<W: ItemWriter<Projection>>(
    reader: &ProjectionReader<File>,
    writer: &W,
    chunk_size: usize,
) -> Result<StepExecution, SiftError> {
    let step: Step<Projection, Projection> = StepBuilder::new()
        .name("extract-ids".to_string())
        .reader(reader)
        .writer(writer)
        .chunk(chunk_size)
        .build();

    step.execute()
}
