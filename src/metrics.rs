//! Scoped measurement of a single extraction run.
//!
//! A [`Measurement`] is a value, not ambient state: take the opening
//! snapshot, run the operation, fold the closing snapshot into a
//! [`RunReport`], and drop the session.

use std::io;
use std::time::Instant;

use serde::Serialize;

/// Resident set size of the current process, in bytes.
///
/// Parsed from the `VmRSS:` line of `/proc/self/status`. Reported as zero on
/// platforms without procfs and on kernels that omit the line.
pub fn resident_set_bytes() -> io::Result<u64> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/self/status")?;

        for line in content.lines() {
            if let Some(v) = line.strip_prefix("VmRSS:") {
                if let Some(kb) = parse_kb_value(v) {
                    return Ok(kb * 1024);
                }
            }
        }

        Ok(0)
    }

    #[cfg(not(target_os = "linux"))]
    {
        Ok(0)
    }
}

/// Parses kilobyte values from status-file lines ("    1234 kB").
fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// One measured run: RSS and wall-clock snapshots around a single call into
/// the extractor.
pub struct Measurement {
    start_rss: u64,
    started: Instant,
}

impl Measurement {
    /// Takes the opening snapshot.
    pub fn start() -> io::Result<Measurement> {
        Ok(Measurement {
            start_rss: resident_set_bytes()?,
            started: Instant::now(),
        })
    }

    /// Takes the closing snapshot and folds both into a report.
    ///
    /// The memory delta can be negative when the allocator returns pages
    /// between the snapshots, so it is reported as a signed float.
    pub fn finish(self, total_items_processed: usize) -> io::Result<RunReport> {
        let elapsed = self.started.elapsed();
        let end_rss = resident_set_bytes()?;

        Ok(RunReport {
            total_items_processed,
            memory_usage_mb: (end_rss as f64 - self.start_rss as f64) / (1024.0 * 1024.0),
            elapsed_time_seconds: elapsed.as_secs_f64(),
        })
    }
}

/// Structured result of a measured run.
///
/// Emitted by the benchmark binary as a single JSON line on stdout.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub total_items_processed: usize,
    pub memory_usage_mb: f64,
    pub elapsed_time_seconds: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kb_values_parse_with_and_without_the_unit() {
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));
        assert_eq!(parse_kb_value("  42  "), Some(42));
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("not a number"), None);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn a_running_process_has_a_nonzero_rss() {
        assert!(resident_set_bytes().unwrap() > 0);
    }

    #[test]
    fn finish_carries_the_item_count_through() {
        let measurement = Measurement::start().unwrap();
        let report = measurement.finish(42).unwrap();

        assert_eq!(report.total_items_processed, 42);
        assert!(report.elapsed_time_seconds >= 0.0);
    }

    #[test]
    fn report_serializes_with_the_exact_field_names() {
        let measurement = Measurement::start().unwrap();
        let report = measurement.finish(0).unwrap();

        let value = serde_json::to_value(&report).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 3);
        assert!(object.contains_key("total_items_processed"));
        assert!(object.contains_key("memory_usage_mb"));
        assert!(object.contains_key("elapsed_time_seconds"));
    }
}
