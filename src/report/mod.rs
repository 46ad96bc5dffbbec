//! Report persistence
//!
//! `ReportSink` is the seam; `CsvReportWriter` is the only backend and writes a
//! UTF-8 CSV atomically (temp file + rename) into the output directory.

pub mod csv_writer;
pub mod sink;

pub use csv_writer::CsvReportWriter;
pub use sink::{OutputPolicy, ReportSink, WrittenReport, DEFAULT_FILE_STEM};
