//! CSV writer for aggregated call reports

use super::sink::{OutputPolicy, ReportSink, WrittenReport};
use crate::call_log::Report;
use crate::error::ReportError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub struct CsvReportWriter {
    output_dir: PathBuf,
    policy: OutputPolicy,
}

impl CsvReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, policy: OutputPolicy) -> Self {
        Self {
            output_dir: output_dir.into(),
            policy,
        }
    }

    pub fn target_path(&self, report_date: NaiveDate) -> PathBuf {
        self.output_dir.join(self.policy.file_name(report_date))
    }

    /// Write to a temp file next to the target, then rename over it
    pub fn write_report(&self, report: &Report, report_date: NaiveDate) -> Result<WrittenReport, ReportError> {
        if report.is_empty() {
            return Err(ReportError::EmptyReport);
        }

        fs::create_dir_all(&self.output_dir)?;

        let target = self.target_path(report_date);
        let temp = temp_path_for(&target);

        let result = write_csv(&temp, report)
            .and_then(|_| fs::rename(&temp, &target).map_err(ReportError::from));
        if let Err(e) = result {
            let _ = fs::remove_file(&temp);
            return Err(e);
        }

        log::info!(
            "📝 Wrote {} rows to {} ({} file policy)",
            report.rows.len(),
            target.display(),
            self.policy.as_str()
        );

        Ok(WrittenReport {
            path: target,
            policy: self.policy.clone(),
            rows: report.rows.len(),
        })
    }
}

fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.tmp", name))
}

fn write_csv(path: &Path, report: &Report) -> Result<(), ReportError> {
    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);

    // Header comes from the mode so a department-less row set still lines up
    writer.write_record(report.column_names())?;
    for row in &report.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(())
}

#[async_trait]
impl ReportSink for CsvReportWriter {
    async fn write(&self, report: &Report, report_date: NaiveDate) -> Result<WrittenReport, ReportError> {
        self.write_report(report, report_date)
    }

    fn policy(&self) -> &OutputPolicy {
        &self.policy
    }

    fn backend_type(&self) -> &'static str {
        "CSV"
    }
}
