//! Report sink trait and output naming policy
//!
//! A run writes at most one file. Which naming policy is active is part of the
//! result (`WrittenReport::policy`) so callers never have to guess.

use crate::call_log::Report;
use crate::error::ReportError;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_FILE_STEM: &str = "external_outbound_calls";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputPolicy {
    /// `{stem}_{YYYY-MM-DD}.csv`, one file per report date
    Dated { stem: String },
    /// Same file overwritten on every run
    Fixed { file_name: String },
}

impl OutputPolicy {
    pub fn dated() -> Self {
        OutputPolicy::Dated {
            stem: DEFAULT_FILE_STEM.to_string(),
        }
    }

    pub fn fixed(file_name: impl Into<String>) -> Self {
        OutputPolicy::Fixed {
            file_name: file_name.into(),
        }
    }

    pub fn file_name(&self, report_date: NaiveDate) -> String {
        match self {
            OutputPolicy::Dated { stem } => {
                format!("{}_{}.csv", stem, report_date.format("%Y-%m-%d"))
            }
            OutputPolicy::Fixed { file_name } => file_name.clone(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputPolicy::Dated { .. } => "dated",
            OutputPolicy::Fixed { .. } => "fixed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub path: PathBuf,
    pub policy: OutputPolicy,
    pub rows: usize,
}

/// Destination for a finished report
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Persist the whole report, replacing any previous file for the same name
    async fn write(&self, report: &Report, report_date: NaiveDate) -> Result<WrittenReport, ReportError>;

    /// Naming policy in effect for this sink
    fn policy(&self) -> &OutputPolicy;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
