pub mod call_log;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;

pub use config::ReportConfig;
pub use error::PipelineError;
pub use pipeline::{run, RunOutcome};
