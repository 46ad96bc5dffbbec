//! Daily report pipeline
//!
//! TokenProvider → Paginator → RecordFilter → (department lookup) → Aggregator → ReportSink
//!
//! Strictly sequential and single pass. Any fatal error returns before the sink
//! is touched, so a failed run never leaves a partial file behind.

use crate::call_log::{
    enrich_departments, Aggregator, DepartmentMode, Paginator, PaginatorConfig, RecordFilter,
    Report, TokenProvider, UserApiLookup,
};
use crate::config::ReportConfig;
use crate::error::PipelineError;
use crate::report::{CsvReportWriter, ReportSink, WrittenReport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Written {
        report: WrittenReport,
        fetched: usize,
        in_scope: usize,
    },
    /// Nothing in scope for the day; no file was written
    NoCalls { fetched: usize },
}

/// Run the job against the CSV sink described by `config`
pub async fn run(config: &ReportConfig) -> Result<RunOutcome, PipelineError> {
    let sink = CsvReportWriter::new(config.output_dir.clone(), config.output_policy.clone());
    run_with_sink(config, &sink).await
}

pub async fn run_with_sink(
    config: &ReportConfig,
    sink: &dyn ReportSink,
) -> Result<RunOutcome, PipelineError> {
    let client = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .map_err(PipelineError::Client)?;

    log::info!("📅 Report date: {}", config.report_date);

    let token = TokenProvider::new(client.clone(), config.token_url.clone())
        .acquire(&config.credentials)
        .await?;

    let mut paginator_config = PaginatorConfig::new(config.call_logs_endpoint());
    paginator_config.page_size = config.page_size;
    paginator_config.policy = config.pagination_policy;

    let records = Paginator::new(
        client.clone(),
        paginator_config,
        config.query_base(),
        token.clone(),
    )
    .fetch_all()
    .await?;
    let fetched = records.len();

    let mut in_scope = RecordFilter::new(config.server_side_filter).retain_in_scope(records);

    if in_scope.is_empty() {
        log::info!("📭 No external outbound calls for {}", config.report_date);
        return Ok(RunOutcome::NoCalls { fetched });
    }

    if config.department_mode.enable_department_join() {
        let lookup = UserApiLookup::new(client, config.users_endpoint(), token);
        in_scope = enrich_departments(&lookup, in_scope, config.enrichment_concurrency).await;
    }

    let report = Aggregator::new(config.department_mode).aggregate(&in_scope);
    log_summary(&report, config.department_mode);

    log::info!(
        "💾 Writing report via {} sink ({} file policy)",
        sink.backend_type(),
        sink.policy().as_str()
    );
    let written = sink.write(&report, config.report_date).await?;

    Ok(RunOutcome::Written {
        report: written,
        fetched,
        in_scope: in_scope.len(),
    })
}

fn log_summary(report: &Report, mode: DepartmentMode) {
    log::info!(
        "📊 {} callers, {} calls, {}s talk time (department: {})",
        report.rows.len(),
        report.total_calls(),
        report.total_talk_time(),
        mode.as_str()
    );
}
