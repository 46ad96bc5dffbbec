//! Daily external outbound call report
//!
//! Fetches one day of call logs, keeps external outbound calls, totals them per
//! caller and writes a CSV.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin callrollup
//! ```
//!
//! See `ReportConfig::from_env` for the environment variables. A `.env` file in
//! the working directory is loaded first.
//!
//! Exit status is 0 on success, including days with no in-scope calls, and 1
//! on any fatal error.

use callrollup::{run, ReportConfig, RunOutcome};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match ReportConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    };

    log::info!("🚀 Starting call report");
    log::info!("   Grant: {}", config.credentials.kind().as_str());
    log::info!("   Endpoint: {}", config.call_logs_endpoint());
    log::info!("   Output: {}", config.output_dir.display());
    log::info!("   File policy: {}", config.output_policy.as_str());
    log::info!("   Department mode: {}", config.department_mode.as_str());

    match run(&config).await {
        Ok(RunOutcome::Written {
            report,
            fetched,
            in_scope,
        }) => {
            log::info!(
                "✅ Saved {} rows to {} ({} of {} calls in scope)",
                report.rows,
                report.path.display(),
                in_scope,
                fetched
            );
        }
        Ok(RunOutcome::NoCalls { fetched }) => {
            log::info!(
                "✅ No external outbound calls today ({} records fetched), nothing written",
                fetched
            );
        }
        Err(e) => {
            log::error!("❌ {}", e);
            std::process::exit(1);
        }
    }
}
