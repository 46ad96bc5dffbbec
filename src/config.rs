//! Report job configuration from environment variables

use crate::call_log::{Credentials, DepartmentMode, TerminationPolicy, MAX_PAGE_SIZE};
use crate::error::ConfigError;
use crate::report::OutputPolicy;
use chrono::{NaiveDate, Utc};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TOKEN_URL: &str = "https://zoom.us/oauth/token";
pub const DEFAULT_API_BASE: &str = "https://api.zoom.us/v2";
pub const DEFAULT_FIXED_NAME: &str = "external_outbound_calls.csv";

/// Configuration for one report run
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub credentials: Credentials,
    pub token_url: String,
    pub api_base: String,
    pub page_size: u32,
    /// Send `direction=outbound&call_type=external` with the list query
    pub server_side_filter: bool,
    pub pagination_policy: TerminationPolicy,
    pub department_mode: DepartmentMode,
    pub enrichment_concurrency: usize,
    pub output_dir: PathBuf,
    pub output_policy: OutputPolicy,
    pub report_date: NaiveDate,
    pub http_timeout: Duration,
}

impl ReportConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `ZOOM_ACCESS_TOKEN` - pre-issued bearer token (skips the OAuth exchange)
    /// - `ZOOM_CLIENT_ID` / `ZOOM_CLIENT_SECRET` - required without a token
    /// - `ZOOM_ACCOUNT_ID` - selects the account-credentials grant
    /// - `ZOOM_TOKEN_URL` (default: https://zoom.us/oauth/token)
    /// - `ZOOM_API_BASE` (default: https://api.zoom.us/v2)
    /// - `CALL_LOG_PAGE_SIZE` (default: 300)
    /// - `CALL_LOG_SERVER_FILTER` (default: true)
    /// - `PAGINATION_POLICY` - auto | counts | short_batch (default: auto)
    /// - `DEPARTMENT_MODE` - none | derived | joined (default: none)
    /// - `ENRICHMENT_CONCURRENCY` (default: 4)
    /// - `REPORT_OUTPUT_DIR` (default: data)
    /// - `REPORT_FILE_POLICY` - dated | fixed (default: dated)
    /// - `REPORT_FIXED_NAME` (default: external_outbound_calls.csv)
    /// - `REPORT_DATE` - YYYY-MM-DD (default: today, UTC)
    /// - `HTTP_TIMEOUT_SECS` (default: 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credentials = match var("ZOOM_ACCESS_TOKEN") {
            Some(access_token) => Credentials::PreIssued { access_token },
            None => {
                let client_id = var("ZOOM_CLIENT_ID")
                    .ok_or_else(|| ConfigError::MissingVariable("ZOOM_CLIENT_ID".to_string()))?;
                let client_secret = var("ZOOM_CLIENT_SECRET")
                    .ok_or_else(|| ConfigError::MissingVariable("ZOOM_CLIENT_SECRET".to_string()))?;

                match var("ZOOM_ACCOUNT_ID") {
                    Some(account_id) => Credentials::AccountCredentials {
                        client_id,
                        client_secret,
                        account_id,
                    },
                    None => Credentials::ClientCredentials {
                        client_id,
                        client_secret,
                    },
                }
            }
        };

        let token_url = var("ZOOM_TOKEN_URL").unwrap_or_else(|| DEFAULT_TOKEN_URL.to_string());
        let api_base = var("ZOOM_API_BASE")
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string())
            .trim_end_matches('/')
            .to_string();

        for (name, url) in [("ZOOM_TOKEN_URL", &token_url), ("ZOOM_API_BASE", &api_base)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "{} must start with http:// or https://",
                    name
                )));
            }
        }

        let page_size: u32 = parse_or(&var, "CALL_LOG_PAGE_SIZE", MAX_PAGE_SIZE)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ConfigError::InvalidValue(format!(
                "CALL_LOG_PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        let server_side_filter = parse_or(&var, "CALL_LOG_SERVER_FILTER", true)?;

        let pagination_policy = match var("PAGINATION_POLICY") {
            Some(s) => TerminationPolicy::from_str(&s.to_lowercase()).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "PAGINATION_POLICY must be auto, counts or short_batch, got '{}'",
                    s
                ))
            })?,
            None => TerminationPolicy::Auto,
        };

        let department_mode = match var("DEPARTMENT_MODE") {
            Some(s) => DepartmentMode::from_str(&s.to_lowercase()).ok_or_else(|| {
                ConfigError::InvalidValue(format!(
                    "DEPARTMENT_MODE must be none, derived or joined, got '{}'",
                    s
                ))
            })?,
            None => DepartmentMode::None,
        };

        let enrichment_concurrency: usize = parse_or(&var, "ENRICHMENT_CONCURRENCY", 4)?;
        if enrichment_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "ENRICHMENT_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let output_dir: PathBuf = var("REPORT_OUTPUT_DIR")
            .unwrap_or_else(|| "data".to_string())
            .into();

        let output_policy = match var("REPORT_FILE_POLICY").map(|s| s.to_lowercase()).as_deref() {
            None | Some("dated") => OutputPolicy::dated(),
            Some("fixed") => OutputPolicy::fixed(
                var("REPORT_FIXED_NAME").unwrap_or_else(|| DEFAULT_FIXED_NAME.to_string()),
            ),
            Some(other) => {
                return Err(ConfigError::InvalidValue(format!(
                    "REPORT_FILE_POLICY must be dated or fixed, got '{}'",
                    other
                )))
            }
        };

        let report_date = match var("REPORT_DATE") {
            Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d").map_err(|_| {
                ConfigError::InvalidValue(format!("REPORT_DATE must be YYYY-MM-DD, got '{}'", s))
            })?,
            None => Utc::now().date_naive(),
        };

        let http_timeout = Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECS", 30)?);

        Ok(Self {
            credentials,
            token_url,
            api_base,
            page_size,
            server_side_filter,
            pagination_policy,
            department_mode,
            enrichment_concurrency,
            output_dir,
            output_policy,
            report_date,
            http_timeout,
        })
    }

    pub fn call_logs_endpoint(&self) -> String {
        format!("{}/phone/call_logs", self.api_base)
    }

    pub fn users_endpoint(&self) -> String {
        format!("{}/users", self.api_base)
    }

    /// Date window and call filters sent with every list request
    pub fn query_base(&self) -> Vec<(String, String)> {
        let day = self.report_date.format("%Y-%m-%d");
        let mut query = vec![
            ("from".to_string(), format!("{}T00:00:00Z", day)),
            ("to".to_string(), format!("{}T23:59:59Z", day)),
        ];

        if self.server_side_filter {
            query.push(("direction".to_string(), "outbound".to_string()));
            query.push(("call_type".to_string(), "external".to_string()));
        }

        query
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw.to_lowercase().parse().map_err(|_| {
            ConfigError::InvalidValue(format!("{} has an invalid value '{}'", key, raw))
        }),
        None => Ok(default),
    }
}
