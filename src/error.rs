//! Error types for the call-log report pipeline
//!
//! Fatal kinds (`AuthError`, `FetchError`, `ReportError`, `ConfigError`) abort the
//! run before anything is written. `EnrichmentError` never leaves the enrichment
//! step; it is logged and replaced with the "Unknown" sentinel.

use reqwest::StatusCode;

#[derive(Debug)]
pub enum AuthError {
    /// Identity endpoint answered with a non-2xx status
    Rejected { status: StatusCode, body: String },
    /// 2xx response without an `access_token` field
    MissingToken,
    Transport(reqwest::Error),
    InvalidCredentials(String),
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::Transport(err)
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Rejected { status, body } => {
                write!(f, "Token request rejected ({}): {}", status, body)
            }
            AuthError::MissingToken => write!(f, "Token response did not contain access_token"),
            AuthError::Transport(e) => write!(f, "Token request failed: {}", e),
            AuthError::InvalidCredentials(msg) => write!(f, "Invalid credentials: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

#[derive(Debug)]
pub enum FetchError {
    Status {
        status: StatusCode,
        body: String,
        page_number: u32,
    },
    Transport(reqwest::Error),
    Decode(serde_json::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Transport(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status {
                status,
                body,
                page_number,
            } => write!(
                f,
                "Call log request for page {} failed ({}): {}",
                page_number, status, body
            ),
            FetchError::Transport(e) => write!(f, "Call log request failed: {}", e),
            FetchError::Decode(e) => write!(f, "Call log response could not be decoded: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug)]
pub enum EnrichmentError {
    Status { status: StatusCode, body: String },
    Transport(reqwest::Error),
    /// Users endpoint cannot carry a path segment
    InvalidUrl(String),
    MissingDepartment,
}

impl From<reqwest::Error> for EnrichmentError {
    fn from(err: reqwest::Error) -> Self {
        EnrichmentError::Transport(err)
    }
}

impl std::fmt::Display for EnrichmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrichmentError::Status { status, body } => {
                write!(f, "User lookup failed ({}): {}", status, body)
            }
            EnrichmentError::Transport(e) => write!(f, "User lookup request failed: {}", e),
            EnrichmentError::InvalidUrl(url) => write!(f, "Invalid users endpoint: {}", url),
            EnrichmentError::MissingDepartment => write!(f, "User record has no department"),
        }
    }
}

impl std::error::Error for EnrichmentError {}

#[derive(Debug)]
pub enum ReportError {
    Io(std::io::Error),
    Csv(csv::Error),
    EmptyReport,
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err)
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err)
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportError::Io(e) => write!(f, "IO error: {}", e),
            ReportError::Csv(e) => write!(f, "CSV error: {}", e),
            ReportError::EmptyReport => write!(f, "Refusing to write a report with no rows"),
        }
    }
}

impl std::error::Error for ReportError {}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Any error that aborts a run
#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigError),
    Auth(AuthError),
    Fetch(FetchError),
    Report(ReportError),
    Client(reqwest::Error),
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err)
    }
}

impl From<AuthError> for PipelineError {
    fn from(err: AuthError) -> Self {
        PipelineError::Auth(err)
    }
}

impl From<FetchError> for PipelineError {
    fn from(err: FetchError) -> Self {
        PipelineError::Fetch(err)
    }
}

impl From<ReportError> for PipelineError {
    fn from(err: ReportError) -> Self {
        PipelineError::Report(err)
    }
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Config(e) => write!(f, "{}", e),
            PipelineError::Auth(e) => write!(f, "Authentication failed: {}", e),
            PipelineError::Fetch(e) => write!(f, "Fetch failed: {}", e),
            PipelineError::Report(e) => write!(f, "Report write failed: {}", e),
            PipelineError::Client(e) => write!(f, "HTTP client setup failed: {}", e),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::Config(e) => Some(e),
            PipelineError::Auth(e) => Some(e),
            PipelineError::Fetch(e) => Some(e),
            PipelineError::Report(e) => Some(e),
            PipelineError::Client(e) => Some(e),
        }
    }
}
