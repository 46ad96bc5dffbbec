//! OAuth2 token acquisition for the telephony API
//!
//! Two grant shapes are supported, both Basic-authenticated with the client
//! id/secret:
//!
//! - `client_credentials`: `POST {token_url}?grant_type=client_credentials`
//! - `account_credentials`: `POST {token_url}?grant_type=account_credentials&account_id=...`
//!
//! A pre-issued bearer token skips the exchange entirely. There is no retry and
//! no refresh: one token per run.

use crate::error::AuthError;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    ClientCredentials,
    AccountCredentials,
    PreIssued,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::ClientCredentials => "client_credentials",
            CredentialKind::AccountCredentials => "account_credentials",
            CredentialKind::PreIssued => "pre_issued",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ClientCredentials {
        client_id: String,
        client_secret: String,
    },
    AccountCredentials {
        client_id: String,
        client_secret: String,
        account_id: String,
    },
    PreIssued {
        access_token: String,
    },
}

impl Credentials {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Credentials::ClientCredentials { .. } => CredentialKind::ClientCredentials,
            Credentials::AccountCredentials { .. } => CredentialKind::AccountCredentials,
            Credentials::PreIssued { .. } => CredentialKind::PreIssued,
        }
    }
}

// Secrets stay out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Credentials::AccountCredentials {
                client_id,
                account_id,
                ..
            } => f
                .debug_struct("AccountCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .field("account_id", account_id)
                .finish(),
            Credentials::PreIssued { .. } => f
                .debug_struct("PreIssued")
                .field("access_token", &"<redacted>")
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    /// Lifetime in seconds as reported by the identity endpoint
    pub expires_in: Option<u64>,
}

impl AccessToken {
    pub fn bearer(&self) -> &str {
        &self.token
    }

    /// Informational only; the token is never refreshed within a run
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_in {
            Some(secs) => (now - self.issued_at).num_seconds() >= secs as i64,
            None => false,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

pub struct TokenProvider {
    client: reqwest::Client,
    token_url: String,
}

impl TokenProvider {
    pub fn new(client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            client,
            token_url: token_url.into(),
        }
    }

    /// Exchange credentials for a bearer token
    ///
    /// # Returns
    /// * `Ok(AccessToken)` - token issued (or passed through when pre-issued)
    /// * `Err(AuthError::Rejected)` - non-2xx status, body kept verbatim
    /// * `Err(AuthError::MissingToken)` - 2xx without an `access_token` field
    pub async fn acquire(&self, credentials: &Credentials) -> Result<AccessToken, AuthError> {
        let request = match credentials {
            Credentials::PreIssued { access_token } => {
                if access_token.trim().is_empty() {
                    return Err(AuthError::InvalidCredentials(
                        "pre-issued access token is empty".to_string(),
                    ));
                }
                log::info!("🔑 Using pre-issued access token");
                return Ok(AccessToken {
                    token: access_token.clone(),
                    issued_at: Utc::now(),
                    expires_in: None,
                });
            }
            Credentials::ClientCredentials {
                client_id,
                client_secret,
            } => self
                .client
                .post(&self.token_url)
                .query(&[("grant_type", "client_credentials")])
                .basic_auth(client_id, Some(client_secret)),
            Credentials::AccountCredentials {
                client_id,
                client_secret,
                account_id,
            } => self
                .client
                .post(&self.token_url)
                .query(&[
                    ("grant_type", "account_credentials"),
                    ("account_id", account_id.as_str()),
                ])
                .basic_auth(client_id, Some(client_secret)),
        };

        log::info!(
            "🔑 Requesting access token ({} grant)",
            credentials.kind().as_str()
        );

        let issued_at = Utc::now();
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected { status, body });
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            log::debug!("Token response was not the expected JSON: {}", e);
            AuthError::MissingToken
        })?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        log::info!("✅ Access token acquired");

        Ok(AccessToken {
            token,
            issued_at,
            expires_in: body.expires_in,
        })
    }
}
