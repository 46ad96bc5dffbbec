//! Scope filtering and optional department enrichment

use super::auth::AccessToken;
use super::types::{CallRecord, Direction, Scope, UNKNOWN};
use crate::error::EnrichmentError;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Keeps external outbound calls only
#[derive(Debug, Clone, Copy)]
pub struct RecordFilter {
    /// `call_type=external` was already sent in the list query
    server_side_scope: bool,
}

impl RecordFilter {
    pub fn new(server_side_scope: bool) -> Self {
        Self { server_side_scope }
    }

    /// Direction is always checked. Scope is read from the record when it
    /// carries one; otherwise the server-side filter is trusted if it was applied.
    pub fn is_in_scope(&self, record: &CallRecord) -> bool {
        if record.direction != Direction::Outbound {
            return false;
        }

        match record.effective_scope() {
            Some(Scope::External) => true,
            Some(Scope::Internal) => false,
            Some(Scope::Unknown) | None => self.server_side_scope,
        }
    }

    pub fn retain_in_scope(&self, records: Vec<CallRecord>) -> Vec<CallRecord> {
        let before = records.len();
        let kept: Vec<CallRecord> = records
            .into_iter()
            .filter(|r| self.is_in_scope(r))
            .collect();

        log::info!(
            "🔎 {} of {} records are external outbound calls",
            kept.len(),
            before
        );
        kept
    }
}

/// Source of per-user department names
#[async_trait]
pub trait DepartmentLookup: Send + Sync {
    async fn department(&self, user_id: &str) -> Result<String, EnrichmentError>;
}

/// Department lookup against `GET {users_endpoint}/{user_id}`
pub struct UserApiLookup {
    client: reqwest::Client,
    users_endpoint: String,
    token: AccessToken,
}

impl UserApiLookup {
    pub fn new(client: reqwest::Client, users_endpoint: impl Into<String>, token: AccessToken) -> Self {
        Self {
            client,
            users_endpoint: users_endpoint.into(),
            token,
        }
    }
}

#[async_trait]
impl DepartmentLookup for UserApiLookup {
    async fn department(&self, user_id: &str) -> Result<String, EnrichmentError> {
        let mut url = reqwest::Url::parse(&self.users_endpoint)
            .map_err(|e| EnrichmentError::InvalidUrl(format!("{}: {}", self.users_endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| EnrichmentError::InvalidUrl(self.users_endpoint.clone()))?
            .pop_if_empty()
            .push(user_id);

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.bearer())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status { status, body });
        }

        let user: Value = response.json().await?;

        // Provider calls it `dept`; accept `department` too
        user.get("dept")
            .or_else(|| user.get("department"))
            .and_then(Value::as_str)
            .filter(|d| !d.trim().is_empty())
            .map(str::to_string)
            .ok_or(EnrichmentError::MissingDepartment)
    }
}

/// Fill `department` on every record from one lookup per distinct user id
///
/// Lookups run with at most `concurrency` in flight. A failed lookup, or a
/// record without a user id, gets the "Unknown" sentinel.
pub async fn enrich_departments<L>(
    lookup: &L,
    records: Vec<CallRecord>,
    concurrency: usize,
) -> Vec<CallRecord>
where
    L: DepartmentLookup + ?Sized,
{
    let mut seen = HashSet::new();
    let user_ids: Vec<String> = records
        .iter()
        .filter_map(|r| r.user_id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    log::info!(
        "🏢 Looking up departments for {} users (concurrency {})",
        user_ids.len(),
        concurrency
    );

    let departments: HashMap<String, String> = stream::iter(user_ids)
        .map(|user_id| async move {
            let department = match lookup.department(&user_id).await {
                Ok(department) => department,
                Err(e) => {
                    log::warn!("⚠️  Department lookup for user {} failed: {}", user_id, e);
                    UNKNOWN.to_string()
                }
            };
            (user_id, department)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    records
        .into_iter()
        .map(|mut record| {
            let department = record
                .user_id
                .as_ref()
                .and_then(|id| departments.get(id))
                .cloned()
                .unwrap_or_else(|| UNKNOWN.to_string());
            record.department = Some(department);
            record
        })
        .collect()
}
