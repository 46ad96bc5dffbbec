//! Page-number pagination over the call-log list endpoint
//!
//! Requests are strictly sequential. Each request merges `page_number` and
//! `page_size` into the base query (date window, direction, call type).
//!
//! ## Termination
//!
//! 1. Records field missing or empty → stop.
//! 2. Explicit `total_records` / `total_pages` → stop once
//!    `page_number * page_size >= total_records` (or `page_number >= total_pages`).
//! 3. Otherwise → stop when the batch is shorter than `page_size`.
//!
//! Which of rules 2 and 3 applies is decided once per endpoint, either by
//! configuration or, under `TerminationPolicy::Auto`, by the first non-empty
//! page. It is not re-derived on later pages.

use super::auth::AccessToken;
use super::types::{CallRecord, Page, PageMeta};
use crate::error::FetchError;
use std::collections::HashSet;

/// Provider maximum for the call-log endpoint
pub const MAX_PAGE_SIZE: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Use explicit counts when the first page carries them, else short batch
    Auto,
    ExplicitCounts,
    ShortBatch,
}

impl TerminationPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "auto" => Some(TerminationPolicy::Auto),
            "counts" => Some(TerminationPolicy::ExplicitCounts),
            "short_batch" => Some(TerminationPolicy::ShortBatch),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationPolicy::Auto => "auto",
            TerminationPolicy::ExplicitCounts => "counts",
            TerminationPolicy::ShortBatch => "short_batch",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PaginatorConfig {
    pub endpoint: String,
    /// JSON field holding the record list
    pub records_field: String,
    pub page_size: u32,
    pub policy: TerminationPolicy,
}

impl PaginatorConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            records_field: "call_logs".to_string(),
            page_size: MAX_PAGE_SIZE,
            policy: TerminationPolicy::Auto,
        }
    }
}

/// Lazy, finite, single-use sequence of call-log pages
pub struct Paginator {
    client: reqwest::Client,
    config: PaginatorConfig,
    query_base: Vec<(String, String)>,
    token: AccessToken,
    page_number: u32,
    resolved_policy: Option<TerminationPolicy>,
    total_records: Option<u64>,
    total_pages: Option<u64>,
    requests_made: u32,
    done: bool,
}

impl Paginator {
    pub fn new(
        client: reqwest::Client,
        config: PaginatorConfig,
        query_base: Vec<(String, String)>,
        token: AccessToken,
    ) -> Self {
        let resolved_policy = match config.policy {
            TerminationPolicy::Auto => None,
            fixed => Some(fixed),
        };

        Self {
            client,
            config,
            query_base,
            token,
            page_number: 1,
            resolved_policy,
            total_records: None,
            total_pages: None,
            requests_made: 0,
            done: false,
        }
    }

    pub fn requests_made(&self) -> u32 {
        self.requests_made
    }

    /// Fetch the next page of records
    ///
    /// Returns `Ok(None)` once the collection is complete. A non-2xx response
    /// ends the sequence with `FetchError::Status`.
    pub async fn next_page(&mut self) -> Result<Option<Vec<CallRecord>>, FetchError> {
        if self.done {
            return Ok(None);
        }

        let page_number = self.page_number;
        let page_size = self.config.page_size;

        let response = self
            .client
            .get(&self.config.endpoint)
            .bearer_auth(self.token.bearer())
            .query(&self.query_base)
            .query(&[
                ("page_size", page_size.to_string()),
                ("page_number", page_number.to_string()),
            ])
            .send()
            .await?;
        self.requests_made += 1;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            self.done = true;
            return Err(FetchError::Status {
                status,
                body,
                page_number,
            });
        }

        let page = Page::from_json(&body, &self.config.records_field)?;

        let batch_len = page.batch_len;
        let records = match page.records {
            Some(records) if batch_len > 0 => records,
            _ => {
                log::debug!("Page {} returned no records, stopping", page_number);
                self.done = true;
                return Ok(None);
            }
        };

        if let PageMeta::Counts {
            total_records,
            total_pages,
        } = page.meta
        {
            self.total_records = total_records.or(self.total_records);
            self.total_pages = total_pages.or(self.total_pages);
        }

        let policy = *self.resolved_policy.get_or_insert_with(|| match page.meta {
            PageMeta::Counts { .. } => TerminationPolicy::ExplicitCounts,
            PageMeta::Implicit => TerminationPolicy::ShortBatch,
        });

        let finished = self.is_last_page(policy, page_number, batch_len);

        log::info!(
            "📄 Page {}: {} records ({} skipped){}",
            page_number,
            batch_len,
            page.skipped,
            if finished { " (last)" } else { "" }
        );

        if finished {
            self.done = true;
        } else {
            self.page_number += 1;
        }

        Ok(Some(records))
    }

    fn is_last_page(&self, policy: TerminationPolicy, page_number: u32, batch_len: usize) -> bool {
        let short_batch = batch_len < self.config.page_size as usize;

        match policy {
            TerminationPolicy::ExplicitCounts => {
                if let Some(total) = self.total_records {
                    page_number as u64 * self.config.page_size as u64 >= total
                } else if let Some(pages) = self.total_pages {
                    page_number as u64 >= pages
                } else {
                    // Counts expected but this endpoint never sent any
                    short_batch
                }
            }
            _ => short_batch,
        }
    }

    /// Drain every page into one list; consumes the paginator
    ///
    /// Duplicate ids across pages are kept, but counted and logged.
    pub async fn fetch_all(mut self) -> Result<Vec<CallRecord>, FetchError> {
        let mut all_records = Vec::new();

        while let Some(records) = self.next_page().await? {
            all_records.extend(records);
        }

        let mut seen = HashSet::with_capacity(all_records.len());
        let duplicates = all_records
            .iter()
            .filter(|r| !seen.insert(r.id.as_str()))
            .count();
        if duplicates > 0 {
            log::warn!(
                "⚠️  {} call ids appeared more than once across pages (kept as fetched)",
                duplicates
            );
        }

        log::info!(
            "Fetched {} call records in {} requests",
            all_records.len(),
            self.requests_made
        );

        Ok(all_records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn token() -> AccessToken {
        AccessToken {
            token: "tok".to_string(),
            issued_at: Utc::now(),
            expires_in: None,
        }
    }

    fn records(start: usize, count: usize) -> Vec<serde_json::Value> {
        (start..start + count)
            .map(|i| {
                json!({
                    "id": format!("call-{}", i),
                    "caller_name": "Alice",
                    "duration": 10,
                    "direction": "outbound"
                })
            })
            .collect()
    }

    async fn mount_page(server: &MockServer, page_number: u32, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/phone/call_logs"))
            .and(query_param("page_number", page_number.to_string()))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(1)
            .mount(server)
            .await;
    }

    fn paginator(server: &MockServer, policy: TerminationPolicy) -> Paginator {
        let mut config = PaginatorConfig::new(format!("{}/phone/call_logs", server.uri()));
        config.policy = policy;
        Paginator::new(
            reqwest::Client::new(),
            config,
            vec![("direction".to_string(), "outbound".to_string())],
            token(),
        )
    }

    #[tokio::test]
    async fn test_short_batch_stops_after_three_requests() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({ "call_logs": records(0, 300) })).await;
        mount_page(&server, 2, json!({ "call_logs": records(300, 300) })).await;
        mount_page(&server, 3, json!({ "call_logs": records(600, 120) })).await;

        let mut paginator = paginator(&server, TerminationPolicy::Auto);
        let mut all = Vec::new();
        while let Some(batch) = paginator.next_page().await.unwrap() {
            all.extend(batch);
        }

        assert_eq!(all.len(), 720);
        assert_eq!(paginator.requests_made(), 3);
        assert!(paginator.next_page().await.unwrap().is_none());
        assert_eq!(paginator.requests_made(), 3);
    }

    #[tokio::test]
    async fn test_total_records_stops_after_two_requests() {
        let server = MockServer::start().await;
        // Batch sizes deliberately disagree with the count
        mount_page(
            &server,
            1,
            json!({ "total_records": 450, "call_logs": records(0, 300) }),
        )
        .await;
        mount_page(
            &server,
            2,
            json!({ "total_records": 450, "call_logs": records(300, 300) }),
        )
        .await;

        let paginator = paginator(&server, TerminationPolicy::Auto);
        let all = paginator.fetch_all().await.unwrap();

        assert_eq!(all.len(), 600);
    }

    #[tokio::test]
    async fn test_total_pages_signal() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({ "total_pages": 1, "call_logs": records(0, 300) })).await;

        let all = paginator(&server, TerminationPolicy::ExplicitCounts)
            .fetch_all()
            .await
            .unwrap();
        assert_eq!(all.len(), 300);
    }

    #[tokio::test]
    async fn test_short_batch_policy_ignores_counts() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({ "total_records": 1, "call_logs": records(0, 300) })).await;
        mount_page(&server, 2, json!({ "total_records": 1, "call_logs": [] })).await;

        let all = paginator(&server, TerminationPolicy::ShortBatch)
            .fetch_all()
            .await
            .unwrap();
        assert_eq!(all.len(), 300);
    }

    #[tokio::test]
    async fn test_missing_records_field_is_empty_result() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({ "page_size": 300 })).await;

        let all = paginator(&server, TerminationPolicy::Auto)
            .fetch_all()
            .await
            .unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_not_deduplicated() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({ "call_logs": records(0, 300) })).await;
        mount_page(&server, 2, json!({ "call_logs": records(299, 2) })).await;

        let all = paginator(&server, TerminationPolicy::Auto)
            .fetch_all()
            .await
            .unwrap();
        assert_eq!(all.len(), 302);
        assert_eq!(all.iter().filter(|r| r.id == "call-299").count(), 2);
    }

    #[tokio::test]
    async fn test_non_success_aborts_fetch() {
        let server = MockServer::start().await;
        mount_page(&server, 1, json!({ "call_logs": records(0, 300) })).await;
        Mock::given(method("GET"))
            .and(query_param("page_number", "2"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let err = paginator(&server, TerminationPolicy::Auto)
            .fetch_all()
            .await
            .unwrap_err();

        match err {
            FetchError::Status {
                status,
                body,
                page_number,
            } => {
                assert_eq!(status.as_u16(), 429);
                assert_eq!(body, "rate limited");
                assert_eq!(page_number, 2);
            }
            other => panic!("expected Status error, got {:?}", other),
        }
    }

    #[test]
    fn test_policy_names() {
        assert_eq!(TerminationPolicy::from_str("counts"), Some(TerminationPolicy::ExplicitCounts));
        assert_eq!(TerminationPolicy::from_str("short_batch"), Some(TerminationPolicy::ShortBatch));
        assert_eq!(TerminationPolicy::from_str("nope"), None);
        assert_eq!(TerminationPolicy::Auto.as_str(), "auto");
    }

    #[tokio::test]
    async fn test_malformed_entry_does_not_abort_fetch() {
        let server = MockServer::start().await;
        let mut first = records(0, 299);
        first.push(json!({ "id": "bad", "direction": "outbound", "duration": "forever" }));
        mount_page(&server, 1, json!({ "call_logs": first })).await;
        mount_page(&server, 2, json!({ "call_logs": records(300, 10) })).await;

        let all = paginator(&server, TerminationPolicy::Auto)
            .fetch_all()
            .await
            .unwrap();

        // The skipped entry still counts toward a full first page
        assert_eq!(all.len(), 309);
    }

    #[tokio::test]
    async fn test_large_total_pages_keeps_paging() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            json!({ "total_pages": 4_294_967_297u64, "call_logs": records(0, 300) }),
        )
        .await;
        mount_page(&server, 2, json!({ "call_logs": [] })).await;

        let all = paginator(&server, TerminationPolicy::ExplicitCounts)
            .fetch_all()
            .await
            .unwrap();
        assert_eq!(all.len(), 300);
    }
}
