//! Call Log - Retrieval and Aggregation
//!
//! Pulls one day of call records from the telephony API and reduces them to
//! per-caller totals.
//!
//! # Architecture
//!
//! ```text
//! Credentials → TokenProvider (OAuth2 grant) → AccessToken
//!     ↓
//! Paginator (page_number / page_size, bearer auth)
//!     ↓
//! RecordFilter (outbound + external)
//!     ↓
//! enrich_departments (optional, one lookup per user id)
//!     ↓
//! Aggregator (group by caller [, department]) → Report
//! ```

pub mod aggregator;
pub mod auth;
pub mod filter;
pub mod paginator;
pub mod types;

pub use aggregator::{AggregateRow, Aggregator, DepartmentMode, Report};
pub use auth::{AccessToken, CredentialKind, Credentials, TokenProvider};
pub use filter::{enrich_departments, DepartmentLookup, RecordFilter, UserApiLookup};
pub use paginator::{Paginator, PaginatorConfig, TerminationPolicy, MAX_PAGE_SIZE};
pub use types::{CallRecord, Direction, Page, PageMeta, Scope, UNKNOWN};
