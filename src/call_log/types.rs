//! Call record and page shapes as returned by the call-log list endpoint

use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Internal,
    External,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "WireCallRecord")]
pub struct CallRecord {
    pub id: String,
    pub caller_name: Option<String>,
    /// Seconds; absent counts as zero
    pub duration: Option<u64>,
    pub direction: Direction,
    pub scope: Option<Scope>,
    pub callee_number_source: Option<String>,
    pub user_id: Option<String>,
    pub department: Option<String>,
}

/// Provider JSON, where several fields have two spellings that may both appear
#[derive(Deserialize)]
struct WireCallRecord {
    #[serde(deserialize_with = "string_or_number")]
    id: String,
    #[serde(default)]
    caller_name: Option<String>,
    #[serde(default)]
    caller_identity: Option<String>,
    #[serde(default)]
    duration: Option<u64>,
    #[serde(default)]
    direction: Option<Direction>,
    #[serde(default)]
    scope: Option<Scope>,
    #[serde(default)]
    call_type: Option<Scope>,
    #[serde(default)]
    callee_number_source: Option<String>,
    #[serde(default)]
    caller_user_id: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    department: Option<String>,
}

impl From<WireCallRecord> for CallRecord {
    fn from(wire: WireCallRecord) -> Self {
        Self {
            id: wire.id,
            caller_name: wire.caller_name.or(wire.caller_identity),
            duration: wire.duration,
            direction: wire.direction.unwrap_or(Direction::Unknown),
            scope: wire.scope.or(wire.call_type),
            callee_number_source: wire.callee_number_source,
            user_id: wire.caller_user_id.or(wire.user_id),
            department: wire.department,
        }
    }
}

impl CallRecord {
    /// Caller display name, or the "Unknown" sentinel when absent or blank
    pub fn caller_identity(&self) -> &str {
        match self.caller_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => UNKNOWN,
        }
    }

    pub fn talk_time(&self) -> u64 {
        self.duration.unwrap_or(0)
    }

    /// Explicit scope if the record carries one, otherwise derived from the
    /// callee number source. `None` when the record says nothing either way.
    pub fn effective_scope(&self) -> Option<Scope> {
        match self.scope {
            Some(Scope::Internal) => return Some(Scope::Internal),
            Some(Scope::External) => return Some(Scope::External),
            _ => {}
        }

        self.callee_number_source
            .as_deref()
            .map(|source| match source.to_ascii_lowercase().as_str() {
                "internal" => Scope::Internal,
                "external" | "byop" | "pstn" => Scope::External,
                _ => Scope::Unknown,
            })
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Pagination metadata carried by one response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageMeta {
    Counts {
        total_records: Option<u64>,
        total_pages: Option<u64>,
    },
    /// No counts; the batch size is the only signal
    Implicit,
}

#[derive(Debug, Clone)]
pub struct Page {
    /// `None` when the records field is missing entirely
    pub records: Option<Vec<CallRecord>>,
    /// Entries in the response, including any that failed to decode
    pub batch_len: usize,
    pub skipped: usize,
    pub meta: PageMeta,
}

impl Page {
    /// Parse one list response
    ///
    /// A body that is not JSON, or a records field that is not a list, is an
    /// error. A single entry that does not decode is skipped and counted.
    pub fn from_json(body: &str, records_field: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(body)?;

        let (records, batch_len, skipped) = match value.get(records_field) {
            None | Some(Value::Null) => (None, 0, 0),
            Some(list) => {
                let entries = Vec::<Value>::deserialize(list)?;
                let batch_len = entries.len();
                let mut records = Vec::with_capacity(batch_len);
                let mut skipped = 0;

                for entry in entries {
                    match CallRecord::deserialize(&entry) {
                        Ok(record) => records.push(record),
                        Err(e) => {
                            skipped += 1;
                            log::warn!("⚠️  Skipping undecodable call record: {} ({})", e, entry);
                        }
                    }
                }

                (Some(records), batch_len, skipped)
            }
        };

        let total_records = value.get("total_records").and_then(Value::as_u64);
        let total_pages = value.get("total_pages").and_then(Value::as_u64);

        let meta = if total_records.is_some() || total_pages.is_some() {
            PageMeta::Counts {
                total_records,
                total_pages,
            }
        } else {
            PageMeta::Implicit
        };

        Ok(Self {
            records,
            batch_len,
            skipped,
            meta,
        })
    }

    pub fn len(&self) -> usize {
        self.records.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
