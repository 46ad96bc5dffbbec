//! Per-caller aggregation of in-scope call records
//!
//! Rows come out sorted by grouping key (byte-wise on caller identity, then
//! department when it is part of the key).

use super::types::CallRecord;
use serde::Serialize;
use std::collections::BTreeMap;

pub const UNKNOWN_DEPARTMENT: &str = super::types::UNKNOWN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartmentMode {
    /// Group by caller only, no department column
    None,
    /// Group by caller; department column is the most frequent value in the group
    Derived,
    /// Department looked up per user and made part of the grouping key
    Joined,
}

impl DepartmentMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "none" => Some(DepartmentMode::None),
            "derived" => Some(DepartmentMode::Derived),
            "joined" => Some(DepartmentMode::Joined),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DepartmentMode::None => "none",
            DepartmentMode::Derived => "derived",
            DepartmentMode::Joined => "joined",
        }
    }

    pub fn enable_department_join(&self) -> bool {
        matches!(self, DepartmentMode::Joined)
    }

    pub fn has_department_column(&self) -> bool {
        !matches!(self, DepartmentMode::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRow {
    pub caller_identity: String,
    pub total_calls: u64,
    pub total_talk_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub rows: Vec<AggregateRow>,
    pub mode: DepartmentMode,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_calls(&self) -> u64 {
        self.rows.iter().map(|r| r.total_calls).sum()
    }

    pub fn total_talk_time(&self) -> u64 {
        self.rows.iter().map(|r| r.total_talk_time).sum()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        let mut columns = vec!["caller_identity", "total_calls", "total_talk_time"];
        if self.mode.has_department_column() {
            columns.push("department");
        }
        columns
    }
}

#[derive(Default)]
struct GroupTotals {
    total_calls: u64,
    total_talk_time: u64,
    /// Department tallies in first-seen order, for the derived mode
    department_counts: Vec<(String, u64)>,
}

impl GroupTotals {
    fn add(&mut self, record: &CallRecord, track_department: bool) {
        self.total_calls += 1;
        self.total_talk_time += record.talk_time();

        if !track_department {
            return;
        }

        // An empty string is a value and is counted; only a missing field is skipped
        let Some(department) = record.department.as_deref() else {
            return;
        };

        match self
            .department_counts
            .iter_mut()
            .find(|(name, _)| name == department)
        {
            Some((_, count)) => *count += 1,
            None => self.department_counts.push((department.to_string(), 1)),
        }
    }

    /// Most frequent department; ties go to the first one seen, empty if none present
    fn department_mode(&self) -> String {
        let mut best: Option<&(String, u64)> = None;
        for entry in &self.department_counts {
            if best.map_or(true, |(_, count)| entry.1 > *count) {
                best = Some(entry);
            }
        }
        best.map(|(name, _)| name.clone()).unwrap_or_default()
    }
}

pub struct Aggregator {
    mode: DepartmentMode,
}

impl Aggregator {
    pub fn new(mode: DepartmentMode) -> Self {
        Self { mode }
    }

    /// Group records and compute per-group totals
    ///
    /// Records are expected to be filtered already. Missing caller names group
    /// under "Unknown"; missing durations count as zero.
    pub fn aggregate(&self, records: &[CallRecord]) -> Report {
        let mut groups: BTreeMap<(String, Option<String>), GroupTotals> = BTreeMap::new();
        let track_department = self.mode == DepartmentMode::Derived;

        for record in records {
            let department_key = match self.mode {
                DepartmentMode::Joined => Some(
                    record
                        .department
                        .clone()
                        .filter(|d| !d.is_empty())
                        .unwrap_or_else(|| UNKNOWN_DEPARTMENT.to_string()),
                ),
                _ => None,
            };
            let key = (record.caller_identity().to_string(), department_key);

            groups
                .entry(key)
                .or_default()
                .add(record, track_department);
        }

        let rows = groups
            .into_iter()
            .map(|((caller_identity, department_key), totals)| {
                let department = match self.mode {
                    DepartmentMode::None => None,
                    DepartmentMode::Derived => Some(totals.department_mode()),
                    DepartmentMode::Joined => department_key,
                };
                AggregateRow {
                    caller_identity,
                    total_calls: totals.total_calls,
                    total_talk_time: totals.total_talk_time,
                    department,
                }
            })
            .collect();

        Report {
            rows,
            mode: self.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::call_log::types::Direction;

    fn call(id: &str, caller: Option<&str>, duration: Option<u64>, department: Option<&str>) -> CallRecord {
        CallRecord {
            id: id.to_string(),
            caller_name: caller.map(str::to_string),
            duration,
            direction: Direction::Outbound,
            scope: None,
            callee_number_source: None,
            user_id: None,
            department: department.map(str::to_string),
        }
    }

    #[test]
    fn test_totals_per_caller() {
        let records = vec![
            call("1", Some("Alice"), Some(60), None),
            call("2", Some("Bob"), Some(45), None),
            call("3", Some("Alice"), Some(30), None),
        ];

        let report = Aggregator::new(DepartmentMode::None).aggregate(&records);

        assert_eq!(
            report.rows,
            vec![
                AggregateRow {
                    caller_identity: "Alice".to_string(),
                    total_calls: 2,
                    total_talk_time: 90,
                    department: None,
                },
                AggregateRow {
                    caller_identity: "Bob".to_string(),
                    total_calls: 1,
                    total_talk_time: 45,
                    department: None,
                },
            ]
        );
        assert_eq!(report.total_calls(), records.len() as u64);
        assert_eq!(report.column_names(), vec!["caller_identity", "total_calls", "total_talk_time"]);
    }

    #[test]
    fn test_missing_caller_and_duration() {
        let records = vec![
            call("1", None, Some(20), None),
            call("2", Some(""), None, None),
            call("3", Some("Carol"), None, None),
        ];

        let report = Aggregator::new(DepartmentMode::None).aggregate(&records);

        let unknown = report
            .rows
            .iter()
            .find(|r| r.caller_identity == "Unknown")
            .unwrap();
        assert_eq!(unknown.total_calls, 2);
        assert_eq!(unknown.total_talk_time, 20);

        let carol = report.rows.iter().find(|r| r.caller_identity == "Carol").unwrap();
        assert_eq!(carol.total_talk_time, 0);
    }

    #[test]
    fn test_derived_department_mode_and_tie_break() {
        let records = vec![
            call("1", Some("Alice"), Some(1), Some("Support")),
            call("2", Some("Alice"), Some(1), Some("Sales")),
            call("3", Some("Alice"), Some(1), Some("Sales")),
            call("4", Some("Bob"), Some(1), Some("Ops")),
            call("5", Some("Bob"), Some(1), Some("Field")),
            call("6", Some("Dan"), Some(1), None),
        ];

        let report = Aggregator::new(DepartmentMode::Derived).aggregate(&records);
        let department_of = |name: &str| {
            report
                .rows
                .iter()
                .find(|r| r.caller_identity == name)
                .and_then(|r| r.department.clone())
        };

        assert_eq!(department_of("Alice").as_deref(), Some("Sales"));
        assert_eq!(department_of("Bob").as_deref(), Some("Ops"));
        assert_eq!(department_of("Dan").as_deref(), Some(""));
        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.column_names().last(), Some(&"department"));
    }

    #[test]
    fn test_derived_mode_counts_empty_department() {
        let records = vec![
            call("1", Some("Eve"), Some(1), Some("")),
            call("2", Some("Eve"), Some(1), Some("")),
            call("3", Some("Eve"), Some(1), Some("Sales")),
            call("4", Some("Eve"), Some(1), None),
            call("5", Some("Fay"), Some(1), Some("Sales")),
            call("6", Some("Fay"), Some(1), None),
            call("7", Some("Fay"), Some(1), None),
        ];

        let report = Aggregator::new(DepartmentMode::Derived).aggregate(&records);
        let departments: Vec<(&str, Option<&str>)> = report
            .rows
            .iter()
            .map(|r| (r.caller_identity.as_str(), r.department.as_deref()))
            .collect();

        assert_eq!(departments, vec![("Eve", Some("")), ("Fay", Some("Sales"))]);
    }

    #[test]
    fn test_joined_department_is_part_of_key() {
        let records = vec![
            call("1", Some("Alice"), Some(10), Some("Sales")),
            call("2", Some("Alice"), Some(20), Some("Support")),
            call("3", Some("Alice"), Some(5), None),
        ];

        let report = Aggregator::new(DepartmentMode::Joined).aggregate(&records);

        let keys: Vec<(&str, Option<&str>)> = report
            .rows
            .iter()
            .map(|r| (r.caller_identity.as_str(), r.department.as_deref()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Alice", Some("Sales")),
                ("Alice", Some("Support")),
                ("Alice", Some("Unknown")),
            ]
        );
        assert_eq!(report.total_talk_time(), 35);
    }

    #[test]
    fn test_aggregate_is_order_insensitive() {
        let mut records = vec![
            call("1", Some("Zed"), Some(3), None),
            call("2", Some("Amy"), Some(4), None),
            call("3", Some("Zed"), Some(5), None),
            call("4", None, Some(6), None),
        ];
        let aggregator = Aggregator::new(DepartmentMode::None);

        let first = aggregator.aggregate(&records);
        records.reverse();
        let second = aggregator.aggregate(&records);

        assert_eq!(first, second);
        assert_eq!(first.rows[0].caller_identity, "Amy");
    }

    #[test]
    fn test_empty_input() {
        let report = Aggregator::new(DepartmentMode::None).aggregate(&[]);
        assert!(report.is_empty());
        assert_eq!(report.total_calls(), 0);
    }
}
