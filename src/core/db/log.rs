//! Append-only query log.
//!
//! Every statement routed through the executor leaves exactly one
//! [`QueryLogEntry`] behind, success or failure. Entries record the statement
//! text, the bound parameters, when the statement ran, how long it took and
//! how it ended, and are never mutated once appended. The log lives on the
//! connection handle, so its lifetime matches the connection's.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::core::db::value::{Params, SqlValue};
use crate::core::Result;

/// One executed statement and its outcome.
///
/// Exactly one of `row_count` and `error` is populated: `row_count` carries
/// the returned-row or affected-row count of a successful execution, `error`
/// carries the failure message otherwise.
#[derive(Debug, Clone, Serialize)]
pub struct QueryLogEntry {
    pub statement: String,
    #[serde(serialize_with = "serialize_params")]
    pub params: Vec<(String, SqlValue)>,
    pub recorded_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_elapsed_ms")]
    pub elapsed: Duration,
    pub row_count: Option<usize>,
    pub error: Option<String>,
}

impl QueryLogEntry {
    pub(crate) fn success(
        statement: &str,
        params: &Params,
        elapsed: Duration,
        row_count: usize,
    ) -> Self {
        QueryLogEntry {
            statement: statement.to_string(),
            params: params.entries().to_vec(),
            recorded_at: Utc::now(),
            elapsed,
            row_count: Some(row_count),
            error: None,
        }
    }

    pub(crate) fn failure(statement: &str, params: &Params, elapsed: Duration, error: &str) -> Self {
        QueryLogEntry {
            statement: statement.to_string(),
            params: params.entries().to_vec(),
            recorded_at: Utc::now(),
            elapsed,
            row_count: None,
            error: Some(error.to_string()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

impl fmt::Display for QueryLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statement)?;
        if !self.params.is_empty() {
            let rendered: Vec<String> = self
                .params
                .iter()
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            write!(f, " [{}]", rendered.join(", "))?;
        }
        write!(f, " -- {:.3}ms", self.elapsed_ms())?;
        match (&self.error, self.row_count) {
            (Some(error), _) => write!(f, ", failed: {}", error),
            (None, Some(count)) => write!(f, ", {} row(s)", count),
            (None, None) => Ok(()),
        }
    }
}

fn serialize_params<S>(params: &[(String, SqlValue)], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_map(params.iter().map(|(name, value)| (name, value)))
}

fn serialize_elapsed_ms<S>(elapsed: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(elapsed.as_secs_f64() * 1000.0)
}

/// In-memory, append-only record of every statement run on a connection.
#[derive(Debug, Default)]
pub struct QueryLog {
    entries: Vec<QueryLogEntry>,
}

impl QueryLog {
    pub(crate) fn new() -> Self {
        QueryLog::default()
    }

    pub(crate) fn record(&mut self, entry: QueryLogEntry) {
        self.entries.push(entry);
    }

    /// All entries in execution order.
    pub fn entries(&self) -> &[QueryLogEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&QueryLogEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the whole log as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_params() -> Params {
        Params::new().set("title", "T").set("status", 1)
    }

    #[test]
    fn test_log_preserves_insertion_order() {
        let mut log = QueryLog::new();
        log.record(QueryLogEntry::success(
            "SELECT 1",
            &Params::new(),
            Duration::from_millis(1),
            1,
        ));
        log.record(QueryLogEntry::failure(
            "SELECT nope",
            &Params::new(),
            Duration::from_millis(2),
            "no such column: nope",
        ));
        log.record(QueryLogEntry::success(
            "SELECT 2",
            &Params::new(),
            Duration::from_millis(3),
            1,
        ));

        let statements: Vec<&str> = log
            .entries()
            .iter()
            .map(|entry| entry.statement.as_str())
            .collect();
        assert_eq!(statements, vec!["SELECT 1", "SELECT nope", "SELECT 2"]);
        assert_eq!(log.len(), 3);
        assert_eq!(log.last().unwrap().statement, "SELECT 2");
    }

    #[test]
    fn test_entry_outcome_invariants() {
        let ok = QueryLogEntry::success("SELECT 1", &sample_params(), Duration::ZERO, 1);
        assert!(ok.succeeded());
        assert_eq!(ok.row_count, Some(1));
        assert_eq!(ok.error, None);

        let failed = QueryLogEntry::failure(
            "SELECT * FROM missing",
            &Params::new(),
            Duration::ZERO,
            "no such table: missing",
        );
        assert!(!failed.succeeded());
        assert_eq!(failed.row_count, None);
        assert_eq!(failed.error.as_deref(), Some("no such table: missing"));
    }

    #[test]
    fn test_entry_display() {
        let ok = QueryLogEntry::success(
            "INSERT INTO tbl_posts (title) VALUES (:title)",
            &sample_params(),
            Duration::from_micros(1500),
            1,
        );
        let rendered = ok.to_string();
        assert!(rendered.contains("INSERT INTO tbl_posts"));
        assert!(rendered.contains("title=T"));
        assert!(rendered.contains("status=1"));
        assert!(rendered.contains("1 row(s)"));

        let failed = QueryLogEntry::failure(
            "SELECT * FROM missing",
            &Params::new(),
            Duration::ZERO,
            "no such table: missing",
        );
        let rendered = failed.to_string();
        assert!(rendered.contains("failed: no such table: missing"));
        assert!(!rendered.contains("row(s)"));
    }

    #[test]
    fn test_log_serializes_to_json() {
        let mut log = QueryLog::new();
        log.record(QueryLogEntry::success(
            "SELECT 1",
            &sample_params(),
            Duration::from_millis(2),
            1,
        ));

        let json = log.to_json().unwrap();
        assert!(json.contains("\"statement\": \"SELECT 1\""));
        assert!(json.contains("\"title\": \"T\""));
        assert!(json.contains("\"status\": 1"));
        assert!(json.contains("\"elapsed_ms\""));
        assert!(json.contains("\"recorded_at\""));
    }
}
