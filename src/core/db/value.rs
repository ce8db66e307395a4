//! SQL value, row and parameter types.
//!
//! Results and bind parameters are carried as [`SqlValue`], a tagged enum
//! mirroring the five SQLite storage classes. Decoding from the driver keeps
//! the stored class instead of forcing columns through a single text
//! representation, so callers can tell `NULL` from the string "NULL" and an
//! integer from its decimal rendering.

use std::fmt;

use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::ToSql;
use serde::Serialize;

/// A single SQL value in one of the five SQLite storage classes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view of the value. Integers widen to `f64` because SQLite's
    /// numeric affinity may store a whole-number REAL as an integer.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Real(r) => Some(*r),
            SqlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Integer(i) => write!(f, "{}", i),
            SqlValue::Real(r) => write!(f, "{}", r),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::Blob(b) => write!(f, "<BLOB: {} bytes>", b.len()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            SqlValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlValue::Real(r) => ToSqlOutput::Borrowed(ValueRef::Real(*r)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b.as_slice())),
        })
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(r) => SqlValue::Real(r),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Integer(i64::from(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Blob(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => SqlValue::Null,
        }
    }
}

/// One decoded result row: column names paired with their values, in
/// statement order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Row { columns }
    }

    /// Looks up a column by name. Returns `None` for unknown columns;
    /// a `NULL` column is `Some(&SqlValue::Null)`.
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| value)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(SqlValue::as_str)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(SqlValue::as_i64)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Named bind parameters for one statement execution.
///
/// Names are stored without the `:` placeholder prefix. `set` has map
/// semantics: assigning a name twice keeps the latest value, so a `Params`
/// never carries two entries for the same placeholder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, SqlValue)>,
}

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    /// Adds or replaces a parameter, returning `self` for chaining.
    pub fn set(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn entries(&self) -> &[(String, SqlValue)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display_matches_storage_class() {
        assert_eq!(SqlValue::Null.to_string(), "NULL");
        assert_eq!(SqlValue::Integer(42).to_string(), "42");
        assert_eq!(SqlValue::Real(1.5).to_string(), "1.5");
        assert_eq!(SqlValue::Text("hello".to_string()).to_string(), "hello");
        assert_eq!(
            SqlValue::Blob(vec![0, 1, 2]).to_string(),
            "<BLOB: 3 bytes>"
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(SqlValue::from(7), SqlValue::Integer(7));
        assert_eq!(SqlValue::from(7i64), SqlValue::Integer(7));
        assert_eq!(SqlValue::from(true), SqlValue::Integer(1));
        assert_eq!(SqlValue::from(false), SqlValue::Integer(0));
        assert_eq!(SqlValue::from("abc"), SqlValue::Text("abc".to_string()));
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(
            SqlValue::from(Some("x".to_string())),
            SqlValue::Text("x".to_string())
        );
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(SqlValue::Integer(3).as_i64(), Some(3));
        assert_eq!(SqlValue::Text("3".to_string()).as_i64(), None);
        assert_eq!(SqlValue::Integer(3).as_f64(), Some(3.0));
        assert_eq!(SqlValue::Real(2.5).as_f64(), Some(2.5));
        assert_eq!(SqlValue::Text("t".to_string()).as_str(), Some("t"));
        assert!(SqlValue::Null.is_null());
        assert!(!SqlValue::Integer(0).is_null());
    }

    #[test]
    fn test_row_lookup_distinguishes_null_from_missing() {
        let row = Row::new(vec![
            ("id".to_string(), SqlValue::Integer(1)),
            ("image".to_string(), SqlValue::Null),
        ]);

        assert_eq!(row.get("id"), Some(&SqlValue::Integer(1)));
        assert_eq!(row.get("image"), Some(&SqlValue::Null));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.get_i64("id"), Some(1));
        assert_eq!(row.get_str("image"), None);
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_params_have_map_semantics() {
        let params = Params::new()
            .set("title", "first")
            .set("status", 1)
            .set("title", "second");

        assert_eq!(params.len(), 2);
        assert_eq!(
            params.get("title"),
            Some(&SqlValue::Text("second".to_string()))
        );
        assert_eq!(params.get("status"), Some(&SqlValue::Integer(1)));
        assert_eq!(params.get("absent"), None);

        // insertion order of first assignment is preserved
        let names: Vec<&str> = params.entries().iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["title", "status"]);
    }
}
