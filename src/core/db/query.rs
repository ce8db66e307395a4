//! Statement execution.
//!
//! This module provides the single execution path for SQL statements. Every
//! statement is prepared, its named parameters are bound and cross-checked
//! against the placeholders the statement actually declares, and the outcome
//! is recorded in the connection's query log before it is returned. Values
//! travel as data through the driver's bind API, never by string
//! interpolation into the statement text.

use std::time::Instant;

use rusqlite::Connection;
use tracing::{debug, error};

use crate::core::db::log::{QueryLog, QueryLogEntry};
use crate::core::db::value::{Params, Row, SqlValue};
use crate::core::{MiniblogError, Result};

/// Statement classes recognized by the executor, from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT statement
    Select,
    /// INSERT statement
    Insert,
    /// UPDATE statement
    Update,
    /// DELETE statement
    Delete,
    /// CREATE/DROP/ALTER statement
    Ddl,
    /// BEGIN/COMMIT/ROLLBACK/SAVEPOINT statement
    Transaction,
    /// Other statement types
    Other,
}

impl StatementKind {
    /// Determines the statement kind from a SQL string.
    pub fn classify(sql: &str) -> Self {
        let sql_upper = sql.trim().to_uppercase();

        if sql_upper.starts_with("SELECT") {
            StatementKind::Select
        } else if sql_upper.starts_with("INSERT") {
            StatementKind::Insert
        } else if sql_upper.starts_with("UPDATE") {
            StatementKind::Update
        } else if sql_upper.starts_with("DELETE") {
            StatementKind::Delete
        } else if sql_upper.starts_with("CREATE")
            || sql_upper.starts_with("DROP")
            || sql_upper.starts_with("ALTER")
        {
            StatementKind::Ddl
        } else if sql_upper.starts_with("BEGIN")
            || sql_upper.starts_with("COMMIT")
            || sql_upper.starts_with("END")
            || sql_upper.starts_with("ROLLBACK")
            || sql_upper.starts_with("SAVEPOINT")
            || sql_upper.starts_with("RELEASE")
        {
            StatementKind::Transaction
        } else {
            StatementKind::Other
        }
    }

    /// Whether statements of this kind produce a result set.
    pub fn returns_rows(self) -> bool {
        matches!(self, StatementKind::Select)
    }
}

/// Outcome of one executed statement.
///
/// Row-returning statements populate the result set; mutating statements
/// populate the affected-row count, and INSERTs additionally carry the
/// generated key. The two shapes never mix.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementResult {
    rows: Option<Vec<Row>>,
    affected_rows: usize,
    last_insert_id: Option<i64>,
}

impl StatementResult {
    fn from_rows(rows: Vec<Row>) -> Self {
        StatementResult {
            rows: Some(rows),
            affected_rows: 0,
            last_insert_id: None,
        }
    }

    fn from_affected(affected_rows: usize) -> Self {
        StatementResult {
            rows: None,
            affected_rows,
            last_insert_id: None,
        }
    }

    fn from_insert(affected_rows: usize, last_insert_id: i64) -> Self {
        StatementResult {
            rows: None,
            affected_rows,
            last_insert_id: Some(last_insert_id),
        }
    }

    /// First row of the result set, if the statement returned any.
    pub fn single_row(&self) -> Option<&Row> {
        self.rows.as_ref().and_then(|rows| rows.first())
    }

    /// Full result set for row-returning statements, `None` for mutating ones.
    pub fn row_set(&self) -> Option<&[Row]> {
        self.rows.as_deref()
    }

    /// Consumes the result, yielding the result set if there is one.
    pub fn into_rows(self) -> Option<Vec<Row>> {
        self.rows
    }

    /// Rows changed by a mutating statement. Zero for row-returning ones.
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    /// Generated key of an INSERT, `None` for every other statement kind.
    pub fn last_insert_id(&self) -> Option<i64> {
        self.last_insert_id
    }

    /// Returned-row count for row-returning statements, affected-row count
    /// otherwise. This is the count the query log records.
    pub fn row_count(&self) -> usize {
        match &self.rows {
            Some(rows) => rows.len(),
            None => self.affected_rows,
        }
    }
}

/// Statement execution service operating on a database connection.
///
/// The executor owns the logging contract: every call appends exactly one
/// entry to the query log, success or failure.
pub struct StatementExecutor<'a> {
    connection: &'a Connection,
    log: &'a mut QueryLog,
}

impl<'a> StatementExecutor<'a> {
    pub(crate) fn new(connection: &'a Connection, log: &'a mut QueryLog) -> Self {
        StatementExecutor { connection, log }
    }

    /// Executes a single statement with named parameters.
    ///
    /// Parameters are cross-checked against the statement in both
    /// directions: a parameter without a matching `:name` placeholder is
    /// rejected, and so is a statement whose placeholders are not fully
    /// covered by the supplied parameters.
    ///
    /// The text must hold exactly one statement. Transaction control
    /// (BEGIN/COMMIT/ROLLBACK) is rejected here so it cannot bypass the
    /// connection's transaction state.
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Query` if the statement is rejected or if
    /// preparation, binding or execution fails. The failure is recorded in
    /// the query log either way.
    pub fn execute(&mut self, sql: &str, params: &Params) -> Result<StatementResult> {
        let started = Instant::now();
        let outcome = run_statement(self.connection, sql, params);
        self.finish(sql, params, started, outcome)
    }

    /// Executes a parameterless row-returning statement and yields its rows.
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Query` for statements that do not return
    /// rows, or when execution fails. Rejections follow the same logging
    /// contract as any other failure.
    pub fn query_all(&mut self, sql: &str) -> Result<Vec<Row>> {
        let params = Params::new();
        let started = Instant::now();
        let outcome = if StatementKind::classify(sql).returns_rows() {
            run_statement(self.connection, sql, &params)
        } else {
            Err(format!("Not a row-returning statement: {}", sql.trim()))
        };
        let result = self.finish(sql, &params, started, outcome)?;
        Ok(result.into_rows().unwrap_or_default())
    }

    /// Records the outcome in the query log and maps it to the crate error
    /// type. Single site, so one execution is always exactly one entry.
    fn finish(
        &mut self,
        sql: &str,
        params: &Params,
        started: Instant,
        outcome: std::result::Result<StatementResult, String>,
    ) -> Result<StatementResult> {
        let elapsed = started.elapsed();
        match outcome {
            Ok(result) => {
                let count = result.row_count();
                debug!(
                    "Executed statement in {:.3}ms ({} row(s)): {}",
                    elapsed.as_secs_f64() * 1000.0,
                    count,
                    sql
                );
                self.log
                    .record(QueryLogEntry::success(sql, params, elapsed, count));
                Ok(result)
            }
            Err(message) => {
                error!(
                    "Statement failed in {:.3}ms: {}: {}",
                    elapsed.as_secs_f64() * 1000.0,
                    message,
                    sql
                );
                self.log
                    .record(QueryLogEntry::failure(sql, params, elapsed, &message));
                Err(MiniblogError::Query(message))
            }
        }
    }
}

fn run_statement(
    connection: &Connection,
    sql: &str,
    params: &Params,
) -> std::result::Result<StatementResult, String> {
    let kind = StatementKind::classify(sql);
    if kind == StatementKind::Transaction {
        return Err(
            "Transaction control statements must go through the connection's transaction methods"
                .to_string(),
        );
    }
    if has_statement_tail(sql) {
        return Err(format!(
            "Multiple statements are not supported: {}",
            sql.trim()
        ));
    }

    let mut stmt = connection
        .prepare(sql)
        .map_err(|e| format!("Failed to prepare statement: {}", e))?;

    bind_params(&mut stmt, params)?;

    match kind {
        StatementKind::Select => {
            let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut raw_rows = stmt.raw_query();
            let mut rows = Vec::new();
            while let Some(row) = raw_rows
                .next()
                .map_err(|e| format!("Query execution failed: {}", e))?
            {
                let mut decoded = Vec::with_capacity(columns.len());
                for (i, column) in columns.iter().enumerate() {
                    let value = row
                        .get_ref(i)
                        .map_err(|e| format!("Result processing failed: {}", e))?;
                    decoded.push((column.clone(), SqlValue::from(value)));
                }
                rows.push(Row::new(decoded));
            }
            Ok(StatementResult::from_rows(rows))
        }
        StatementKind::Insert => {
            let affected = stmt
                .raw_execute()
                .map_err(|e| format!("Statement execution failed: {}", e))?;
            Ok(StatementResult::from_insert(
                affected,
                connection.last_insert_rowid(),
            ))
        }
        _ => {
            let affected = stmt
                .raw_execute()
                .map_err(|e| format!("Statement execution failed: {}", e))?;
            Ok(StatementResult::from_affected(affected))
        }
    }
}

/// Reports whether `sql` carries executable content after a
/// statement-terminating `;`. The driver would compile just the first
/// statement and drop the rest on the floor, so such input is rejected
/// instead. Semicolons inside quoted literals, quoted identifiers and
/// comments terminate nothing; whitespace and comments after the final `;`
/// are tolerated.
fn has_statement_tail(sql: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut i = 0;
    let mut terminated = false;
    while i < bytes.len() {
        match bytes[i] {
            b';' => terminated = true,
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            quote @ (b'\'' | b'"' | b'`') => {
                if terminated {
                    return true;
                }
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // a doubled quote stays inside the literal
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
            }
            b'[' => {
                if terminated {
                    return true;
                }
                while i < bytes.len() && bytes[i] != b']' {
                    i += 1;
                }
            }
            c if c.is_ascii_whitespace() => {}
            _ => {
                if terminated {
                    return true;
                }
            }
        }
        i += 1;
    }
    false
}

/// Binds every parameter by its `:name` placeholder, then checks that the
/// statement's placeholders are fully covered. Distinct names always map to
/// distinct indices, so a bare count comparison closes the other direction.
fn bind_params(
    stmt: &mut rusqlite::Statement<'_>,
    params: &Params,
) -> std::result::Result<(), String> {
    for (name, value) in params.entries() {
        let placeholder = format!(":{}", name);
        let index = stmt
            .parameter_index(&placeholder)
            .map_err(|e| format!("Failed to resolve placeholder '{}': {}", placeholder, e))?
            .ok_or_else(|| {
                format!(
                    "Parameter '{}' does not match any placeholder in the statement",
                    name
                )
            })?;
        stmt.raw_bind_parameter(index, value)
            .map_err(|e| format!("Failed to bind parameter '{}': {}", placeholder, e))?;
    }

    let expected = stmt.parameter_count();
    if params.len() != expected {
        return Err(format!(
            "Statement expects {} parameter(s) but {} were supplied",
            expected,
            params.len()
        ));
    }
    Ok(())
}
