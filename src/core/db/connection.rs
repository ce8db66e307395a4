//! Connection management.
//!
//! This module provides the two layers of connection handling: an owned
//! [`ConnectionHandle`] that callers can construct directly (tests open as
//! many as they like), and the process-wide [`ConnectionManager`] singleton
//! that the application binary uses so every call site shares one lazily
//! opened handle.
//!
//! The handle is the single entry point for statement execution and carries
//! the transaction flag and the query log, so their lifetimes always match
//! the connection's.

use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use rusqlite::Connection;
use tracing::{debug, error, info};

use crate::core::db::config::ConnectionConfig;
use crate::core::db::log::QueryLog;
use crate::core::db::query::{StatementExecutor, StatementResult};
use crate::core::db::value::{Params, Row};
use crate::core::{MiniblogError, Result};

/// An open database connection with its session state.
///
/// All statements run through [`execute`](ConnectionHandle::execute) or
/// [`query_all`](ConnectionHandle::query_all), which keeps every execution in
/// the query log. Transaction control is explicit, with the handle tracking
/// whether a transaction is active.
#[derive(Debug)]
pub struct ConnectionHandle {
    connection: Connection,
    config: ConnectionConfig,
    in_transaction: bool,
    log: QueryLog,
}

impl ConnectionHandle {
    /// Opens a connection using the given settings.
    ///
    /// # Arguments
    ///
    /// * `config` - Connection settings; `database` is the file path, or
    ///   `:memory:` for a transient database
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Connection` when the settings are incomplete
    /// or the database cannot be opened.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let connection = Connection::open(&config.database).map_err(|e| {
            MiniblogError::Connection(format!(
                "Failed to open database '{}': {}",
                config.database, e
            ))
        })?;

        // Initialize connection with common pragmas
        connection
            .execute_batch(
                "
                PRAGMA foreign_keys = ON;
                PRAGMA journal_mode = WAL;
            ",
            )
            .map_err(|e| {
                MiniblogError::Connection(format!("Failed to apply session pragmas: {}", e))
            })?;

        info!("Connected to database '{}'", config.database);

        Ok(ConnectionHandle {
            connection,
            config,
            in_transaction: false,
            log: QueryLog::new(),
        })
    }

    /// Checks that the connection still answers a trivial query.
    pub fn ping(&self) -> bool {
        self.connection.query_row("SELECT 1", [], |_| Ok(())).is_ok()
    }

    /// The settings this connection was opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Executes a single statement with named parameters.
    ///
    /// See [`StatementExecutor::execute`] for the binding and logging
    /// contract.
    pub fn execute(&mut self, sql: &str, params: &Params) -> Result<StatementResult> {
        let Self {
            connection, log, ..
        } = self;
        StatementExecutor::new(connection, log).execute(sql, params)
    }

    /// Executes a parameterless row-returning statement and yields its rows.
    pub fn query_all(&mut self, sql: &str) -> Result<Vec<Row>> {
        let Self {
            connection, log, ..
        } = self;
        StatementExecutor::new(connection, log).query_all(sql)
    }

    /// The log of every statement executed on this connection, in order.
    pub fn query_log(&self) -> &QueryLog {
        &self.log
    }

    /// Whether an explicit transaction is currently active.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    /// Starts an explicit transaction.
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Transaction` if a transaction is already
    /// active; nested transactions are not supported.
    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(MiniblogError::Transaction(
                "Transaction already in progress".to_string(),
            ));
        }
        self.connection
            .execute_batch("BEGIN")
            .map_err(|e| MiniblogError::Transaction(format!("Failed to begin transaction: {}", e)))?;
        self.in_transaction = true;
        debug!("Transaction started");
        Ok(())
    }

    /// Commits the active transaction.
    ///
    /// A failed commit leaves the transaction open so the caller can still
    /// roll it back.
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Transaction` if no transaction is active or
    /// the commit itself fails.
    pub fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(MiniblogError::Transaction(
                "No transaction in progress".to_string(),
            ));
        }
        self.connection
            .execute_batch("COMMIT")
            .map_err(|e| MiniblogError::Transaction(format!("Failed to commit transaction: {}", e)))?;
        self.in_transaction = false;
        debug!("Transaction committed");
        Ok(())
    }

    /// Rolls back the active transaction.
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Transaction` if no transaction is active.
    /// A rollback the engine refuses surfaces as `MiniblogError::Connection`;
    /// the session state is undefined at that point and the handle should be
    /// discarded.
    pub fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(MiniblogError::Transaction(
                "No transaction in progress".to_string(),
            ));
        }
        self.connection.execute_batch("ROLLBACK").map_err(|e| {
            MiniblogError::Connection(format!("Failed to roll back transaction: {}", e))
        })?;
        self.in_transaction = false;
        debug!("Transaction rolled back");
        Ok(())
    }

    /// Runs `f` inside a transaction, committing on `Ok` and rolling back
    /// on `Err`.
    ///
    /// The closure's error is returned after the rollback; if the rollback
    /// itself fails, that failure takes precedence and the original error is
    /// only reported through the log output.
    pub fn with_transaction<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut ConnectionHandle) -> Result<T>,
    {
        self.begin_transaction()?;
        match f(self) {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                error!("Rolling back transaction after error: {}", err);
                self.rollback()?;
                Err(err)
            }
        }
    }
}

/// Shared, lock-guarded connection handle as handed out by the manager.
pub type SharedHandle = Arc<Mutex<ConnectionHandle>>;

/// Process-wide connection slot.
///
/// Uses OnceCell for lazy initialization to ensure thread-safe singleton
/// behavior.
static SHARED_HANDLE: OnceCell<Mutex<Option<SharedHandle>>> = OnceCell::new();

/// Lazy singleton access to one shared [`ConnectionHandle`].
pub struct ConnectionManager;

impl ConnectionManager {
    fn slot() -> &'static Mutex<Option<SharedHandle>> {
        SHARED_HANDLE.get_or_init(|| Mutex::new(None))
    }

    /// Returns the shared handle, opening the connection on first use.
    ///
    /// The settings are only consulted when no handle exists yet. Later
    /// calls return the same handle unchanged, whatever settings they pass.
    ///
    /// # Errors
    ///
    /// Returns `MiniblogError::Connection` when the first open fails; no
    /// handle is retained in that case, so a later call may try again.
    pub fn instance(config: &ConnectionConfig) -> Result<SharedHandle> {
        let mut slot = Self::slot().lock().map_err(|_| {
            MiniblogError::App("Failed to acquire connection manager lock".to_string())
        })?;

        if let Some(handle) = slot.as_ref() {
            return Ok(Arc::clone(handle));
        }

        let handle = Arc::new(Mutex::new(ConnectionHandle::open(config.clone())?));
        *slot = Some(Arc::clone(&handle));
        Ok(handle)
    }

    /// Drops the shared handle. The connection closes once the last
    /// outstanding clone is released. Safe to call when nothing is open.
    pub fn close() {
        if let Some(slot) = SHARED_HANDLE.get() {
            if let Ok(mut guard) = slot.lock() {
                if guard.take().is_some() {
                    info!("Database connection closed");
                }
            }
        }
    }

    /// Whether the manager currently holds an open handle.
    pub fn is_open() -> bool {
        SHARED_HANDLE
            .get()
            .and_then(|slot| slot.lock().ok())
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }
}
