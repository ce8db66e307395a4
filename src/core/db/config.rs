//! Connection settings.
//!
//! The settings keep the conventional client/server shape (host, user,
//! password, database, port) even though the embedded engine only consumes
//! `database`, which it treats as a filesystem path (or `:memory:` for a
//! transient database). Carrying the full shape keeps configuration files
//! stable if the storage backend ever changes.

use serde::Deserialize;

use crate::core::{MiniblogError, Result};

/// Settings required to open a database connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    pub host: String,
    pub user: String,
    /// May be empty; some local setups run without one.
    #[serde(default)]
    pub password: String,
    /// Database name. Resolved as a file path by the embedded engine;
    /// `:memory:` opens a transient in-memory database.
    pub database: String,
    #[serde(default)]
    pub port: u16,
}

impl ConnectionConfig {
    pub fn new(
        host: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
        port: u16,
    ) -> Self {
        ConnectionConfig {
            host: host.into(),
            user: user.into(),
            password: password.into(),
            database: database.into(),
            port,
        }
    }

    /// Settings for a transient in-memory database, used as the default
    /// when no configuration file is supplied.
    pub fn in_memory() -> Self {
        ConnectionConfig::new("localhost", "miniblog", "", ":memory:", 0)
    }

    /// Checks that every setting a connection attempt needs is present.
    /// The password may be empty; the port is always structurally valid.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(MiniblogError::Connection(
                "invalid connection settings: host must not be empty".to_string(),
            ));
        }
        if self.user.trim().is_empty() {
            return Err(MiniblogError::Connection(
                "invalid connection settings: user must not be empty".to_string(),
            ));
        }
        if self.database.trim().is_empty() {
            return Err(MiniblogError::Connection(
                "invalid connection settings: database must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
