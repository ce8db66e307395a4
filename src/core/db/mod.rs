/// Database Module
///
/// This module provides the database access layer, organized into focused
/// submodules for better maintainability and separation of concerns.
///
/// ## Architecture
///
/// The layer is split into five concerns:
/// - **Connection Management** (`connection.rs`): The owned connection handle, transaction control and the shared singleton manager
/// - **Connection Settings** (`config.rs`): The host/user/password/database/port shape and its validation
/// - **Statement Execution** (`query.rs`): Named-parameter binding, classification and result decoding
/// - **Values** (`value.rs`): The SQL value enum plus row and parameter containers
/// - **Query Log** (`log.rs`): The append-only record of every executed statement
///
/// ## Error Handling
///
/// All database operations use the standardized `MiniblogError` type for consistent error propagation.
///
/// ## Usage
///
/// Open a `ConnectionHandle` directly when the caller owns the connection,
/// or go through `ConnectionManager::instance` to share one process-wide
/// connection between call sites.
pub mod config;
pub mod connection;
pub mod log;
pub mod query;
pub mod value;

pub use config::*;
pub use connection::*;
pub use log::*;
pub use query::*;
pub use value::*;
