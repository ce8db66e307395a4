/// Core Module
///
/// This module contains the fundamental components that form the backbone of
/// the application: the database access layer and the shared error type used
/// for consistent error propagation.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{MiniblogError, Result};
