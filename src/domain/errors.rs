//! Domain errors. Used by ports and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

/// Why a single customer record cannot be classified or scored.
///
/// Always a per-record skip: one malformed record never aborts a population pass.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidRecord {
    #[error("date of birth is missing")]
    MissingDateOfBirth,

    #[error("field `{field}` is not a finite number")]
    NonFiniteField { field: &'static str },
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Repository error: {0}")]
    Repo(String),

    #[error("Customer not found: {0}")]
    NotFound(String),

    #[error("Invalid customer record {id}: {reason}")]
    InvalidRecord { id: String, reason: InvalidRecord },

    #[error("Import failed: {0}")]
    Import(String),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("UI error: {0}")]
    Ui(String),
}
