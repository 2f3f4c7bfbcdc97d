//! Error types for the audit pipeline.

use std::path::PathBuf;

/// Errors that can occur while building the catalog or writing the report.
///
/// Decode-level anomalies (a style document without the class-id field, an
/// inline style string without a bracket pair) are not errors: they resolve
/// to empty or skipped contributions inside the catalog builder. Only
/// store connectivity and report persistence can fail a run.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Database error from one of the store readers.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// IO error (exception file, report file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The report path could not be written.
    #[error("Failed to write report to '{path}': {message}")]
    ReportWrite {
        /// Path to the report file.
        path: PathBuf,
        /// Error message.
        message: String,
    },
}

/// Result type for audit operations.
pub type Result<T> = std::result::Result<T, AuditError>;
