//! Error types for cellgen core.

use thiserror::Error;

use cellgen_engine::compute::ComputeError;
use cellgen_engine::engine::{EngineError, RowId};

/// Errors that can occur while configuring fields or recomputing cells
#[derive(Error, Debug)]
pub enum CellgenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error at line {line}: {message}")]
    Csv { line: u64, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Missing API key: set {0}")]
    MissingKey(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Compute error: {0}")]
    Compute(#[from] ComputeError),

    #[error("Field name already in use: {0}")]
    DuplicateField(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Unknown row: {0}")]
    UnknownRow(RowId),

    #[error("Field {field} is still read by {by}")]
    FieldInUse { field: String, by: String },

    #[error("Field {0} is computed and cannot be edited")]
    ReadOnlyField(String),

    #[error("Circular dependency detected")]
    CircularDependency,

    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CellgenError>;
