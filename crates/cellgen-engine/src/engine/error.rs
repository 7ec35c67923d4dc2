use thiserror::Error;

use super::field::FieldId;

/// Errors raised while resolving field configuration against a row.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Unknown placeholder: {{{0}}}")]
    UnknownPlaceholder(String),

    #[error("Unknown field: {0}")]
    UnknownField(FieldId),
}
