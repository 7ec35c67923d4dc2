//! cellgen-core - computed field types, the table host and their I/O.

pub mod config;
pub mod error;
pub mod field_types;
pub mod host;
pub mod remote;
pub mod storage;
pub mod table;

pub use config::Config;
pub use error::{CellgenError, Result};
pub use field_types::{ComputeContext, ComputedFieldType, FieldTypeRegistry};
pub use host::{Notification, RowSelection, TableHost};
pub use table::Table;

pub use cellgen_engine::compute::{ComputeBackend, StubBackend};
pub use cellgen_engine::engine::{Field, FieldId, FieldKind, RowId, Value};
