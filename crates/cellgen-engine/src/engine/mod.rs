//! Field model and dependency engine API.
//!
//! This module provides the pure side of computed columns:
//!
//! - [`Field`], [`FieldKind`], [`FieldId`] - Column descriptors and their configuration
//! - [`Value`], [`Row`], [`RowId`] - Cell values and host-owned rows
//! - [`extract_placeholders`] / [`expand_template`] - `{Column}` prompt templates
//! - [`field_dependencies`] - Declare which fields a computed field reads
//! - [`detect_cycle`] / [`evaluation_order`] - Cycle detection and recompute ordering

mod cycle;
mod deps;
mod error;
mod field;
mod placeholders;
mod value;

pub use cycle::{detect_cycle, evaluation_order};
pub use deps::{FieldDependency, dependency_ids, field_dependencies, find_field_by_name};
pub use error::EngineError;
pub use field::{Field, FieldId, FieldKind, PromptOptions, TranslationOptions};
pub use placeholders::{expand_template, extract_placeholders};
pub use value::{Row, RowId, Value, format_number};
