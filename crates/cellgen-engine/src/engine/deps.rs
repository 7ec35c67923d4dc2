//! Dependency declaration for computed fields.
//!
//! Given a field's configuration, returns the other fields it reads. The
//! host uses the result to decide which computed columns to refresh after
//! an edit. Dependencies are derived on demand and never stored.
//!
//! - Translation: zero or one dependency (the source field, if set)
//! - Prompt: one dependency per distinct placeholder naming an existing field
//! - Plain fields: none

use super::field::{Field, FieldId, FieldKind};
use super::placeholders::extract_placeholders;

/// A read relationship: `dependant` is computed from `dependency`.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct FieldDependency {
    pub dependant: FieldId,
    pub dependency: FieldId,
}

/// Look up a field by its exact name.
pub fn find_field_by_name<'a>(fields: &'a [Field], name: &str) -> Option<&'a Field> {
    fields.iter().find(|f| f.name == name)
}

/// Declare the fields `field` reads, resolved against the table's fields.
///
/// An unset translation source is "no dependency". Placeholders naming a
/// field that does not exist are skipped; rejecting them is up to the host.
pub fn field_dependencies(field: &Field, fields: &[Field]) -> Vec<FieldDependency> {
    dependency_ids(field, fields)
        .into_iter()
        .map(|dependency| FieldDependency {
            dependant: field.id,
            dependency,
        })
        .collect()
}

/// Ids of the fields `field` reads, in declaration order.
pub fn dependency_ids(field: &Field, fields: &[Field]) -> Vec<FieldId> {
    match &field.kind {
        FieldKind::Translation(opts) => opts
            .source_field_id
            .filter(|source| fields.iter().any(|f| f.id == *source))
            .into_iter()
            .collect(),
        FieldKind::Prompt(opts) => extract_placeholders(&opts.prompt)
            .iter()
            .filter_map(|name| find_field_by_name(fields, name))
            .map(|f| f.id)
            .collect(),
        FieldKind::Text | FieldKind::Number => Vec::new(),
    }
}
