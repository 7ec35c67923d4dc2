//! Circular dependency detection and recompute ordering for fields.
//!
//! When a computed field is configured, we must verify it doesn't create a
//! cycle (e.g., a prompt that names its own column, or two translations
//! of each other). This module uses depth-first search over the declared
//! dependencies to detect such cycles before they cause endless
//! recomputation, and to order fields so inputs are computed first.

use std::collections::HashSet;

use super::deps::dependency_ids;
use super::field::{Field, FieldId};

/// Detect circular dependencies starting from a field.
/// Returns Some(cycle_path) if a cycle is found, None otherwise.
pub fn detect_cycle(start: FieldId, fields: &[Field]) -> Option<Vec<FieldId>> {
    let mut visiting = HashSet::new();
    let mut path = Vec::new();

    if detect_cycle_dfs(start, fields, &mut visiting, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn detect_cycle_dfs(
    current: FieldId,
    fields: &[Field],
    visiting: &mut HashSet<FieldId>,
    path: &mut Vec<FieldId>,
) -> bool {
    if visiting.contains(&current) {
        path.push(current);
        return true;
    }

    let deps = match fields.iter().find(|f| f.id == current) {
        Some(field) => dependency_ids(field, fields),
        None => return false,
    };

    visiting.insert(current);
    path.push(current);

    for dep in deps {
        if detect_cycle_dfs(dep, fields, visiting, path) {
            return true;
        }
    }

    path.pop();
    visiting.remove(&current);
    false
}

/// All fields ordered so that every field comes after the fields it reads.
///
/// Fields caught in a cycle are still emitted once; callers that need
/// acyclic input reject cycles with [`detect_cycle`] first.
pub fn evaluation_order(fields: &[Field]) -> Vec<FieldId> {
    let mut done = HashSet::new();
    let mut order = Vec::with_capacity(fields.len());

    for field in fields {
        visit(field.id, fields, &mut done, &mut order);
    }

    order
}

fn visit(current: FieldId, fields: &[Field], done: &mut HashSet<FieldId>, order: &mut Vec<FieldId>) {
    if !done.insert(current) {
        return;
    }
    if let Some(field) = fields.iter().find(|f| f.id == current) {
        for dep in dependency_ids(field, fields) {
            visit(dep, fields, done, order);
        }
        order.push(current);
    }
}
