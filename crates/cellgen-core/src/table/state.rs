use crate::error::{CellgenError, Result};
use crate::field_types::{ComputeContext, DEFAULT_BATCH_SIZE, FieldTypeRegistry};
use crate::host::{Notification, TableHost};
use cellgen_engine::compute::ComputeBackend;
use cellgen_engine::engine::{Field, FieldId, RowId, Value, find_field_by_name};
use std::collections::{HashMap, HashSet};

use super::store::MemoryStore;

/// UI-agnostic table state.
pub struct Table {
    /// Fields, rows and emitted notifications
    pub store: MemoryStore,
    /// Implementations of the computed field types
    pub registry: FieldTypeRegistry,
    /// Translator and completer used by computed fields
    pub backend: Box<dyn ComputeBackend>,
    /// Rows per bulk write during a column recompute
    pub batch_size: usize,
    /// Reverse dependency map: field -> computed fields that read it
    pub dependants: HashMap<FieldId, HashSet<FieldId>>,
    pub(crate) next_field_id: u32,
    pub(crate) next_row_id: u64,
}

impl Table {
    /// Create an empty table computing through `backend`.
    pub fn new(backend: Box<dyn ComputeBackend>) -> Self {
        Table {
            store: MemoryStore::new(),
            registry: FieldTypeRegistry::default(),
            backend,
            batch_size: DEFAULT_BATCH_SIZE,
            dependants: HashMap::new(),
            next_field_id: 1,
            next_row_id: 1,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub(crate) fn context(backend: &dyn ComputeBackend, batch_size: usize) -> ComputeContext<'_> {
        ComputeContext::new(backend).with_batch_size(batch_size)
    }

    /// Rebuild the reverse dependency map from the field configuration.
    /// Call this after fields are added, removed, renamed or reconfigured.
    pub(crate) fn rebuild_dependants(&mut self) {
        self.dependants.clear();
        for field in &self.store.fields {
            let Some(field_type) = self.registry.for_kind(&field.kind) else {
                continue;
            };
            for dep in field_type.dependencies(field, &self.store.fields) {
                self.dependants
                    .entry(dep.dependency)
                    .or_default()
                    .insert(dep.dependant);
            }
        }
    }

    /// Every computed field that reads any of `changed`, directly or through
    /// other computed fields.
    pub(crate) fn transitive_dependants(&self, changed: &[FieldId]) -> HashSet<FieldId> {
        let mut to_process: Vec<FieldId> = changed.to_vec();
        let mut affected = HashSet::new();
        while let Some(field) = to_process.pop() {
            if let Some(deps) = self.dependants.get(&field) {
                for dep in deps {
                    if affected.insert(*dep) {
                        to_process.push(*dep);
                    }
                }
            }
        }
        affected
    }

    pub fn fields(&self) -> &[Field] {
        &self.store.fields
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.store.field(id)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&Field> {
        find_field_by_name(&self.store.fields, name)
    }

    pub fn row_ids(&self) -> Vec<RowId> {
        self.store.row_ids()
    }

    pub fn row_count(&self) -> usize {
        self.store.rows.len()
    }

    /// Stored value of a cell, looked up by field name.
    pub fn cell(&self, row: RowId, field_name: &str) -> Result<Value> {
        let field = self
            .field_by_name(field_name)
            .ok_or_else(|| CellgenError::UnknownField(field_name.to_string()))?;
        let row = self.store.rows.get(&row).ok_or(CellgenError::UnknownRow(row))?;
        Ok(row.get(field.id).clone())
    }

    /// Display text of a cell; missing rows and cells read as "".
    pub fn display(&self, row: RowId, field: FieldId) -> String {
        self.store
            .rows
            .get(&row)
            .map(|r| r.get(field).to_text())
            .unwrap_or_default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.store.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.store.notifications)
    }
}
