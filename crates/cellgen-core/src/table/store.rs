use cellgen_engine::engine::{Field, FieldId, Row, RowId, Value};
use dashmap::DashMap;

use crate::error::{CellgenError, Result};
use crate::host::{Notification, TableHost};

/// Thread-safe sparse row storage.
pub type Rows = DashMap<RowId, Row>;

/// In-memory storage half of a [`Table`](super::Table): fields, rows and
/// the notifications emitted against them.
#[derive(Default)]
pub struct MemoryStore {
    pub fields: Vec<Field>,
    pub rows: Rows,
    pub notifications: Vec<Notification>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(&self, id: FieldId) -> Option<&Field> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub(crate) fn field_index(&self, id: FieldId) -> Result<usize> {
        self.fields
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| CellgenError::UnknownField(id.to_string()))
    }

    /// Drop every stored value of a field.
    pub(crate) fn clear_column(&self, id: FieldId) {
        for mut entry in self.rows.iter_mut() {
            entry.cells.remove(&id);
        }
    }
}

impl TableHost for MemoryStore {
    fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn row(&self, id: RowId) -> Option<Row> {
        self.rows.get(&id).map(|r| r.clone())
    }

    fn row_ids(&self) -> Vec<RowId> {
        let mut ids: Vec<RowId> = self.rows.iter().map(|entry| *entry.key()).collect();
        ids.sort();
        ids
    }

    fn bulk_update(&mut self, field: FieldId, values: Vec<(RowId, Value)>) -> Result<()> {
        for (id, value) in values {
            if let Some(mut row) = self.rows.get_mut(&id) {
                row.set(field, value);
            }
        }
        Ok(())
    }

    fn field_values_updated(&mut self, field: FieldId) {
        self.notifications.push(Notification::FieldValuesUpdated(field));
    }

    fn table_refreshed(&mut self) {
        self.notifications.push(Notification::TableRefreshed);
    }
}
