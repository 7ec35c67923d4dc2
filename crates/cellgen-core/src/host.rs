//! The host side of the contract.
//!
//! Computed field types never own rows. They read the table through
//! [`TableHost`], write their column back with one bulk update per batch,
//! and tell the host what changed so it can refresh views and cascade to
//! fields that read this one.

use cellgen_engine::engine::{Field, FieldId, Row, RowId, Value};

use crate::error::Result;

/// Change notifications emitted by computed field types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// Some cells of this field changed (incremental recompute).
    FieldValuesUpdated(FieldId),
    /// The whole table should be refreshed (full column recompute).
    TableRefreshed,
}

/// Rows handed to a row-level recompute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RowSelection {
    Single(RowId),
    Many(Vec<RowId>),
    /// Every row of the table.
    All,
}

impl RowSelection {
    /// Concrete row ids, in the order the host should process them.
    pub fn resolve(&self, host: &dyn TableHost) -> Vec<RowId> {
        match self {
            RowSelection::Single(id) => vec![*id],
            RowSelection::Many(ids) => ids.clone(),
            RowSelection::All => host.row_ids(),
        }
    }
}

impl From<RowId> for RowSelection {
    fn from(id: RowId) -> Self {
        RowSelection::Single(id)
    }
}

impl From<Vec<RowId>> for RowSelection {
    fn from(ids: Vec<RowId>) -> Self {
        RowSelection::Many(ids)
    }
}

/// Capabilities a table host offers to computed field types.
pub trait TableHost {
    /// All fields of the table, computed ones included.
    fn fields(&self) -> &[Field];

    /// A snapshot of one row, or `None` if it no longer exists.
    fn row(&self, id: RowId) -> Option<Row>;

    /// Ids of every row, in a stable order.
    fn row_ids(&self) -> Vec<RowId>;

    /// Write one field's value for many rows in a single storage round-trip.
    fn bulk_update(&mut self, field: FieldId, values: Vec<(RowId, Value)>) -> Result<()>;

    fn field_values_updated(&mut self, field: FieldId);

    fn table_refreshed(&mut self);
}
