//! Computed field types.
//!
//! Each computed kind implements [`ComputedFieldType`]: it validates its
//! configuration, declares its dependencies and computes one row. The two
//! recompute paths are shared and provided by the trait:
//!
//! - [`ComputedFieldType::row_of_dependency_updated`] - incremental, for
//!   rows whose inputs changed; one bulk write and one
//!   [`Notification::FieldValuesUpdated`](crate::host::Notification) per batch
//! - [`ComputedFieldType::recompute_column`] - every row of the table,
//!   streamed in chunks, followed by a single table refresh

mod prompt;
mod registry;
mod translation;

pub use prompt::PromptFieldType;
pub use registry::FieldTypeRegistry;
pub use translation::TranslationFieldType;

use cellgen_engine::compute::ComputeBackend;
use cellgen_engine::engine::{Field, FieldDependency, FieldKind, Row, RowId, Value, field_dependencies};
use tracing::{debug, info};

use crate::error::Result;
use crate::host::{RowSelection, TableHost};

/// Default number of rows per bulk write during a column recompute.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Storage column backing a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StorageShape {
    pub column_type: &'static str,
    pub nullable: bool,
}

impl StorageShape {
    pub const LONG_TEXT: StorageShape = StorageShape {
        column_type: "text",
        nullable: true,
    };
}

/// How the host's formula language sees a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormulaType {
    Text,
}

/// What a recompute needs besides the host.
#[derive(Clone, Copy)]
pub struct ComputeContext<'a> {
    pub backend: &'a dyn ComputeBackend,
    /// Rows per bulk write when recomputing a whole column.
    pub batch_size: usize,
}

impl<'a> ComputeContext<'a> {
    pub fn new(backend: &'a dyn ComputeBackend) -> Self {
        Self {
            backend,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }
}

/// A field type whose cells are derived from other fields of the same row.
pub trait ComputedFieldType {
    /// Registry tag, also the serialized `type` of the field.
    fn type_name(&self) -> &'static str;

    /// Type-specific attributes accepted on create/update and serialized back.
    fn attributes(&self) -> &'static [&'static str];

    /// End users cannot edit computed cells.
    fn read_only(&self) -> bool {
        true
    }

    fn storage(&self) -> StorageShape {
        StorageShape::LONG_TEXT
    }

    fn formula_type(&self) -> FormulaType {
        FormulaType::Text
    }

    /// Reject configurations this type cannot compute with.
    fn validate(&self, field: &Field, fields: &[Field]) -> Result<()>;

    /// Fields this field reads, resolved against the table.
    fn dependencies(&self, field: &Field, fields: &[Field]) -> Vec<FieldDependency> {
        field_dependencies(field, fields)
    }

    /// The per-row transform.
    fn compute_row(
        &self,
        field: &Field,
        row: &Row,
        fields: &[Field],
        ctx: &ComputeContext<'_>,
    ) -> Result<Value>;

    /// Whether switching from `old` to `new` changes any computed cell.
    fn inputs_changed(&self, old: &FieldKind, new: &FieldKind) -> bool {
        old != new
    }

    /// Recompute `rows` after one of their inputs changed.
    ///
    /// Every row is computed before anything is written, so a backend
    /// failure leaves the whole batch untouched. Returns the rows written.
    fn row_of_dependency_updated(
        &self,
        field: &Field,
        rows: RowSelection,
        host: &mut dyn TableHost,
        ctx: &ComputeContext<'_>,
    ) -> Result<Vec<RowId>> {
        let ids = rows.resolve(&*host);
        let updates = compute_rows(self, field, &ids, &*host, ctx)?;
        if updates.is_empty() {
            return Ok(Vec::new());
        }

        let written: Vec<RowId> = updates.iter().map(|(id, _)| *id).collect();
        debug!(
            field = %field.id,
            rows = written.len(),
            "recomputed rows after dependency update"
        );
        host.bulk_update(field.id, updates)?;
        host.field_values_updated(field.id);
        Ok(written)
    }

    /// Recompute every row of the table, then emit one table refresh.
    /// Returns the number of rows written.
    fn recompute_column(
        &self,
        field: &Field,
        host: &mut dyn TableHost,
        ctx: &ComputeContext<'_>,
    ) -> Result<usize> {
        let ids = host.row_ids();
        let mut written = 0;

        for chunk in ids.chunks(ctx.batch_size.max(1)) {
            let updates = compute_rows(self, field, chunk, &*host, ctx)?;
            written += updates.len();
            host.bulk_update(field.id, updates)?;
        }

        info!(field = %field.id, name = %field.name, rows = written, "recomputed column");
        host.table_refreshed();
        Ok(written)
    }

    /// Lifecycle hook: the field was just created.
    fn after_create(
        &self,
        field: &Field,
        host: &mut dyn TableHost,
        ctx: &ComputeContext<'_>,
    ) -> Result<usize> {
        self.recompute_column(field, host, ctx)
    }

    /// Lifecycle hook: the field was reconfigured. Renames alone recompute nothing.
    fn after_update(
        &self,
        old: &Field,
        new: &Field,
        host: &mut dyn TableHost,
        ctx: &ComputeContext<'_>,
    ) -> Result<usize> {
        if !self.inputs_changed(&old.kind, &new.kind) {
            return Ok(0);
        }
        self.recompute_column(new, host, ctx)
    }
}

fn compute_rows<T: ComputedFieldType + ?Sized>(
    field_type: &T,
    field: &Field,
    ids: &[RowId],
    host: &dyn TableHost,
    ctx: &ComputeContext<'_>,
) -> Result<Vec<(RowId, Value)>> {
    let fields = host.fields();
    let mut updates = Vec::with_capacity(ids.len());
    for id in ids {
        // Rows deleted since the notification was queued are skipped.
        let Some(row) = host.row(*id) else {
            continue;
        };
        updates.push((*id, field_type.compute_row(field, &row, fields, ctx)?));
    }
    Ok(updates)
}

fn invalid(field: &Field, reason: &str) -> crate::error::CellgenError {
    crate::error::CellgenError::InvalidField {
        field: field.name.clone(),
        reason: reason.to_string(),
    }
}
