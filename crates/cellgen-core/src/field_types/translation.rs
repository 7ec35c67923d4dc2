use cellgen_engine::engine::{Field, FieldKind, Row, TranslationOptions, Value};

use super::{ComputeContext, ComputedFieldType, invalid};
use crate::error::{CellgenError, Result};

/// Machine translation of one source column.
#[derive(Clone, Copy, Debug, Default)]
pub struct TranslationFieldType;

impl TranslationFieldType {
    fn options<'a>(&self, field: &'a Field) -> Result<&'a TranslationOptions> {
        match &field.kind {
            FieldKind::Translation(opts) => Ok(opts),
            _ => Err(invalid(field, "not a translation field")),
        }
    }
}

impl ComputedFieldType for TranslationFieldType {
    fn type_name(&self) -> &'static str {
        "translation"
    }

    fn attributes(&self) -> &'static [&'static str] {
        &["source_field_id", "source_language", "target_language"]
    }

    fn validate(&self, field: &Field, fields: &[Field]) -> Result<()> {
        let opts = self.options(field)?;
        if opts.source_language.trim().is_empty() {
            return Err(invalid(field, "source_language must not be blank"));
        }
        if opts.target_language.trim().is_empty() {
            return Err(invalid(field, "target_language must not be blank"));
        }
        if let Some(source) = opts.source_field_id {
            if source == field.id {
                return Err(CellgenError::CircularDependency);
            }
            if !fields.iter().any(|f| f.id == source) {
                return Err(CellgenError::UnknownField(source.to_string()));
            }
        }
        Ok(())
    }

    fn compute_row(
        &self,
        field: &Field,
        row: &Row,
        _fields: &[Field],
        ctx: &ComputeContext<'_>,
    ) -> Result<Value> {
        let opts = self.options(field)?;
        let Some(source) = opts.source_field_id else {
            return Ok(Value::Empty);
        };

        let text = row.get(source).to_text();
        let translated =
            ctx.backend
                .translate(&text, &opts.source_language, &opts.target_language)?;
        Ok(Value::Text(translated))
    }
}
