use cellgen_engine::engine::{
    Field, FieldKind, PromptOptions, Row, Value, expand_template, find_field_by_name,
};

use super::{ComputeContext, ComputedFieldType, invalid};
use crate::error::Result;

/// LLM completion of a `{Column}` prompt template.
#[derive(Clone, Copy, Debug, Default)]
pub struct PromptFieldType;

impl PromptFieldType {
    fn options<'a>(&self, field: &'a Field) -> Result<&'a PromptOptions> {
        match &field.kind {
            FieldKind::Prompt(opts) => Ok(opts),
            _ => Err(invalid(field, "not a prompt field")),
        }
    }

    /// The prompt sent for `row`, with every placeholder substituted.
    pub fn expand(&self, field: &Field, row: &Row, fields: &[Field]) -> Result<String> {
        let opts = self.options(field)?;
        let prompt = expand_template(&opts.prompt, |name| {
            find_field_by_name(fields, name).map(|f| row.get(f.id).to_text())
        })?;
        Ok(prompt)
    }
}

impl ComputedFieldType for PromptFieldType {
    fn type_name(&self) -> &'static str {
        "prompt"
    }

    fn attributes(&self) -> &'static [&'static str] {
        &["prompt"]
    }

    // Placeholder names are resolved per row; whether unknown names are an
    // error at configuration time is the host's call.
    fn validate(&self, field: &Field, _fields: &[Field]) -> Result<()> {
        self.options(field).map(|_| ())
    }

    fn compute_row(
        &self,
        field: &Field,
        row: &Row,
        fields: &[Field],
        ctx: &ComputeContext<'_>,
    ) -> Result<Value> {
        let prompt = self.expand(field, row, fields)?;
        Ok(Value::Text(ctx.backend.complete(&prompt)?))
    }
}
