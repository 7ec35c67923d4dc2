//! Computed field declarations read from a TOML file.
//!
//! ```toml
//! [[field]]
//! name = "French"
//! type = "translation"
//! source = "English"
//! source_language = "en"
//! target_language = "fr"
//! ```
//!
//! Fields are added in file order, so a field may only read columns from
//! the CSV header or fields declared above it.

use std::path::Path;

use anyhow::{Context, Result, bail};
use cellgen_core::Table;
use cellgen_engine::engine::{FieldId, FieldKind, PromptOptions, TranslationOptions};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldsFile {
    #[serde(default)]
    pub field: Vec<FieldSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Name of the field a translation reads.
    pub source: Option<String>,
    pub source_language: Option<String>,
    pub target_language: Option<String>,
    pub prompt: Option<String>,
}

impl FieldsFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Add every declared field to `table`, computing each over all rows.
    pub fn apply(&self, table: &mut Table) -> Result<Vec<FieldId>> {
        let mut ids = Vec::with_capacity(self.field.len());
        for spec in &self.field {
            let kind = spec.to_kind(table)?;
            let id = table
                .add_field(&spec.name, kind)
                .with_context(|| format!("Failed to add field '{}'", spec.name))?;
            ids.push(id);
        }
        Ok(ids)
    }
}

impl FieldSpec {
    fn to_kind(&self, table: &Table) -> Result<FieldKind> {
        match self.kind.to_ascii_lowercase().as_str() {
            "text" => Ok(FieldKind::Text),
            "number" => Ok(FieldKind::Number),
            "translation" => {
                let source_field_id = match self.source.as_deref() {
                    Some(name) => match table.field_by_name(name) {
                        Some(field) => Some(field.id),
                        None => bail!("Field '{}': unknown source '{}'", self.name, name),
                    },
                    None => None,
                };
                Ok(FieldKind::Translation(TranslationOptions {
                    source_field_id,
                    source_language: self.required("source_language", &self.source_language)?,
                    target_language: self.required("target_language", &self.target_language)?,
                }))
            }
            "prompt" | "prompt-llm" | "chatgpt" => Ok(FieldKind::Prompt(PromptOptions {
                prompt: self.prompt.clone().unwrap_or_default(),
            })),
            other => bail!("Field '{}': unknown type '{}'", self.name, other),
        }
    }

    fn required(&self, key: &str, value: &Option<String>) -> Result<String> {
        match value {
            Some(v) => Ok(v.clone()),
            None => bail!("Field '{}': missing {}", self.name, key),
        }
    }
}
