//! Field descriptors.
//!
//! A [`Field`] is a column of a table. Plain fields ([`FieldKind::Text`],
//! [`FieldKind::Number`]) hold user input; computed fields derive their
//! cells from other fields of the same row:
//!
//! - [`FieldKind::Translation`] translates one source column
//! - [`FieldKind::Prompt`] expands a `{Column}` template and sends it to an LLM
//!
//! Serialized with a `type` tag so field declarations round-trip through
//! JSON and TOML.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a field within its table.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldId(pub u32);

/// Displays as the storage column backing the field (`field_<id>`).
impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field_{}", self.0)
    }
}

/// Configuration of a translation field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationOptions {
    /// Field whose text is translated. `None` until the user picks one.
    #[serde(default)]
    pub source_field_id: Option<FieldId>,
    #[serde(default)]
    pub source_language: String,
    #[serde(default)]
    pub target_language: String,
}

/// Configuration of a prompt (LLM) field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOptions {
    /// Free text with `{Column Name}` placeholders.
    #[serde(default)]
    pub prompt: String,
}

/// The type of a field and its type-specific attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
    Translation(TranslationOptions),
    #[serde(alias = "chatgpt", alias = "prompt-llm")]
    Prompt(PromptOptions),
}

impl FieldKind {
    /// The registry tag for this kind.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Translation(_) => "translation",
            FieldKind::Prompt(_) => "prompt",
        }
    }

    /// Whether cells of this kind are derived rather than entered.
    pub fn is_computed(&self) -> bool {
        matches!(self, FieldKind::Translation(_) | FieldKind::Prompt(_))
    }
}

/// A column descriptor owned by a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl Field {
    pub fn new(id: FieldId, name: &str, kind: FieldKind) -> Field {
        Field {
            id,
            name: name.to_string(),
            kind,
        }
    }

    pub fn new_text(id: FieldId, name: &str) -> Field {
        Field::new(id, name, FieldKind::Text)
    }

    pub fn new_translation(
        id: FieldId,
        name: &str,
        source: Option<FieldId>,
        source_language: &str,
        target_language: &str,
    ) -> Field {
        Field::new(
            id,
            name,
            FieldKind::Translation(TranslationOptions {
                source_field_id: source,
                source_language: source_language.to_string(),
                target_language: target_language.to_string(),
            }),
        )
    }

    pub fn new_prompt(id: FieldId, name: &str, prompt: &str) -> Field {
        Field::new(
            id,
            name,
            FieldKind::Prompt(PromptOptions {
                prompt: prompt.to_string(),
            }),
        )
    }

    pub fn is_computed(&self) -> bool {
        self.kind.is_computed()
    }
}
