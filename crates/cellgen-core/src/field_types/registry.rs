use std::collections::HashMap;

use cellgen_engine::engine::FieldKind;

use super::{ComputedFieldType, PromptFieldType, TranslationFieldType};

/// Maps field type tags to their implementations.
pub struct FieldTypeRegistry {
    types: Vec<Box<dyn ComputedFieldType>>,
    by_name: HashMap<String, usize>,
}

impl FieldTypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            types: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a field type under its own tag.
    pub fn register(&mut self, field_type: Box<dyn ComputedFieldType>) {
        let name = field_type.type_name().to_string();
        self.types.push(field_type);
        self.by_name.insert(name, self.types.len() - 1);
    }

    /// Make `alias` resolve to an already registered tag.
    /// Returns false if `target` is unknown.
    pub fn register_alias(&mut self, alias: &str, target: &str) -> bool {
        match self.by_name.get(target).copied() {
            Some(index) => {
                self.by_name.insert(alias.to_string(), index);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, type_name: &str) -> Option<&dyn ComputedFieldType> {
        self.by_name
            .get(type_name)
            .map(|&index| self.types[index].as_ref())
    }

    /// The implementation for a field kind, or `None` for plain fields.
    pub fn for_kind(&self, kind: &FieldKind) -> Option<&dyn ComputedFieldType> {
        if !kind.is_computed() {
            return None;
        }
        self.get(kind.type_name())
    }

    /// Registered tags, aliases included, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for FieldTypeRegistry {
    /// Translation and prompt types, with the legacy `chatgpt` tag for prompts.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(TranslationFieldType));
        registry.register(Box::new(PromptFieldType));
        registry.register_alias("chatgpt", "prompt");
        registry.register_alias("prompt-llm", "prompt");
        registry
    }
}
