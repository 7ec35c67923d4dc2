//! Prompt templates.
//!
//! A prompt field stores free text with `{Column Name}` placeholders, e.g.
//! `Translate text into {Lang}: {Text}`. The same brace pattern is used to
//! discover the fields a prompt reads and to substitute the row's values
//! before the prompt is sent.
//!
//! Handles:
//! - Names with spaces: `{First name}` (surrounding whitespace is trimmed)
//! - Repeated placeholders: declared once, substituted everywhere
//! - Braces that do not form a placeholder (`{}`, `{ }`, unbalanced) stay as text

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use super::error::EngineError;

fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]+)\}").unwrap())
}

/// All distinct placeholder names in a template, in first-occurrence order.
pub fn extract_placeholders(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for caps in placeholder_re().captures_iter(template) {
        let name = caps[1].trim();
        if name.is_empty() {
            continue;
        }
        if seen.insert(name.to_string()) {
            names.push(name.to_string());
        }
    }

    names
}

/// Substitute every placeholder with the text returned by `lookup`.
///
/// `lookup` returns `None` for names that do not resolve to a field, which
/// fails the expansion with [`EngineError::UnknownPlaceholder`].
pub fn expand_template(
    template: &str,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> Result<String, EngineError> {
    let mut out = String::with_capacity(template.len());
    let mut last = 0;

    for caps in placeholder_re().captures_iter(template) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let name = caps[1].trim();
        if name.is_empty() {
            continue;
        }

        let value =
            lookup(name).ok_or_else(|| EngineError::UnknownPlaceholder(name.to_string()))?;
        out.push_str(&template[last..whole.start()]);
        out.push_str(&value);
        last = whole.end();
    }

    out.push_str(&template[last..]);
    Ok(out)
}
