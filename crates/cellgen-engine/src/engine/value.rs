//! Cell values and rows.
//!
//! Rows are owned by the host; computed fields only read them and hand
//! back new [`Value`]s for their own column.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::field::FieldId;

static EMPTY: Value = Value::Empty;

/// The content stored in a cell. `Empty` stands for null or missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl Value {
    pub fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    /// Parse user input into a value.
    /// - Empty string or whitespace -> Empty
    /// - Valid number without leading zeros -> Number
    /// - Otherwise -> Text (trimmed)
    pub fn from_input(input: &str) -> Value {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }

        // Keep values like "007" as text.
        if trimmed.starts_with('0')
            && trimmed.len() > 1
            && !trimmed.starts_with("0.")
            && trimmed.chars().nth(1).is_some_and(|c| c.is_ascii_digit())
        {
            return Value::text(trimmed);
        }

        if let Ok(n) = trimmed.parse::<f64>()
            && n.is_finite()
        {
            return Value::Number(n);
        }

        Value::text(trimmed)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Text used when the value feeds a translation or a prompt.
    /// Null and missing values read as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Format a number without a trailing `.0` for integral values.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        n.to_string()
    }
}

/// Identifier of a row within its table.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A row: a sparse mapping from field id to stored value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    pub cells: HashMap<FieldId, Value>,
}

impl Row {
    pub fn new(id: RowId) -> Row {
        Row {
            id,
            cells: HashMap::new(),
        }
    }

    /// Value of a field in this row; missing cells read as [`Value::Empty`].
    pub fn get(&self, field: FieldId) -> &Value {
        self.cells.get(&field).unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, field: FieldId, value: Value) {
        if value.is_empty() {
            self.cells.remove(&field);
        } else {
            self.cells.insert(field, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_input_keeps_leading_zeros_as_text() {
        assert_eq!(Value::from_input("007"), Value::text("007"));
        assert_eq!(Value::from_input("0.5"), Value::Number(0.5));
        assert_eq!(Value::from_input("  "), Value::Empty);
        assert_eq!(Value::from_input(" Hello "), Value::text("Hello"));
    }

    #[test]
    fn test_to_text_formats_integral_numbers() {
        assert_eq!(Value::Number(3.0).to_text(), "3");
        assert_eq!(Value::Number(2.5).to_text(), "2.5");
        assert_eq!(Value::Empty.to_text(), "");
    }

    #[test]
    fn test_missing_cell_reads_as_empty() {
        let mut row = Row::new(RowId(1));
        assert_eq!(row.get(FieldId(9)), &Value::Empty);
        row.set(FieldId(9), Value::text("x"));
        assert_eq!(row.get(FieldId(9)), &Value::text("x"));
        row.set(FieldId(9), Value::Empty);
        assert!(row.cells.is_empty());
    }
}
