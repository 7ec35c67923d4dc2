//! CSV import/export functionality

use std::path::Path;

use cellgen_engine::engine::{FieldKind, Value};
use tracing::info;

use crate::error::{CellgenError, Result};
use crate::table::Table;

/// Load a CSV file into `table`. See [`parse_csv_str`].
pub fn load_csv(table: &mut Table, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let rows = parse_csv_str(table, &content)?;
    info!(path = %path.display(), rows, "loaded CSV");
    Ok(rows)
}

/// Parse CSV text into `table`.
///
/// The first record is the header: every column name becomes a text field
/// unless the table already has a plain field of that name. Blank header
/// cells (e.g. a trailing comma) are skipped as long as their column holds
/// no data. Cells go through [`Value::from_input`]. All rows are created in
/// one batch, so computed fields already on the table are populated before
/// this returns.
pub fn parse_csv_str(table: &mut Table, content: &str) -> Result<usize> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    for name in headers.iter().filter(|name| !name.is_empty()) {
        match table.field_by_name(name) {
            Some(field) if field.is_computed() => {
                return Err(CellgenError::ReadOnlyField(name.clone()));
            }
            Some(_) => {}
            None => {
                table.add_field(name, FieldKind::Text)?;
            }
        }
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let mut values: Vec<(String, Value)> = Vec::new();
        for (column, (name, cell)) in headers.iter().zip(record.iter()).enumerate() {
            if cell.trim().is_empty() {
                continue;
            }
            if name.is_empty() {
                return Err(CellgenError::Csv {
                    line: record.position().map(|p| p.line()).unwrap_or(0),
                    message: format!("value in column {} has no header", column + 1),
                });
            }
            values.push((name.clone(), Value::from_input(cell)));
        }
        rows.push(values);
    }

    let ids = table.create_rows(rows)?;
    Ok(ids.len())
}

fn csv_error(e: csv::Error) -> CellgenError {
    CellgenError::Csv {
        line: e.position().map(|p| p.line()).unwrap_or(0),
        message: e.to_string(),
    }
}

/// Render the table as CSV: a header of field names, then one record per
/// row in creation order using display values.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    write_records(&mut writer, table)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| CellgenError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| CellgenError::Csv {
        line: 0,
        message: e.to_string(),
    })
}

/// Export the table to a CSV file. See [`to_csv_string`].
pub fn write_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    write_records(&mut writer, table)?;
    writer.flush()?;
    Ok(())
}

fn write_records<W: std::io::Write>(writer: &mut csv::Writer<W>, table: &Table) -> Result<()> {
    let fields = table.fields();
    writer
        .write_record(fields.iter().map(|f| guard_formula(&f.name)))
        .map_err(csv_error)?;
    for row in table.row_ids() {
        writer
            .write_record(
                fields
                    .iter()
                    .map(|f| guard_formula(&table.display(row, f.id))),
            )
            .map_err(csv_error)?;
    }
    Ok(())
}

/// Guard against CSV formula injection in spreadsheet apps. Generated text
/// comes from remote services and is not trusted.
fn guard_formula(field: &str) -> String {
    let first_non_space = field.trim_start_matches([' ', '\t']).chars().next();
    if matches!(first_non_space, Some('=' | '+' | '-' | '@')) {
        format!("'{}", field)
    } else {
        field.to_string()
    }
}
