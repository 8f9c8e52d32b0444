use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use std::path::Path;

use crate::error::SourceError;
use crate::models::{is_missing_text, Cell, RawGrid};

/// Converts a calamine `Data` into a cell (`None` = empty).
pub fn cell_to_text(c: &Data) -> Cell {
    match c {
        Data::String(s) => {
            if is_missing_text(s) { None } else { Some(s.clone()) }
        }
        Data::Float(f) => {
            if (f.floor() - f).abs() < f64::EPSILON {
                Some(format!("{}", *f as i64))
            } else {
                Some(format!("{}", f))
            }
        }
        Data::Int(i) => Some(format!("{}", i)),
        Data::Bool(b) => Some(format!("{}", b)),
        Data::DateTime(dt) => Some(excel_serial_to_text(dt.as_f64())),
        Data::DateTimeIso(s) => Some(s.clone()),
        Data::DurationIso(s) => Some(s.clone()),
        Data::Empty => None,
        Data::Error(_) => None,
    }
}

/// Time-only serials (fraction of a day) render as `H:MM` so that header
/// cells stored as spreadsheet times still look like time labels.
fn excel_serial_to_text(serial: f64) -> String {
    if (0.0..1.0).contains(&serial) {
        let minutes = (serial * 24.0 * 60.0).round() as i64;
        format!("{}:{:02}", minutes / 60, minutes % 60)
    } else {
        format!("{}", serial)
    }
}

fn text_to_cell(field: &str) -> Cell {
    if is_missing_text(field) {
        None
    } else {
        Some(field.to_string())
    }
}

/// Reads the first sheet of a workbook held in memory.
///
/// Column positions follow the sheet: calamine trims leading empty columns
/// off the used range, so they are padded back in.
pub fn read_workbook_grid(bytes: &[u8]) -> Result<RawGrid, String> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| e.to_string())?;
    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| "workbook has no sheets".to_string())?;
    let range = workbook.worksheet_range(&first).map_err(|e| e.to_string())?;

    let col_offset = range.start().map(|(_, c)| c as usize).unwrap_or(0);
    let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(range.height());
    for r in range.rows() {
        let mut row: Vec<Cell> = vec![None; col_offset];
        row.extend(r.iter().map(cell_to_text));
        rows.push(row);
    }
    Ok(RawGrid::new(rows))
}

/// Reads delimited text with no header row and ragged rows allowed.
pub fn read_csv_grid(bytes: &[u8]) -> Result<RawGrid, String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| e.to_string())?;
        rows.push(record.iter().map(text_to_cell).collect());
    }
    Ok(RawGrid::new(rows))
}

/// Workbook first, delimited text second. `location` is only used in errors.
pub fn load_raw_grid_from_bytes(bytes: &[u8], location: &str) -> Result<RawGrid, SourceError> {
    match read_workbook_grid(bytes) {
        Ok(grid) => return Ok(grid),
        Err(e) => tracing::debug!("'{}' is not a workbook ({}), trying delimited text", location, e),
    }
    read_csv_grid(bytes).map_err(|reason| SourceError::Unreadable {
        location: location.to_string(),
        reason,
    })
}

pub fn load_raw_grid<P: AsRef<Path>>(path: P) -> Result<RawGrid, SourceError> {
    let path = path.as_ref();
    let location = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| SourceError::Unreadable {
        location: location.clone(),
        reason: e.to_string(),
    })?;
    load_raw_grid_from_bytes(&bytes, &location)
}
