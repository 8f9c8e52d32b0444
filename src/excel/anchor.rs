//! Locating the real table inside a spreadsheet dump.
//!
//! Exports start with an arbitrary block of titles and notes. The table
//! proper begins at the first row mentioning the anchor text ("Classroom
//! No.", "Lab Name/ No."); that row becomes the header and everything above
//! it is discarded. Visually merged room/day cells serialize as blanks below
//! the first row of the block and are repaired by forward-filling.

use crate::error::SourceError;
use crate::excel::time_columns::is_time_label;
use crate::models::{cell_is_blank, Cell, Frame, RawGrid};

/// Header substrings (lowercased) marking identifier columns to merge-repair.
pub const IDENTIFIER_MARKERS: &[&str] = &["room", "lab", "day"];

/// Index of the first row with a single cell containing `anchor`.
/// Text split across neighbouring cells does not count.
pub fn find_anchor_row(grid: &RawGrid, anchor: &str) -> Option<usize> {
    grid.rows()
        .iter()
        .position(|row| row.iter().filter_map(|c| c.as_deref()).any(|c| c.contains(anchor)))
}

/// Identifier header that is not itself a time slot (`Lab 2:00-4:00` is one).
fn names_identifier(header: &str, markers: &[&str]) -> bool {
    if is_time_label(header) {
        return false;
    }
    let h = header.to_lowercase();
    markers.iter().any(|m| h.contains(m))
}

/// Columns whose header names an identifier; falls back to the first two.
pub fn identifier_columns(header: &[String]) -> Vec<usize> {
    let found: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(_, h)| names_identifier(h, IDENTIFIER_MARKERS))
        .map(|(i, _)| i)
        .collect();

    if found.is_empty() {
        (0..header.len().min(2)).collect()
    } else {
        found
    }
}

/// Each missing cell takes the nearest preceding non-missing value of the column.
pub fn forward_fill_column(rows: &mut [Vec<Cell>], col: usize) {
    let mut last: Option<String> = None;
    for row in rows.iter_mut() {
        let Some(cell) = row.get_mut(col) else { continue };
        if cell_is_blank(cell) {
            if let Some(v) = &last {
                *cell = Some(v.clone());
            }
        } else {
            last = cell.clone();
        }
    }
}

fn locate_column(header: &[String], markers: &[&str], fallback: usize) -> usize {
    header
        .iter()
        .position(|h| names_identifier(h, markers))
        .unwrap_or(fallback)
}

/// Slices the grid at the anchor row, promotes it to header, repairs merged
/// identifier columns and drops rows still lacking a room or day.
pub fn extract_frame(grid: &RawGrid, anchor: &str) -> Result<Frame, SourceError> {
    let anchor_idx = find_anchor_row(grid, anchor).ok_or_else(|| SourceError::AnchorNotFound {
        anchor: anchor.to_string(),
    })?;
    tracing::info!("anchor '{}' found at row {}", anchor, anchor_idx + 1);

    let width = grid.rows()[anchor_idx..].iter().map(|r| r.len()).max().unwrap_or(0);

    let header: Vec<String> = (0..width)
        .map(|i| {
            grid.rows()[anchor_idx]
                .get(i)
                .and_then(|c| c.as_deref())
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        })
        .collect();

    let mut rows: Vec<Vec<Cell>> = grid.rows()[anchor_idx + 1..]
        .iter()
        .map(|r| {
            let mut r = r.clone();
            r.resize(width, None);
            r
        })
        .collect();

    for col in identifier_columns(&header) {
        forward_fill_column(&mut rows, col);
    }

    let room_col = locate_column(&header, &["room", "lab"], 0);
    let day_col = locate_column(&header, &["day"], 1);

    let before = rows.len();
    rows.retain(|r| {
        let present = |c: usize| r.get(c).map(|cell| !cell_is_blank(cell)).unwrap_or(false);
        present(room_col) && present(day_col)
    });
    if rows.len() < before {
        tracing::debug!("dropped {} rows without room/day identifiers", before - rows.len());
    }

    Ok(Frame { header, rows, room_col, day_col })
}
