use regex::Regex;
use std::sync::OnceLock;

use crate::error::SourceError;
use crate::models::{cell_is_blank, Frame};

fn time_label_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{1,2}[:.]\d{2}").expect("static regex"))
}

/// `10.00`, `9:30-10:30`, `1:00 - 2:00` are time labels; `Days` is not.
pub fn is_time_label(label: &str) -> bool {
    time_label_pattern().is_match(label)
}

/// Positions of time-slot columns, left to right.
pub fn classify_time_columns(frame: &Frame) -> Result<Vec<usize>, SourceError> {
    let cols: Vec<usize> = frame
        .header
        .iter()
        .enumerate()
        .filter(|(_, h)| is_time_label(h))
        .map(|(i, _)| i)
        .collect();

    if cols.is_empty() {
        return Err(SourceError::NoTimeColumnsFound);
    }
    tracing::info!("{} time columns detected", cols.len());
    Ok(cols)
}

/// Two-hour labs are written once and the following slot left blank.
/// Copies a value into the next time column only, never further, and only
/// from values that were present before the pass.
pub fn extend_lab_durations(frame: &mut Frame, time_cols: &[usize]) {
    for row in frame.rows.iter_mut() {
        let original: Vec<bool> = time_cols
            .iter()
            .map(|&c| row.get(c).map(|cell| !cell_is_blank(cell)).unwrap_or(false))
            .collect();

        for k in 1..time_cols.len() {
            let (prev, cur) = (time_cols[k - 1], time_cols[k]);
            if original[k] || !original[k - 1] {
                continue;
            }
            let value = row.get(prev).cloned().flatten();
            if let Some(slot) = row.get_mut(cur) {
                *slot = value;
            }
        }
    }
}
