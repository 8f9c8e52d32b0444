use std::collections::BTreeSet;

use crate::models::Frame;

/// Distinct trimmed cell strings found in the time columns, sorted.
pub fn harvest_raw_values(frame: &Frame, time_cols: &[usize]) -> BTreeSet<String> {
    let mut values = BTreeSet::new();
    for &col in time_cols {
        for row in 0..frame.rows.len() {
            if let Some(v) = frame.cell(row, col) {
                values.insert(v.to_string());
            }
        }
    }
    values
}
