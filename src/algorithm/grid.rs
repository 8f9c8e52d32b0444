//! Grid assembler: pivots session entries into a day × time grid.

use chrono::Weekday;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::matcher::time_start_value;
use crate::error::ExportError;
use crate::models::SessionEntry;

/// Separator between concurrent sessions in one grid cell.
pub const CELL_SEPARATOR: &str = " | ";

/// Sort key for time labels that do not parse.
const UNPARSED_TIME: f64 = 99.0;

const WEEKDAYS: [(Weekday, &str); 7] = [
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
    (Weekday::Sun, "Sunday"),
];

fn weekday_of(canonical: &str) -> Option<Weekday> {
    WEEKDAYS.iter().find(|(_, name)| *name == canonical).map(|(d, _)| *d)
}

/// `"MON"`, `"monday"`, `"Mon (A)"` → `"Monday"`; anything else is title-cased.
pub fn normalize_day(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    for (_, name) in WEEKDAYS {
        if lower.contains(&name[..3].to_lowercase()) {
            return name.to_string();
        }
    }
    title_case(raw.trim())
}

/// Uppercases the first letter of every alphabetic run, lowercases the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Monday..Sunday first, then unrecognised labels alphabetically.
fn day_order(a: &str, b: &str) -> Ordering {
    let rank = |d: &str| weekday_of(d).map(|w| w.num_days_from_monday()).unwrap_or(7);
    rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
}

fn time_order(a: &str, b: &str) -> Ordering {
    let key = |t: &str| time_start_value(t).unwrap_or(UNPARSED_TIME);
    key(a).total_cmp(&key(b)).then_with(|| a.cmp(b))
}

/// Day labels normalized, duplicates removed, ordered by day, time, subject, room.
pub fn normalize_entries(entries: &[SessionEntry]) -> Vec<SessionEntry> {
    let mut unique: Vec<SessionEntry> = entries
        .iter()
        .map(|e| SessionEntry { day: normalize_day(&e.day), ..e.clone() })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    unique.sort_by(|a, b| {
        day_order(&a.day, &b.day)
            .then_with(|| time_order(&a.time, &b.time))
            .then_with(|| a.subject.cmp(&b.subject))
            .then_with(|| a.room.cmp(&b.room))
    });
    unique
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridRow {
    pub day: String,
    /// One slot per entry of `UnifiedGrid::times`; `None` when free.
    pub cells: Vec<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UnifiedGrid {
    pub times: Vec<String>,
    pub rows: Vec<GridRow>,
}

impl UnifiedGrid {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn cell(&self, day: &str, time: &str) -> Option<&str> {
        let col = self.times.iter().position(|t| t == time)?;
        let row = self.rows.iter().find(|r| r.day == day)?;
        row.cells.get(col)?.as_deref()
    }

    pub fn days(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.day.as_str()).collect()
    }

    /// Delimited text: header `Day,<time...>`, one line per day.
    pub fn to_csv(&self) -> Result<String, ExportError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());

        let mut header = vec!["Day"];
        header.extend(self.times.iter().map(String::as_str));
        wtr.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.day.as_str()];
            record.extend(row.cells.iter().map(|c| c.as_deref().unwrap_or("")));
            wtr.write_record(&record)?;
        }

        let bytes = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Time → day → content, occupied cells only.
    pub fn to_column_map(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        let mut out: BTreeMap<String, BTreeMap<String, String>> = BTreeMap::new();
        for row in &self.rows {
            for (time, cell) in self.times.iter().zip(&row.cells) {
                if let Some(content) = cell {
                    out.entry(time.clone()).or_default().insert(row.day.clone(), content.clone());
                }
            }
        }
        out
    }
}

/// Groups entries by (day, time), joining distinct display strings in
/// lexical order. No entries gives an empty grid.
pub fn assemble_grid(entries: &[SessionEntry]) -> UnifiedGrid {
    let entries = normalize_entries(entries);

    let mut groups: BTreeMap<(String, String), BTreeSet<String>> = BTreeMap::new();
    for e in &entries {
        groups.entry((e.day.clone(), e.time.clone())).or_default().insert(e.display());
    }

    let mut days: Vec<String> = groups.keys().map(|(d, _)| d.clone()).collect::<BTreeSet<_>>().into_iter().collect();
    days.sort_by(|a, b| day_order(a, b));
    let mut times: Vec<String> = groups.keys().map(|(_, t)| t.clone()).collect::<BTreeSet<_>>().into_iter().collect();
    times.sort_by(|a, b| time_order(a, b));

    let rows = days
        .into_iter()
        .map(|day| {
            let cells = times
                .iter()
                .map(|time| {
                    groups
                        .get(&(day.clone(), time.clone()))
                        .map(|set| set.iter().cloned().collect::<Vec<_>>().join(CELL_SEPARATOR))
                })
                .collect();
            GridRow { day, cells }
        })
        .collect();

    UnifiedGrid { times, rows }
}

/// Flat `Day,Time,Subject,Room` export of normalized entries.
pub fn entries_to_csv(entries: &[SessionEntry]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for e in normalize_entries(entries) {
        wtr.serialize(&e)?;
    }
    let bytes = wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}
