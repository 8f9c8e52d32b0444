//! Cell parser / matcher: turns time-column cells into `SessionEntry`s for
//! the selected subjects.
//!
//! A cell is split on `/` (joint sessions). Each sub-part is matched exactly
//! against the aliases of the selected subjects first, then by its first
//! token. Class cells may carry a specific room as a trailing `(...)`.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::models::{Selection, SessionEntry, SourceKind, SourceTable, SubjectContext};
use crate::subjects::first_token;

/// Start values in `[PM_SHIFT_FROM, PM_SHIFT_UNTIL)` are afternoon hours.
pub const PM_SHIFT_FROM: f64 = 1.0;
pub const PM_SHIFT_UNTIL: f64 = 7.0;

fn leading_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,2}(?:[:.]\d{1,2})?)").expect("static regex"))
}

fn trailing_room_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^)]+)\)$").expect("static regex"))
}

/// Selected subjects plus the lookups derived from the current mapping.
#[derive(Debug, Clone)]
pub struct MatchContext {
    selected: Vec<String>,
    /// Raw alias → first selected subject (in selection order) covering it.
    exact: HashMap<String, String>,
    /// Lowercased branch filter for lab sub-entries.
    branch: Option<String>,
}

impl MatchContext {
    pub fn new(selection: &Selection, context: &SubjectContext) -> Self {
        let mut exact: HashMap<String, String> = HashMap::new();
        for subject in &selection.subjects {
            if let Some(aliases) = context.mapping.aliases(subject) {
                for alias in aliases {
                    exact.entry(alias.clone()).or_insert_with(|| subject.clone());
                }
            } else {
                tracing::debug!("selected subject '{}' not in mapping, heuristic match only", subject);
            }
        }

        MatchContext {
            selected: selection.subjects.clone(),
            exact,
            branch: selection.branch.as_ref().map(|b| b.to_lowercase()),
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    /// Exact alias membership first, then case-insensitive first-token match.
    pub fn match_subject(&self, part: &str) -> Option<&str> {
        if let Some(subject) = self.exact.get(part) {
            return Some(subject.as_str());
        }
        let token = first_token(part);
        if token.is_empty() {
            return None;
        }
        self.selected
            .iter()
            .find(|s| s.to_lowercase() == token.to_lowercase())
            .map(String::as_str)
    }

    /// Branch filter for lab sub-entries; always passes without a filter.
    pub fn passes_branch(&self, part: &str) -> bool {
        match &self.branch {
            Some(b) => part.to_lowercase().contains(b),
            None => true,
        }
    }
}

/// Room written as a trailing parenthesized group, e.g. `DIP-TJ(301)` → `301`.
pub fn specific_room(part: &str) -> Option<&str> {
    trailing_room_pattern()
        .captures(part)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|r| !r.is_empty())
}

/// Numeric start of a time label, afternoon-shifted. `None` when the label
/// does not start with a number.
///
/// `"9:30-10:30"` → 9.3, `"2.00"` → 14.0, `"13:00 – 14:00"` → 13.0,
/// `"9:00 AM"` → 9.0.
pub fn time_start_value(label: &str) -> Option<f64> {
    let start = label.split(['-', '–']).next().unwrap_or("");
    let token = leading_number_pattern().captures(start)?.get(1)?.as_str();
    let mut value: f64 = token.replace(':', ".").parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    if (PM_SHIFT_FROM..PM_SHIFT_UNTIL).contains(&value) {
        value += 12.0;
    }
    Some(value)
}

/// Canonical one-hour slot for a column label: `"1:00-2:00"` → `"13:00 - 14:00"`.
/// Unparseable labels are returned unchanged.
pub fn normalize_time_label(label: &str) -> String {
    match time_start_value(label) {
        Some(v) => {
            let hour = v.trunc() as u32;
            format!("{:02}:00 - {:02}:00", hour, hour + 1)
        }
        None => label.to_string(),
    }
}

/// All session entries for the selected subjects found in one source table.
pub fn extract_entries(table: &SourceTable, ctx: &MatchContext) -> Vec<SessionEntry> {
    let frame = &table.frame;
    let mut entries = Vec::new();

    for row in 0..frame.rows.len() {
        let (Some(room), Some(day)) = (frame.cell(row, frame.room_col), frame.cell(row, frame.day_col)) else {
            continue;
        };

        for &col in &table.time_columns {
            let Some(text) = frame.cell(row, col) else {
                continue;
            };
            let label = frame.header.get(col).map(String::as_str).unwrap_or("");

            for part in text.split('/').map(str::trim).filter(|p| !p.is_empty()) {
                if table.kind == SourceKind::Lab && !ctx.passes_branch(part) {
                    continue;
                }
                let Some(subject) = ctx.match_subject(part) else {
                    continue;
                };

                let room = match table.kind {
                    SourceKind::Class => specific_room(part).unwrap_or(room),
                    SourceKind::Lab => room,
                };

                entries.push(SessionEntry {
                    day: day.to_string(),
                    time: normalize_time_label(label),
                    subject: subject.to_string(),
                    room: room.to_string(),
                });
            }
        }
    }

    tracing::debug!("{} source: {} session entries", table.kind, entries.len());
    entries
}
