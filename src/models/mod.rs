// Core data structures shared by the extraction pipeline

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A single spreadsheet cell. `None` is the missing marker (blank cell,
/// spreadsheet error, or one of the textual NA markers of delimited files).
pub type Cell = Option<String>;

/// Textual markers spreadsheets and exports use for an empty cell.
pub const NA_MARKERS: &[&str] = &["nan", "na", "n/a", "#n/a", "null"];

/// True for whitespace-only text or one of the `NA_MARKERS` (any case).
pub fn is_missing_text(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || NA_MARKERS.iter().any(|m| t.eq_ignore_ascii_case(m))
}

/// True when the cell carries no usable text.
pub fn cell_is_blank(cell: &Cell) -> bool {
    cell.as_deref().map(is_missing_text).unwrap_or(true)
}

/// Raw 2-D grid as read from a workbook sheet or delimited file.
/// Rows may have different widths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawGrid {
    rows: Vec<Vec<Cell>>,
}

impl RawGrid {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        RawGrid { rows }
    }

    /// Convenience constructor for text rows; empty strings become missing cells.
    pub fn from_text_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Self {
        let rows = rows
            .iter()
            .map(|r| {
                r.iter()
                    .map(|c| {
                        let c = c.as_ref();
                        if c.trim().is_empty() { None } else { Some(c.to_string()) }
                    })
                    .collect()
            })
            .collect();
        RawGrid { rows }
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }
}

/// Which of the two timetable tables a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Class,
    Lab,
}

impl SourceKind {
    pub fn default_anchor(&self) -> &'static str {
        match self {
            SourceKind::Class => "Classroom No.",
            SourceKind::Lab => "Lab Name/ No.",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Class => write!(f, "class"),
            SourceKind::Lab => write!(f, "lab"),
        }
    }
}

/// The real table found inside a raw grid: header row promoted to labels,
/// identifier columns merge-repaired, rows without room/day dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Column holding the room / lab identifier.
    pub room_col: usize,
    /// Column holding the weekday label.
    pub day_col: usize,
}

impl Frame {
    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Trimmed text of a cell, `None` when blank or out of range.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        let cell = self.rows.get(row)?.get(col)?;
        if cell_is_blank(cell) {
            return None;
        }
        cell.as_deref().map(str::trim)
    }

    /// Header followed by data rows, i.e. the frame written back as a grid.
    pub fn to_raw_grid(&self) -> RawGrid {
        let mut rows: Vec<Vec<Cell>> = Vec::with_capacity(self.rows.len() + 1);
        rows.push(
            self.header
                .iter()
                .map(|h| if h.is_empty() { None } else { Some(h.clone()) })
                .collect(),
        );
        rows.extend(self.rows.iter().cloned());
        RawGrid::new(rows)
    }
}

/// A processed source file ready for matching.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub kind: SourceKind,
    pub frame: Frame,
    pub time_columns: Vec<usize>,
    pub raw_values: BTreeSet<String>,
}

/// Canonical subject name -> raw strings it covers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectMapping(BTreeMap<String, BTreeSet<String>>);

impl SubjectMapping {
    pub fn new() -> Self {
        SubjectMapping(BTreeMap::new())
    }

    pub fn insert_alias(&mut self, canonical: impl Into<String>, alias: impl Into<String>) {
        self.0.entry(canonical.into()).or_default().insert(alias.into());
    }

    /// Registers a canonical name that has no aliases (yet).
    pub fn insert_subject(&mut self, canonical: impl Into<String>) {
        self.0.entry(canonical.into()).or_default();
    }

    pub fn aliases(&self, canonical: &str) -> Option<&BTreeSet<String>> {
        self.0.get(canonical)
    }

    /// Canonical names in sorted order.
    pub fn subjects(&self) -> Vec<String> {
        self.0.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, String)> for SubjectMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut m = SubjectMapping::new();
        for (k, v) in iter {
            m.insert_alias(k, v);
        }
        m
    }
}

/// How the current mapping was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingSource {
    /// One canonical key per raw value.
    Identity,
    /// Accepted as returned by the external oracle.
    Oracle,
    /// Oracle requested but unusable; keys are first tokens of the candidates.
    FirstTokenFallback,
}

/// Session-scoped subject vocabulary. Replaced wholesale whenever subjects
/// are re-normalized; generation only ever reads it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectContext {
    pub mapping: SubjectMapping,
    pub source: MappingSource,
}

impl SubjectContext {
    pub fn new(mapping: SubjectMapping, source: MappingSource) -> Self {
        SubjectContext { mapping, source }
    }

    pub fn used_oracle(&self) -> bool {
        self.source != MappingSource::Identity
    }
}

/// What the student asked for.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub subjects: Vec<String>,
    /// Case-insensitive substring that lab sub-entries must contain.
    pub branch: Option<String>,
}

impl Selection {
    /// Subjects and branch are trimmed; blanks are dropped.
    pub fn new(subjects: Vec<String>, branch: Option<String>) -> Self {
        let subjects = subjects
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let branch = branch.map(|b| b.trim().to_string()).filter(|b| !b.is_empty());
        Selection { subjects, branch }
    }
}

/// One (day, time, subject, room) observation taken from a cell sub-part.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SessionEntry {
    #[serde(rename = "Day")]
    pub day: String,
    #[serde(rename = "Time")]
    pub time: String,
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Room")]
    pub room: String,
}

impl SessionEntry {
    pub fn display(&self) -> String {
        format!("{} ({})", self.subject, self.room)
    }
}
