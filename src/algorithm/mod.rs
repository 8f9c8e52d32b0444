// Matching and grid assembly over the processed class and lab tables.
pub mod grid;
pub mod matcher;

pub use grid::{assemble_grid, entries_to_csv, normalize_day, normalize_entries, GridRow, UnifiedGrid};
pub use matcher::{extract_entries, normalize_time_label, specific_room, time_start_value, MatchContext};

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{RequestError, SourceError};
use crate::excel::LoadedSources;
use crate::models::{Selection, SessionEntry, SourceKind, SourceTable, SubjectContext};

/// A per-file failure reported next to partial results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub source: SourceKind,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimetableOutcome {
    pub grid: UnifiedGrid,
    /// Normalized and deduplicated entries behind the grid.
    pub entries: Vec<SessionEntry>,
    pub source_errors: Vec<SourceFailure>,
}

impl TimetableOutcome {
    pub fn has_matches(&self) -> bool {
        !self.grid.is_empty()
    }
}

fn split_sources(sources: &LoadedSources) -> (Vec<&SourceTable>, Vec<(SourceKind, SourceError)>) {
    let mut usable = Vec::new();
    let mut failures = Vec::new();
    for (kind, result) in [(SourceKind::Class, &sources.class), (SourceKind::Lab, &sources.lab)] {
        match result {
            Ok(table) => usable.push(table),
            Err(e) => failures.push((kind, e.clone())),
        }
    }
    (usable, failures)
}

/// Raw subject candidates. The class table is the vocabulary; the lab table
/// is used only when the class table is unusable.
pub fn collect_raw_values(sources: &LoadedSources) -> Result<BTreeSet<String>, RequestError> {
    match (&sources.class, &sources.lab) {
        (Ok(class), _) => Ok(class.raw_values.clone()),
        (Err(_), Ok(lab)) => {
            tracing::warn!("class source unusable, taking subject candidates from the lab source");
            Ok(lab.raw_values.clone())
        }
        (Err(c), Err(l)) => Err(RequestError::no_usable_source(&[
            (SourceKind::Class, c.clone()),
            (SourceKind::Lab, l.clone()),
        ])),
    }
}

/// Matches the selection against every usable source and pivots the result.
///
/// Fails only when nothing was selected or neither source is usable. A
/// source that failed on its own is reported in `source_errors`.
pub fn generate_timetable(
    sources: &LoadedSources,
    selection: &Selection,
    context: &SubjectContext,
) -> Result<TimetableOutcome, RequestError> {
    if selection.subjects.is_empty() {
        return Err(RequestError::NoSubjectsSelected);
    }

    let (usable, failures) = split_sources(sources);
    if usable.is_empty() {
        return Err(RequestError::no_usable_source(&failures));
    }

    let ctx = MatchContext::new(selection, context);
    let entries: Vec<SessionEntry> = usable.iter().flat_map(|t| extract_entries(t, &ctx)).collect();
    tracing::info!(
        "{} session entries for {} selected subjects",
        entries.len(),
        ctx.selected().len()
    );

    let grid = assemble_grid(&entries);
    let source_errors = failures
        .into_iter()
        .map(|(source, e)| SourceFailure { source, error: e.to_string() })
        .collect();

    Ok(TimetableOutcome {
        grid,
        entries: normalize_entries(&entries),
        source_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::process_source;
    use crate::models::RawGrid;
    use crate::subjects::identity_context;

    fn class_table() -> SourceTable {
        let grid = RawGrid::from_text_rows(&[
            vec!["Classroom No.", "Days", "9:00-10:00", "2:00-3:00"],
            vec!["CR1", "Mon", "DIP-TJ(301) / FML-ND", "DIP-TJ"],
        ]);
        process_source(&grid, SourceKind::Class, "Classroom No.").unwrap()
    }

    #[test]
    fn empty_selection_is_rejected() {
        let sources = LoadedSources { class: Ok(class_table()), lab: Err(SourceError::NoTimeColumnsFound) };
        let ctx = identity_context(&BTreeSet::new());
        let err = generate_timetable(&sources, &Selection::new(vec![], None), &ctx).unwrap_err();
        assert_eq!(err, RequestError::NoSubjectsSelected);
    }

    #[test]
    fn failed_source_reported_next_to_results() {
        let table = class_table();
        let ctx = identity_context(&table.raw_values);
        let sources = LoadedSources {
            class: Ok(table),
            lab: Err(SourceError::AnchorNotFound { anchor: "Lab Name/ No.".into() }),
        };
        let out = generate_timetable(&sources, &Selection::new(vec!["DIP".into()], None), &ctx).unwrap();
        assert_eq!(out.source_errors.len(), 1);
        assert_eq!(out.source_errors[0].source, SourceKind::Lab);
        assert_eq!(out.grid.cell("Monday", "09:00 - 10:00"), Some("DIP (301)"));
        assert_eq!(out.grid.cell("Monday", "14:00 - 15:00"), Some("DIP (CR1)"));
    }

    #[test]
    fn both_sources_unusable() {
        let sources = LoadedSources {
            class: Err(SourceError::NoTimeColumnsFound),
            lab: Err(SourceError::NoTimeColumnsFound),
        };
        let ctx = identity_context(&BTreeSet::new());
        let err = generate_timetable(&sources, &Selection::new(vec!["DIP".into()], None), &ctx).unwrap_err();
        assert!(matches!(err, RequestError::NoUsableSource { class: Some(_), lab: Some(_) }));
        assert!(collect_raw_values(&sources).is_err());
    }
}
