//! Module `excel`: turning timetable exports into matchable tables.
//!
//! Submodules:
//! - `io`: workbook / delimited-text loading into a `RawGrid`
//! - `source`: local vs. remote locations, Google Sheets export URLs
//! - `anchor`: header detection and merged-cell repair
//! - `time_columns`: time-slot column detection, two-hour lab repair
//! - `harvest`: distinct raw cell values (candidate subject vocabulary)

/// Workbook and CSV readers
pub mod io;

/// Source locations and remote fetching
pub mod source;

/// Anchor-based frame extraction: `extract_frame`
pub mod anchor;

/// Time columns: `classify_time_columns`, `extend_lab_durations`
pub mod time_columns;

/// Raw value harvesting: `harvest_raw_values`
pub mod harvest;

pub use anchor::{extract_frame, find_anchor_row, forward_fill_column, identifier_columns};
pub use harvest::harvest_raw_values;
pub use io::{load_raw_grid, load_raw_grid_from_bytes};
pub use source::{export_url, SourceLocation};
pub use time_columns::{classify_time_columns, extend_lab_durations, is_time_label};

use std::path::Path;

use crate::error::SourceError;
use crate::models::{RawGrid, SourceKind, SourceTable};

/// Anchor → time columns → (lab) duration repair → raw values.
pub fn process_source(grid: &RawGrid, kind: SourceKind, anchor: &str) -> Result<SourceTable, SourceError> {
    let mut frame = extract_frame(grid, anchor)?;
    let time_columns = classify_time_columns(&frame)?;

    if kind == SourceKind::Lab {
        extend_lab_durations(&mut frame, &time_columns);
    }

    let raw_values = harvest_raw_values(&frame, &time_columns);
    tracing::info!(
        "{} source: {} rows, {} time columns, {} distinct raw values",
        kind,
        frame.rows.len(),
        time_columns.len(),
        raw_values.len()
    );

    Ok(SourceTable { kind, frame, time_columns, raw_values })
}

/// Synchronous variant for files on disk.
pub fn process_source_file<P: AsRef<Path>>(path: P, kind: SourceKind, anchor: &str) -> Result<SourceTable, SourceError> {
    let grid = load_raw_grid(path)?;
    process_source(&grid, kind, anchor)
}

/// Result of loading one of the two sources.
pub type SourceResult = Result<SourceTable, SourceError>;

/// Reads and processes one location. Parsing runs on the blocking pool.
pub async fn load_source(
    client: &reqwest::Client,
    location: &SourceLocation,
    kind: SourceKind,
    anchor: &str,
) -> SourceResult {
    let result = read_and_process(client, location, kind, anchor).await;
    if let Err(e) = &result {
        tracing::warn!("{} source unusable: {}", kind, e);
    }
    result
}

async fn read_and_process(
    client: &reqwest::Client,
    location: &SourceLocation,
    kind: SourceKind,
    anchor: &str,
) -> SourceResult {
    let bytes = source::read_location(client, location).await?;
    let name = location.to_string();
    let anchor = anchor.to_string();

    tokio::task::spawn_blocking(move || {
        let grid = load_raw_grid_from_bytes(&bytes, &name)?;
        process_source(&grid, kind, &anchor)
    })
    .await
    .unwrap_or_else(|e| {
        Err(SourceError::Unreadable {
            location: location.to_string(),
            reason: format!("worker failed: {}", e),
        })
    })
}

/// Class and lab tables, processed independently and concurrently.
#[derive(Debug)]
pub struct LoadedSources {
    pub class: SourceResult,
    pub lab: SourceResult,
}

pub async fn load_sources(
    client: &reqwest::Client,
    class: (&SourceLocation, &str),
    lab: (&SourceLocation, &str),
) -> LoadedSources {
    let (class, lab) = tokio::join!(
        load_source(client, class.0, SourceKind::Class, class.1),
        load_source(client, lab.0, SourceKind::Lab, lab.1),
    );
    LoadedSources { class, lab }
}
