//! Request / response bodies of the HTTP API.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::algorithm::{SourceFailure, TimetableOutcome, UnifiedGrid};
use crate::excel::SourceLocation;
use crate::models::{MappingSource, Selection, SubjectMapping};

/// Body of `POST /api/subjects`.
///
/// ```json
/// { "use_ai": true, "model_name": "openai/gpt-oss-120b" }
/// ```
///
/// - `use_ai`: group raw values with the external oracle (default `false`,
///   identity mapping)
/// - `model_name`: model selector forwarded to the oracle (optional)
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SubjectRequest {
    #[serde(default)]
    pub use_ai: bool,
    #[serde(default)]
    pub model_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectResponse {
    pub subjects: Vec<String>,
    pub mapping: SubjectMapping,
    pub source: MappingSource,
    pub used_ai: bool,
}

/// Body of `POST /api/generate` and `POST /api/generate/csv`.
///
/// ```json
/// {
///   "selected_subjects": ["DIP", "FML"],
///   "branch": "ECE",
///   "batch": null
/// }
/// ```
///
/// - `selected_subjects`: canonical names from `/api/subjects` (required, non-empty)
/// - `branch`: substring lab entries must contain, case-insensitive (optional)
/// - `batch`: accepted for older clients and ignored
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TimetableRequest {
    pub selected_subjects: Vec<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub batch: Option<String>,
}

impl TimetableRequest {
    pub fn into_selection(self) -> Selection {
        if let Some(batch) = self.batch.as_deref().filter(|b| !b.trim().is_empty()) {
            tracing::debug!("ignoring deprecated batch filter '{}'", batch);
        }
        Selection::new(self.selected_subjects, self.branch)
    }
}

pub fn parse_timetable_request(body: serde_json::Value) -> Result<TimetableRequest, serde_json::Error> {
    serde_json::from_value(body)
}

pub const NO_MATCHES_MESSAGE: &str = "No matching classes found";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimetableResponse {
    pub success: bool,
    /// Time → day → cell content.
    pub data: Option<BTreeMap<String, BTreeMap<String, String>>>,
    /// Time labels in display order.
    pub columns: Vec<String>,
    /// Day labels in display order.
    pub days: Vec<String>,
    pub message: Option<String>,
    pub source_errors: Vec<SourceFailure>,
    pub generated_at: DateTime<Utc>,
}

impl TimetableResponse {
    pub fn from_outcome(outcome: &TimetableOutcome) -> Self {
        let grid: &UnifiedGrid = &outcome.grid;
        let success = outcome.has_matches();
        TimetableResponse {
            success,
            data: success.then(|| grid.to_column_map()),
            columns: grid.times.clone(),
            days: grid.days().into_iter().map(String::from).collect(),
            message: (!success).then(|| NO_MATCHES_MESSAGE.to_string()),
            source_errors: outcome.source_errors.clone(),
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub class_file_loaded: bool,
    pub lab_file_loaded: bool,
    pub class_file_path: SourceLocation,
    pub lab_file_path: SourceLocation,
    pub oracle_configured: bool,
}
