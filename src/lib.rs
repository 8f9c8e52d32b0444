// Library root of the `timetable_extractor` crate.
// The pipeline runs excel (ingestion) -> subjects (vocabulary) -> algorithm
// (matching and grid); `server` exposes it over HTTP.
pub mod algorithm;
pub mod api_json;
pub mod config;
pub mod error;
pub mod excel;
pub mod models;
pub mod server;
pub mod subjects;

pub use algorithm::{generate_timetable, TimetableOutcome, UnifiedGrid};
pub use config::AppConfig;
pub use error::{OracleError, RequestError, SourceError};
pub use server::run_server;
