use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

use super::request_error_response;
use crate::algorithm::{entries_to_csv, generate_timetable, TimetableOutcome};
use crate::api_json::{parse_timetable_request, TimetableResponse};
use crate::error::RequestError;
use crate::server::AppState;

/// Shared front half of both generate endpoints: parse, check the session,
/// load the sources and run the matcher.
async fn run_generation(state: &AppState, body: serde_json::Value) -> Result<TimetableOutcome, HttpResponse> {
    let selection = match parse_timetable_request(body) {
        Ok(r) => r.into_selection(),
        Err(e) => {
            return Err(HttpResponse::BadRequest().json(json!({"success": false, "error": format!("invalid request: {}", e)})));
        }
    };
    if selection.subjects.is_empty() {
        return Err(request_error_response(&RequestError::NoSubjectsSelected));
    }

    let Some(context) = state.session.read().await.clone() else {
        return Err(request_error_response(&RequestError::MappingNotInitialised));
    };

    let sources = state.load_sources().await;
    generate_timetable(&sources, &selection, &context).map_err(|e| request_error_response(&e))
}

/// POST /api/generate
pub async fn generate_handler(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> impl Responder {
    match run_generation(&state, body.into_inner()).await {
        Ok(outcome) => HttpResponse::Ok().json(TimetableResponse::from_outcome(&outcome)),
        Err(resp) => resp,
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CsvQuery {
    /// `entries` for the flat Day,Time,Subject,Room listing; grid otherwise.
    #[serde(default)]
    pub format: Option<String>,
}

/// POST /api/generate/csv
pub async fn generate_csv_handler(
    state: web::Data<AppState>,
    query: web::Query<CsvQuery>,
    body: web::Json<serde_json::Value>,
) -> impl Responder {
    let outcome = match run_generation(&state, body.into_inner()).await {
        Ok(o) => o,
        Err(resp) => return resp,
    };

    let rendered = match query.format.as_deref() {
        Some("entries") => entries_to_csv(&outcome.entries),
        _ => outcome.grid.to_csv(),
    };
    match rendered {
        Ok(text) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .append_header(("Content-Disposition", "attachment; filename=\"my_timetable.csv\""))
            .body(text),
        Err(e) => HttpResponse::InternalServerError().json(json!({"success": false, "error": e.to_string()})),
    }
}
