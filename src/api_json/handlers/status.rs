use actix_web::{web, HttpResponse, Responder};

use crate::api_json::StatusResponse;
use crate::server::AppState;

/// GET /api/status
/// Configured source locations and whether each currently resolves.
pub async fn status_handler(state: web::Data<AppState>) -> impl Responder {
    let config = &state.config;
    HttpResponse::Ok().json(StatusResponse {
        class_file_loaded: config.class_source.is_resolvable(),
        lab_file_loaded: config.lab_source.is_resolvable(),
        class_file_path: config.class_source.clone(),
        lab_file_path: config.lab_source.clone(),
        oracle_configured: state.oracle.is_some(),
    })
}
