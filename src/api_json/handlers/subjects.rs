use actix_web::{web, HttpResponse, Responder};

use super::request_error_response;
use crate::algorithm::collect_raw_values;
use crate::api_json::{SubjectRequest, SubjectResponse};
use crate::server::AppState;
use crate::subjects::{normalize_subjects, Strategy};

/// POST /api/subjects
/// Re-reads both sources, normalizes the subject vocabulary and replaces the
/// session mapping with the result. An empty body means identity mapping.
pub async fn subjects_handler(state: web::Data<AppState>, body: Option<web::Json<SubjectRequest>>) -> impl Responder {
    let req = body.map(web::Json::into_inner).unwrap_or_default();

    let sources = state.load_sources().await;
    let raw_values = match collect_raw_values(&sources) {
        Ok(v) => v,
        Err(e) => return request_error_response(&e),
    };

    let strategy = if req.use_ai {
        Strategy::Oracle {
            oracle: state.oracle.as_deref(),
            options: state.config.oracle_options(req.model_name.as_deref()),
        }
    } else {
        Strategy::Identity
    };
    let context = normalize_subjects(&raw_values, strategy).await;
    tracing::info!("{} subjects ({:?})", context.mapping.len(), context.source);

    let resp = SubjectResponse {
        subjects: context.mapping.subjects(),
        mapping: context.mapping.clone(),
        source: context.source,
        used_ai: context.used_oracle(),
    };
    *state.session.write().await = Some(context);

    HttpResponse::Ok().json(resp)
}
