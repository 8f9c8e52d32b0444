pub mod docs;
pub mod generate;
pub mod status;
pub mod subjects;

pub use docs::*;
pub use generate::*;
pub use status::*;
pub use subjects::*;

use actix_web::HttpResponse;
use serde_json::json;

use crate::error::RequestError;

/// Every request-level failure is the caller's to fix: 400 with the reason.
pub(crate) fn request_error_response(e: &RequestError) -> HttpResponse {
    tracing::warn!("request rejected: {}", e);
    HttpResponse::BadRequest().json(json!({"success": false, "error": e.to_string()}))
}
