use actix_web::{HttpResponse, Responder};
use serde_json::json;

use crate::api_json::{SubjectRequest, TimetableRequest};

/// GET /help
pub async fn help_handler() -> impl Responder {
    let subjects_example = SubjectRequest {
        use_ai: false,
        model_name: None,
    };
    let generate_example = TimetableRequest {
        selected_subjects: vec!["DIP".to_string(), "FML".to_string()],
        branch: Some("ECE".to_string()),
        batch: None,
    };

    HttpResponse::Ok().json(json!({
        "description": "Extracts a personal timetable from the class and lab occupancy sheets.",
        "endpoints": {
            "GET /api/status": "configured source locations and whether they resolve",
            "POST /api/subjects": "normalize the subject vocabulary and store it for this server session",
            "POST /api/generate": "day x time grid for the selected subjects",
            "POST /api/generate/csv": "same grid as CSV; ?format=entries for a flat Day,Time,Subject,Room listing",
        },
        "subjects_example": subjects_example,
        "generate_example": generate_example,
        "note": "call /api/subjects before /api/generate. 'batch' is accepted but ignored.",
    }))
}
