use actix_web::{test, web, App};
use async_trait::async_trait;
use serde_json::json;
use std::io::Write;
use std::sync::Arc;

use timetable_extractor::api_json::{SubjectResponse, TimetableResponse, NO_MATCHES_MESSAGE};
use timetable_extractor::config::AppConfig;
use timetable_extractor::excel::SourceLocation;
use timetable_extractor::models::{MappingSource, SubjectMapping};
use timetable_extractor::server::{configure_routes, AppState};
use timetable_extractor::subjects::{OracleOptions, SubjectOracle};
use timetable_extractor::OracleError;

const CLASS_CSV: &str = "\
Institute Time Table,,
Classroom No.,Days,9:00-10:00,1:00-2:00
CR1,Mon,DIP-TJ(301) / FML-ND,
,Wed,,DIP-TJ
";

const LAB_CSV: &str = "\
Lab Name/ No.,Day,9:00,10:00
EL-1,Tue,DIP-LAB ECE,
";

struct GroupingOracle;

#[async_trait]
impl SubjectOracle for GroupingOracle {
    async fn suggest(&self, candidates: &[String], _options: &OracleOptions) -> Result<SubjectMapping, OracleError> {
        Ok(candidates
            .iter()
            .filter(|c| c.starts_with("DIP"))
            .map(|c| ("Image Processing".to_string(), c.clone()))
            .collect())
    }
}

struct Fixtures {
    _class: tempfile::NamedTempFile,
    _lab: tempfile::NamedTempFile,
    config: AppConfig,
}

fn fixtures() -> Fixtures {
    let mut class = tempfile::NamedTempFile::new().expect("temp file");
    class.write_all(CLASS_CSV.as_bytes()).expect("write class");
    let mut lab = tempfile::NamedTempFile::new().expect("temp file");
    lab.write_all(LAB_CSV.as_bytes()).expect("write lab");

    let config = AppConfig {
        class_source: SourceLocation::Local(class.path().to_path_buf()),
        lab_source: SourceLocation::Local(lab.path().to_path_buf()),
        ..AppConfig::default()
    };
    Fixtures { _class: class, _lab: lab, config }
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data(web::Data::new($state)).configure(configure_routes)).await
    };
}

#[actix_web::test]
async fn status_reports_locations() {
    let fx = fixtures();
    let mut config = fx.config.clone();
    config.lab_source = SourceLocation::parse("/missing/lab.csv");
    let app = app!(AppState::with_oracle(config, None));

    let req = test::TestRequest::get().uri("/api/status").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["class_file_loaded"], true);
    assert_eq!(body["lab_file_loaded"], false);
    assert_eq!(body["lab_file_path"], "/missing/lab.csv");
    assert_eq!(body["oracle_configured"], false);
}

#[actix_web::test]
async fn generate_before_subjects_is_rejected() {
    let fx = fixtures();
    let app = app!(AppState::with_oracle(fx.config.clone(), None));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"selected_subjects": ["DIP"]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn empty_selection_is_rejected() {
    let fx = fixtures();
    let app = app!(AppState::with_oracle(fx.config.clone(), None));

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"selected_subjects": ["  "]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "no subjects selected");
}

#[actix_web::test]
async fn identity_subjects_then_generate() {
    let fx = fixtures();
    let app = app!(AppState::with_oracle(fx.config.clone(), None));

    let req = test::TestRequest::post().uri("/api/subjects").set_json(json!({})).to_request();
    let subjects: SubjectResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(subjects.source, MappingSource::Identity);
    assert!(!subjects.used_ai);
    assert_eq!(subjects.subjects, vec!["DIP-TJ", "DIP-TJ(301) / FML-ND"]);

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"selected_subjects": ["DIP"], "batch": "B2"}))
        .to_request();
    let out: TimetableResponse = test::call_and_read_body_json(&app, req).await;
    assert!(out.success);
    assert_eq!(out.days, vec!["Monday", "Tuesday", "Wednesday"]);
    assert_eq!(out.columns, vec!["09:00 - 10:00", "10:00 - 11:00", "13:00 - 14:00"]);
    let data = out.data.expect("grid data");
    assert_eq!(data["09:00 - 10:00"]["Monday"], "DIP (301)");
    assert_eq!(data["10:00 - 11:00"]["Tuesday"], "DIP (EL-1)");
    assert_eq!(data["13:00 - 14:00"]["Wednesday"], "DIP (CR1)");
}

#[actix_web::test]
async fn oracle_mapping_drives_exact_matches() {
    let fx = fixtures();
    let oracle: Arc<dyn SubjectOracle> = Arc::new(GroupingOracle);
    let app = app!(AppState::with_oracle(fx.config.clone(), Some(oracle)));

    let req = test::TestRequest::post()
        .uri("/api/subjects")
        .set_json(json!({"use_ai": true, "model_name": "test-model"}))
        .to_request();
    let subjects: SubjectResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(subjects.source, MappingSource::Oracle);
    assert_eq!(subjects.subjects, vec!["Image Processing"]);

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"selected_subjects": ["Image Processing"]}))
        .to_request();
    let out: TimetableResponse = test::call_and_read_body_json(&app, req).await;
    assert!(out.success);
    let data = out.data.expect("grid data");
    assert_eq!(data["09:00 - 10:00"]["Monday"], "Image Processing (301)");
    assert_eq!(data["13:00 - 14:00"]["Wednesday"], "Image Processing (CR1)");
    // the lab cell is no alias and its first token is not a selected name
    assert!(!data["09:00 - 10:00"].contains_key("Tuesday"));
    assert!(!data.contains_key("10:00 - 11:00"));
}

#[actix_web::test]
async fn unavailable_oracle_uses_first_tokens() {
    let fx = fixtures();
    let app = app!(AppState::with_oracle(fx.config.clone(), None));

    let req = test::TestRequest::post().uri("/api/subjects").set_json(json!({"use_ai": true})).to_request();
    let subjects: SubjectResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(subjects.source, MappingSource::FirstTokenFallback);
    assert_eq!(subjects.subjects, vec!["DIP", "FML"]);
}

#[actix_web::test]
async fn no_matches_is_not_an_error() {
    let fx = fixtures();
    let app = app!(AppState::with_oracle(fx.config.clone(), None));

    let req = test::TestRequest::post().uri("/api/subjects").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let req = test::TestRequest::post()
        .uri("/api/generate")
        .set_json(json!({"selected_subjects": ["Radar"]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let out: TimetableResponse = test::read_body_json(resp).await;
    assert!(!out.success);
    assert!(out.data.is_none());
    assert_eq!(out.message.as_deref(), Some(NO_MATCHES_MESSAGE));
}

#[actix_web::test]
async fn csv_exports() {
    let fx = fixtures();
    let app = app!(AppState::with_oracle(fx.config.clone(), None));

    let req = test::TestRequest::post().uri("/api/subjects").set_json(json!({})).to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri("/api/generate/csv")
        .set_json(json!({"selected_subjects": ["FML"]}))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, "Day,09:00 - 10:00\nMonday,FML (CR1)\n");

    let req = test::TestRequest::post()
        .uri("/api/generate/csv?format=entries")
        .set_json(json!({"selected_subjects": ["FML"]}))
        .to_request();
    let body = test::call_and_read_body(&app, req).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text, "Day,Time,Subject,Room\nMonday,09:00 - 10:00,FML,CR1\n");
}

#[actix_web::test]
async fn subjects_without_any_source_fail() {
    let config = AppConfig {
        class_source: SourceLocation::parse("/missing/class.xlsx"),
        lab_source: SourceLocation::parse("/missing/lab.csv"),
        ..AppConfig::default()
    };
    let app = app!(AppState::with_oracle(config, None));

    let req = test::TestRequest::post().uri("/api/subjects").set_json(json!({})).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn help_lists_endpoints() {
    let app = app!(AppState::with_oracle(AppConfig::default(), None));
    let req = test::TestRequest::get().uri("/help").to_request();
    let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["endpoints"]["POST /api/generate"].is_string());
}
