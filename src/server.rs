use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api_json::handlers::{
    generate_csv_handler, generate_handler, help_handler, status_handler, subjects_handler,
};
use crate::config::AppConfig;
use crate::excel::{load_sources, LoadedSources};
use crate::models::SubjectContext;
use crate::subjects::{GroqOracle, SubjectOracle};

/// Shared by all workers. The session mapping is replaced by `/api/subjects`
/// and only read by the generate endpoints.
pub struct AppState {
    pub config: AppConfig,
    pub session: RwLock<Option<SubjectContext>>,
    pub oracle: Option<Arc<dyn SubjectOracle>>,
    pub http: reqwest::Client,
}

impl AppState {
    /// Builds the state, wiring the Groq oracle when an API key is configured.
    pub fn new(config: AppConfig) -> Self {
        let oracle: Option<Arc<dyn SubjectOracle>> = match &config.groq_api_key {
            Some(key) => match GroqOracle::new(key, &config.groq_base_url) {
                Ok(o) => Some(Arc::new(o)),
                Err(e) => {
                    tracing::warn!("oracle disabled: {}", e);
                    None
                }
            },
            None => {
                tracing::info!("no GROQ_API_KEY set, subject grouping uses the first-token rule");
                None
            }
        };
        AppState::with_oracle(config, oracle)
    }

    pub fn with_oracle(config: AppConfig, oracle: Option<Arc<dyn SubjectOracle>>) -> Self {
        AppState {
            config,
            session: RwLock::new(None),
            oracle,
            http: reqwest::Client::new(),
        }
    }

    /// Loads and processes both configured sources.
    pub async fn load_sources(&self) -> LoadedSources {
        load_sources(
            &self.http,
            (&self.config.class_source, &self.config.class_anchor),
            (&self.config.lab_source, &self.config.lab_anchor),
        )
        .await
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/status", web::get().to(status_handler))
        .route("/api/subjects", web::post().to(subjects_handler))
        .route("/api/generate", web::post().to(generate_handler))
        .route("/api/generate/csv", web::post().to(generate_csv_handler))
        .route("/help", web::get().to(help_handler));
}

pub async fn run_server(config: AppConfig) -> std::io::Result<()> {
    let bind_addr = config.bind_addr.clone();
    tracing::info!("class source: {}", config.class_source);
    tracing::info!("lab source: {}", config.lab_source);

    let state = web::Data::new(AppState::new(config));
    tracing::info!("listening on http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(configure_routes)
    })
    .bind(bind_addr)?
    .run()
    .await
}
