// --- Timetable extractor - HTTP entry point ---

use timetable_extractor::{run_server, AppConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // .env may carry RUST_LOG, so load it before the subscriber.
    let _ = dotenv::dotenv();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("=== Timetable extractor (API) ===");
    run_server(AppConfig::from_env()).await
}
