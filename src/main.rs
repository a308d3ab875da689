use log::{error, info};
use service::{config::Config, logging::Logger, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting event hub (subscriber queue capacity {})",
        config.subscriber_queue_capacity
    );

    let sse_manager = Arc::new(sse::Manager::new(config.subscriber_queue_capacity));
    let app_state = AppState::new(config, &sse_manager);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }

    info!("Server stopped");
}
