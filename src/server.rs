use crate::config::ServerConfig;
use crate::models::CapturePayload;
use crate::output;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use log::{error, info};
use serde_json::json;
use std::sync::Arc;

pub fn router(config: ServerConfig) -> Router {
    let state = Arc::new(config);

    Router::new()
        .route("/health", get(health))
        .route("/capture_prompt", post(capture_prompt))
        // Pasted prompts can be large; no cap on the body
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let addr = config.bind_addr.clone();
    info!("Prompt capture listening on {}", addr);
    info!("Fallback log: {}", config.fallback_log.display());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(config)).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

async fn capture_prompt(
    State(config): State<Arc<ServerConfig>>,
    Json(payload): Json<CapturePayload>,
) -> impl IntoResponse {
    match output::append_entry(&config, &payload) {
        Ok(path) => {
            info!("Captured prompt to {}", path.display());
            (StatusCode::OK, Json(json!({ "status": "ok" })))
        }
        Err(e) => {
            error!("Failed to capture prompt: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "error": format!("{:#}", e) })),
            )
        }
    }
}
