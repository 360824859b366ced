pub mod cli;
pub mod config;
pub mod handlers;
pub mod managers;
pub mod test_utils;
pub mod validation;

use axum::http::StatusCode;
use mcpdeck_shared::DeckError;
use std::sync::Arc;

pub struct AppState {
    pub config: config::AppConfig,
    pub mcp: managers::McpCli,
}

impl AppState {
    #[must_use]
    pub fn new(config: config::AppConfig, runner: Arc<dyn managers::CommandRunner>) -> Self {
        let mcp = managers::McpCli::new(runner, config.default_scope, config.detail_concurrency);
        Self { config, mcp }
    }
}

pub enum AppError {
    Deck(DeckError),
    /// A CLI failure while looking up one server; a failed run means "not found".
    Lookup(DeckError),
    /// A failed `mcp list`. Always a server-side fault, but the CLI's
    /// diagnostics are kept.
    Listing(DeckError),
    Internal(anyhow::Error),
}

/// Standard error envelope shared by every route.
#[must_use]
pub fn error_body(err_type: &str, message: &str, details: Option<&str>) -> serde_json::Value {
    let mut error = serde_json::json!({
        "type": err_type,
        "message": message,
    });
    if let Some(details) = details {
        error["details"] = serde_json::Value::String(details.trim().to_string());
    }
    serde_json::json!({
        "status": "error",
        "error": error,
    })
}

fn classify(err: &DeckError) -> (StatusCode, &'static str, String, Option<String>) {
    match err {
        DeckError::CommandFailed { stderr, .. } => (
            StatusCode::BAD_REQUEST,
            "CommandFailed",
            err.to_string(),
            Some(stderr.clone()),
        ),
        DeckError::SpawnFailed(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "SpawnFailed",
            "Failed to run CLI".to_string(),
            Some(msg.clone()),
        ),
        DeckError::Timeout(_) => (
            StatusCode::GATEWAY_TIMEOUT,
            "Timeout",
            err.to_string(),
            None,
        ),
        DeckError::ValidationError(m) => (StatusCode::BAD_REQUEST, "ValidationError", m.clone(), None),
    }
}

impl AppError {
    /// Status, type, message and details for the response body.
    #[must_use]
    pub fn parts(&self) -> (StatusCode, String, String, Option<String>) {
        match self {
            AppError::Deck(e) => {
                let (status, t, m, d) = classify(e);
                (status, t.to_string(), m, d)
            }
            AppError::Lookup(e) => {
                let (status, t, m, d) = classify(e);
                if matches!(e, DeckError::CommandFailed { .. }) {
                    (
                        StatusCode::NOT_FOUND,
                        "NotFound".to_string(),
                        "MCP server not found".to_string(),
                        d,
                    )
                } else {
                    (status, t.to_string(), m, d)
                }
            }
            AppError::Listing(e) => {
                let (status, t, m, d) = classify(e);
                let status = if status == StatusCode::GATEWAY_TIMEOUT {
                    status
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (
                    status,
                    t.to_string(),
                    "Failed to list MCP servers".to_string(),
                    d.or(Some(m)),
                )
            }
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "InternalError".to_string(),
                "An internal error occurred".to_string(),
                None,
            ),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if let AppError::Internal(e) = &self {
            // Log full error server-side only; return generic message to client
            tracing::error!("Internal error: {:#}", e);
        }
        let (status, err_type, message, details) = self.parts();
        let body = axum::Json(error_body(&err_type, &message, details.as_deref()));
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<DeckError> for AppError {
    fn from(err: DeckError) -> Self {
        AppError::Deck(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// All routes, with `/api/mcp` as the mount point.
pub fn build_router(state: Arc<AppState>) -> axum::Router {
    use axum::routing::{delete, get, post};
    use handlers::mcp;

    let mcp_routes = axum::Router::new()
        .route("/config/list", get(mcp::config_list))
        .route("/cli/list", get(mcp::cli_list))
        .route("/cli/add", post(mcp::cli_add))
        .route("/cli/remove/:name", delete(mcp::cli_remove))
        .route("/cli/get/:name", get(mcp::cli_get))
        .route("/servers/test", post(mcp::test_server_config))
        .route("/servers", get(mcp::list_servers))
        .route("/servers/:id/test", post(mcp::test_existing_server))
        .route("/servers/:id/tools", post(mcp::discover_tools))
        .fallback(mcp::not_found)
        .with_state(state);

    axum::Router::new()
        .route("/api/version", get(handlers::version_handler))
        .nest("/api/mcp", mcp_routes)
}

/// Server entry point
pub async fn run_server() -> anyhow::Result<()> {
    use crate::config::AppConfig;
    use crate::managers::ProcessRunner;
    use tower_http::cors::CorsLayer;
    use tower_http::trace::TraceLayer;
    use tracing::info;

    let config = AppConfig::load()?;
    info!(
        "📍 Loaded Config: CLI={}, SCOPE={}, CLAUDE_CONFIG={}",
        config.cli_bin,
        config.default_scope,
        config.claude_config_path.display()
    );

    let runner = Arc::new(ProcessRunner::new(
        config.cli_bin.clone(),
        config.cli_timeout,
        config.cli_extra_path.clone(),
    ));
    let state = Arc::new(AppState::new(config.clone(), runner));

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(config.cors_origins.clone())
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::DELETE,
                ])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        );

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.bind_address, config.port)).await?;
    info!(
        "🚀 mcpdeck is listening on http://{}:{}",
        config.bind_address, config.port
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("🛑 Graceful shutdown signal received. Stopping server...");
        })
        .await?;
    Ok(())
}
