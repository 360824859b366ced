pub mod mcp;

use axum::Json;

/// Build and version information.
///
/// **Route:** `GET /api/version`
pub async fn version_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
