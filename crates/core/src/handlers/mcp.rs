use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use mcpdeck_shared::{DeckError, Scope};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::managers::{claude_config, TestFailure};
use crate::validation::{check_name, AddServerRequest, ServerSpec};
use crate::{error_body, AppError, AppResult, AppState};

/// Routes served under `/api/mcp`, reported by the 404 fallback.
pub const AVAILABLE_ROUTES: &[&str] = &[
    "GET /api/mcp/config/list",
    "GET /api/mcp/cli/list",
    "POST /api/mcp/cli/add",
    "DELETE /api/mcp/cli/remove/:name",
    "GET /api/mcp/cli/get/:name",
    "POST /api/mcp/servers/test",
    "GET /api/mcp/servers",
    "POST /api/mcp/servers/:serverId/test",
    "POST /api/mcp/servers/:serverId/tools",
];

#[derive(Debug, Deserialize)]
pub struct ConfigListQuery {
    #[serde(rename = "projectPath")]
    pub project_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub scope: Option<Scope>,
}

/// List MCP servers from the assistant's JSON config file.
///
/// **Route:** `GET /api/mcp/config/list?projectPath=<path>`
///
/// Servers of `projectPath` come first; global servers follow unless a
/// project server already uses the name. An absent or unreadable file still
/// answers 200 with an empty list; `config_state` tells the two apart.
pub async fn config_list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConfigListQuery>,
) -> Json<serde_json::Value> {
    info!(path = %state.config.claude_config_path.display(), "📋 Reading MCP servers from config");
    let load = claude_config::load_servers(
        &state.config.claude_config_path,
        query.project_path.as_deref(),
    )
    .await;

    Json(serde_json::json!({
        "success": true,
        "servers": load.servers,
        "source": "config",
        "config_state": load.state,
    }))
}

/// List MCP servers via the CLI, enriched with per-server details.
///
/// **Route:** `GET /api/mcp/cli/list`
pub async fn cli_list(State(state): State<Arc<AppState>>) -> AppResult<Json<serde_json::Value>> {
    let listing = state.mcp.list_detailed().await.map_err(AppError::Listing)?;
    Ok(Json(serde_json::json!({
        "success": true,
        "output": listing.output,
        "servers": listing.servers,
    })))
}

/// Add an MCP server via the CLI.
///
/// **Route:** `POST /api/mcp/cli/add`
///
/// # Request Body
/// ```json
/// { "name": "fs", "type": "stdio", "command": "npx", "args": ["-y", "server"], "env": {} }
/// ```
///
/// # Response
/// - **200 OK:** `{ "success": true, "output": "...", "message": "..." }`
/// - **400 Bad Request:** validation failure, or the CLI rejected the entry
pub async fn cli_add(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddServerRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let scope = body.scope;
    let spec = ServerSpec::try_from(body)?;
    let output = state.mcp.add(&spec, scope).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "output": output,
        "message": format!("MCP server \"{}\" added successfully", spec.name),
    })))
}

/// Remove an MCP server via the CLI.
///
/// **Route:** `DELETE /api/mcp/cli/remove/:name?scope=<scope>`
pub async fn cli_remove(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<serde_json::Value>> {
    check_name(&name)?;
    let output = state.mcp.remove(&name, query.scope).await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "output": output,
        "message": format!("MCP server \"{}\" removed successfully", name),
    })))
}

/// Get one MCP server's details via the CLI.
///
/// **Route:** `GET /api/mcp/cli/get/:name?scope=<scope>`
///
/// # Response
/// - **200 OK:** `{ "success": true, "output": "...", "server": { ... } }`
/// - **404 Not Found:** the CLI reported a failure for this name
pub async fn cli_get(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<serde_json::Value>> {
    check_name(&name)?;
    let (output, server) = state
        .mcp
        .get(&name, query.scope)
        .await
        .map_err(AppError::Lookup)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "output": output,
        "server": server,
    })))
}

/// Test a server configuration by adding it under a temporary name, reading
/// it back and removing it again.
///
/// **Route:** `POST /api/mcp/servers/test`
///
/// Validation happens before any CLI call. Once the temporary entry exists,
/// it is removed even if reading it back fails.
pub async fn test_server_config(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AddServerRequest>,
) -> AppResult<Response> {
    let spec = ServerSpec::try_from(body)?;
    info!(name = %spec.name, transport = %spec.transport(), "🧪 Testing MCP server configuration");

    match state.mcp.test_config(&spec).await {
        Ok(report) => Ok(Json(serde_json::json!({
            "success": true,
            "message": format!("MCP server configuration \"{}\" test completed successfully", spec.name),
            "tested": spec,
            "serverDetails": report.server_details,
            "note": "Test performed by temporarily adding and removing the server configuration",
        }))
        .into_response()),
        Err(TestFailure {
            temp_name,
            error,
            cleaned_up,
        }) => {
            error!(name = %spec.name, temp = %temp_name, error = %error, cleaned_up, "MCP server configuration test failed");
            if matches!(error, DeckError::SpawnFailed(_) | DeckError::Timeout(_)) {
                return Err(AppError::Deck(error));
            }
            let details = match &error {
                DeckError::CommandFailed { stderr, .. } => stderr.trim().to_string(),
                other => other.to_string(),
            };
            let mut body = error_body(
                "TestFailed",
                "MCP server configuration test failed",
                Some(&details),
            );
            body["tested"] = serde_json::json!(spec);
            body["suggestion"] = serde_json::json!(
                "Check server configuration. Common issues: invalid command path, incorrect URL, missing dependencies"
            );
            Ok((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

/// List MCP servers (fallback listing used by the UI).
///
/// **Route:** `GET /api/mcp/servers?scope=<scope>`
pub async fn list_servers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let scope = query.scope.unwrap_or_else(|| state.mcp.default_scope());
    let listing = state.mcp.list_detailed().await.map_err(AppError::Listing)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "servers": listing.servers,
        "scope": scope,
        "message": "MCP servers listed successfully",
    })))
}

/// Validate an existing server by retrieving its configuration.
///
/// **Route:** `POST /api/mcp/servers/:id/test?scope=<scope>`
pub async fn test_existing_server(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<serde_json::Value>> {
    check_name(&id)?;
    let scope = query.scope.unwrap_or_else(|| state.mcp.default_scope());
    info!(server_id = %id, %scope, "🧪 Testing existing MCP server");

    let (_, server) = state
        .mcp
        .get(&id, query.scope)
        .await
        .map_err(AppError::Lookup)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "serverId": id,
        "message": "Connected",
        "server": server,
        "scope": scope,
        "note": "Server validated by retrieving configuration details",
    })))
}

/// Tool discovery. The CLI offers no discovery command, so the tool list is
/// always empty once the server is confirmed to exist.
///
/// **Route:** `POST /api/mcp/servers/:id/tools?scope=<scope>`
pub async fn discover_tools(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ScopeQuery>,
) -> AppResult<Json<serde_json::Value>> {
    check_name(&id)?;
    let scope = query.scope.unwrap_or_else(|| state.mcp.default_scope());
    let (_, server) = state
        .mcp
        .get(&id, query.scope)
        .await
        .map_err(AppError::Lookup)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "serverId": id,
        "tools": [],
        "server": server,
        "message": format!("MCP server \"{}\" found, but automatic tool discovery is not available", id),
        "note": "The CLI does not provide a tools discovery command. Tools become available when the server is used in a session.",
        "scope": scope,
    })))
}

/// 404 for anything under `/api/mcp` that no route matched.
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "MCP endpoint not found",
            "method": method.as_str(),
            "requested": uri.to_string(),
            "available": AVAILABLE_ROUTES,
        })),
    )
}
