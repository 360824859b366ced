use mcpdeck_shared::{Scope, ServerConfig, TransportType};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default location of the assistant CLI's user config.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".claude.json"))
}

/// Outcome of reading the config file.
///
/// `Absent` and `Unreadable` both produce an empty server list, but stay
/// distinguishable for callers that care.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConfigState {
    Loaded,
    Absent,
    Unreadable { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigLoad {
    pub state: ConfigState,
    pub servers: Vec<ServerConfig>,
}

impl ConfigLoad {
    fn empty(state: ConfigState) -> Self {
        Self {
            state,
            servers: Vec::new(),
        }
    }
}

/// Read `path` and merge project-scoped and global servers.
pub async fn load_servers(path: &Path, project_path: Option<&str>) -> ConfigLoad {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No MCP config file, reporting no servers");
            return ConfigLoad::empty(ConfigState::Absent);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read MCP config file");
            return ConfigLoad::empty(ConfigState::Unreadable {
                reason: e.to_string(),
            });
        }
    };

    let root: Value = match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse MCP config file");
            return ConfigLoad::empty(ConfigState::Unreadable {
                reason: format!("invalid JSON: {}", e),
            });
        }
    };

    let servers = merge_servers(&root, project_path);
    info!(
        path = %path.display(),
        count = servers.len(),
        project = ?project_path,
        "Loaded MCP servers from config"
    );
    ConfigLoad {
        state: ConfigState::Loaded,
        servers,
    }
}

/// Project entries first, then global entries whose name is not yet taken.
#[must_use]
pub fn merge_servers(root: &Value, project_path: Option<&str>) -> Vec<ServerConfig> {
    let mut servers = Vec::new();

    if let Some(project) = project_path {
        if let Some(entries) = root
            .get("projects")
            .and_then(|p| p.get(project))
            .and_then(|p| p.get("mcpServers"))
            .and_then(Value::as_object)
        {
            for (name, entry) in entries {
                servers.push(server_from_entry(
                    name,
                    entry,
                    Scope::Project,
                    Some(project.to_string()),
                ));
            }
        }
    }

    if let Some(entries) = root.get("mcpServers").and_then(Value::as_object) {
        let mut seen: HashSet<String> = servers.iter().map(|s| s.name.clone()).collect();
        for (name, entry) in entries {
            if seen.insert(name.clone()) {
                servers.push(server_from_entry(name, entry, Scope::Global, None));
            }
        }
    }

    servers
}

fn server_from_entry(
    name: &str,
    entry: &Value,
    scope: Scope,
    project_path: Option<String>,
) -> ServerConfig {
    let empty = Map::new();
    let obj = entry.as_object().unwrap_or(&empty);
    let str_field = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    ServerConfig {
        name: name.to_string(),
        transport: obj
            .get("type")
            .and_then(Value::as_str)
            .map(TransportType::from)
            .unwrap_or_default(),
        command: str_field("command"),
        args: string_list(obj.get("args")),
        env: string_map(obj.get("env")),
        url: str_field("url"),
        headers: string_map(obj.get("headers")),
        disabled: obj.get("disabled").and_then(Value::as_bool).unwrap_or(false),
        auto_approve: string_list(obj.get("autoApprove")),
        scope,
        project_path,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(value: Option<&Value>) -> BTreeMap<String, String> {
    value
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect()
        })
        .unwrap_or_default()
}
