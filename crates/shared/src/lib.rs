use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Transport an MCP server speaks.
///
/// Unknown tags reported by the CLI (e.g. a future `(WS)`) are kept verbatim
/// in lowercase instead of being coerced to `stdio`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransportType {
    #[default]
    Stdio,
    Http,
    Sse,
    Other(String),
}

impl TransportType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
            Self::Sse => "sse",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for TransportType {
    fn from(s: &str) -> Self {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "" | "stdio" => Self::Stdio,
            "http" => Self::Http,
            "sse" => Self::Sse,
            _ => Self::Other(lower),
        }
    }
}

impl From<String> for TransportType {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<TransportType> for String {
    fn from(t: TransportType) -> Self {
        t.as_str().to_string()
    }
}

impl std::fmt::Display for TransportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Visibility level of a server entry.
///
/// `Project` and `Global` label entries read from the config file; `User`
/// and `Local` are the values accepted by the CLI's `--scope` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Project,
    Global,
    User,
    Local,
}

impl Scope {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Global => "global",
            Self::User => "user",
            Self::Local => "local",
        }
    }
}

impl std::str::FromStr for Scope {
    type Err = DeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "global" => Ok(Self::Global),
            "user" => Ok(Self::User),
            "local" => Ok(Self::Local),
            other => Err(DeckError::ValidationError(format!(
                "Unknown scope '{}': expected one of project, global, user, local",
                other
            ))),
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A server entry read from `~/.claude.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub transport: TransportType,
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub disabled: bool,
    pub auto_approve: Vec<String>,
    pub scope: Scope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    #[default]
    Active,
}

/// One record scraped from `mcp list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedServer {
    pub name: String,
    #[serde(rename = "type")]
    pub transport: TransportType,
    pub status: ServerStatus,
}

/// One record scraped from `mcp get <name>`.
///
/// `raw_output` always carries the unparsed text so nothing is lost when the
/// scraper does not recognize the format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub transport: Option<TransportType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    pub raw_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

/// Connection fields copied from a [`ServerDetails`] onto a listed server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServerEnrichment {
    pub command: String,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl From<ServerDetails> for ServerEnrichment {
    fn from(d: ServerDetails) -> Self {
        Self {
            command: d.command.unwrap_or_default(),
            args: d.args.unwrap_or_default(),
            env: d.env.unwrap_or_default(),
            url: d.url.unwrap_or_default(),
            headers: d.headers.unwrap_or_default(),
        }
    }
}

/// A listed server, enriched with its details when `mcp get` succeeded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedServer {
    #[serde(flatten)]
    pub listed: ListedServer,
    #[serde(flatten, default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ServerEnrichment>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail")]
pub enum DeckError {
    #[error("CLI command failed with code {}: {stderr}", .code.map_or_else(|| "none".to_string(), |c| c.to_string()))]
    CommandFailed { code: Option<i32>, stderr: String },
    #[error("Failed to run CLI: {0}")]
    SpawnFailed(String),
    #[error("CLI command timed out after {0}s")]
    Timeout(u64),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type DeckResult<T> = std::result::Result<T, DeckError>;
