use anyhow::Context;
use axum::http::HeaderValue;
use mcpdeck_shared::Scope;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Returns the directory containing the running executable.
/// Falls back to CWD if the exe path cannot be determined.
#[must_use]
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(std::path::Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub bind_address: String,
    pub cors_origins: Vec<HeaderValue>,
    /// Executable that provides the `mcp` subcommands.
    pub cli_bin: String,
    pub cli_timeout: Duration,
    /// Directories searched before the inherited PATH when spawning the CLI.
    pub cli_extra_path: Vec<String>,
    pub detail_concurrency: usize,
    pub default_scope: Scope,
    pub claude_config_path: PathBuf,
}

fn parse_ranged<T>(key: &str, default: &str, min: T, max: T) -> anyhow::Result<T>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .with_context(|| format!("Failed to parse {}", key))?;
    if value < min || value > max {
        anyhow::bail!(
            "{} must be between {} and {} (got {})",
            key,
            min,
            max,
            value
        );
    }
    Ok(value)
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let port_str = env::var("PORT").unwrap_or_else(|_| "3001".to_string());
        let port = port_str.parse::<u16>().map_err(|_| {
            anyhow::anyhow!(
                "Invalid PORT value '{}': must be an integer between 1 and 65535",
                port_str
            )
        })?;

        if port == 0 {
            anyhow::bail!("Invalid PORT value '0': must be between 1 and 65535");
        }

        // Loopback only unless BIND_ADDRESS says otherwise.
        let bind_address = match env::var("BIND_ADDRESS") {
            Ok(addr) => {
                addr.parse::<std::net::IpAddr>()
                    .with_context(|| format!(
                        "Invalid BIND_ADDRESS '{}': must be a valid IP address (e.g., '127.0.0.1' or '::1')",
                        addr
                    ))?;
                addr
            }
            Err(_) => "127.0.0.1".to_string(),
        };

        let cors_origins_str = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string());

        let cors_origins: Vec<HeaderValue> = cors_origins_str
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
                    tracing::warn!("Skipping CORS origin with invalid scheme '{}': must be http:// or https://", trimmed);
                    return None;
                }
                match trimmed.parse::<HeaderValue>() {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!("Skipping invalid CORS origin '{}': {}", trimmed, e);
                        None
                    }
                }
            })
            .collect();

        let cli_bin = env::var("MCP_CLI_BIN")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "claude".to_string());

        let cli_timeout_secs = parse_ranged::<u64>("MCP_CLI_TIMEOUT_SECS", "30", 1, 600)?;

        let cli_extra_path = env::var("MCP_CLI_EXTRA_PATH")
            .unwrap_or_else(|_| "/usr/local/bin".to_string())
            .split(':')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let detail_concurrency = parse_ranged::<usize>("MCP_DETAIL_CONCURRENCY", "8", 1, 64)?;

        let default_scope = env::var("MCP_DEFAULT_SCOPE")
            .unwrap_or_else(|_| "user".to_string())
            .parse::<Scope>()
            .context("Failed to parse MCP_DEFAULT_SCOPE")?;
        if !matches!(default_scope, Scope::User | Scope::Local | Scope::Project) {
            anyhow::bail!(
                "MCP_DEFAULT_SCOPE must be one of user, local, project (got {})",
                default_scope
            );
        }

        let claude_config_path = match env::var("CLAUDE_CONFIG_PATH") {
            Ok(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => crate::managers::claude_config::default_config_path()
                .context("Could not determine home directory; set CLAUDE_CONFIG_PATH")?,
        };

        Ok(Self {
            port,
            bind_address,
            cors_origins,
            cli_bin,
            cli_timeout: Duration::from_secs(cli_timeout_secs),
            cli_extra_path,
            detail_concurrency,
            default_scope,
            claude_config_path,
        })
    }
}
