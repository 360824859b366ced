use futures::stream::{self, StreamExt};
use mcpdeck_shared::{DeckError, DeckResult, DetailedServer, Scope, ServerDetails};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use super::cli_bridge::{CommandOutput, CommandRunner};
use super::output_parser::{parse_get_output, parse_list_output};
use crate::validation::{ServerSpec, ServerTarget};

/// High-level `mcp` subcommands on top of a [`CommandRunner`].
#[derive(Clone)]
pub struct McpCli {
    runner: Arc<dyn CommandRunner>,
    default_scope: Scope,
    detail_concurrency: usize,
}

/// Result of `mcp list` plus the per-server detail fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct ServerListing {
    pub output: String,
    pub servers: Vec<DetailedServer>,
}

/// Successful add/get/remove round-trip of a temporary entry.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub server_details: ServerDetails,
}

/// A failed test round-trip. `cleaned_up` tells whether a temporary entry
/// had to be removed after a partial failure.
#[derive(Debug, Clone)]
pub struct TestFailure {
    pub temp_name: String,
    pub error: DeckError,
    pub cleaned_up: bool,
}

impl McpCli {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, default_scope: Scope, detail_concurrency: usize) -> Self {
        Self {
            runner,
            default_scope,
            detail_concurrency: detail_concurrency.max(1),
        }
    }

    #[must_use]
    pub fn default_scope(&self) -> Scope {
        self.default_scope
    }

    async fn run(&self, args: Vec<String>) -> DeckResult<CommandOutput> {
        self.runner.run(&args).await
    }

    /// `mcp list` enriched with `mcp get` per server.
    ///
    /// Detail fetches run concurrently and keep list order; a failed fetch
    /// leaves that entry with only its list-form fields.
    pub async fn list_detailed(&self) -> DeckResult<ServerListing> {
        let output = self.run(list_args()).await?.stdout;
        let listed = parse_list_output(&output);
        info!(count = listed.len(), "📋 Listed MCP servers via CLI");

        let servers = stream::iter(listed)
            .map(|server| async move {
                match self.get(&server.name, None).await {
                    Ok((_, details)) => DetailedServer {
                        listed: server,
                        details: Some(details.into()),
                    },
                    Err(e) => {
                        warn!(name = %server.name, error = %e, "Failed to get MCP server details");
                        DetailedServer {
                            listed: server,
                            details: None,
                        }
                    }
                }
            })
            .buffered(self.detail_concurrency)
            .collect()
            .await;

        Ok(ServerListing { output, servers })
    }

    /// `mcp get`; returns the raw stdout alongside the parsed record.
    pub async fn get(&self, name: &str, scope: Option<Scope>) -> DeckResult<(String, ServerDetails)> {
        let output = self.run(get_args(name, scope)).await?.stdout;
        let details = parse_get_output(&output);
        Ok((output, details))
    }

    pub async fn add(&self, spec: &ServerSpec, scope: Option<Scope>) -> DeckResult<String> {
        let scope = scope.unwrap_or(self.default_scope);
        let output = self.run(add_args(spec, scope)).await?.stdout;
        info!(name = %spec.name, transport = %spec.transport(), %scope, "🔌 MCP server added");
        Ok(output)
    }

    pub async fn remove(&self, name: &str, scope: Option<Scope>) -> DeckResult<String> {
        let scope = scope.unwrap_or(self.default_scope);
        let output = self.run(remove_args(name, scope)).await?.stdout;
        info!(name = %name, %scope, "🗑️ MCP server removed");
        Ok(output)
    }

    /// Add `spec` under a unique temporary name, read it back, then remove it.
    ///
    /// If the add succeeded but a later step failed, the temporary entry is
    /// removed before the error is returned.
    pub async fn test_config(&self, spec: &ServerSpec) -> Result<TestReport, TestFailure> {
        let temp_name = temp_test_name(&spec.name, chrono::Utc::now().timestamp_millis());
        let temp = spec.renamed(temp_name.clone());
        let scope = self.default_scope;

        if let Err(error) = self.add(&temp, Some(scope)).await {
            return Err(TestFailure {
                temp_name,
                error,
                cleaned_up: false,
            });
        }

        let fetched = self.get(&temp_name, None).await;
        let removed = self.remove(&temp_name, Some(scope)).await;

        match (fetched, removed) {
            (Ok((_, server_details)), Ok(_)) => Ok(TestReport { server_details }),
            (Ok(_), Err(error)) => Err(TestFailure {
                temp_name,
                error,
                cleaned_up: false,
            }),
            (Err(error), removed) => {
                if let Err(cleanup) = &removed {
                    warn!(name = %temp_name, error = %cleanup, "Failed to clean up temporary test server");
                }
                Err(TestFailure {
                    temp_name,
                    error,
                    cleaned_up: removed.is_ok(),
                })
            }
        }
    }
}

#[must_use]
pub fn temp_test_name(name: &str, millis: i64) -> String {
    format!("temp-test-{}-{}", name, millis)
}

fn to_args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| (*s).to_string()).collect()
}

#[must_use]
pub fn list_args() -> Vec<String> {
    to_args(&["mcp", "list"])
}

#[must_use]
pub fn get_args(name: &str, scope: Option<Scope>) -> Vec<String> {
    let mut args = to_args(&["mcp", "get", name]);
    if let Some(scope) = scope {
        args.extend(to_args(&["-s", scope.as_str()]));
    }
    args
}

#[must_use]
pub fn remove_args(name: &str, scope: Scope) -> Vec<String> {
    to_args(&["mcp", "remove", "--scope", scope.as_str(), name])
}

/// `mcp add` argument vector.
///
/// Remote: `mcp add --transport <t> --scope <s> <name> <url> [--header "K: V"]...`
/// Stdio:  `mcp add --scope <s> <name> [-e K=V]... <command> [args...]`
#[must_use]
pub fn add_args(spec: &ServerSpec, scope: Scope) -> Vec<String> {
    let mut args = to_args(&["mcp", "add"]);
    match &spec.target {
        ServerTarget::Http { url, headers } | ServerTarget::Sse { url, headers } => {
            let transport = spec.transport();
            args.extend(to_args(&[
                "--transport",
                transport.as_str(),
                "--scope",
                scope.as_str(),
                spec.name.as_str(),
                url.as_str(),
            ]));
            for (key, value) in headers {
                args.push("--header".to_string());
                args.push(format!("{}: {}", key, value));
            }
        }
        ServerTarget::Stdio {
            command,
            args: command_args,
            env,
        } => {
            args.extend(to_args(&["--scope", scope.as_str(), spec.name.as_str()]));
            for (key, value) in env {
                args.push("-e".to_string());
                args.push(format!("{}={}", key, value));
            }
            args.push(command.clone());
            args.extend(command_args.iter().cloned());
        }
    }
    args
}
