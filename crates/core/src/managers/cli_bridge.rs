use async_trait::async_trait;
use mcpdeck_shared::{DeckError, DeckResult};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Captured output of a successful CLI invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs the external CLI with an argument list.
///
/// Production code uses [`ProcessRunner`]; tests substitute a scripted fake
/// so no real process is launched.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, args: &[String]) -> DeckResult<CommandOutput>;
}

pub struct ProcessRunner {
    program: String,
    timeout: Duration,
    extra_path: Vec<String>,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(program: impl Into<String>, timeout: Duration, extra_path: Vec<String>) -> Self {
        Self {
            program: program.into(),
            timeout,
            extra_path,
        }
    }

    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// PATH for the child: configured directories first, then the inherited PATH.
    fn child_path(&self) -> Option<String> {
        if self.extra_path.is_empty() {
            return None;
        }
        let inherited = std::env::var("PATH").unwrap_or_default();
        let mut parts: Vec<&str> = self.extra_path.iter().map(String::as_str).collect();
        if !inherited.is_empty() {
            parts.push(&inherited);
        }
        Some(parts.join(":"))
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, args: &[String]) -> DeckResult<CommandOutput> {
        debug!(program = %self.program, ?args, "Invoking CLI");

        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = self.child_path() {
            cmd.env("PATH", path);
        }

        let child = cmd.spawn().map_err(|e| {
            warn!(program = %self.program, error = %e, "Failed to spawn CLI");
            DeckError::SpawnFailed(format!("{}: {}", self.program, e))
        })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| DeckError::SpawnFailed(e.to_string()))?,
            Err(_) => {
                warn!(program = %self.program, ?args, timeout_secs = self.timeout.as_secs(), "CLI timed out");
                return Err(DeckError::Timeout(self.timeout.as_secs()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            let code = output.status.code();
            warn!(program = %self.program, ?args, ?code, stderr = %stderr.trim(), "CLI exited with failure");
            Err(DeckError::CommandFailed { code, stderr })
        }
    }
}
