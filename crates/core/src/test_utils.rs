use crate::config::AppConfig;
use crate::managers::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use mcpdeck_shared::{DeckError, DeckResult, Scope};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Rule {
    pattern: Vec<String>,
    response: DeckResult<CommandOutput>,
}

impl Rule {
    // A trailing "*" in the pattern matches any remaining arguments.
    fn matches(&self, args: &[String]) -> bool {
        match self.pattern.split_last() {
            Some((last, prefix)) if last == "*" => {
                args.len() >= prefix.len() && args[..prefix.len()] == *prefix
            }
            _ => self.pattern == args,
        }
    }
}

/// Fake [`CommandRunner`] answering from a rule table and recording every
/// invocation. The first matching rule wins; unmatched calls fail.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<Vec<String>>>,
}

fn split_pattern(pattern: &str) -> Vec<String> {
    pattern.split_whitespace().map(str::to_string).collect()
}

impl ScriptedRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer `pattern` (whitespace-separated args) with `stdout`.
    pub fn on_ok(&self, pattern: &str, stdout: &str) -> &Self {
        self.push(
            pattern,
            Ok(CommandOutput {
                stdout: stdout.to_string(),
                stderr: String::new(),
            }),
        )
    }

    /// Answer `pattern` with a nonzero exit and `stderr`.
    pub fn on_fail(&self, pattern: &str, stderr: &str) -> &Self {
        self.push(
            pattern,
            Err(DeckError::CommandFailed {
                code: Some(1),
                stderr: stderr.to_string(),
            }),
        )
    }

    pub fn on_err(&self, pattern: &str, err: DeckError) -> &Self {
        self.push(pattern, Err(err))
    }

    fn push(&self, pattern: &str, response: DeckResult<CommandOutput>) -> &Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: split_pattern(pattern),
            response,
        });
        self
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded invocations joined with spaces, for compact assertions.
    pub fn call_lines(&self) -> Vec<String> {
        self.calls().iter().map(|c| c.join(" ")).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, args: &[String]) -> DeckResult<CommandOutput> {
        self.calls.lock().unwrap().push(args.to_vec());
        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|rule| rule.matches(args))
            .map(|rule| rule.response.clone())
            .unwrap_or_else(|| {
                Err(DeckError::CommandFailed {
                    code: Some(1),
                    stderr: format!("unscripted command: {}", args.join(" ")),
                })
            })
    }
}

pub fn test_config(claude_config_path: PathBuf) -> AppConfig {
    AppConfig {
        port: 3001,
        bind_address: "127.0.0.1".to_string(),
        cors_origins: Vec::new(),
        cli_bin: "claude".to_string(),
        cli_timeout: Duration::from_secs(5),
        cli_extra_path: Vec::new(),
        detail_concurrency: 4,
        default_scope: Scope::User,
        claude_config_path,
    }
}

pub fn create_test_app_state(
    runner: Arc<dyn CommandRunner>,
    claude_config_path: PathBuf,
) -> Arc<crate::AppState> {
    Arc::new(crate::AppState::new(test_config(claude_config_path), runner))
}
