use mcpdeck_shared::{DeckError, DeckResult, Scope, TransportType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

/// Body of `POST /cli/add` and `POST /servers/test`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AddServerRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub transport: TransportType,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub scope: Option<Scope>,
    /// Nested fallbacks, used where the top-level field is missing or empty.
    #[serde(default)]
    pub config: Option<ServerConfigFallback>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfigFallback {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Option<Vec<String>>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub env: Option<BTreeMap<String, String>>,
}

impl AddServerRequest {
    /// Fill empty top-level fields from the nested `config` object.
    #[must_use]
    pub fn with_config_fallback(mut self) -> Self {
        let Some(config) = self.config.take() else {
            return self;
        };
        if self.command.as_deref().map_or(true, str::is_empty) {
            self.command = config.command;
        }
        if self.args.is_empty() {
            self.args = config.args.unwrap_or_default();
        }
        if self.url.as_deref().map_or(true, str::is_empty) {
            self.url = config.url;
        }
        if self.headers.is_empty() {
            self.headers = config.headers.unwrap_or_default();
        }
        if self.env.is_empty() {
            self.env = config.env.unwrap_or_default();
        }
        self
    }
}

/// What a server entry connects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerTarget {
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    Http {
        url: String,
        headers: BTreeMap<String, String>,
    },
    Sse {
        url: String,
        headers: BTreeMap<String, String>,
    },
}

/// A validated server entry, ready to be turned into `mcp add` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Validate)]
pub struct ServerSpec {
    #[validate(
        length(min = 1, max = 64, message = "Server name must be 1-64 characters"),
        custom(function = validate_server_name)
    )]
    pub name: String,
    #[serde(flatten)]
    pub target: ServerTarget,
}

impl ServerSpec {
    #[must_use]
    pub fn transport(&self) -> TransportType {
        match self.target {
            ServerTarget::Stdio { .. } => TransportType::Stdio,
            ServerTarget::Http { .. } => TransportType::Http,
            ServerTarget::Sse { .. } => TransportType::Sse,
        }
    }

    /// Same entry under a different name (used for temporary test entries).
    #[must_use]
    pub fn renamed(&self, name: String) -> Self {
        Self {
            name,
            target: self.target.clone(),
        }
    }
}

impl TryFrom<AddServerRequest> for ServerSpec {
    type Error = DeckError;

    fn try_from(req: AddServerRequest) -> DeckResult<Self> {
        let req = req.with_config_fallback();
        let name = req
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| DeckError::ValidationError("Server name is required".into()))?;

        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        let target = match req.transport {
            TransportType::Http | TransportType::Sse => {
                let label = req.transport.as_str().to_ascii_uppercase();
                let url = non_empty(req.url).ok_or_else(|| {
                    DeckError::ValidationError(format!("URL is required for {} servers", label))
                })?;
                if req.transport == TransportType::Http {
                    ServerTarget::Http {
                        url,
                        headers: req.headers,
                    }
                } else {
                    ServerTarget::Sse {
                        url,
                        headers: req.headers,
                    }
                }
            }
            TransportType::Stdio => {
                let command = non_empty(req.command).ok_or_else(|| {
                    DeckError::ValidationError("Command is required for stdio servers".into())
                })?;
                ServerTarget::Stdio {
                    command,
                    args: req.args,
                    env: req.env,
                }
            }
            TransportType::Other(other) => {
                return Err(DeckError::ValidationError(format!(
                    "Unsupported transport type '{}': expected stdio, http or sse",
                    other
                )))
            }
        };

        let spec = Self { name, target };
        validate_request(&spec).map_err(DeckError::ValidationError)?;
        Ok(spec)
    }
}

// A leading '-' would be read by the CLI as a flag.
fn validate_server_name(name: &str) -> Result<(), validator::ValidationError> {
    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid_chars && !name.starts_with('-') {
        Ok(())
    } else {
        let mut err = validator::ValidationError::new("invalid_server_name");
        err.message = Some(
            "Server name may only contain letters, digits, '_', '-' and '.', and must not start with '-'"
                .into(),
        );
        Err(err)
    }
}

/// Check a server name taken from outside a [`ServerSpec`], such as a URL
/// path segment, before it is passed to the CLI.
pub fn check_name(name: &str) -> DeckResult<()> {
    if name.is_empty() || name.chars().count() > 64 {
        return Err(DeckError::ValidationError(
            "Server name must be 1-64 characters".into(),
        ));
    }
    validate_server_name(name).map_err(|e| {
        DeckError::ValidationError(
            e.message
                .map_or_else(|| e.code.to_string(), |m| m.to_string()),
        )
    })
}

/// Validation helper function
pub fn validate_request<T: Validate>(req: &T) -> Result<(), String> {
    req.validate()
        .map_err(|e| format!("Validation error: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stdio_request(name: &str) -> AddServerRequest {
        AddServerRequest {
            name: Some(name.to_string()),
            command: Some("npx".to_string()),
            args: vec!["-y".to_string(), "server".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_stdio_request_is_valid() {
        let spec = ServerSpec::try_from(stdio_request("filesystem")).unwrap();
        assert_eq!(spec.transport(), TransportType::Stdio);
        assert_eq!(spec.name, "filesystem");
    }

    #[test]
    fn test_missing_name_rejected() {
        let mut req = stdio_request("x");
        req.name = None;
        let err = ServerSpec::try_from(req).unwrap_err();
        assert_eq!(
            err,
            DeckError::ValidationError("Server name is required".into())
        );
    }

    #[test]
    fn test_stdio_requires_command() {
        let mut req = stdio_request("fs");
        req.command = Some("   ".to_string());
        let err = ServerSpec::try_from(req).unwrap_err();
        assert_eq!(
            err,
            DeckError::ValidationError("Command is required for stdio servers".into())
        );
    }

    #[test]
    fn test_remote_transports_require_url() {
        for (transport, label) in [(TransportType::Http, "HTTP"), (TransportType::Sse, "SSE")] {
            let req = AddServerRequest {
                name: Some("remote".to_string()),
                transport,
                ..Default::default()
            };
            let err = ServerSpec::try_from(req).unwrap_err();
            assert_eq!(
                err,
                DeckError::ValidationError(format!("URL is required for {} servers", label))
            );
        }
    }

    #[test]
    fn test_name_starting_with_dash_rejected() {
        assert!(ServerSpec::try_from(stdio_request("--scope")).is_err());
        assert!(ServerSpec::try_from(stdio_request("has space")).is_err());
        assert!(ServerSpec::try_from(stdio_request(&"a".repeat(65))).is_err());
        assert!(ServerSpec::try_from(stdio_request("my.server-2_b")).is_ok());
    }

    #[test]
    fn test_config_fallback_fills_empty_fields() {
        let req = AddServerRequest {
            name: Some("remote".to_string()),
            transport: TransportType::Sse,
            config: Some(ServerConfigFallback {
                url: Some("https://sse.example.com".to_string()),
                headers: Some(BTreeMap::from([("X-Key".to_string(), "k".to_string())])),
                ..Default::default()
            }),
            ..Default::default()
        };
        let spec = ServerSpec::try_from(req).unwrap();
        match spec.target {
            ServerTarget::Sse { url, headers } => {
                assert_eq!(url, "https://sse.example.com");
                assert_eq!(headers.len(), 1);
            }
            other => panic!("unexpected target: {other:?}"),
        }
    }

    #[test]
    fn test_top_level_fields_win_over_config() {
        let mut req = stdio_request("fs");
        req.config = Some(ServerConfigFallback {
            command: Some("uvx".to_string()),
            args: Some(vec!["other".to_string()]),
            ..Default::default()
        });
        let req = req.with_config_fallback();
        assert_eq!(req.command.as_deref(), Some("npx"));
        assert_eq!(req.args, vec!["-y", "server"]);
    }

    #[test]
    fn test_check_name_rejects_flag_like_names() {
        assert!(check_name("filesystem").is_ok());
        assert!(check_name("my.server-2_b").is_ok());
        for bad in ["--help", "-s", "", "has space", "a/b"] {
            assert!(
                matches!(check_name(bad), Err(DeckError::ValidationError(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(check_name(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_unknown_transport_rejected() {
        let req = AddServerRequest {
            name: Some("ws".to_string()),
            transport: TransportType::from("ws"),
            url: Some("wss://x".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ServerSpec::try_from(req),
            Err(DeckError::ValidationError(_))
        ));
    }
}
