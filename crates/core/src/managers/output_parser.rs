//! Scrapers for the human-readable output of `mcp list` and `mcp get`.
//!
//! Both are best-effort and never fail. The detail scraper follows one
//! indentation-based grammar:
//!
//! ```text
//! my-server:
//!   Scope: User config (available in all your projects)
//!   Status: ✓ Connected
//!   Type: stdio
//!   Command: npx
//!   Args: -y @modelcontextprotocol/server-filesystem /tmp
//!   Environment:
//!     API_KEY=secret
//! ```

use mcpdeck_shared::{ListedServer, ServerDetails, ServerStatus, TransportType};
use std::collections::BTreeMap;

/// Sentence printed by `mcp list` when nothing is configured.
const EMPTY_LISTING_PREFIX: &str = "No MCP servers configured";

/// Parse `mcp list` output into name/type records, preserving line order.
///
/// A line is a record only if it contains a colon. The text before the first
/// colon is the name. The transport comes from a trailing `(TAG)` if present,
/// else `http` for URL targets, else `stdio`.
#[must_use]
pub fn parse_list_output(output: &str) -> Vec<ListedServer> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(EMPTY_LISTING_PREFIX))
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(ListedServer {
                name: name.to_string(),
                transport: infer_transport(rest.trim()),
                status: ServerStatus::Active,
            })
        })
        .collect()
}

fn infer_transport(rest: &str) -> TransportType {
    let target = strip_health_suffix(rest);
    if let Some(tag) = trailing_paren_tag(target) {
        return TransportType::from(tag);
    }
    if target.starts_with("http://") || target.starts_with("https://") {
        TransportType::Http
    } else {
        TransportType::Stdio
    }
}

/// Drop the ` - ✓ Connected` style health suffix newer CLIs append.
fn strip_health_suffix(rest: &str) -> &str {
    match rest.rfind(" - ") {
        Some(idx) if !rest[idx + 3..].contains('(') => rest[..idx].trim_end(),
        _ => rest,
    }
}

/// `foo (SSE)` -> `Some("SSE")`. The tag must be a single word.
fn trailing_paren_tag(s: &str) -> Option<&str> {
    let inner = s.trim_end().strip_suffix(')')?;
    let open = inner.rfind('(')?;
    let tag = inner[open + 1..].trim();
    if !tag.is_empty() && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Some(tag)
    } else {
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Environment,
    Headers,
}

/// Parse `mcp get <name>` output into a detail record.
///
/// Never fails: unrecognized input yields a record carrying `raw_output` and
/// a `parse_error` description.
#[must_use]
pub fn parse_get_output(output: &str) -> ServerDetails {
    let mut details = ServerDetails {
        raw_output: output.to_string(),
        ..Default::default()
    };
    let mut args = Vec::new();
    let mut env = BTreeMap::new();
    let mut headers = BTreeMap::new();
    let mut section: Option<Section> = None;
    let mut recognized = false;

    for (i, line) in output.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        let indent = line.len() - line.trim_start_matches(' ').len();
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        if i == 0 && indent == 0 {
            if let Some(name) = trimmed.strip_suffix(':') {
                details.name = Some(name.trim().to_string());
                recognized = true;
            }
            continue;
        }

        if indent < 2 {
            continue;
        }

        if let Some((key, value)) = field_line(trimmed) {
            section = None;
            recognized = true;
            match key {
                "Type" => details.transport = Some(TransportType::from(value)),
                "Scope" => details.scope = Some(value.to_string()),
                "Status" => details.status = Some(value.to_string()),
                "Command" => details.command = Some(value.to_string()),
                "Args" => args.extend(value.split_whitespace().map(str::to_string)),
                "URL" => details.url = Some(value.to_string()),
                "Environment" => section = Some(Section::Environment),
                "Headers" => section = Some(Section::Headers),
                _ => {}
            }
            continue;
        }

        match section {
            Some(sec) => {
                if let Some((key, value)) = split_entry(trimmed) {
                    recognized = true;
                    let target = match sec {
                        Section::Environment => &mut env,
                        Section::Headers => &mut headers,
                    };
                    target.insert(key.to_string(), value.to_string());
                }
            }
            None if indent >= 4 && !trimmed.contains(':') => {
                recognized = true;
                args.push(trimmed.to_string());
            }
            None => {}
        }
    }

    if !args.is_empty() {
        details.args = Some(args);
    }
    if !env.is_empty() {
        details.env = Some(env);
    }
    if !headers.is_empty() {
        details.headers = Some(headers);
    }
    if !recognized && !output.trim().is_empty() {
        details.parse_error = Some("Unrecognized `mcp get` output format".to_string());
    }

    details
}

const FIELD_KEYS: &[&str] = &[
    "Type",
    "Scope",
    "Status",
    "Command",
    "Args",
    "URL",
    "Environment",
    "Headers",
];

/// Split a known `Key: value` field line. The value keeps any later colons.
fn field_line(trimmed: &str) -> Option<(&'static str, &str)> {
    FIELD_KEYS.iter().find_map(|key| {
        trimmed
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .map(|value| (*key, value.trim()))
    })
}

/// `KEY=value` or `KEY: value`, split at whichever separator comes first.
fn split_entry(trimmed: &str) -> Option<(&str, &str)> {
    let idx = trimmed.find(['=', ':'])?;
    let key = trimmed[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, trimmed[idx + 1..].trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_paren_tag_wins_over_url() {
        let servers = parse_list_output("foo: https://x (SSE)");
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "foo");
        assert_eq!(servers[0].transport, TransportType::Sse);
        assert_eq!(servers[0].status, ServerStatus::Active);
    }

    #[test]
    fn test_list_url_defaults_to_http() {
        let servers = parse_list_output("foo: https://x");
        assert_eq!(servers[0].transport, TransportType::Http);
        let servers = parse_list_output("foo: http://localhost:8080/mcp");
        assert_eq!(servers[0].transport, TransportType::Http);
    }

    #[test]
    fn test_list_command_defaults_to_stdio() {
        let servers = parse_list_output("foo: somecommand");
        assert_eq!(servers[0].transport, TransportType::Stdio);
    }

    #[test]
    fn test_list_preserves_order_and_skips_colonless_lines() {
        let output = "Checking MCP server health...\n\
                      \n\
                      zeta: npx zeta-server\n\
                      not a record\n\
                      alpha: https://alpha.dev/mcp (HTTP)\n\
                      mid: uvx mid --port 3\n";
        let names: Vec<_> = parse_list_output(output)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_list_strips_health_suffix() {
        let output = "remote: https://api.example.com/mcp (HTTP) - ✓ Connected\n\
                      local: npx -y server - ✗ Failed to connect\n\
                      events: https://sse.example.com - ✓ Connected";
        let servers = parse_list_output(output);
        assert_eq!(servers[0].transport, TransportType::Http);
        assert_eq!(servers[1].transport, TransportType::Stdio);
        assert_eq!(servers[2].transport, TransportType::Http);
    }

    #[test]
    fn test_list_unknown_tag_is_kept_lowercase() {
        let servers = parse_list_output("ws: wss://x (WS)");
        assert_eq!(servers[0].transport, TransportType::Other("ws".to_string()));
    }

    #[test]
    fn test_list_non_ascii_paren_word_is_not_a_tag() {
        let servers = parse_list_output("docs: https://x.example.com (données)\nlocal: run-server (café)");
        assert_eq!(servers[0].transport, TransportType::Http);
        assert_eq!(servers[1].transport, TransportType::Stdio);
    }

    #[test]
    fn test_list_empty_listing_sentence_is_not_a_record() {
        let output = "No MCP servers configured. Use `claude mcp add` to add a server.";
        assert!(parse_list_output(output).is_empty());
    }

    #[test]
    fn test_list_skips_empty_name() {
        assert!(parse_list_output(": orphan value").is_empty());
    }

    #[test]
    fn test_get_stdio_server() {
        let output = "filesystem:\n  Scope: User config (available in all your projects)\n  Status: ✓ Connected\n  Type: stdio\n  Command: npx\n  Args: -y @modelcontextprotocol/server-filesystem /tmp\n  Environment:\n    API_KEY=secret\n    REGION: eu-west-1\n\nTo remove this server, run: claude mcp remove \"filesystem\" -s user\n";
        let d = parse_get_output(output);
        assert_eq!(d.name.as_deref(), Some("filesystem"));
        assert_eq!(d.transport, Some(TransportType::Stdio));
        assert_eq!(d.command.as_deref(), Some("npx"));
        assert_eq!(
            d.args.unwrap(),
            vec!["-y", "@modelcontextprotocol/server-filesystem", "/tmp"]
        );
        let env = d.env.unwrap();
        assert_eq!(env.get("API_KEY").map(String::as_str), Some("secret"));
        assert_eq!(env.get("REGION").map(String::as_str), Some("eu-west-1"));
        assert_eq!(
            d.scope.as_deref(),
            Some("User config (available in all your projects)")
        );
        assert!(d.parse_error.is_none());
        assert_eq!(d.raw_output, output);
    }

    #[test]
    fn test_get_http_server_keeps_url_colons_and_headers() {
        let output = "remote:\n  Type: http\n  URL: https://api.example.com:8443/mcp\n  Headers:\n    Authorization: Bearer abc:def\n";
        let d = parse_get_output(output);
        assert_eq!(d.transport, Some(TransportType::Http));
        assert_eq!(d.url.as_deref(), Some("https://api.example.com:8443/mcp"));
        let headers = d.headers.unwrap();
        assert_eq!(
            headers.get("Authorization").map(String::as_str),
            Some("Bearer abc:def")
        );
        assert!(d.env.is_none());
    }

    #[test]
    fn test_get_field_line_closes_section() {
        let output = "s:\n  Environment:\n    A=1\n  Command: node\n    extra-arg\n";
        let d = parse_get_output(output);
        assert_eq!(d.env.unwrap().len(), 1);
        assert_eq!(d.command.as_deref(), Some("node"));
        assert_eq!(d.args.unwrap(), vec!["extra-arg"]);
    }

    #[test]
    fn test_get_positional_args_on_deep_indent() {
        let output = "s:\n  Command: python\n    server.py\n    --verbose\n";
        let d = parse_get_output(output);
        assert_eq!(d.args.unwrap(), vec!["server.py", "--verbose"]);
    }

    #[test]
    fn test_get_garbage_never_fails_and_keeps_raw() {
        for input in ["", "garbage", "\u{0}\u{1}::::", "   \n\t\n", "{\"json\": true}"] {
            let d = parse_get_output(input);
            assert_eq!(d.raw_output, input);
        }
        let d = parse_get_output("garbage output");
        assert!(d.parse_error.is_some());
        assert!(parse_get_output("").parse_error.is_none());
    }

    #[test]
    fn test_get_first_line_without_colon_is_not_name() {
        let d = parse_get_output("filesystem\n  Type: sse\n");
        assert!(d.name.is_none());
        assert_eq!(d.transport, Some(TransportType::Sse));
    }
}
