pub mod claude_config;
pub mod cli_bridge;
pub mod mcp_cli;
pub mod output_parser;

pub use claude_config::{ConfigLoad, ConfigState};
pub use cli_bridge::{CommandOutput, CommandRunner, ProcessRunner};
pub use mcp_cli::{McpCli, ServerListing, TestFailure, TestReport};
