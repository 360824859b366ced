use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::AppConfig;
use crate::managers::{claude_config, CommandRunner, ProcessRunner};

#[derive(Parser)]
#[command(
    name = "mcpdeck",
    version = env!("CARGO_PKG_VERSION"),
    about = "mcpdeck - HTTP management API for MCP server configurations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Check that the MCP CLI can be found and run
    Doctor,
    /// Print the MCP servers found in the config file as JSON
    Config {
        /// Project path whose servers take precedence over global ones
        #[arg(long)]
        project: Option<PathBuf>,
    },
}

pub async fn dispatch(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Serve => crate::run_server().await,
        Commands::Doctor => doctor().await,
        Commands::Config { project } => print_config(project).await,
    }
}

async fn doctor() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let runner = ProcessRunner::new(
        config.cli_bin.clone(),
        config.cli_timeout,
        config.cli_extra_path.clone(),
    );
    info!("🩺 Checking MCP CLI '{}'", runner.program());

    match runner.run(&["--version".to_string()]).await {
        Ok(output) => {
            println!("CLI:     {}", runner.program());
            println!("Version: {}", output.stdout.trim());
            println!("Config:  {}", config.claude_config_path.display());
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("CLI:     {}", runner.program());
            println!("FAILED:  {}", e);
            anyhow::bail!("MCP CLI check failed: {}", e)
        }
    }
}

async fn print_config(project: Option<PathBuf>) -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let project = project.map(|p| p.to_string_lossy().into_owned());
    let load = claude_config::load_servers(&config.claude_config_path, project.as_deref()).await;
    println!("{}", serde_json::to_string_pretty(&load)?);
    Ok(())
}
