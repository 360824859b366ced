use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = mcpdeck_core::cli::Cli::parse();

    // .env from the working directory, else next to the executable
    if dotenvy::dotenv().is_err() {
        let _ = dotenvy::from_path(mcpdeck_core::config::exe_dir().join(".env"));
    }
    init_tracing();

    match cli.command {
        None => mcpdeck_core::run_server().await,
        Some(cmd) => mcpdeck_core::cli::dispatch(cmd).await,
    }
}
