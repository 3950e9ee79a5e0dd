//! `pilot` - play Pokemon Showdown battles with an LLM choosing the moves

use clap::Parser;
use pilot_agent::{Args, app};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "pilot starting");
    app::run(args).await
}
