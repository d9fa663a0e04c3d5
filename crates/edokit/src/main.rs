//! edokit - local development kit for EDO energy dashboards
//!
//! Main entry point for the edokit CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{auth, fetch, serve};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// edokit - local development kit for EDO energy dashboards
#[derive(Parser)]
#[command(name = "edokit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Dev proxy URL (default: http://localhost:3001)
    #[arg(long, global = true, env = "EDOKIT_PROXY_URL")]
    pub proxy: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the local development proxy
    Serve(serve::ServeArgs),

    /// Authentication management
    Auth(auth::AuthArgs),

    /// One authenticated GET against the EDO API
    Fetch(fetch::FetchArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: human-readable console + rotating JSON file
    let console_filter = if cli.verbose {
        "edokit=debug,edokit_proxy=debug,edokit_client=debug,info"
    } else {
        "edokit=info,edokit_proxy=info,edokit_client=info,warn"
    };

    let log_dir = dirs::data_local_dir()
        .map(|d| d.join("edokit").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "edokit.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(tracing_subscriber::EnvFilter::new(console_filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "edokit=trace,edokit_proxy=trace,edokit_client=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        proxy_url: cli
            .proxy
            .unwrap_or_else(|| "http://localhost:3001".to_string()),
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Serve(args) => serve::run(args, &ctx).await,
        Commands::Auth(args) => auth::run(args, &ctx).await,
        Commands::Fetch(args) => fetch::run(args, &ctx).await,
    }
}
