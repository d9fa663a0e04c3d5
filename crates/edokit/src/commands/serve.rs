//! Serve command - run the local development proxy.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use edokit_proxy::{ProxyConfig, ProxyServer};

use super::Context;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides PORT from .env.local)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Upstream EDO API base URL (overrides EDO_API_BASE_URL)
    #[arg(long)]
    pub upstream: Option<String>,

    /// Directory served by the static fallback
    #[arg(long, value_name = "DIR")]
    pub site_dir: Option<PathBuf>,

    /// Token cache file location
    #[arg(long, value_name = "FILE")]
    pub cache_file: Option<PathBuf>,

    /// Open the dashboard in a browser once the server is up
    #[arg(long)]
    pub open: bool,
}

/// Run the serve command.
pub async fn run(args: ServeArgs, _ctx: &Context) -> Result<()> {
    let mut config = ProxyConfig::from_env();

    if let Some(port) = args.port {
        config = config.with_port(port);
    }
    if let Some(upstream) = args.upstream {
        config = config.with_upstream_base_url(upstream);
    }
    if let Some(dir) = args.site_dir {
        config = config.with_site_dir(dir);
    }
    if let Some(file) = args.cache_file {
        config = config.with_cache_path(file);
    }

    let server = ProxyServer::new(config);
    let addr = server
        .run_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    let dashboard = format!("http://{}/", addr);
    println!("EDO dev proxy listening on {}", dashboard);
    println!("Sign-in entry point: {}oauth/start", dashboard);
    println!("Press Ctrl-C to stop.");

    if args.open && super::open_url(&dashboard).is_err() {
        println!("(Could not open a browser automatically)");
    }

    // Both this and the server's shutdown future observe the same Ctrl-C.
    tokio::signal::ctrl_c().await?;
    // Let in-flight requests drain before the process exits.
    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("Stopped.");

    Ok(())
}
