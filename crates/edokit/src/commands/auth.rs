//! Auth command - sign in, inspect, and clear credentials.

use std::io::Write;

use anyhow::Result;
use clap::{Args, Subcommand};

use edokit_client::{AuthOutcome, EdoClient, SessionStore};
use edokit_proxy::TokenCache;
use edokit_proxy::config::CACHE_FILE;

use super::{Context, mask};

/// Arguments for the auth command.
#[derive(Args, Debug)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    /// Sign in through the dev proxy's PKCE flow
    Login {
        /// Paste a token instead of running the browser flow
        #[arg(long)]
        manual: bool,
    },

    /// Show authentication status
    Status,

    /// Clear saved session credentials
    Logout {
        /// Also remove the proxy's token cache file in this directory
        #[arg(long)]
        purge_cache: bool,
    },
}

/// Run the auth command.
pub async fn run(args: AuthArgs, ctx: &Context) -> Result<()> {
    match args.command {
        AuthCommand::Login { manual } => cmd_login(manual, ctx).await,
        AuthCommand::Status => cmd_status(ctx).await,
        AuthCommand::Logout { purge_cache } => cmd_logout(purge_cache).await,
    }
}

fn build_client(ctx: &Context) -> Result<EdoClient> {
    EdoClient::builder()
        .proxy_base_url(&ctx.proxy_url)
        .build()
        .map_err(|e| anyhow::anyhow!("Could not build the client: {}", e))
}

async fn cmd_login(manual: bool, ctx: &Context) -> Result<()> {
    let client = build_client(ctx)?;

    let flow = match client.authenticate().await {
        Ok(AuthOutcome::Ready(credentials)) => {
            println!("Already authenticated against {}", credentials.proxy_base_url);
            println!("Token: {}", mask(&credentials.token));
            println!("Run 'edokit auth logout' first to sign in again.");
            return Ok(());
        }
        Ok(AuthOutcome::Interactive(flow)) => flow,
        Err(e) => return Err(anyhow::anyhow!("Authentication failed: {}", e)),
    };

    if manual {
        println!("Paste a bearer token for the EDO API (a 'Bearer ' prefix is fine):");
        print!("token> ");
        std::io::stdout().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        let credentials = flow
            .submit_token(&input)
            .map_err(|e| anyhow::anyhow!("Token rejected: {}", e))?;

        println!("Token {} saved for {}", mask(&credentials.token), credentials.proxy_base_url);
        return Ok(());
    }

    let auth_url = flow.authorize_url();

    println!("EDO Sign-in");
    println!("===========");
    println!();
    println!("Open this URL in your browser:");
    println!();
    println!("  {}", auth_url);
    println!();
    println!("Waiting for the sign-in to finish (Ctrl-C to abort)...");

    if super::open_url(&auth_url).is_err() {
        println!("(Could not open a browser automatically)");
    }

    let credentials = flow.poll_until_ready().await.map_err(|e| {
        anyhow::anyhow!(
            "{}\nIs the proxy running? Try 'edokit auth login --manual' otherwise.",
            e
        )
    })?;

    println!();
    println!("Authentication successful!");
    println!("Token {} saved; 'edokit fetch' will use it.", mask(&credentials.token));

    Ok(())
}

async fn cmd_status(ctx: &Context) -> Result<()> {
    println!("Authentication Status");
    println!("---------------------");

    // What the proxy reports.
    let status_url = format!("{}/api/dev-auth/status", ctx.proxy_url.trim_end_matches('/'));
    match reqwest::get(&status_url).await {
        Ok(response) => match response.json::<serde_json::Value>().await {
            Ok(body) if body["ready"].as_bool() == Some(true) => {
                let token = body["token"].as_str().unwrap_or_default();
                println!("Proxy:   ready (token {})", mask(token));
            }
            Ok(_) => println!("Proxy:   running, no valid token"),
            Err(e) => println!("Proxy:   unexpected reply: {}", e),
        },
        Err(_) => println!("Proxy:   not reachable at {}", ctx.proxy_url),
    }

    // The cache file, when run from the proxy's directory.
    let cache = TokenCache::new(CACHE_FILE);
    match cache.load().await {
        Some(record) => {
            let expiry = chrono::DateTime::from_timestamp(record.expires_on as i64, 0)
                .map(|t| {
                    t.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|| record.expires_on.to_string());
            println!("Cache:   valid until {} ({} left)", expiry, record.expires_in_display());
        }
        None => println!("Cache:   no valid token in ./{}", CACHE_FILE),
    }

    // The CLI's own session store.
    match SessionStore::default_path() {
        Some(path) => {
            let store = SessionStore::new(path);
            match store.load() {
                Some(credentials) => println!(
                    "Session: {} for {}",
                    mask(&credentials.token),
                    credentials.proxy_base_url
                ),
                None => println!("Session: none saved"),
            }
        }
        None => println!("Session: no cache directory available"),
    }

    Ok(())
}

async fn cmd_logout(purge_cache: bool) -> Result<()> {
    match SessionStore::default_path() {
        Some(path) => {
            let store = SessionStore::new(path);
            if store.load().is_some() {
                store.clear();
                println!("Session credentials removed.");
            } else {
                println!("No session credentials found.");
            }
        }
        None => println!("No cache directory available; nothing to clear."),
    }

    if purge_cache {
        let cache = TokenCache::new(CACHE_FILE);
        cache.clear().await;
        println!("Token cache file removed.");
    }

    Ok(())
}
