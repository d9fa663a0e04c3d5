//! Fetch command - one authenticated GET through the dev proxy.

use anyhow::Result;
use clap::Args;

use edokit_client::{AuthOutcome, Credentials, EdoClient, Query};

use super::Context;

/// Arguments for the fetch command.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Relative EDO API path, e.g. point/building/7/point
    pub path: String,

    /// Query parameter as KEY=VALUE; repeat the flag for repeated keys
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// Bearer token to use instead of the saved session
    #[arg(long)]
    pub token: Option<String>,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs, ctx: &Context) -> Result<()> {
    let query = parse_params(&args.params)?;

    let mut builder = EdoClient::builder().proxy_base_url(&ctx.proxy_url);

    if let Some(token) = args.token {
        builder = builder.provisioned(Credentials::new(token, ctx.proxy_url.clone()));
    }

    let client = builder.build()?;

    match client.authenticate().await? {
        AuthOutcome::Ready(_) => {}
        AuthOutcome::Interactive(_) => {
            anyhow::bail!("Not authenticated. Run 'edokit auth login' first.");
        }
    }

    let body: serde_json::Value = client.get_with_query(&args.path, &query).await?;

    if ctx.json_output {
        println!("{}", serde_json::to_string(&body)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&body)?);
    }

    Ok(())
}

/// Parse repeated KEY=VALUE flags into query parameters.
fn parse_params(raw: &[String]) -> Result<Query> {
    let mut query = Query::new();
    for pair in raw {
        let Some((key, value)) = pair.split_once('=') else {
            anyhow::bail!("Invalid parameter '{}': expected KEY=VALUE", pair);
        };
        query = query.set(key, value);
    }
    Ok(query)
}
