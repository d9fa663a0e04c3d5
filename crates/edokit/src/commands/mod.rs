//! CLI command handlers.

pub mod auth;
pub mod fetch;
pub mod serve;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Dev proxy URL to talk to.
    pub proxy_url: String,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

/// Try to open a URL in the default browser.
pub fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open").arg(url).status()?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open").arg(url).status()?;
    }

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .status()?;
    }

    Ok(())
}

/// Shorten a token for display.
pub fn mask(token: &str) -> String {
    let len = token.chars().count();
    if len > 8 {
        let head: String = token.chars().take(4).collect();
        let tail: String = token.chars().skip(len - 4).collect();
        format!("{}...{}", head, tail)
    } else {
        "****".to_string()
    }
}
