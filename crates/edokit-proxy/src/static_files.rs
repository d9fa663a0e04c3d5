//! Static file serving with a directory-traversal guard.

use std::path::{Component, Path, PathBuf};

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::{ProxyError, Result};

/// Resolve a request path against the site root, refusing anything that
/// would escape it.
///
/// Components are normalized lexically: `..` pops, and popping past the
/// root is an error rather than a clamp. `/` and paths ending in `/`
/// resolve to `index.html`.
pub fn resolve(site_dir: &Path, raw_path: &str) -> Result<PathBuf> {
    let decoded = urlencoding::decode(raw_path)
        .map_err(|_| ProxyError::Forbidden(format!("undecodable path: {}", raw_path)))?;

    let mut relative = decoded.trim_start_matches('/').to_string();
    if relative.is_empty() || relative.ends_with('/') {
        relative.push_str("index.html");
    }

    let mut resolved = PathBuf::new();
    for component in Path::new(&relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(ProxyError::Forbidden(format!(
                        "path escapes site root: {}",
                        raw_path
                    )));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(ProxyError::Forbidden(format!(
                    "absolute path rejected: {}",
                    raw_path
                )));
            }
        }
    }

    if resolved.as_os_str().is_empty() {
        resolved.push("index.html");
    }

    Ok(site_dir.join(resolved))
}

/// Serve a file below the site root.
pub async fn serve(site_dir: &Path, raw_path: &str) -> Result<Response> {
    let path = resolve(site_dir, raw_path)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ProxyError::NotFound(format!("no such file: {}", raw_path)));
        }
        Err(e) => {
            return Err(ProxyError::Io(format!("{}: {}", path.display(), e)));
        }
    };

    let content_type = content_type_for(&path);
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// Content type from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
