//! Callback pages rendered at the end of an authorization attempt.
//!
//! Both pages ship with HTTP 200 regardless of how the flow ended. The
//! page itself tells an opener window the outcome through the
//! `edo_auth_ok` / `edo_auth_error` sentinels, so a flow driven from a
//! popup still resolves when the navigation succeeded but the exchange
//! did not.

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>EDO sign-in complete</title>
  <style>
    body { font-family: system-ui, sans-serif; display: flex; justify-content: center;
           align-items: center; height: 100vh; margin: 0; background: #f4f6f8; }
    .card { background: #fff; border-radius: 8px; padding: 2rem 3rem; text-align: center;
            box-shadow: 0 1px 4px rgba(0, 0, 0, 0.12); }
    h1 { font-size: 1.2rem; color: #1a7f37; margin-bottom: 0.5rem; }
    p { color: #57606a; margin: 0; }
  </style>
</head>
<body>
  <div class="card">
    <h1>Signed in</h1>
    <p>You can close this window.</p>
  </div>
  <script>
    if (window.opener) { window.opener.postMessage('edo_auth_ok', '*'); }
    setTimeout(function () { window.close(); }, 1200);
  </script>
</body>
</html>
"#;

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>EDO sign-in failed</title>
  <style>
    body { font-family: system-ui, sans-serif; display: flex; justify-content: center;
           align-items: center; height: 100vh; margin: 0; background: #f4f6f8; }
    .card { background: #fff; border-radius: 8px; padding: 2rem 3rem; text-align: center;
            box-shadow: 0 1px 4px rgba(0, 0, 0, 0.12); max-width: 32rem; }
    h1 { font-size: 1.2rem; color: #cf222e; margin-bottom: 0.5rem; }
    p { color: #57606a; margin: 0 0 0.5rem; }
    code { background: #f6f8fa; padding: 0.1em 0.3em; border-radius: 4px; }
  </style>
</head>
<body>
  <div class="card">
    <h1>Sign-in failed</h1>
    <p><code>{{detail}}</code></p>
    <p>Close this window and try again.</p>
  </div>
  <script>
    if (window.opener) { window.opener.postMessage('edo_auth_error', '*'); }
  </script>
</body>
</html>
"#;

/// The auto-closing success page.
pub fn success() -> &'static str {
    SUCCESS_HTML
}

/// The failure page with `detail` interpolated, HTML-escaped.
pub fn error(detail: &str) -> String {
    ERROR_HTML.replace("{{detail}}", &escape(detail))
}

/// Minimal HTML escaping for interpolated error text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
