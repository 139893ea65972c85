//! HTML fixtures for fetch and extraction tests.

/// A content page with navigation and footer chrome around the paragraphs.
///
/// The chrome alone keeps the page above the default minimum HTML length.
#[must_use]
pub fn song_page(title: &str, paragraphs: &[&str]) -> String {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("      <p>{p}</p>\n"))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <title>{title}</title>
    <style>body {{ font-family: serif; }}</style>
  </head>
  <body>
    <nav class="site-nav"><a href="/">Home</a> <a href="/ragams">All ragams</a></nav>
    <article>
      <h1>{title}</h1>
{body}    </article>
    <footer id="footer">Copyright Carnatic Songs Archive. All rights reserved.</footer>
  </body>
</html>
"#
    )
}

/// An interstitial that forwards with `<meta http-equiv="refresh">`.
#[must_use]
pub fn meta_refresh_stub(target: &str) -> String {
    format!(
        r#"<html><head><meta http-equiv="refresh" content="0;url={target}"></head><body><p>Please wait.</p></body></html>"#
    )
}

/// An interstitial whose only way out is a "click here" anchor.
#[must_use]
pub fn click_through_stub(href: &str) -> String {
    format!(
        r#"<html><body><p>This page will take you elsewhere.</p><a href="{href}">Click here to continue</a></body></html>"#
    )
}

/// An interstitial that redirects by script and names no target anywhere.
#[must_use]
pub fn dead_end_stub() -> String {
    r#"<html><head><script>function go() { window.location.replace(window.name); }</script></head><body onload="location.replace(window.name)"><p>You are being redirected.</p></body></html>"#
        .to_string()
}

/// A page that is valid HTML but too small to extract from.
#[must_use]
pub fn sparse_page() -> String {
    "<html><body><p>Coming soon</p></body></html>".to_string()
}

/// An oracle answer listing `titles`, each attributed to `composer`.
#[must_use]
pub fn oracle_answer(titles: &[&str], composer: &str) -> String {
    let items: Vec<serde_json::Value> = titles
        .iter()
        .map(|title| serde_json::json!({"title": title, "composer": composer}))
        .collect();
    serde_json::Value::Array(items).to_string()
}
