use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)]
static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://[^\s)]+|www\.[^\s)]+").expect("URL pattern is valid")
});

/// Pulls `http(s)://…` and `www.…` tokens out of free text, completing the
/// bare `www.` form with an `https://` scheme. Links come back as plain
/// data for the caller to render; nothing here produces markup.
#[must_use]
pub fn extract_links(text: &str) -> Vec<String> {
    URL_PATTERN
        .find_iter(text)
        .map(|m| {
            let token = m.as_str();
            if token.starts_with("http") {
                token.to_string()
            } else {
                format!("https://{token}")
            }
        })
        .collect()
}
