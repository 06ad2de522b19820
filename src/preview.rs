//! Screenshot preview URLs.
//!
//! Previews are rendered lazily by the screenshot provider when the image URL
//! is first fetched; building the URL never touches the network.

use url::Url;

use crate::validate::is_valid_http_url;

const SCREENSHOT_ENDPOINT: &str = "https://api.microlink.io/";
const VIEWPORT_WIDTH: u32 = 1920;
const VIEWPORT_HEIGHT: u32 = 1080;

/// Provider URL that embeds a full-viewport screenshot of `site_url`.
pub fn screenshot_url(site_url: &str) -> String {
    let width = VIEWPORT_WIDTH.to_string();
    let height = VIEWPORT_HEIGHT.to_string();
    let params = [
        ("url", site_url),
        ("screenshot", "true"),
        ("meta", "false"),
        ("embed", "screenshot.url"),
        ("viewport.width", width.as_str()),
        ("viewport.height", height.as_str()),
    ];
    match Url::parse_with_params(SCREENSHOT_ENDPOINT, params) {
        Ok(url) => url.into(),
        // The endpoint constant always parses.
        Err(_) => SCREENSHOT_ENDPOINT.to_string(),
    }
}

/// Preview for an entry: a usable override wins, otherwise the screenshot URL.
pub fn resolve_preview_url(site_url: &str, override_url: Option<&str>) -> String {
    match override_url.map(str::trim) {
        Some(candidate) if !candidate.is_empty() && is_valid_http_url(candidate) => {
            candidate.to_string()
        }
        _ => screenshot_url(site_url.trim()),
    }
}
