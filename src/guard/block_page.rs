//! Internal block page URL contract

use serde::{Deserialize, Serialize};
use url::{form_urlencoded, Url};

pub const BLOCK_PAGE_PATH: &str = "block.html";
pub const BLOCKED_URL_PARAM: &str = "url";

/// Location of the extension's block page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPage {
    page_url: String,
}

impl BlockPage {
    /// `extension_base` is the extension's own origin, e.g.
    /// `chrome-extension://<id>/`
    pub fn new(extension_base: &str) -> Self {
        Self {
            page_url: format!("{}/{}", extension_base.trim_end_matches('/'), BLOCK_PAGE_PATH),
        }
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    /// Block page URL carrying the percent-encoded original destination
    pub fn url_for(&self, blocked_url: &str) -> String {
        let encoded: String = form_urlencoded::byte_serialize(blocked_url.as_bytes()).collect();
        format!("{}?{}={}", self.page_url, BLOCKED_URL_PARAM, encoded)
    }
}

/// What the block page displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPageInfo {
    pub blocked_url: Option<String>,
    pub display_host: Option<String>,
}

impl BlockPageInfo {
    /// Parse the block page query string (without the leading `?`)
    pub fn from_query(query: &str) -> Self {
        let blocked_url = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == BLOCKED_URL_PARAM)
            .map(|(_, value)| value.into_owned());
        let display_host = blocked_url.as_deref().map(display_host);
        Self {
            blocked_url,
            display_host,
        }
    }
}

/// Hostname of `blocked_url`, or the raw string when it does not parse
pub fn display_host(blocked_url: &str) -> String {
    Url::parse(blocked_url)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| blocked_url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_page_url_encodes_destination() {
        let page = BlockPage::new("chrome-extension://abc/");
        let url = page.url_for("https://www.youtube.com/watch?v=x&t=1");
        assert_eq!(
            url,
            "chrome-extension://abc/block.html?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dx%26t%3D1"
        );
    }

    #[test]
    fn query_round_trips_to_hostname() {
        let page = BlockPage::new("chrome-extension://abc");
        let url = Url::parse(&page.url_for("https://m.youtube.com/feed")).unwrap();
        let info = BlockPageInfo::from_query(url.query().unwrap());
        assert_eq!(info.blocked_url.as_deref(), Some("https://m.youtube.com/feed"));
        assert_eq!(info.display_host.as_deref(), Some("m.youtube.com"));
    }

    #[test]
    fn unparsable_url_is_shown_raw() {
        assert_eq!(display_host("youtube"), "youtube");
        assert_eq!(display_host("mailto:someone@example.com"), "mailto:someone@example.com");
    }

    #[test]
    fn missing_parameter_shows_nothing() {
        let info = BlockPageInfo::from_query("other=1");
        assert_eq!(info, BlockPageInfo { blocked_url: None, display_host: None });
    }
}
