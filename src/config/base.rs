//! `[base]` section configuration.
//!
//! Site identity used by the sitemap, robots.txt and feeds.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[base]` section in pocket.toml.
///
/// # Example
/// ```toml
/// [base]
/// url = "https://example.com"
/// title = "My Site"
/// language = "en-US"
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Absolute site URL without trailing slash.
    /// Metadata files are only written when this is set.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// Feed title. Falls back to `url`.
    #[serde(default)]
    pub title: Option<String>,

    /// BCP 47 language code for the JSON feed.
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,
}

impl BaseConfig {
    /// `url` with any trailing `/` removed.
    pub fn base_url(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(|u| u.trim_end_matches('/'))
            .filter(|u| !u.is_empty())
    }
}
