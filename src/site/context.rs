//! What a function page sees when it renders.

use serde::Serialize;

use super::article::Template;
use super::index::{Catalog, SiteIndex};

/// Render-time view of one template and the whole site.
///
/// Serializes as the template's own fields plus `site`, `previous`, `next`
/// and `tag`, which is the shape external page programs receive.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PageContext<'a> {
    #[serde(flatten)]
    pub article: &'a Template,
    pub site: &'a SiteIndex,
    /// Next older feed entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<&'a Template>,
    /// Next newer feed entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<&'a Template>,
    /// The catalog a `[tag]` page was generated for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<&'a Catalog>,
}

impl<'a> PageContext<'a> {
    /// Context with no site relations, for pages rendered outside a build.
    pub fn standalone(article: &'a Template, site: &'a SiteIndex) -> Self {
        Self {
            article,
            site,
            previous: None,
            next: None,
            tag: None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
