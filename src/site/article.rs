//! Compiled article types.
//!
//! These are what the compile phase produces and the render phase consumes.
//! Templates are shared (`Arc`) because the site index, pagination and the
//! render pass all refer to the same template.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use super::context::PageContext;
use crate::markup::Node;

/// Where an article came from and where it goes.
#[derive(Debug, Clone, Serialize)]
pub struct Location {
    /// Absolute source file path.
    #[serde(skip)]
    pub source: PathBuf,
    /// Source path relative to the site root, forward slashes (e.g. `posts/a.html.ls`).
    pub path: String,
    /// Absolute output file path.
    #[serde(skip)]
    pub output: PathBuf,
    /// Site-relative URL (e.g. `/posts/a.html`).
    pub url: String,
}

/// A non-HTML, non-CSS output such as `feed.md` or `data.txt`.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    #[serde(flatten)]
    pub location: Location,
    #[serde(skip)]
    pub content: Node,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stylesheet {
    #[serde(flatten)]
    pub location: Location,
    #[serde(skip)]
    pub content: Node,
}

/// A function page body, evaluated once the site index is complete.
pub trait PageFn: Send + Sync {
    fn render(&self, context: &PageContext<'_>) -> anyhow::Result<Node>;
}

impl<F> PageFn for F
where
    F: Fn(&PageContext<'_>) -> anyhow::Result<Node> + Send + Sync,
{
    fn render(&self, context: &PageContext<'_>) -> anyhow::Result<Node> {
        self(context)
    }
}

#[derive(Clone)]
pub enum Page {
    Static(Node),
    Dynamic(Arc<dyn PageFn>),
}

impl Page {
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&PageContext<'_>) -> anyhow::Result<Node> + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Produce the page tree for a render context.
    pub fn resolve(&self, context: &PageContext<'_>) -> anyhow::Result<Node> {
        match self {
            Self::Static(node) => Ok(node.clone()),
            Self::Dynamic(f) => f.render(context),
        }
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(node) => f.debug_tuple("Static").field(node).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

/// An HTML page with front-matter style metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Template {
    #[serde(flatten)]
    pub location: Location,
    #[serde(skip)]
    pub page: Page,
    #[serde(serialize_with = "serialize_date", skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub tags: Vec<String>,
    /// `Some(false)` excludes the page from feeds and pagination.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed: Option<bool>,
    /// `Some(false)` excludes the page from the sitemap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Set on pages generated from a `[tag]` template. Exposed to pages
    /// as the full catalog through [`PageContext::tag`].
    #[serde(skip)]
    pub tag: Option<String>,
}

impl Template {
    /// A bare template with no metadata.
    pub fn new(location: Location, page: Page) -> Self {
        Self {
            location,
            page,
            date: None,
            author: None,
            tags: Vec::new(),
            feed: None,
            map: None,
            summary: None,
            title: None,
            tag: None,
        }
    }

    /// Dated and not opted out of feeds.
    pub fn is_feed_eligible(&self) -> bool {
        self.date.is_some() && self.feed != Some(false)
    }

    pub fn in_sitemap(&self) -> bool {
        self.map != Some(false)
    }
}

#[derive(Debug, Clone)]
pub enum Article {
    Document(Document),
    Stylesheet(Stylesheet),
    Template(Arc<Template>),
}

impl Article {
    pub fn location(&self) -> &Location {
        match self {
            Self::Document(d) => &d.location,
            Self::Stylesheet(s) => &s.location,
            Self::Template(t) => &t.location,
        }
    }

    pub fn as_template(&self) -> Option<&Arc<Template>> {
        match self {
            Self::Template(t) => Some(t),
            _ => None,
        }
    }
}

// ============================================================================
// Dates
// ============================================================================

/// Parse a template date.
///
/// Accepts RFC 3339, a naive date-time, or a plain date. Values without an
/// offset are taken as UTC.
pub fn parse_date(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Format as `YYYY-MM-DDTHH:MM:SS.mmmZ` in UTC.
pub fn format_date(date: &DateTime<FixedOffset>) -> String {
    date.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_date<S: Serializer>(
    date: &Option<DateTime<FixedOffset>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match date {
        Some(date) => serializer.serialize_str(&format_date(date)),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_rfc3339() {
        let date = parse_date("2024-01-02T03:04:05+02:00");
        assert_eq!(date.map(|d| format_date(&d)).as_deref(), Some("2024-01-02T01:04:05.000Z"));
    }

    #[test]
    fn test_parse_date_naive_and_plain() {
        let naive = parse_date("2024-01-02T03:04:05").map(|d| format_date(&d));
        assert_eq!(naive.as_deref(), Some("2024-01-02T03:04:05.000Z"));

        let plain = parse_date("2024-01-02").map(|d| format_date(&d));
        assert_eq!(plain.as_deref(), Some("2024-01-02T00:00:00.000Z"));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-01").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_feed_eligibility() {
        let location = Location {
            source: PathBuf::from("/site/a.html.ls"),
            path: "a.html.ls".into(),
            output: PathBuf::from("/site/public/a.html"),
            url: "/a.html".into(),
        };
        let mut template = Template::new(location, Page::Static(Node::empty()));
        assert!(!template.is_feed_eligible());

        template.date = parse_date("2024-01-01");
        assert!(template.is_feed_eligible());

        template.feed = Some(false);
        assert!(!template.is_feed_eligible());

        assert!(template.in_sitemap());
        template.map = Some(false);
        assert!(!template.in_sitemap());
    }
}
