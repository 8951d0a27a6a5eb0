//! Atom and JSON feeds over the site's feed entries.
//!
//! Entries arrive newest first, as ordered by the site index.

use super::trim_index;
use crate::site::{Template, format_date};
use anyhow::Result;
use atom_syndication::{
    ContentBuilder, EntryBuilder, FeedBuilder, GeneratorBuilder, LinkBuilder, Text,
};
use serde::Serialize;
use std::sync::Arc;

/// JSON Feed version URL
const JSON_FEED_VERSION: &str = "https://jsonfeed.org/version/1.1";

// ============================================================================
// Atom
// ============================================================================

/// Build `feed.xml`.
pub fn build_atom(base_url: &str, title: &str, entries: &[Arc<Template>]) -> String {
    let updated = entries.iter().find_map(|t| t.date).unwrap_or_default();

    let items: Vec<_> = entries
        .iter()
        .filter_map(|t| {
            let date = t.date?;
            let link = format!("{base_url}{}", trim_index(&t.location.url));
            Some(
                EntryBuilder::default()
                    .id(format!("{base_url}{}", t.location.url))
                    .title(Text::plain(t.title.clone().unwrap_or_default()))
                    .summary(t.summary.clone().map(Text::plain))
                    .updated(date)
                    .links(vec![LinkBuilder::default().href(link.clone()).build()])
                    .content(
                        ContentBuilder::default()
                            .value(link)
                            .content_type(Some("text".to_owned()))
                            .build(),
                    )
                    .build(),
            )
        })
        .collect();

    let feed = FeedBuilder::default()
        .title(Text::plain(title))
        .id(base_url)
        .updated(updated)
        .links(vec![
            LinkBuilder::default()
                .href(format!("{base_url}/feed.xml"))
                .rel("self")
                .build(),
            LinkBuilder::default().href(format!("{base_url}/")).build(),
        ])
        .generator(
            GeneratorBuilder::default()
                .value("PocketPress")
                .version(Some(env!("CARGO_PKG_VERSION").to_owned()))
                .build(),
        )
        .entries(items)
        .build();

    feed.to_string()
}

// ============================================================================
// JSON Feed
// ============================================================================

#[derive(Debug, Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: String,
    language: &'a str,
    items: Vec<JsonItem<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonItem<'a> {
    id: String,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    content_text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
    date_published: String,
    tags: &'a [String],
}

/// Build `feed.json`.
pub fn build_json_feed(
    base_url: &str,
    title: &str,
    language: &str,
    entries: &[Arc<Template>],
) -> Result<String> {
    let items = entries
        .iter()
        .filter_map(|t| {
            let url = format!("{base_url}{}", trim_index(&t.location.url));
            Some(JsonItem {
                id: url.clone(),
                url,
                title: t.title.as_deref(),
                content_text: t.summary.as_deref().unwrap_or_default(),
                summary: t.summary.as_deref(),
                date_published: format_date(t.date.as_ref()?),
                tags: &t.tags,
            })
        })
        .collect();

    let feed = JsonFeed {
        version: JSON_FEED_VERSION,
        title,
        home_page_url: base_url,
        feed_url: format!("{base_url}/feed.json"),
        language,
        items,
    };
    Ok(serde_json::to_string_pretty(&feed)?)
}
