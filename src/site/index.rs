//! Site index: cross-article tables built after every article compiled.
//!
//! The index is built once per build cycle and is read-only afterwards.
//! Rendering never starts before it exists, so function pages always see
//! the complete site.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::Serialize;

use super::article::{Article, Location, Template};
use super::context::PageContext;

/// A named group of templates (one tag, or one author).
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub name: String,
    pub templates: Vec<Arc<Template>>,
}

impl Catalog {
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[derive(Debug, Default, Serialize)]
pub struct SiteIndex {
    pub templates: Vec<Arc<Template>>,
    pub documents: Vec<Location>,
    pub stylesheets: Vec<Location>,
    /// Most-used first; ties keep first-seen order.
    pub tags: Vec<Catalog>,
    /// Most-used first; ties keep first-seen order.
    pub authors: Vec<Catalog>,
    /// Feed-eligible templates, newest first; equal dates keep compiled order.
    pub entries: Vec<Arc<Template>>,
    /// `entries` position by source path.
    #[serde(skip)]
    positions: FxHashMap<String, usize>,
}

impl SiteIndex {
    pub fn build(articles: &[Article]) -> Self {
        let mut index = Self::default();

        for article in articles {
            match article {
                Article::Template(t) => index.templates.push(Arc::clone(t)),
                Article::Document(d) => index.documents.push(d.location.clone()),
                Article::Stylesheet(s) => index.stylesheets.push(s.location.clone()),
            }
        }

        let mut tags = CatalogBuilder::default();
        let mut authors = CatalogBuilder::default();
        for template in &index.templates {
            for tag in &template.tags {
                tags.add(tag, template);
            }
            if let Some(author) = template.author.as_deref().filter(|a| !a.is_empty()) {
                authors.add(author, template);
            }
        }
        index.tags = tags.finish();
        index.authors = authors.finish();

        let mut entries: Vec<_> = index
            .templates
            .iter()
            .filter(|t| t.is_feed_eligible())
            .cloned()
            .collect();
        // `sort_by` is stable
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        index.positions = entries
            .iter()
            .enumerate()
            .map(|(i, t)| (t.location.path.clone(), i))
            .collect();
        index.entries = entries;

        index
    }

    pub fn tag(&self, name: &str) -> Option<&Catalog> {
        self.tags.iter().find(|c| c.name == name)
    }

    pub fn author(&self, name: &str) -> Option<&Catalog> {
        self.authors.iter().find(|c| c.name == name)
    }

    /// Older and newer neighbours of a feed-eligible template.
    ///
    /// Returns `(previous, next)`; both `None` for pages outside the feed.
    pub fn neighbors(&self, template: &Template) -> (Option<&Template>, Option<&Template>) {
        let Some(&i) = self.positions.get(&template.location.path) else {
            return (None, None);
        };
        let previous = self.entries.get(i + 1).map(Arc::as_ref);
        let next = i
            .checked_sub(1)
            .and_then(|j| self.entries.get(j))
            .map(Arc::as_ref);
        (previous, next)
    }

    /// Render context for one template.
    pub fn context_for<'a>(&'a self, template: &'a Template) -> PageContext<'a> {
        let (previous, next) = self.neighbors(template);
        PageContext {
            article: template,
            site: self,
            previous,
            next,
            tag: template.tag.as_deref().and_then(|name| self.tag(name)),
        }
    }
}

/// Append-only per-name lists in first-seen order.
#[derive(Default)]
struct CatalogBuilder {
    catalogs: Vec<Catalog>,
    lookup: FxHashMap<String, usize>,
}

impl CatalogBuilder {
    fn add(&mut self, name: &str, template: &Arc<Template>) {
        let i = match self.lookup.get(name) {
            Some(&i) => i,
            None => {
                self.lookup.insert(name.to_owned(), self.catalogs.len());
                self.catalogs.push(Catalog {
                    name: name.to_owned(),
                    templates: Vec::new(),
                });
                self.catalogs.len() - 1
            }
        };
        self.catalogs[i].templates.push(Arc::clone(template));
    }

    fn finish(mut self) -> Vec<Catalog> {
        self.catalogs.sort_by(|a, b| b.len().cmp(&a.len()));
        self.catalogs
    }
}
