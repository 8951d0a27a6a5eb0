//! Compiled articles and the cross-article site index.
//!
//! ```text
//! compile ──► Vec<Article> ──► SiteIndex::build ──► context_for(template) ──► render
//!                                (tags, authors,         (previous, next, tag)
//!                                 feed entries)
//! ```

mod article;
mod context;
mod index;

pub use article::{
    Article, Document, Location, Page, PageFn, Stylesheet, Template, format_date, parse_date,
};
pub use context::PageContext;
pub use index::{Catalog, SiteIndex};

#[cfg(test)]
pub(crate) use index::tests as index_tests;
