//! Article compiler boundary.
//!
//! The pipeline never interprets source text itself. An [`ArticleCompiler`]
//! turns one source path into a [`Program`]; running the program yields a
//! node tree or a template record.
//!
//! - **command**: the default compiler, an external process speaking JSON
//! - **wire**: JSON to node tree decoding
//!
//! # Source Kinds
//!
//! | File name              | Kind         | Output         |
//! |------------------------|--------------|----------------|
//! | `index.html.ls`        | `Template`   | `index.html`   |
//! | `style.css.ls`         | `Stylesheet` | `style.css`    |
//! | `notes.md.ls`          | `Document`   | `notes.md`     |
//! | `tags/[tag].html.ls`   | tag template | one page per tag |

pub mod command;
pub mod wire;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::markup::{Content, Node, element};
use crate::site::Page;

pub use command::CommandCompiler;

/// Placeholder replaced by the tag name in tag template paths.
pub const TAG_PLACEHOLDER: &str = "[tag]";

/// Build timestamp script written to the output root in watch mode.
pub const LIVE_RELOAD_FILE: &str = ".live-reload.js";

/// What a source file compiles into, decided by its inner extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Template,
    Stylesheet,
    Document,
}

impl SourceKind {
    /// Classify `path`, or `None` if it is not a `*.<x>.<extension>` source.
    pub fn of(path: &Path, extension: &str) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        let stem = name.strip_suffix(extension)?.strip_suffix('.')?;
        // Partials without an inner extension are not articles.
        match stem.rsplit_once('.') {
            Some((base, inner)) if !base.is_empty() && !inner.is_empty() => {}
            _ => return None,
        }
        Some(if stem.ends_with(".html") {
            Self::Template
        } else if stem.ends_with(".css") {
            Self::Stylesheet
        } else {
            Self::Document
        })
    }
}

/// Whether `path` names a tag template (`[tag].html.<extension>`).
pub fn is_tag_template(path: &Path, extension: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.strip_suffix(extension).is_some_and(|s| s.ends_with("[tag].html.")))
}

/// Paths and mode shared with every compiled program.
///
/// Stands in for the helpers a template program needs from its host:
/// relative includes, file loading, links and the live-reload hook.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub root: PathBuf,
    pub output: PathBuf,
    pub watch: bool,
    /// Source extension without the dot.
    pub extension: String,
}

impl BuildContext {
    /// Resolve `file` relative to the directory of `from`.
    pub fn resolve(&self, from: &Path, file: &str) -> PathBuf {
        if let Some(rooted) = file.strip_prefix('/') {
            return self.root.join(rooted);
        }
        from.parent().unwrap_or(&self.root).join(file)
    }

    /// Read `file` relative to `from`.
    pub fn load_file(&self, from: &Path, file: &str) -> Result<String> {
        let path = self.resolve(from, file);
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// Path relative to the root, with forward slashes.
    pub fn relative(&self, source: &Path) -> String {
        let rel = source.strip_prefix(&self.root).unwrap_or(source);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Site URL of a source file: `/` + relative path without the extension.
    pub fn url_for(&self, source: &Path) -> String {
        let rel = self.relative(source);
        let suffix = format!(".{}", self.extension);
        format!("/{}", rel.strip_suffix(&suffix).unwrap_or(&rel))
    }

    /// Output file of a source file.
    pub fn output_for(&self, source: &Path) -> PathBuf {
        let url = self.url_for(source);
        self.output.join(url.trim_start_matches('/'))
    }

    /// Link target for a site URL.
    ///
    /// While watching, pages are opened straight from the output directory,
    /// so links resolve to output files; otherwise the URL is kept.
    pub fn link_to(&self, url: &str) -> String {
        if !self.watch {
            return url.to_owned();
        }
        let mut target = self.output.join(url.trim_start_matches('/'));
        if url.ends_with('/') || url.is_empty() {
            target.push("index.html");
        }
        format!("file://{}", target.display())
    }

    /// Script tag polling the build timestamp, or nothing outside watch mode.
    pub fn live_reload(&self) -> Node {
        if !self.watch {
            return Node::empty();
        }
        let src = self.link_to(&format!("/{LIVE_RELOAD_FILE}"));
        Node::Element(element("script").build([Content::attrs([("src", src)])]))
    }
}

/// Turns a source file into a runnable program.
pub trait ArticleCompiler: Send + Sync {
    fn load(&self, path: &Path, context: &BuildContext) -> Result<Arc<dyn Program>>;
}

/// A loaded source. Tag templates run once per tag.
pub trait Program: Send + Sync {
    fn run(&self) -> Result<Compiled>;
}

impl<F> Program for F
where
    F: Fn() -> Result<Compiled> + Send + Sync,
{
    fn run(&self) -> Result<Compiled> {
        self()
    }
}

#[derive(Debug, Clone)]
pub enum Compiled {
    /// Body of a document or stylesheet.
    Content(Node),
    Template(TemplateRecord),
}

impl Compiled {
    /// View as a template record; bare content becomes the page.
    pub fn into_record(self) -> TemplateRecord {
        match self {
            Self::Template(record) => record,
            Self::Content(node) => TemplateRecord::new(Page::Static(node)),
        }
    }

    /// View as a node; a template record yields its static page, if any.
    pub fn into_content(self) -> Result<Node> {
        match self {
            Self::Content(node) => Ok(node),
            Self::Template(TemplateRecord {
                page: Page::Static(node),
                ..
            }) => Ok(node),
            Self::Template(_) => anyhow::bail!("only templates may have function pages"),
        }
    }
}

/// Template metadata as returned by a program, before date parsing.
#[derive(Debug, Clone)]
pub struct TemplateRecord {
    pub page: Page,
    /// ISO 8601 date string.
    pub date: Option<String>,
    pub author: Option<String>,
    pub tags: Vec<String>,
    pub feed: Option<bool>,
    pub map: Option<bool>,
    pub summary: Option<String>,
    pub title: Option<String>,
}

impl TemplateRecord {
    pub fn new(page: Page) -> Self {
        Self {
            page,
            date: None,
            author: None,
            tags: Vec::new(),
            feed: None,
            map: None,
            summary: None,
            title: None,
        }
    }
}
