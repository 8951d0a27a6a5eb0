//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── discover()        walk the root, skip exclusions, sort
//!     │
//!     ├── compile           every source in parallel, failures isolated
//!     │                     ([tag] templates only loaded)
//!     │
//!     ├── SiteIndex::build  barrier: needs every compiled article
//!     │
//!     ├── expand tags       run each [tag] program once per tag catalog
//!     │
//!     ├── render + write    parallel, runtime failures isolated
//!     │
//!     └── write_metadata()  sitemap, robots.txt, feeds
//! ```
//!
//! A failing article is reported and left out; the rest of the site is
//! still written.

use crate::{
    compiler::{
        ArticleCompiler, BuildContext, Compiled, Program, SourceKind, TAG_PLACEHOLDER,
        TemplateRecord, is_tag_template,
    },
    config::SiteConfig,
    generator, log,
    render::{Mode, render},
    site::{Article, Document, Location, SiteIndex, Stylesheet, Template, parse_date},
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use walkdir::WalkDir;

const DOCTYPE: &str = "<!DOCTYPE html>";

// ============================================================================
// Results
// ============================================================================

/// A failure scoped to one article.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ArticleError {
    /// The source did not produce an article.
    #[error("Compile error in \"{path}\": {message}")]
    Compile { path: String, message: String },

    /// A page function failed during rendering.
    #[error("Runtime error in \"{path}\": {message}")]
    Runtime { path: String, message: String },
}

impl ArticleError {
    fn compile(path: &str, err: &anyhow::Error) -> Self {
        Self::Compile {
            path: path.to_owned(),
            message: format!("{err:#}"),
        }
    }

    fn runtime(path: &str, err: &anyhow::Error) -> Self {
        Self::Runtime {
            path: path.to_owned(),
            message: format!("{err:#}"),
        }
    }

    /// Relative source path of the failed article.
    pub fn path(&self) -> &str {
        match self {
            Self::Compile { path, .. } | Self::Runtime { path, .. } => path,
        }
    }
}

/// Outcome of one build cycle.
#[derive(Debug)]
pub struct BuildReport {
    pub articles_written: usize,
    pub failures: Vec<ArticleError>,
    pub metadata_written: Vec<PathBuf>,
    /// Index the cycle rendered with.
    pub index: Arc<SiteIndex>,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Build the whole site once.
///
/// Article failures are collected into the report. Errors returned here are
/// infrastructure failures: unreadable root, unwritable output.
pub fn build_site(config: &SiteConfig, compiler: &dyn ArticleCompiler) -> Result<BuildReport> {
    let context = config.build_context();
    let mode = Mode::from_pretty(config.build.pretty);

    let (tag_sources, sources): (Vec<_>, Vec<_>) = discover(config)?
        .into_iter()
        .partition(|path| is_tag_template(path, &context.extension));

    log!("build"; "compiling {} articles", sources.len() + tag_sources.len());
    let mut failures = Vec::new();

    let compiled: Vec<_> = sources
        .par_iter()
        .map(|source| compile_article(source, &context, compiler))
        .collect();
    let mut articles = Vec::with_capacity(compiled.len());
    for result in compiled {
        match result {
            Ok(article) => articles.push(article),
            Err(err) => failures.push(err),
        }
    }

    let index = Arc::new(SiteIndex::build(&articles));

    for source in &tag_sources {
        let program = match compiler.load(source, &context) {
            Ok(program) => program,
            Err(err) => {
                failures.push(ArticleError::compile(&context.relative(source), &err));
                continue;
            }
        };
        for catalog in &index.tags {
            match expand_tag(source, &catalog.name, program.as_ref(), &context) {
                Ok(template) => articles.push(Article::Template(Arc::new(template))),
                Err(err) => failures.push(err),
            }
        }
    }

    let rendered: Vec<_> = articles
        .par_iter()
        .map(|article| render_article(article, &index, mode))
        .collect();
    let mut outputs = Vec::with_capacity(rendered.len());
    for result in rendered {
        match result {
            Ok(output) => outputs.push(output),
            Err(err) => failures.push(err),
        }
    }

    outputs
        .par_iter()
        .try_for_each(|(path, content)| write_output(path, content))?;
    log!("build"; "rendered {} articles", outputs.len());

    for failure in &failures {
        log!("error"; "{}", failure);
    }

    let metadata_written = generator::write_metadata(config, &index)?;
    log!("build"; "done");

    Ok(BuildReport {
        articles_written: outputs.len(),
        failures,
        metadata_written,
        index,
    })
}

/// Source files under the root, sorted by path.
pub fn discover(config: &SiteConfig) -> Result<Vec<PathBuf>> {
    let root = config.get_root();
    let extension = &config.build.extension;
    let exclusions = config.exclusions();

    let mut sources = Vec::new();
    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !exclusions.iter().any(|x| e.path().starts_with(x)))
    {
        let entry = entry.with_context(|| format!("Failed to scan {}", root.display()))?;
        if entry.file_type().is_file() && SourceKind::of(entry.path(), extension).is_some() {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}

// ============================================================================
// Stages
// ============================================================================

fn locate(source: &Path, context: &BuildContext) -> Location {
    Location {
        source: source.to_path_buf(),
        path: context.relative(source),
        output: context.output_for(source),
        url: context.url_for(source),
    }
}

fn compile_article(
    source: &Path,
    context: &BuildContext,
    compiler: &dyn ArticleCompiler,
) -> Result<Article, ArticleError> {
    let location = locate(source, context);
    let kind = SourceKind::of(source, &context.extension).unwrap_or(SourceKind::Document);
    let article = compiler
        .load(source, context)
        .and_then(|program| program.run())
        .and_then(|compiled| into_article(kind, location.clone(), compiled));
    article.map_err(|err| ArticleError::compile(&location.path, &err))
}

fn into_article(kind: SourceKind, location: Location, compiled: Compiled) -> Result<Article> {
    Ok(match kind {
        SourceKind::Template => {
            Article::Template(Arc::new(into_template(location, compiled.into_record())?))
        }
        SourceKind::Stylesheet => Article::Stylesheet(Stylesheet {
            location,
            content: compiled.into_content()?,
        }),
        SourceKind::Document => Article::Document(Document {
            location,
            content: compiled.into_content()?,
        }),
    })
}

fn into_template(location: Location, record: TemplateRecord) -> Result<Template> {
    let date = record
        .date
        .as_deref()
        .map(|date| parse_date(date).with_context(|| format!("Invalid date `{date}`")))
        .transpose()?;

    let mut template = Template::new(location, record.page);
    template.date = date;
    template.author = record.author;
    template.tags = record.tags;
    template.feed = record.feed;
    template.map = record.map;
    template.summary = record.summary;
    template.title = record.title;
    Ok(template)
}

/// One generated page of a `[tag]` template.
fn expand_tag(
    source: &Path,
    tag: &str,
    program: &dyn Program,
    context: &BuildContext,
) -> Result<Template, ArticleError> {
    let name = source
        .file_name()
        .map(|n| n.to_string_lossy().replace(TAG_PLACEHOLDER, tag))
        .unwrap_or_default();
    let generated = source.with_file_name(name);
    let mut location = locate(&generated, context);
    location.source = source.to_path_buf();

    let path = location.path.clone();
    if !is_safe_tag(tag) {
        let err = anyhow::anyhow!("tag `{tag}` cannot be used in a file name");
        return Err(ArticleError::compile(&path, &err));
    }
    let mut template = program
        .run()
        .and_then(|compiled| into_template(location, compiled.into_record()))
        .map_err(|err| ArticleError::compile(&path, &err))?;
    template.tag = Some(tag.to_owned());
    Ok(template)
}

/// A tag may only fill the file name of the page it generates.
fn is_safe_tag(tag: &str) -> bool {
    !tag.is_empty() && !tag.contains(['/', '\\']) && !tag.contains("..")
}

fn render_article(
    article: &Article,
    index: &SiteIndex,
    mode: Mode,
) -> Result<(PathBuf, String), ArticleError> {
    match article {
        Article::Document(Document { location, content })
        | Article::Stylesheet(Stylesheet { location, content }) => {
            Ok((location.output.clone(), render(content, mode)))
        }
        Article::Template(template) => {
            let location = &template.location;
            let page = template
                .page
                .resolve(&index.context_for(template))
                .map_err(|err| ArticleError::runtime(&location.path, &err))?;
            let html = format!("{DOCTYPE}\n{}", render(&page, mode));
            Ok((location.output.clone(), html))
        }
    }
}

fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::wire;
    use crate::markup::Node;
    use crate::site::{Page, PageContext};
    use anyhow::bail;
    use serde_json::Value;
    use tempfile::TempDir;

    /// Sources hold the JSON a compiler would print. Function pages list
    /// the feed titles, the tag and its size on tag pages, or their
    /// neighbors when dated. A page titled `boom` fails while rendering.
    struct JsonCompiler;

    impl ArticleCompiler for JsonCompiler {
        fn load(&self, path: &Path, context: &BuildContext) -> Result<Arc<dyn Program>> {
            let kind = SourceKind::of(path, &context.extension).context("not a source")?;
            let text = fs::read_to_string(path)?;
            Ok(Arc::new(move || {
                let value: Value = serde_json::from_str(&text)?;
                wire::decode_compiled(kind, &value, || Page::dynamic(listing))
            }))
        }
    }

    fn listing(context: &PageContext<'_>) -> Result<Node> {
        if context.article.title.as_deref() == Some("boom") {
            bail!("page exploded");
        }
        if let Some(tag) = context.tag {
            return Ok(Node::Text(format!("{}:{}", tag.name, tag.len())));
        }
        if context.article.date.is_some() {
            fn title<'a>(t: Option<&'a Template>) -> &'a str {
                t.and_then(|t| t.title.as_deref()).unwrap_or("")
            }
            return Ok(Node::Text(format!(
                "{}<{}>{}",
                title(context.previous),
                context.article.title.as_deref().unwrap_or_default(),
                title(context.next)
            )));
        }
        let titles: Vec<_> = context
            .site
            .entries
            .iter()
            .filter_map(|t| t.title.clone())
            .collect();
        Ok(Node::Text(titles.join(",")))
    }

    fn site(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, content) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn config(dir: &TempDir) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        config.build.output = dir.path().join("public");
        config.base.url = Some("https://example.com".into());
        config
    }

    fn read(dir: &TempDir, path: &str) -> String {
        fs::read_to_string(dir.path().join("public").join(path)).unwrap()
    }

    const POST_A: &str = r#"{
        "page": {"$tag": "p", "$content": "A"},
        "title": "A", "date": "2024-01-01", "tags": ["rust"]
    }"#;
    const POST_B: &str = r#"{
        "page": "B",
        "title": "B", "date": "2024-02-01", "tags": ["rust", "web"]
    }"#;
    const LISTING: &str = r#"{"page": {"$function": true}, "title": "Home"}"#;
    const STYLE: &str = r#"{"$rule": ".a", "$content": {"$property": "color", "$value": "red"}}"#;

    #[test]
    fn test_build_writes_every_kind() {
        let dir = site(&[
            ("index.html.ls", LISTING),
            ("posts/a.html.ls", POST_A),
            ("posts/b.html.ls", POST_B),
            ("style.css.ls", STYLE),
            ("notes.md.ls", r##""# Notes""##),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.articles_written, 5);
        assert_eq!(read(&dir, "index.html"), "<!DOCTYPE html>\nB,A");
        assert_eq!(read(&dir, "posts/a.html"), "<!DOCTYPE html>\n<p>A</p>");
        assert_eq!(read(&dir, "style.css"), ".a{color:red}");
        assert_eq!(read(&dir, "notes.md"), "# Notes");

        let names: Vec<_> = report
            .metadata_written
            .iter()
            .filter_map(|p| p.file_name()?.to_str())
            .collect();
        assert_eq!(names, ["sitemap.xml", "robots.txt", "feed.xml", "feed.json"]);
    }

    #[test]
    fn test_pretty_mode() {
        let dir = site(&[("a.html.ls", r#"{"$tag": "div", "$content": {"$tag": "p"}}"#)]);
        let mut config = config(&dir);
        config.build.pretty = true;
        build_site(&config, &JsonCompiler).unwrap();

        assert_eq!(read(&dir, "a.html"), "<!DOCTYPE html>\n<div>\n  <p></p>\n</div>");
    }

    #[test]
    fn test_runtime_error_isolated() {
        let dir = site(&[
            ("index.html.ls", LISTING),
            ("posts/a.html.ls", POST_A),
            ("boom.html.ls", r#"{"page": {"$function": true}, "title": "boom"}"#),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert_eq!(
            report.failures,
            vec![ArticleError::Runtime {
                path: "boom.html.ls".into(),
                message: "page exploded".into(),
            }]
        );
        assert_eq!(report.articles_written, 2);
        assert!(!dir.path().join("public/boom.html").exists());
        assert!(dir.path().join("public/index.html").exists());

        // Failed pages were indexed before rendering, so they stay listed
        let sitemap = read(&dir, "sitemap.xml");
        assert!(sitemap.contains("https://example.com/boom.html"));
        assert!(dir.path().join("public/feed.xml").exists());
    }

    #[test]
    fn test_compile_errors_excluded_from_index() {
        let dir = site(&[
            ("index.html.ls", LISTING),
            ("posts/a.html.ls", POST_A),
            ("broken.html.ls", "{not json"),
            ("undated.html.ls", r#"{"page": "x", "title": "U", "date": "someday"}"#),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        let paths: Vec<_> = report.failures.iter().map(ArticleError::path).collect();
        assert_eq!(paths, ["broken.html.ls", "undated.html.ls"]);
        assert!(matches!(report.failures[0], ArticleError::Compile { .. }));
        assert!(report.failures[1].to_string().contains("Invalid date `someday`"));

        assert_eq!(report.index.templates.len(), 2);
        assert_eq!(read(&dir, "index.html"), "<!DOCTYPE html>\nA");
        assert!(!read(&dir, "sitemap.xml").contains("broken"));
    }

    #[test]
    fn test_tag_pages_generated_per_catalog() {
        let dir = site(&[
            ("posts/a.html.ls", POST_A),
            ("posts/b.html.ls", POST_B),
            ("tags/[tag].html.ls", r#"{"page": {"$function": true}}"#),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(read(&dir, "tags/rust.html"), "<!DOCTYPE html>\nrust:2");
        assert_eq!(read(&dir, "tags/web.html"), "<!DOCTYPE html>\nweb:1");
        assert!(!dir.path().join("public/tags/[tag].html").exists());

        // Generated after indexing, so absent from site-wide listings
        assert!(!read(&dir, "sitemap.xml").contains("tags/"));
    }

    #[test]
    fn test_function_pages_receive_neighbors() {
        let dated = |title: &str, date: &str| {
            format!(r#"{{"page": {{"$function": true}}, "title": "{title}", "date": "{date}"}}"#)
        };
        let (a, b, c) = (
            dated("a", "2024-01-01"),
            dated("b", "2024-02-01"),
            dated("c", "2024-03-01"),
        );
        let dir = site(&[
            ("posts/a.html.ls", a.as_str()),
            ("posts/b.html.ls", b.as_str()),
            ("posts/c.html.ls", c.as_str()),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        // previous is older, next is newer
        assert_eq!(read(&dir, "posts/a.html"), "<!DOCTYPE html>\n<a>b");
        assert_eq!(read(&dir, "posts/b.html"), "<!DOCTYPE html>\na<b>c");
        assert_eq!(read(&dir, "posts/c.html"), "<!DOCTYPE html>\nb<c>");
    }

    #[test]
    fn test_unsafe_tags_rejected() {
        let post = r#"{"page": "A", "date": "2024-01-01", "tags": ["../../escaped", "ok"]}"#;
        let dir = site(&[
            ("posts/a.html.ls", post),
            ("tags/[tag].html.ls", r#"{"page": {"$function": true}}"#),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert_eq!(report.failures.len(), 1);
        let failure = &report.failures[0];
        assert!(matches!(failure, ArticleError::Compile { .. }));
        assert!(failure.to_string().contains("cannot be used in a file name"));
        assert!(!dir.path().join("escaped.html").exists());
        assert!(!dir.path().join("public/escaped.html").exists());
        assert_eq!(read(&dir, "tags/ok.html"), "<!DOCTYPE html>\nok:1");
    }

    #[test]
    fn test_placeholder_only_replaced_in_file_name() {
        let dir = site(&[
            ("posts/a.html.ls", POST_A),
            ("[tag]/[tag].html.ls", r#"{"page": {"$function": true}}"#),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(read(&dir, "[tag]/rust.html"), "<!DOCTYPE html>\nrust:1");
    }

    #[test]
    fn test_partials_without_inner_extension_skipped() {
        let dir = site(&[
            ("index.html.ls", r#""home""#),
            ("partials/nav.ls", r#""nav""#),
        ]);
        let report = build_site(&config(&dir), &JsonCompiler).unwrap();

        assert!(report.is_success(), "{:?}", report.failures);
        assert_eq!(report.articles_written, 1);
        assert!(!dir.path().join("public/partials/nav").exists());
    }

    #[test]
    fn test_exclusions_skip_sources() {
        let dir = site(&[
            ("index.html.ls", r#""home""#),
            ("drafts/wip.html.ls", r#""wip""#),
            ("node_modules/pkg/x.html.ls", r#""dep""#),
            ("readme.txt", "ignored"),
        ]);
        let mut config = config(&dir);
        config.build.exclude = vec![dir.path().join("drafts")];

        let sources = discover(&config).unwrap();
        assert_eq!(sources, vec![dir.path().join("index.html.ls")]);
    }

    #[test]
    fn test_no_base_url_skips_metadata() {
        let dir = site(&[("posts/a.html.ls", POST_A)]);
        let mut config = config(&dir);
        config.base.url = None;
        let report = build_site(&config, &JsonCompiler).unwrap();

        assert!(report.is_success());
        assert!(report.metadata_written.is_empty());
        assert!(!dir.path().join("public/sitemap.xml").exists());
    }

    #[test]
    fn test_article_error_display() {
        let err = ArticleError::Compile {
            path: "posts/a.html.ls".into(),
            message: "unexpected token".into(),
        };
        assert_eq!(err.to_string(), r#"Compile error in "posts/a.html.ls": unexpected token"#);

        let err = ArticleError::Runtime {
            path: "index.html.ls".into(),
            message: "boom".into(),
        };
        assert_eq!(err.to_string(), r#"Runtime error in "index.html.ls": boom"#);
    }
}
