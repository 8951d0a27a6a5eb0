//! Derived site artifacts.
//!
//! Written after every build when `[base.url]` is set:
//!
//! | File          | Source                         |
//! |---------------|--------------------------------|
//! | `sitemap.xml` | templates with `map != false`  |
//! | `robots.txt`  | fixed, points at the sitemap   |
//! | `feed.xml`    | feed entries, Atom             |
//! | `feed.json`   | feed entries, JSON Feed 1.1    |
//!
//! Without a base URL nothing is written and no error is raised. The feeds
//! are skipped when the site has no feed entries.

mod feed;
mod sitemap;

use crate::{config::SiteConfig, log, site::SiteIndex};
use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub use feed::{build_atom, build_json_feed};
pub use sitemap::{build_robots_txt, build_sitemap_xml};

/// Write all metadata files into the output directory.
///
/// Returns the paths written.
pub fn write_metadata(config: &SiteConfig, index: &SiteIndex) -> Result<Vec<PathBuf>> {
    let Some(base_url) = config.base.base_url() else {
        return Ok(Vec::new());
    };
    let output = &config.build.output;
    let mut written = Vec::with_capacity(4);

    written.push(write(output, "sitemap.xml", &build_sitemap_xml(base_url, index))?);
    written.push(write(output, "robots.txt", &build_robots_txt(base_url))?);
    log!("sitemap"; "sitemap.xml, robots.txt");

    if !index.entries.is_empty() {
        let title = config.base.title.as_deref().unwrap_or(base_url);
        let atom = build_atom(base_url, title, &index.entries);
        let json = build_json_feed(base_url, title, &config.base.language, &index.entries)?;
        written.push(write(output, "feed.xml", &atom)?);
        written.push(write(output, "feed.json", &json)?);
        log!("feed"; "feed.xml, feed.json");
    }

    Ok(written)
}

fn write(output: &Path, name: &str, content: &str) -> Result<PathBuf> {
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let path = output.join(name);
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// Remove a trailing `index.html` so directory URLs stay canonical.
pub(crate) fn trim_index(url: &str) -> &str {
    url.strip_suffix("index.html").unwrap_or(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{Article, parse_date};
    use crate::site::index_tests::template;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config(dir: &TempDir, url: Option<&str>) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.base.url = url.map(str::to_owned);
        config.build.output = dir.path().join("public");
        config
    }

    #[test]
    fn test_trim_index() {
        assert_eq!(trim_index("/index.html"), "/");
        assert_eq!(trim_index("/posts/index.html"), "/posts/");
        assert_eq!(trim_index("/posts/a.html"), "/posts/a.html");
    }

    #[test]
    fn test_no_base_url_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let index = SiteIndex::build(&[Article::Template(Arc::new(template("index.html.ls")))]);
        let written = write_metadata(&config(&dir, None), &index).unwrap();

        assert!(written.is_empty());
        assert!(!dir.path().join("public").exists());
    }

    #[test]
    fn test_feeds_skipped_without_entries() {
        let dir = TempDir::new().unwrap();
        let index = SiteIndex::build(&[Article::Template(Arc::new(template("index.html.ls")))]);
        let written = write_metadata(&config(&dir, Some("https://example.com")), &index).unwrap();

        let names: Vec<_> = written.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(names, ["sitemap.xml", "robots.txt"]);
    }

    #[test]
    fn test_writes_all_files() {
        let dir = TempDir::new().unwrap();
        let mut post = template("posts/a.html.ls");
        post.date = parse_date("2024-05-06");
        post.title = Some("A".into());
        let index = SiteIndex::build(&[Article::Template(Arc::new(post))]);

        let written = write_metadata(&config(&dir, Some("https://example.com/")), &index).unwrap();
        assert_eq!(written.len(), 4);

        let robots = fs::read_to_string(dir.path().join("public/robots.txt")).unwrap();
        assert_eq!(robots, "User-agent: *\nSitemap: https://example.com/sitemap.xml\n");
        let atom = fs::read_to_string(dir.path().join("public/feed.xml")).unwrap();
        assert!(atom.contains("https://example.com/posts/a.html"));
    }
}
