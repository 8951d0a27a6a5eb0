//! Site configuration management for `pocket.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[base]`    | Site identity for sitemap and feeds              |
//! | `[build]`   | Paths, exclusions, output mode, compiler command |
//! | `[watch]`   | Rebuild on change                                |
//!
//! # Example
//!
//! ```toml
//! [base]
//! url = "https://example.com"
//! title = "My Site"
//!
//! [build]
//! output = "public"
//! exclude = ["drafts"]
//!
//! [watch]
//! debounce_ms = 300
//! ```
//!
//! The file is optional. Without it every field takes its default.

mod base;
mod build;
pub mod defaults;
mod error;
mod handle;
mod watch;

pub use base::BaseConfig;
pub use build::BuildConfig;
pub use error::ConfigError;
pub use handle::{cfg, init_config, reload_config};
pub use watch::WatchConfig;

use crate::cli::Cli;
use crate::compiler::BuildContext;
use anyhow::{Context, Result, bail};
use educe::Educe;
use serde::Deserialize;
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

/// Directories never scanned for sources.
const ALWAYS_EXCLUDED: [&str; 2] = [".git", "node_modules"];

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing pocket.toml
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub base: BaseConfig,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Load the config file named by the CLI and apply CLI overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(cli: &'static Cli) -> Result<Self> {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let path = root.join(&cli.config);
        let mut config = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments and make every path absolute.
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.build.exclude.extend(cli.exclude.iter().cloned());
        self.build.pretty |= cli.pretty;
        self.watch.enable |= cli.watch;

        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths relative to root and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.exclude = self
            .build
            .exclude
            .iter()
            .map(|path| Self::normalize_path(&root.join(path)))
            .collect();

        // A compiler given as a relative path (`./bin/compile`) lives in the site
        if let Some(program) = self.build.compiler.first_mut() {
            let path = Path::new(program.as_str());
            if path.is_relative() && path.components().count() > 1 {
                *program = Self::normalize_path(&root.join(path))
                    .to_string_lossy()
                    .into_owned();
            }
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            };
            // Missing paths keep their shape minus `.` segments
            absolute
                .components()
                .filter(|c| !matches!(c, Component::CurDir))
                .collect()
        })
    }

    /// Paths skipped during discovery and watching: configured excludes,
    /// `.git`, `node_modules` and the output directory.
    pub fn exclusions(&self) -> Vec<PathBuf> {
        let root = self.get_root();
        let mut paths = self.build.exclude.clone();
        paths.extend(ALWAYS_EXCLUDED.iter().map(|name| root.join(name)));
        paths.push(self.build.output.clone());
        paths
    }

    /// Context handed to the article compiler.
    pub fn build_context(&self) -> BuildContext {
        BuildContext {
            root: self.get_root().to_path_buf(),
            output: self.build.output.clone(),
            watch: self.watch.enable,
            extension: self.build.extension.clone(),
        }
    }

    /// Validate the configuration before a build.
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        let extension = &self.build.extension;
        if extension.is_empty() || extension.contains(['.', '/', '\\']) {
            bail!(ConfigError::Validation(
                "[build.extension] must be a bare extension such as \"ls\"".into()
            ));
        }

        if self.build.output == self.get_root() {
            bail!(ConfigError::Validation(
                "[build.output] must not be the site root".into()
            ));
        }

        Self::check_command_installed("[build.compiler]", &self.build.compiler)?;

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn leak(cli: Cli) -> &'static Cli {
        Box::leak(Box::new(cli))
    }

    fn cli_for(root: &Path) -> Cli {
        Cli {
            root: Some(root.to_path_buf()),
            config: PathBuf::from("pocket.toml"),
            ..Cli::default()
        }
    }

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            url = "https://example.com"
            [build]
            output = "dist"
        "#,
        )
        .unwrap();

        assert_eq!(config.base.url.as_deref(), Some("https://example.com"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = SiteConfig::from_str("[base\nurl = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/nonexistent/pocket.toml")).unwrap_err();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::Io(..))));
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_set_root() {
        let mut config = SiteConfig::default();
        config.set_root(Path::new("/custom/path"));
        assert_eq!(config.get_root(), Path::new("/custom/path"));
    }

    #[test]
    fn test_site_config_default() {
        let config = SiteConfig::default();

        assert!(config.cli.is_none());
        assert_eq!(config.config_path, PathBuf::new());
        assert_eq!(config.base.url, None);
        assert_eq!(config.base.language, "en-US");
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert!(!config.watch.enable);
    }

    #[test]
    fn test_unknown_top_level_field_rejection() {
        let result = SiteConfig::from_str("[serve]\nport = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_without_config_file() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load(leak(cli_for(dir.path()))).unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.output, root.join("public"));
        assert_eq!(config.config_path, root.join("pocket.toml"));
    }

    #[test]
    fn test_load_applies_cli_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pocket.toml"),
            "[build]\noutput = \"dist\"\nexclude = [\"drafts\"]\n",
        )
        .unwrap();
        let cli = Cli {
            output: Some(PathBuf::from("out")),
            exclude: vec![PathBuf::from("tmp")],
            watch: true,
            pretty: true,
            ..cli_for(dir.path())
        };
        let config = SiteConfig::load(leak(cli)).unwrap();

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.build.output, root.join("out"));
        assert_eq!(config.build.exclude, vec![root.join("drafts"), root.join("tmp")]);
        assert!(config.build.pretty);
        assert!(config.watch.enable);
        assert!(config.build_context().watch);
    }

    #[test]
    fn test_exclusions_include_defaults_and_output() {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::load(leak(cli_for(dir.path()))).unwrap();
        let root = dir.path().canonicalize().unwrap();

        let exclusions = config.exclusions();
        assert!(exclusions.contains(&root.join(".git")));
        assert!(exclusions.contains(&root.join("node_modules")));
        assert!(exclusions.contains(&root.join("public")));
    }

    #[test]
    fn test_relative_compiler_path_resolved_against_root() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("pocket.toml"),
            "[build]\ncompiler = [\"./bin/compile\", \"--fast\"]\n",
        )
        .unwrap();
        let config = SiteConfig::load(leak(cli_for(dir.path()))).unwrap();
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(
            config.build.compiler,
            vec![root.join("bin/compile").to_string_lossy().into_owned(), "--fast".into()]
        );
    }

    #[test]
    fn test_normalize_missing_path_drops_cur_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();

        let normalized = SiteConfig::normalize_path(&root.join("./bin/./compile"));
        assert_eq!(normalized, root.join("bin").join("compile"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let mut config = SiteConfig::default();
        config.base.url = Some("example.com".into());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("[base.url]"));
    }

    #[test]
    fn test_validate_rejects_bad_extension() {
        let mut config = SiteConfig::default();
        config.build.extension = ".ls".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_compiler() {
        let mut config = SiteConfig::default();
        config.build.compiler = Vec::new();
        assert!(config.validate().is_err());

        config.build.compiler = vec!["pocket-compiler-that-does-not-exist".into()];
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("not found"));
    }
}
