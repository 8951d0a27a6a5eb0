//! `[build]` section configuration.
//!
//! Paths, source extension, serializer mode and the article compiler command.

use super::defaults;
use educe::Educe;
use serde::Deserialize;
use std::path::PathBuf;

/// `[build]` section in pocket.toml.
///
/// # Example
/// ```toml
/// [build]
/// output = "public"             # Output directory
/// exclude = ["drafts"]          # Skipped during discovery
/// extension = "ls"              # Source extension
/// pretty = false                # Indented output
/// compiler = ["pocket-compile"] # Article compiler command
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Site root directory (usually set via CLI `--path`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Paths skipped during discovery, relative to root.
    #[serde(default = "defaults::build::exclude")]
    #[educe(Default = defaults::build::exclude())]
    pub exclude: Vec<PathBuf>,

    /// Source-file extension, without the dot.
    #[serde(default = "defaults::build::extension")]
    #[educe(Default = defaults::build::extension())]
    pub extension: String,

    /// Indent output instead of the compact form.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub pretty: bool,

    /// Article compiler program and leading arguments.
    #[serde(default = "defaults::build::compiler")]
    #[educe(Default = defaults::build::compiler())]
    pub compiler: Vec<String>,
}
