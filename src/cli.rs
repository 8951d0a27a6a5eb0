//! Command-line interface definitions.

use clap::Parser;
use std::path::PathBuf;

/// PocketPress static site builder
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Site root directory (default: current directory)
    #[arg(short = 'p', long = "path")]
    pub root: Option<PathBuf>,

    /// Output directory path (relative to site root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip a path during discovery (relative to site root, repeatable)
    #[arg(short, long = "exclude")]
    pub exclude: Vec<PathBuf>,

    /// Rebuild whenever a source file changes
    #[arg(short, long)]
    pub watch: bool,

    /// Config file name (default: pocket.toml)
    #[arg(short = 'C', long, default_value = "pocket.toml")]
    pub config: PathBuf,

    /// Indent the rendered output
    #[arg(long)]
    pub pretty: bool,
}
