//! File system watcher for rebuild on change.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ handle_changes()             │
//! │ events   │    │ (300ms)   │    │  config changed → reload     │
//! └──────────┘    └───────────┘    │  then full rebuild           │
//!                                  │  new SiteIndex swapped in    │
//!                                  │  .live-reload.js rewritten   │
//!                                  └──────────────────────────────┘
//! ```
//!
//! A failed rebuild is logged and the loop keeps waiting for the next change.

use crate::{
    build::{BuildReport, build_site},
    compiler::{CommandCompiler, LIVE_RELOAD_FILE, SourceKind},
    config::{SiteConfig, cfg, reload_config},
    log,
    site::SiteIndex,
};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, LazyLock, mpsc},
    time::{Duration, Instant},
};

// =============================================================================
// Site Index
// =============================================================================

/// Index of the most recent build. Replaced whole after every rebuild and
/// compared against the next one to report added and removed pages.
static SITE_INDEX: LazyLock<ArcSwap<SiteIndex>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteIndex::default()));

/// Build with the current config, then publish the index and the
/// live-reload timestamp.
pub fn rebuild() -> Result<BuildReport> {
    let config = cfg();
    let compiler = CommandCompiler::new(config.build.compiler.clone());
    let report = build_site(&config, &compiler)?;

    let previous = SITE_INDEX.swap(Arc::clone(&report.index));
    if !previous.templates.is_empty() {
        let (added, removed) = page_changes(&previous, &report.index);
        if !added.is_empty() {
            log!("watch"; "new pages: {}", added.join(", "));
        }
        if !removed.is_empty() {
            log!("watch"; "removed pages: {}", removed.join(", "));
        }
    }

    write_live_reload(&config.build.output, chrono::Utc::now().timestamp_millis())?;
    Ok(report)
}

/// Template paths present only in `current`, and only in `previous`.
fn page_changes<'a>(
    previous: &'a SiteIndex,
    current: &'a SiteIndex,
) -> (Vec<&'a str>, Vec<&'a str>) {
    let paths = |index: &'a SiteIndex| -> FxHashSet<&'a str> {
        index.templates.iter().map(|t| t.location.path.as_str()).collect()
    };
    let (before, after) = (paths(previous), paths(current));

    let only = |index: &'a SiteIndex, other: &FxHashSet<&'a str>| -> Vec<&'a str> {
        index
            .templates
            .iter()
            .map(|t| t.location.path.as_str())
            .filter(|path| !other.contains(path))
            .collect()
    };
    (only(current, &before), only(previous, &after))
}

// =============================================================================
// Live Reload
// =============================================================================

/// Polls itself; reloads the page once a newer build rewrites the file.
const LIVE_RELOAD_SCRIPT: &str = r#"(function () {
  var built = __BUILT__;
  if (window.__pocketBuilt === undefined) {
    window.__pocketBuilt = built;
    var src = document.currentScript.src.split("?")[0];
    setInterval(function () {
      var script = document.createElement("script");
      script.src = src + "?" + Date.now();
      script.onload = script.onerror = function () { script.remove(); };
      document.head.appendChild(script);
    }, 1000);
  } else if (window.__pocketBuilt !== built) {
    location.reload();
  }
})();
"#;

fn live_reload_script(timestamp: i64) -> String {
    LIVE_RELOAD_SCRIPT.replace("__BUILT__", &timestamp.to_string())
}

fn write_live_reload(output: &Path, timestamp: i64) -> Result<()> {
    fs::create_dir_all(output).with_context(|| format!("Failed to create {}", output.display()))?;
    let path = output.join(LIVE_RELOAD_FILE);
    fs::write(&path, live_reload_script(timestamp))
        .with_context(|| format!("Failed to write {}", path.display()))
}

// =============================================================================
// Path Utilities
// =============================================================================

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Config,
    Source,
    Ignored,
}

fn classify(path: &Path, config: &SiteConfig) -> Change {
    if path == config.config_path {
        return Change::Config;
    }
    if is_temp_file(path) || config.exclusions().iter().any(|x| path.starts_with(x)) {
        return Change::Ignored;
    }
    match SourceKind::of(path, &config.build.extension) {
        Some(_) => Change::Source,
        None => Change::Ignored,
    }
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events until they go quiet.
struct Debouncer {
    delay: Duration,
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            pending: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add(&mut self, event: Event) {
        self.pending.extend(event.paths);
        self.last_event = Some(Instant::now());
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty() && self.last_event.is_some_and(|t| t.elapsed() >= self.delay)
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            self.delay
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

/// Rebuild for a batch of changed paths. Nothing happens if none matter.
fn handle_changes(paths: &[PathBuf]) {
    let config = cfg();
    let changes: Vec<_> = paths
        .iter()
        .map(|path| (path, classify(path, &config)))
        .filter(|(_, change)| *change != Change::Ignored)
        .collect();
    if changes.is_empty() {
        return;
    }

    if changes.iter().any(|(_, change)| *change == Change::Config) {
        match reload_config() {
            Ok(true) => log!("watch"; "config reloaded"),
            Ok(false) => {}
            Err(e) => {
                log!("watch"; "config reload failed, keeping previous config");
                log!("error"; "{e:#}");
            }
        }
    }

    let root = config.get_root();
    let trigger: Vec<_> = changes.iter().map(|(p, _)| rel_path(p, root)).collect();
    log!("watch"; "{} changed, rebuilding...", trigger.join(", "));

    match rebuild() {
        Ok(report) if report.is_success() => {
            log!("watch"; "rebuilt {} articles", report.articles_written);
        }
        Ok(report) => {
            log!("watch"; "rebuilt with {} failed articles", report.failures.len());
        }
        Err(e) => {
            log!("watch"; "build failed");
            log!("error"; "{e:#}");
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the site root and rebuild on change. Blocks until the watcher stops.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    let root = config.get_root().to_path_buf();

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;
    log!("watch"; "watching {}", root.display());

    let mut debouncer = Debouncer::new(config.watch.debounce_ms);
    drop(config);

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => debouncer.add(event),
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                handle_changes(&debouncer.take());
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
