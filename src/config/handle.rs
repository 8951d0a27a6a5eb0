//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement, so
//! `pocket.toml` can be edited while watching.
//!
//! ```text
//!   render workers (rayon)          watcher
//!        │        │                    │
//!      cfg()    cfg()           reload_config()
//!    (lock-free reads)         (atomic replace)
//!        └────────┴──── CONFIG ────────┘
//! ```

use super::SiteConfig;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use rustc_hash::FxHasher;
use std::fs;
use std::hash::Hasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

// =============================================================================
// Global State
// =============================================================================

/// Global config storage.
///
/// Starts as the default config and is replaced with the loaded one in main.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content last loaded.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

// =============================================================================
// Public API
// =============================================================================

/// Current config. Wait-free; the `Arc` keeps it alive across a reload.
#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

/// Install the loaded config at startup.
pub fn init_config(config: SiteConfig) {
    if let Ok(content) = fs::read_to_string(&config.config_path) {
        CONFIG_HASH.store(hash(content.as_bytes()), Ordering::Relaxed);
    }
    CONFIG.store(Arc::new(config));
}

/// Reload the config file and replace the global config.
///
/// Returns `false` when the file content has not changed since the last load.
pub fn reload_config() -> Result<bool> {
    let current = cfg();
    let cli = current
        .cli
        .context("CLI arguments missing from config; was init_config called?")?;

    let content = fs::read_to_string(&current.config_path)
        .with_context(|| format!("Failed to read {}", current.config_path.display()))?;
    let new_hash = hash(content.as_bytes());
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let config = SiteConfig::load(cli)?;
    config.validate()?;
    CONFIG.store(Arc::new(config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);
    Ok(true)
}

fn hash(bytes: &[u8]) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(bytes);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_content_based() {
        assert_eq!(hash(b"[base]"), hash(b"[base]"));
        assert_ne!(hash(b"[base]"), hash(b"[build]"));
    }
}
