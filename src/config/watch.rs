//! `[watch]` section configuration.

use super::defaults;
use educe::Educe;
use serde::Deserialize;

/// `[watch]` section in pocket.toml.
///
/// # Example
/// ```toml
/// [watch]
/// enable = true
/// debounce_ms = 300
/// ```
#[derive(Debug, Clone, Educe, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WatchConfig {
    /// Rebuild on file changes. `--watch` turns this on.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Quiet period before a batch of changes triggers a rebuild.
    #[serde(default = "defaults::watch::debounce_ms")]
    #[educe(Default = defaults::watch::debounce_ms())]
    pub debounce_ms: u64,
}
