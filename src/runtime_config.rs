//! # Runtime Configuration Module
//!
//! Environment variable based tuning for the dispatch pipeline.
//!
//! ## Environment Variables
//!
//! ### `WAYPOINT_MATCH_CACHE`
//!
//! `on` (default) or `off`. When off, every lookup walks the route tree.
//!
//! ### `WAYPOINT_MATCH_CACHE_CAPACITY`
//!
//! Maximum number of `(method, path)` outcomes the match cache keeps.
//! Once the cache is full, new outcomes are still computed but no longer stored.
//!
//! Default: `10000`
//!
//! ## Usage
//!
//! ```rust
//! use waypoint::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("match cache capacity: {}", config.match_cache_capacity);
//! ```

use std::env;

/// Default number of cached match outcomes.
pub const DEFAULT_MATCH_CACHE_CAPACITY: usize = 10_000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Whether route-match outcomes are memoized
    pub match_cache_enabled: bool,
    /// Upper bound on memoized outcomes
    pub match_cache_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            match_cache_enabled: true,
            match_cache_capacity: DEFAULT_MATCH_CACHE_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let match_cache_enabled = match lookup("WAYPOINT_MATCH_CACHE") {
            Some(val) => !matches!(
                val.trim().to_ascii_lowercase().as_str(),
                "off" | "false" | "0" | "no"
            ),
            None => true,
        };
        let match_cache_capacity = lookup("WAYPOINT_MATCH_CACHE_CAPACITY")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_MATCH_CACHE_CAPACITY);
        RuntimeConfig {
            match_cache_enabled,
            match_cache_capacity,
        }
    }
}
