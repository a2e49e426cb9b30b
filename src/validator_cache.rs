//! # Pattern Cache Module
//!
//! Process-wide cache of compiled parameter patterns.
//!
//! ## Overview
//!
//! Parameter specs declare their `pattern` constraint as a raw regex string.
//! Compiling a [`Regex`] is far more expensive than running it, so compiled
//! patterns are memoized here, keyed by the raw pattern text, and shared as
//! `Arc<Regex>` across threads.
//!
//! ## Thread Safety
//!
//! The cache is a `DashMap` (sharded locks), so lookups on different shards
//! never contend. Two threads that miss on the same pattern at the same time
//! may both compile it; the first insert wins and the other compiled copy is
//! dropped. Both callers get a valid regex either way.
//!
//! Patterns that fail to compile are never cached; callers get the
//! [`regex::Error`] back every time.
//!
//! The cache lives for the whole process and is never invalidated: a given
//! pattern string always compiles to the same regex.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

static GLOBAL: Lazy<PatternCache> = Lazy::new(PatternCache::new);

/// Thread-safe cache of compiled regex patterns.
#[derive(Default)]
pub struct PatternCache {
    compiled: DashMap<String, Arc<Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide instance used by the parameter validators.
    pub fn global() -> &'static PatternCache {
        &GLOBAL
    }

    /// Return the compiled form of `pattern`, compiling and caching it on first use.
    pub fn get_or_compile(&self, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
        if let Some(hit) = self.compiled.get(pattern) {
            return Ok(Arc::clone(hit.value()));
        }

        let compiled = Regex::new(pattern).map_err(|e| {
            warn!(pattern = %pattern, error = %e, "Failed to compile parameter pattern");
            e
        })?;

        // The entry guard holds a shard write lock; release it before `len()`.
        let regex = Arc::clone(
            self.compiled
                .entry(pattern.to_string())
                .or_insert_with(|| Arc::new(compiled))
                .value(),
        );
        debug!(
            pattern = %pattern,
            cache_size = self.compiled.len(),
            "Parameter pattern compiled and cached"
        );
        Ok(regex)
    }

    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.compiled.contains_key(pattern)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.compiled.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_pattern_compiles_once() {
        let cache = PatternCache::new();
        let a = cache.get_or_compile("^[a-z]+$").unwrap();
        let b = cache.get_or_compile("^[a-z]+$").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_invalid_pattern_is_not_cached() {
        let cache = PatternCache::new();
        assert!(cache.get_or_compile("([unclosed").is_err());
        assert!(!cache.contains("([unclosed"));
        assert_eq!(cache.size(), 0);
    }

    #[test]
    fn test_compile_with_debug_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            tracing::subscriber::with_default(subscriber, || {
                let cache = PatternCache::new();
                let compiled = cache.get_or_compile("^[a-z]+$").map(|re| re.is_match("abc"));
                tx.send((compiled.ok(), cache.size())).unwrap();
            });
        });
        let outcome = rx.recv_timeout(std::time::Duration::from_secs(5));
        assert_eq!(outcome, Ok((Some(true), 1)));
    }

    #[test]
    fn test_concurrent_population_converges() {
        let cache = Arc::new(PatternCache::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.get_or_compile(r"^\d{3}$").unwrap())
            })
            .collect();
        let compiled: Vec<Arc<Regex>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(cache.size(), 1);
        assert!(compiled.iter().all(|re| re.is_match("123")));
    }
}
