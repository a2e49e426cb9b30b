//! # Pipeline Configuration Module
//!
//! YAML configuration for the policies applied by the dispatcher.
//!
//! ```yaml
//! cors:
//!   allowed_origins:
//!     - https://app.example.com
//! origin_filter:
//!   prefixes:
//!     - https://api.example.com/
//! ```
//!
//! Every key is optional. Omitting `cors` registers no CORS interceptor;
//! `cors: {}` registers one that accepts every origin. Omitting
//! `origin_filter.prefixes` leaves the origin filter off, while an explicit
//! empty list rejects every request.
//!
//! Apply a loaded config with
//! [`DispatcherBuilder::with_config`](crate::dispatcher::DispatcherBuilder::with_config).

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cors: Option<CorsConfig>,
    pub origin_filter: OriginFilterConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Exact origins to accept; absent or empty accepts all
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginFilterConfig {
    /// URL prefixes to admit; absent disables the filter
    pub prefixes: Option<Vec<String>>,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid pipeline config {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse pipeline config YAML")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(PipelineConfig::from_yaml_str("").unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_explicit_empty_prefix_list_is_kept() {
        let config = PipelineConfig::from_yaml_str("origin_filter:\n  prefixes: []\n").unwrap();
        assert_eq!(config.origin_filter.prefixes, Some(Vec::new()));
        assert!(config.cors.is_none());
    }

    #[test]
    fn test_cors_section_without_list() {
        let config = PipelineConfig::from_yaml_str("cors: {}\n").unwrap();
        assert_eq!(config.cors, Some(CorsConfig::default()));
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        assert!(PipelineConfig::from_yaml_str("cors: [unclosed").is_err());
    }
}
