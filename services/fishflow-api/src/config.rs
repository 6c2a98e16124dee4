//! Service configuration loaded from an optional YAML file.

use std::path::Path;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

pub const SERVICE_VERSION: &str = "0.0.1";

/// Presentation and CORS settings of the HTTP service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name reported by the landing endpoint.
    pub title: String,

    /// Origins allowed by CORS. `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            title: "FishFlow API".to_string(),
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServiceConfig {
    /// Load from `path`, falling back to defaults when no file exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Service config file does not exist, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;

        let config: ServiceConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse: {:?}", path))?;

        tracing::info!(
            path = %path.display(),
            origins = config.cors_allowed_origins.len(),
            "Loaded service config"
        );
        Ok(config)
    }

    pub fn cors_layer(&self) -> CorsLayer {
        if self.cors_allowed_origins.iter().any(|o| o == "*") {
            return CorsLayer::permissive();
        }

        let origins: Vec<HeaderValue> = self
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ServiceConfig::load(Some(&dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(ServiceConfig::load(None).unwrap(), ServiceConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.yaml");
        std::fs::write(&path, "cors_allowed_origins:\n  - https://fishflow.example.org\n").unwrap();

        let config = ServiceConfig::load(Some(&path)).unwrap();
        assert_eq!(config.title, "FishFlow API");
        assert_eq!(config.cors_allowed_origins, vec!["https://fishflow.example.org"]);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("service.yaml");
        std::fs::write(&path, "cors_allowed_origins: [unclosed").unwrap();

        assert!(ServiceConfig::load(Some(&path)).is_err());
    }
}
