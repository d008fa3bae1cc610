//! Brandbrief configuration management
//!
//! Loaded from a TOML file, every section falling back to defaults when
//! absent. Credentials are never stored here; the service adapters resolve
//! them from the environment at construction time.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main brandbrief configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandbriefConfig {
    /// Generative model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Storage directory configuration
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Generative model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier passed to the content service
    pub name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash-exp".to_string(),
        }
    }
}

/// Storage directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for JSON artifacts
    pub artifact_dir: PathBuf,

    /// Directory for downloaded brand assets (logos)
    pub asset_dir: PathBuf,

    /// Directory for rendered documents
    pub document_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("output/artifacts"),
            asset_dir: PathBuf::from("output/assets"),
            document_dir: PathBuf::from("output/documents"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BrandbriefConfig::default();
        assert_eq!(config.model.name, "gemini-2.0-flash-exp");
        assert_eq!(config.storage.artifact_dir, PathBuf::from("output/artifacts"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: BrandbriefConfig = toml::from_str(
            r#"
            [storage]
            artifact_dir = "custom/artifacts"
            asset_dir = "custom/assets"
            document_dir = "custom/documents"
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.artifact_dir, PathBuf::from("custom/artifacts"));
        assert_eq!(config.model.name, "gemini-2.0-flash-exp");
    }

    #[test]
    fn test_round_trip() {
        let config = BrandbriefConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let back: BrandbriefConfig = toml::from_str(&toml).unwrap();
        assert_eq!(back.model.name, config.model.name);
    }
}
