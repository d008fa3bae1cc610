//! Asset stage: brand logo resolution
//!
//! Resolves a display asset per entity name through the image search
//! collaborator, caching downloads under a deterministic filename derived
//! from the asset kind and the normalized name. Every failure mode (no
//! search result, non-200 download, I/O error) yields `None` with a warning;
//! a missing logo never blocks message generation or rendering.

use crate::content::ImageSearch;
use crate::error::{Error, Result};
use crate::store::normalize_name;
use std::path::{Path, PathBuf};

/// Asset type tag, part of the cached filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Company,
    Provider,
}

impl AssetKind {
    fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Company => "company",
            AssetKind::Provider => "provider",
        }
    }
}

/// Resolves and caches brand assets.
pub struct AssetStage<'a> {
    search: &'a dyn ImageSearch,
    client: reqwest::Client,
    dir: PathBuf,
}

impl<'a> AssetStage<'a> {
    /// Create the stage, ensuring the asset directory exists.
    pub fn new(search: &'a dyn ImageSearch, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Asset(format!("Failed to create {}: {}", dir.display(), e)))?;
        Ok(Self {
            search,
            client: reqwest::Client::new(),
            dir,
        })
    }

    /// Deterministic filename stem for an asset, without extension.
    fn stem(kind: AssetKind, name: &str) -> String {
        format!("{}_{}", kind.as_str(), normalize_name(name))
    }

    /// Look for a previously cached asset with any extension.
    fn cached(&self, stem: &str) -> Option<PathBuf> {
        let entries = std::fs::read_dir(&self.dir).ok()?;
        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .find(|p| {
                p.file_stem()
                    .and_then(|s| s.to_str())
                    .map(|s| s == stem)
                    .unwrap_or(false)
            })
    }

    /// Resolve the logo for `name`, downloading it on first use.
    ///
    /// Returns the cached or freshly downloaded path, or `None` on any
    /// failure.
    pub async fn resolve(&self, name: &str, kind: AssetKind) -> Option<PathBuf> {
        let stem = Self::stem(kind, name);
        if let Some(path) = self.cached(&stem) {
            tracing::debug!("Asset cache hit for {}: {}", name, path.display());
            return Some(path);
        }

        let hit = match self.search.lookup_image(&format!("{} logo", name)).await {
            Ok(Some(hit)) => hit,
            Ok(None) => {
                tracing::warn!("No logo found for {}", name);
                return None;
            }
            Err(e) => {
                tracing::warn!("Logo search failed for {}: {}", name, e);
                return None;
            }
        };

        match self.download(&hit.url, &stem).await {
            Ok(path) => {
                tracing::info!("Logo saved for {} at {}", name, path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("Logo download failed for {}: {}", name, e);
                None
            }
        }
    }

    async fn download(&self, url: &str, stem: &str) -> Result<PathBuf> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Asset(format!("Download returned HTTP {}", status)));
        }

        let extension = extension_from_url(url);
        let path = self.dir.join(format!("{}{}", stem, extension));
        let bytes = response.bytes().await?;
        std::fs::write(&path, &bytes)?;
        Ok(path)
    }
}

/// Extension from the URL path, defaulting to `.png` when absent.
fn extension_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| ".png".to_string())
}
