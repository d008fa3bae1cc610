//! File-backed artifact store
//!
//! Every pipeline stage persists its output as a named, versionless JSON
//! document keyed by `(entity, kind)`. Writes always overwrite and are atomic
//! (write-temp-then-rename); reads return `None` for missing or corrupt files
//! rather than erroring, so a damaged artifact degrades to defaults downstream
//! instead of aborting the run.
//!
//! Concurrent writers to the same key are not supported. The pipeline is the
//! single writer per key; this is a documented assumption, not enforced by
//! locking.

use crate::error::{Error, Result};
use crate::extract::RecordBatch;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// The artifact types produced by the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Company main report (recent news and overview)
    MainReport,
    /// Employee roster report
    Employees,
    /// Departments report
    Departments,
    /// Brand colors report
    Colors,
    /// Service providers report
    Providers,
    /// The single selected provider (overwritten each run)
    SelectedProvider,
    /// Denormalized blended view of an entity
    Blended,
    /// Service message batch
    ServiceMessages,
    /// Event message batch
    EventMessages,
    /// Issue message batch
    IssueMessages,
    /// News message batch
    NewsMessages,
}

impl ArtifactKind {
    /// Stable file name fragment for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::MainReport => "main_report",
            ArtifactKind::Employees => "employees",
            ArtifactKind::Departments => "departments",
            ArtifactKind::Colors => "colors",
            ArtifactKind::Providers => "providers",
            ArtifactKind::SelectedProvider => "selected_provider",
            ArtifactKind::Blended => "blended",
            ArtifactKind::ServiceMessages => "service_messages",
            ArtifactKind::EventMessages => "event_messages",
            ArtifactKind::IssueMessages => "issue_messages",
            ArtifactKind::NewsMessages => "news_messages",
        }
    }
}

/// Normalize an entity display name into a stable key fragment:
/// lower-cased, whitespace and filesystem-unsafe characters replaced with
/// underscores. Entity names come from extracted records, so any character
/// must map to something the filesystem accepts.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// File-backed key/value store of named JSON artifacts.
#[derive(Debug)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| Error::Store(format!("Failed to create {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, entity: &str, kind: ArtifactKind) -> PathBuf {
        self.dir
            .join(format!("{}_{}.json", normalize_name(entity), kind.as_str()))
    }

    /// Write an artifact, overwriting any previous value for the same key.
    ///
    /// The value is pretty-printed and replaced atomically: written to a
    /// temporary sibling file first, then renamed into place, so readers
    /// never observe a partial write.
    pub fn put(&self, entity: &str, kind: ArtifactKind, value: &Value) -> Result<()> {
        let path = self.path_for(entity, kind);
        let json = serde_json::to_string_pretty(value)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &path)?;

        tracing::debug!("Artifact written: {}", path.display());
        Ok(())
    }

    /// Read an artifact.
    ///
    /// Returns `None` when the file is missing. A file that exists but does
    /// not parse as JSON is logged and treated as absent, never propagated as
    /// an error.
    pub fn get(&self, entity: &str, kind: ArtifactKind) -> Option<Value> {
        let path = self.path_for(entity, kind);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(_) => return None,
        };
        match serde_json::from_str(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Corrupt artifact {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Read an artifact and coerce it to a record batch.
    ///
    /// Anything other than an array of objects yields an empty batch.
    pub fn get_records(&self, entity: &str, kind: ArtifactKind) -> RecordBatch {
        match self.get(entity, kind) {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether an artifact exists for the given key.
    pub fn contains(&self, entity: &str, kind: ArtifactKind) -> bool {
        self.path_for(entity, kind).exists()
    }
}
