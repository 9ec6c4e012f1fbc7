//! Directory-backed sketch store.

use super::{
    BoxFuture, IdentityToken, SavedSketch, SketchStore, SketchSummary, StorageError,
    StorageResult, validate_save,
};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::future;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Metadata written next to each PNG.
#[derive(Debug, Serialize, Deserialize)]
struct SketchRecord {
    id: String,
    title: String,
    owner: IdentityToken,
    created_at: DateTime<Utc>,
}

/// Stores each sketch as `<id>.png` plus `<id>.json` metadata.
///
/// The PNG is written before the metadata, and only metadata files are
/// listed, so a failed save never shows up as a record.
pub struct FileStore {
    base_path: PathBuf,
}

impl FileStore {
    /// Open a store in `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Store in the platform data directory (`<data dir>/sketchpad/sketches`).
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("sketchpad").join("sketches"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn file_path(&self, id: &str, extension: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{safe_id}.{extension}"))
    }

    fn url_for(&self, id: &str) -> String {
        format!("file://{}", self.file_path(id, "png").display())
    }

    fn read_record(path: &Path) -> StorageResult<SketchRecord> {
        let json = fs::read_to_string(path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        serde_json::from_str(&json).map_err(|e| {
            StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    fn save_now(&self, token: &IdentityToken, title: &str, png: &[u8]) -> StorageResult<SavedSketch> {
        let title = validate_save(title, png)?;
        let id = Uuid::new_v4().to_string();
        let record = SketchRecord {
            id: id.clone(),
            title,
            owner: token.clone(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        let png_path = self.file_path(&id, "png");
        fs::write(&png_path, png).map_err(|e| {
            StorageError::Io(format!("Failed to write {}: {}", png_path.display(), e))
        })?;
        let meta_path = self.file_path(&id, "json");
        if let Err(e) = fs::write(&meta_path, json) {
            let _ = fs::remove_file(&png_path);
            return Err(StorageError::Io(format!(
                "Failed to write {}: {}",
                meta_path.display(),
                e
            )));
        }

        info!("Saved sketch {id} to {}", png_path.display());
        Ok(SavedSketch {
            url: self.url_for(&id),
            id,
        })
    }

    fn load_now(&self, token: &IdentityToken, id: &str) -> StorageResult<Vec<u8>> {
        let meta_path = self.file_path(id, "json");
        if !meta_path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let record = Self::read_record(&meta_path)?;
        if &record.owner != token {
            debug!("Sketch {id} belongs to another token");
            return Err(StorageError::NotFound(id.to_string()));
        }

        let png_path = self.file_path(id, "png");
        fs::read(&png_path)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", png_path.display(), e)))
    }

    fn list_now(&self, token: &IdentityToken) -> StorageResult<Vec<SketchSummary>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }

        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

        let mut summaries = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            let record = match Self::read_record(&path) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable sketch record: {e}");
                    continue;
                }
            };
            if &record.owner == token {
                summaries.push(SketchSummary {
                    url: self.url_for(&record.id),
                    id: record.id,
                    title: record.title,
                    created_at: record.created_at,
                });
            }
        }
        summaries.sort_by_key(|s| s.created_at);
        Ok(summaries)
    }
}

impl SketchStore for FileStore {
    fn save(&self, token: &IdentityToken, title: &str, png: &[u8]) -> BoxFuture<'_, StorageResult<SavedSketch>> {
        Box::pin(future::ready(self.save_now(token, title, png)))
    }

    fn load(&self, token: &IdentityToken, id: &str) -> BoxFuture<'_, StorageResult<Vec<u8>>> {
        Box::pin(future::ready(self.load_now(token, id)))
    }

    fn list(&self, token: &IdentityToken) -> BoxFuture<'_, StorageResult<Vec<SketchSummary>>> {
        Box::pin(future::ready(self.list_now(token)))
    }
}
