//! In-memory sketch store.

use super::{
    BoxFuture, IdentityToken, SavedSketch, SketchStore, SketchSummary, StorageError,
    StorageResult, validate_save,
};
use chrono::Utc;
use log::info;
use std::collections::HashMap;
use std::future;
use std::sync::RwLock;
use uuid::Uuid;

struct StoredSketch {
    summary: SketchSummary,
    png: Vec<u8>,
}

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    /// Sketches per owner token, in insertion order.
    sketches: RwLock<HashMap<IdentityToken, Vec<StoredSketch>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn save_now(&self, token: &IdentityToken, title: &str, png: &[u8]) -> StorageResult<SavedSketch> {
        let title = validate_save(title, png)?;
        let id = Uuid::new_v4().to_string();
        let url = format!("memory://sketches/{id}.png");

        let mut sketches = self
            .sketches
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        sketches.entry(token.clone()).or_default().push(StoredSketch {
            summary: SketchSummary {
                id: id.clone(),
                title,
                url: url.clone(),
                created_at: Utc::now(),
            },
            png: png.to_vec(),
        });
        info!("Saved sketch {id} ({} bytes)", png.len());
        Ok(SavedSketch { id, url })
    }

    fn load_now(&self, token: &IdentityToken, id: &str) -> StorageResult<Vec<u8>> {
        let sketches = self
            .sketches
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        sketches
            .get(token)
            .and_then(|owned| owned.iter().find(|s| s.summary.id == id))
            .map(|s| s.png.clone())
            .ok_or_else(|| StorageError::NotFound(id.to_string()))
    }

    fn list_now(&self, token: &IdentityToken) -> StorageResult<Vec<SketchSummary>> {
        let sketches = self
            .sketches
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(sketches
            .get(token)
            .map(|owned| owned.iter().map(|s| s.summary.clone()).collect())
            .unwrap_or_default())
    }
}

impl SketchStore for MemoryStore {
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
