//! Persistence of exported sketches.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Sketch not found: {0}")]
    NotFound(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Opaque bearer token identifying the owner of stored sketches.
///
/// Stores only use it to partition records; it is never parsed.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityToken(String);

impl IdentityToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Keep tokens out of logs.
impl fmt::Debug for IdentityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("IdentityToken(..)")
    }
}

/// Returned by a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedSketch {
    pub id: String,
    pub url: String,
}

/// Listing entry for a stored sketch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchSummary {
    pub id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Backend for saved sketches (PNG bytes plus a title).
pub trait SketchStore: Send + Sync {
    /// Store a PNG under `title`. Blank titles and empty images are rejected.
    fn save(&self, token: &IdentityToken, title: &str, png: &[u8]) -> BoxFuture<'_, StorageResult<SavedSketch>>;

    /// Fetch the PNG bytes of a sketch owned by `token`.
    fn load(&self, token: &IdentityToken, id: &str) -> BoxFuture<'_, StorageResult<Vec<u8>>>;

    /// Sketches owned by `token`, oldest first.
    fn list(&self, token: &IdentityToken) -> BoxFuture<'_, StorageResult<Vec<SketchSummary>>>;
}

/// Trimmed title, or `InvalidInput` if the title or image is empty.
fn validate_save(title: &str, png: &[u8]) -> StorageResult<String> {
    let title = title.trim();
    if title.is_empty() || png.is_empty() {
        return Err(StorageError::InvalidInput(
            "Title and canvas data are required".to_string(),
        ));
    }
    Ok(title.to_string())
}

#[cfg(test)]
pub(crate) fn block_on<F: Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_save() {
        assert_eq!(validate_save("  Cat  ", b"png").unwrap(), "Cat");
        assert!(matches!(validate_save("   ", b"png"), Err(StorageError::InvalidInput(_))));
        assert!(matches!(validate_save("Cat", b""), Err(StorageError::InvalidInput(_))));
    }

    #[test]
    fn test_token_debug_is_redacted() {
        let token = IdentityToken::new("secret-bearer");
        assert!(!format!("{token:?}").contains("secret"));
        assert_eq!(token.as_str(), "secret-bearer");
    }
}
