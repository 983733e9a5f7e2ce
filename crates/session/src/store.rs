//! Persisted identity store.
//!
//! The only state that survives a restart is the signed-in user's identity;
//! every collection is rebuilt from the server. Stored as a small JSON file
//! at a configurable path.

use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

use shopsync_core::UserIdentity;

/// Errors from the identity store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem operation failed.
    #[error("identity store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Identity failed to serialize.
    #[error("identity store encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// File-backed store for the signed-in identity.
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Create a store at the given path. Nothing is touched until the first
    /// save/load.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Persist the identity, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self, identity: &UserIdentity) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(identity)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Load the persisted identity, if any.
    ///
    /// A corrupt file is treated as absent (logged at `warn`), so a bad
    /// write can never lock the user out of the app.
    ///
    /// # Errors
    ///
    /// Returns an error only for I/O failures other than "file not found".
    pub async fn load(&self) -> Result<Option<UserIdentity>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(identity) => Ok(Some(identity)),
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "discarding corrupt identity file");
                Ok(None)
            }
        }
    }

    /// Remove the persisted identity. Missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error for I/O failures other than "file not found".
    pub async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsync_core::UserId;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_store() -> IdentityStore {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = std::env::temp_dir()
            .join(format!("shopsync-test-{}-{n}", std::process::id()))
            .join("identity.json");
        IdentityStore::new(path)
    }

    fn identity() -> UserIdentity {
        UserIdentity {
            id: UserId::new("u1"),
            name: "Asha Rao".to_owned(),
            email: "asha@example.com".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let store = temp_store();
        store.save(&identity()).await.expect("save");
        let loaded = store.load().await.expect("load");
        assert_eq!(loaded, Some(identity()));
        store.clear().await.expect("clear");
    }

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = temp_store();
        assert_eq!(store.load().await.expect("load"), None);
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = temp_store();
        store.clear().await.expect("first clear");
        store.clear().await.expect("second clear");
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_absent() {
        let store = temp_store();
        store.save(&identity()).await.expect("save");
        tokio::fs::write(store.path.clone(), b"{not json")
            .await
            .expect("corrupt");
        assert_eq!(store.load().await.expect("load"), None);
        store.clear().await.expect("clear");
    }
}
