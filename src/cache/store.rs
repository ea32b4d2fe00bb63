//! Persistent tier of the prompt cache.
//!
//! Prompts are addressed by `{cache_key}.prompt` under a fixed directory.
//! The storage contract is a trait so alternative backends (e.g. an
//! object store shared between replicas) can be injected; the shipped
//! [`FsPromptStore`] keeps JSON files on the local filesystem.
//!
//! Writes go through a sibling tmp file and a rename, so a crash mid-write
//! never leaves a half-written payload under the key. Corruption is a
//! distinct error variant: the cache layer above deletes the file and
//! treats the lookup as a miss instead of failing the request.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::prompt::VoicePrompt;

/// File extension for persisted voice prompts.
pub const PROMPT_FILE_EXTENSION: &str = "prompt";

/// Persistent-store error types.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The on-disk payload exists but failed to deserialize.
    #[error("corrupt prompt file: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// The prompt could not be serialized for writing.
    #[error("failed to encode prompt: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Blob-store contract for the persistent tier.
#[async_trait]
pub trait PromptStorage: Send + Sync {
    /// Load the prompt stored under `key`, or `None` when absent.
    ///
    /// A present-but-undecodable payload is [`StoreError::Corrupt`].
    async fn load(&self, key: &str) -> Result<Option<VoicePrompt>, StoreError>;

    /// Persist `prompt` under `key`, replacing any previous value.
    async fn save(&self, key: &str, prompt: &VoicePrompt) -> Result<(), StoreError>;

    /// Remove the prompt stored under `key`. Absence is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Filesystem-backed prompt store.
pub struct FsPromptStore {
    dir: PathBuf,
}

impl FsPromptStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Path of the file holding `key`'s prompt.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{PROMPT_FILE_EXTENSION}"))
    }

    /// The directory this store writes into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl PromptStorage for FsPromptStore {
    async fn load(&self, key: &str) -> Result<Option<VoicePrompt>, StoreError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice(&bytes) {
            Ok(prompt) => Ok(Some(prompt)),
            Err(e) => Err(StoreError::Corrupt(e)),
        }
    }

    async fn save(&self, key: &str, prompt: &VoicePrompt) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let tmp_path = self.dir.join(format!("{key}.{PROMPT_FILE_EXTENSION}.tmp"));
        let json = serde_json::to_vec(prompt).map_err(StoreError::Encode)?;
        tokio::fs::write(&tmp_path, &json).await?;
        tokio::fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::prompt::PromptTensor;

    fn sample_prompt() -> VoicePrompt {
        VoicePrompt::Tensor(PromptTensor::vector(vec![0.25, -1.0, 3.5]))
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPromptStore::new(dir.path()).unwrap();

        store.save("abc123", &sample_prompt()).await.unwrap();
        let loaded = store.load("abc123").await.unwrap();
        assert_eq!(loaded, Some(sample_prompt()));
    }

    #[tokio::test]
    async fn load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPromptStore::new(dir.path()).unwrap();

        assert!(store.load("no-such-key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn load_garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPromptStore::new(dir.path()).unwrap();
        std::fs::write(store.path_for("bad"), b"not json at all").unwrap();

        let result = store.load("bad").await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPromptStore::new(dir.path()).unwrap();

        store.save("gone", &sample_prompt()).await.unwrap();
        store.delete("gone").await.unwrap();
        assert!(!store.path_for("gone").exists());

        // Second delete of an absent key still succeeds.
        store.delete("gone").await.unwrap();
    }

    #[tokio::test]
    async fn save_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsPromptStore::new(dir.path()).unwrap();

        store.save("k", &sample_prompt()).await.unwrap();
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn creates_directory_on_construction() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("cache").join("prompts");
        FsPromptStore::new(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
