// ABOUTME: Blob storage for generated documents, addressed by relative path keys
// ABOUTME: ArtifactStore trait plus a filesystem-rooted implementation

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use robodesk_core::{validate_storage_key, ServiceError, Upstream, ValidationError};

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Artifact already exists: {0}")]
    AlreadyExists(String),
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    InvalidKey(#[from] ValidationError),
    #[error("Artifact IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ArtifactResult<T> = Result<T, ArtifactError>;

impl From<ArtifactError> for ServiceError {
    fn from(err: ArtifactError) -> Self {
        match err {
            ArtifactError::AlreadyExists(key) => {
                ServiceError::Conflict(format!("Artifact {} already exists", key))
            }
            ArtifactError::NotFound(key) => ServiceError::NotFound(format!("Artifact {}", key)),
            ArtifactError::InvalidKey(v) => ServiceError::Validation(v),
            ArtifactError::Io(e) => ServiceError::upstream(Upstream::ArtifactStore, e.to_string()),
        }
    }
}

/// Blob store addressed by `/`-separated relative keys
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store bytes under `key`; fails with `AlreadyExists` unless `overwrite`
    async fn upload(&self, key: &str, bytes: &[u8], overwrite: bool) -> ArtifactResult<()>;

    async fn download(&self, key: &str) -> ArtifactResult<Vec<u8>>;

    /// Keys under a prefix directory, sorted
    async fn list(&self, prefix: &str) -> ArtifactResult<Vec<String>>;

    fn public_url(&self, key: &str) -> ArtifactResult<String>;
}

/// Artifact store backed by a local directory
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            public_base_url: None,
        }
    }

    /// Serve public links from `base_url` instead of `file://` paths
    pub fn with_public_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.public_base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> ArtifactResult<PathBuf> {
        validate_storage_key(key)?;
        Ok(key.split('/').fold(self.root.clone(), |path, seg| path.join(seg)))
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn upload(&self, key: &str, bytes: &[u8], overwrite: bool) -> ArtifactResult<()> {
        let path = self.resolve(key)?;
        debug!("Uploading artifact {} ({} bytes)", key, bytes.len());

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = match options.open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(ArtifactError::AlreadyExists(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn download(&self, key: &str) -> ArtifactResult<Vec<u8>> {
        let path = self.resolve(key)?;
        debug!("Downloading artifact {}", key);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ArtifactError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, prefix: &str) -> ArtifactResult<Vec<String>> {
        let prefix = prefix.trim_end_matches('/');
        let base = if prefix.is_empty() {
            self.root.clone()
        } else {
            self.resolve(prefix)?
        };

        let mut keys = Vec::new();
        let mut pending = vec![base];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&self.root) {
                    let key: Vec<String> = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect();
                    keys.push(key.join("/"));
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn public_url(&self, key: &str) -> ArtifactResult<String> {
        let path = self.resolve(key)?;
        Ok(match &self.public_base_url {
            Some(base) => format!("{}/{}", base, key),
            None => format!("file://{}", path.display()),
        })
    }
}
