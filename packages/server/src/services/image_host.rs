use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs;

#[derive(Debug, Error)]
pub enum ImageHostError {
    #[error("file is {actual} bytes, the limit is {limit}")]
    TooLarge { actual: u64, limit: u64 },
    #[error("file is empty")]
    Empty,
    #[error("image host I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where customer images and payment slips end up.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store `data` and return its public URL.
    async fn upload(&self, data: &[u8], filename: &str) -> Result<String, ImageHostError>;

    /// Bytes stored under `key`, the last path segment of an uploaded URL.
    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ImageHostError>;
}

/// Content-addressed store on local disk.
///
/// Files live at `{dir}/{first 2 hex chars}/{remaining hex chars}[.ext]`
/// and are served from `{public_base_url}/uploads/{hash}[.ext]`.
pub struct FilesystemImageHost {
    dir: PathBuf,
    max_size: u64,
    public_base_url: String,
}

impl FilesystemImageHost {
    pub async fn new(
        dir: PathBuf,
        max_size: u64,
        public_base_url: impl Into<String>,
    ) -> Result<Self, ImageHostError> {
        fs::create_dir_all(dir.join(".tmp")).await?;
        Ok(Self {
            dir,
            max_size,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn blob_path(&self, key: &str) -> PathBuf {
        let (prefix, rest) = key.split_at(2);
        self.dir.join(prefix).join(rest)
    }

    fn temp_path(&self) -> PathBuf {
        self.dir
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

/// Lowercase extension of `filename` if it is short and alphanumeric.
fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ok = !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    ok.then(|| ext.to_ascii_lowercase())
}

/// `{64 hex}[.ext]`, nothing that could leave the upload directory.
pub fn is_valid_key(key: &str) -> bool {
    let (hash, ext) = match key.split_once('.') {
        Some((hash, ext)) => (hash, Some(ext)),
        None => (key, None),
    };
    hash.len() == 64
        && hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
        && ext.is_none_or(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
}

#[async_trait]
impl ImageHost for FilesystemImageHost {
    async fn upload(&self, data: &[u8], filename: &str) -> Result<String, ImageHostError> {
        if data.is_empty() {
            return Err(ImageHostError::Empty);
        }
        if data.len() as u64 > self.max_size {
            return Err(ImageHostError::TooLarge {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let hash = hex::encode(Sha256::digest(data));
        let key = match extension_of(filename) {
            Some(ext) => format!("{hash}.{ext}"),
            None => hash,
        };
        let blob_path = self.blob_path(&key);

        if !fs::try_exists(&blob_path).await? {
            let temp_path = self.temp_path();
            if let Err(e) = fs::write(&temp_path, data).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
            if let Some(parent) = blob_path.parent() {
                fs::create_dir_all(parent).await?;
            }
            if let Err(e) = fs::rename(&temp_path, &blob_path).await {
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        }

        tracing::debug!(%key, bytes = data.len(), "Stored upload");
        Ok(format!("{}/uploads/{key}", self.public_base_url))
    }

    async fn fetch(&self, key: &str) -> Result<Option<Vec<u8>>, ImageHostError> {
        if !is_valid_key(key) {
            return Ok(None);
        }
        match fs::read(self.blob_path(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
