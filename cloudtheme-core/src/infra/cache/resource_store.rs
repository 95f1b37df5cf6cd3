use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use cacache::Integrity;
use cloudtheme_contracts::resources::{ResourceCache, ResourceSource};
use cloudtheme_model::ResourceId;
use tracing::{debug, warn};

use crate::{
    config::ThemeUpdateConfig,
    error::{Result, ThemeUpdateError},
};

/// Root directory for the resource blob store.
///
/// This is a dedicated directory that `cacache` will manage internally
/// (index + content-addressed blobs).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResourceCacheRoot(PathBuf);

impl ResourceCacheRoot {
    pub fn new(path: PathBuf) -> Self {
        Self(path)
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Debug for ResourceCacheRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceCacheRoot").field(&self.0).finish()
    }
}

/// Versioned cache key for a resource id. Changing the layout of stored
/// blobs means bumping the prefix.
fn cache_key_for(id: &ResourceId) -> String {
    let mut key = String::with_capacity(13 + id.as_str().len());
    key.push_str("resources/v1/");
    key.push_str(id.as_str());
    key
}

/// Minimal metadata returned from a successful store write.
#[derive(Debug, Clone)]
pub struct StoredResourceBlob {
    pub integrity: Integrity,
    pub byte_len: usize,
}

/// A thin typed wrapper over `cacache` for theme and wallpaper blobs.
///
/// When a [`ResourceSource`] is attached, cache misses are downloaded from it
/// and written back before being returned.
#[derive(Clone)]
pub struct ResourceBlobStore {
    root: ResourceCacheRoot,
    source: Option<Arc<dyn ResourceSource>>,
}

impl fmt::Debug for ResourceBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceBlobStore")
            .field("root", &self.root)
            .field("has_source", &self.source.is_some())
            .finish()
    }
}

impl ResourceBlobStore {
    pub fn new(root: ResourceCacheRoot) -> Self {
        Self { root, source: None }
    }

    pub fn from_config(config: &ThemeUpdateConfig) -> Result<Self> {
        let dir = config.resource_cache_dir.clone().ok_or_else(|| {
            ThemeUpdateError::Config("resource_cache_dir is not set".into())
        })?;
        Ok(Self::new(ResourceCacheRoot::new(dir)))
    }

    pub fn with_source(mut self, source: Arc<dyn ResourceSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn root(&self) -> &ResourceCacheRoot {
        &self.root
    }

    /// Reads a blob, mapping a missing entry to `Ok(None)`.
    pub async fn read(&self, id: &ResourceId) -> Result<Option<Vec<u8>>> {
        match cacache::read(self.root.as_path(), cache_key_for(id)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(cacache::Error::EntryNotFound(_, _)) => Ok(None),
            Err(cacache::Error::IntegrityError(err)) => {
                Err(ThemeUpdateError::Cache(format!(
                    "cache entry failed integrity check: {} ({err})",
                    id
                )))
            }
            Err(cacache::Error::SizeMismatch(wanted, actual)) => {
                Err(ThemeUpdateError::Cache(format!(
                    "cache entry size mismatch: key={}, wanted={wanted}, actual={actual}",
                    id
                )))
            }
            Err(cacache::Error::IoError(_, msg)) => Err(ThemeUpdateError::Cache(
                format!("cacache read I/O error: {msg}"),
            )),
            Err(cacache::Error::SerdeError(_, msg)) => Err(
                ThemeUpdateError::Cache(format!("cacache read serde error: {msg}")),
            ),
        }
    }

    pub async fn write(
        &self,
        id: &ResourceId,
        bytes: &[u8],
    ) -> Result<StoredResourceBlob> {
        let integrity =
            cacache::write(self.root.as_path(), cache_key_for(id), bytes)
                .await
                .map_err(|e| {
                    ThemeUpdateError::Cache(format!("cacache write failed: {e}"))
                })?;

        Ok(StoredResourceBlob {
            integrity,
            byte_len: bytes.len(),
        })
    }

    pub async fn remove(&self, id: &ResourceId) -> Result<()> {
        let r_opts = cacache::index::RemoveOpts::new().remove_fully(true);
        r_opts
            .remove(self.root.as_path(), cache_key_for(id))
            .await
            .map_err(|e| {
                ThemeUpdateError::Cache(format!("cacache remove failed: {e}"))
            })
    }
}

#[async_trait]
impl ResourceCache for ResourceBlobStore {
    async fn fetch(&self, id: &ResourceId) -> Option<Vec<u8>> {
        match self.read(id).await {
            Ok(Some(bytes)) => return Some(bytes),
            Ok(None) => {}
            // A corrupt entry is treated as a miss and overwritten below.
            Err(err) => {
                warn!(target: "theme::cache", resource = %id, error = %err, "resource cache read failed");
            }
        }

        let source = self.source.as_ref()?;
        let bytes = source.download(id).await?;
        debug!(target: "theme::cache", resource = %id, bytes = bytes.len(), "downloaded resource");
        if let Err(err) = self.write(id, &bytes).await {
            warn!(target: "theme::cache", resource = %id, error = %err, "failed to cache downloaded resource");
        }
        Some(bytes)
    }

    async fn store(&self, id: &ResourceId, data: Vec<u8>) {
        if let Err(err) = self.write(id, &data).await {
            warn!(target: "theme::cache", resource = %id, error = %err, "failed to store resource");
        }
    }
}
