use async_trait::async_trait;
use cloudtheme_model::ResourceId;

/// Content-addressed blob cache shared with other subsystems.
#[async_trait]
pub trait ResourceCache: Send + Sync {
    /// Returns the bytes for `id`, fetching and caching them when the
    /// implementation knows how. `None` means the data is not available yet.
    async fn fetch(&self, id: &ResourceId) -> Option<Vec<u8>>;

    async fn store(&self, id: &ResourceId, data: Vec<u8>);
}

/// Remote origin of resource bytes, consulted on cache misses.
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn download(&self, id: &ResourceId) -> Option<Vec<u8>>;
}
