use async_trait::async_trait;
use cloudtheme_model::SharedThemeSettings;
use futures::stream::BoxStream;
use thiserror::Error;

/// Read-modify-write step applied inside a settings transaction.
///
/// Receives the stored value (`None` when nothing was ever written) and
/// returns the value to store, or `None` to leave the entry untouched.
pub type SettingsUpdate = Box<
    dyn FnOnce(Option<SharedThemeSettings>) -> Option<SharedThemeSettings>
        + Send,
>;

#[derive(Error, Debug)]
pub enum SettingsStoreError {
    #[error("settings store closed")]
    Closed,

    #[error("settings persistence failed: {0}")]
    Persistence(String),
}

/// Push-based feed of shared settings snapshots.
pub trait SettingsStream: Send + Sync {
    /// Yields the current value first, then every subsequent write.
    /// Dropping the stream unsubscribes.
    fn subscribe(&self) -> BoxStream<'static, SharedThemeSettings>;
}

/// Atomic access to the shared settings entry.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn transaction(
        &self,
        update: SettingsUpdate,
    ) -> Result<(), SettingsStoreError>;
}
