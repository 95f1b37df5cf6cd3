use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;
use cloudtheme_contracts::settings::{
    SettingsStore, SettingsStoreError, SettingsStream, SettingsUpdate,
};
use cloudtheme_model::SharedThemeSettings;
use futures::{
    StreamExt,
    future::ready,
    stream::{self, BoxStream},
};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{debug, warn};

use crate::{config::ThemeUpdateConfig, error::Result};

/// Process-local settings entry with broadcast fan-out and optional JSON
/// file persistence.
///
/// Transactions are serialized; a transaction's result is persisted before
/// it becomes visible to readers and subscribers.
pub struct InMemorySettingsStore {
    current: Mutex<Option<SharedThemeSettings>>,
    write_gate: tokio::sync::Mutex<()>,
    sender: broadcast::Sender<SharedThemeSettings>,
    persist_path: Option<PathBuf>,
}

impl fmt::Debug for InMemorySettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemorySettingsStore")
            .field("has_value", &self.current().is_some())
            .field("subscribers", &self.sender.receiver_count())
            .field("persist_path", &self.persist_path)
            .finish()
    }
}

impl InMemorySettingsStore {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            current: Mutex::new(None),
            write_gate: tokio::sync::Mutex::new(()),
            sender,
            persist_path: None,
        }
    }

    pub fn with_initial(capacity: usize, initial: SharedThemeSettings) -> Self {
        let store = Self::new(capacity);
        *store.lock_current() = Some(initial);
        store
    }

    /// Opens the store described by `config`, loading any previously
    /// persisted value from `settings_path`.
    pub async fn open(config: &ThemeUpdateConfig) -> Result<Self> {
        let mut store = Self::new(config.settings_broadcast_capacity);
        if let Some(path) = &config.settings_path {
            *store.lock_current() = load_settings_file(path).await?;
            store.persist_path = Some(path.clone());
        }
        Ok(store)
    }

    /// Latest stored value, `None` when nothing was ever written.
    pub fn current(&self) -> Option<SharedThemeSettings> {
        self.lock_current().clone()
    }

    fn lock_current(
        &self,
    ) -> std::sync::MutexGuard<'_, Option<SharedThemeSettings>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn load_settings_file(path: &Path) -> Result<Option<SharedThemeSettings>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => {
            let settings = serde_json::from_slice(&bytes)?;
            debug!(target: "theme::store", path = %path.display(), "loaded persisted settings");
            Ok(Some(settings))
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

async fn persist_settings_file(
    path: &Path,
    settings: &SharedThemeSettings,
) -> std::result::Result<(), SettingsStoreError> {
    let encoded = serde_json::to_vec_pretty(settings)
        .map_err(|err| SettingsStoreError::Persistence(err.to_string()))?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|err| SettingsStoreError::Persistence(err.to_string()))?;
    }
    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, encoded)
        .await
        .map_err(|err| SettingsStoreError::Persistence(err.to_string()))?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|err| SettingsStoreError::Persistence(err.to_string()))
}

impl SettingsStream for InMemorySettingsStore {
    fn subscribe(&self) -> BoxStream<'static, SharedThemeSettings> {
        // Read and subscribe under one lock so no write slips in between.
        let (initial, receiver) = {
            let guard = self.lock_current();
            (guard.clone().unwrap_or_default(), self.sender.subscribe())
        };

        let updates = BroadcastStream::new(receiver).filter_map(|item| {
            ready(match item {
                Ok(settings) => Some(settings),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(target: "theme::store", skipped, "settings subscriber lagged");
                    None
                }
            })
        });

        stream::once(ready(initial)).chain(updates).boxed()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn transaction(
        &self,
        update: SettingsUpdate,
    ) -> std::result::Result<(), SettingsStoreError> {
        let _gate = self.write_gate.lock().await;

        let Some(next) = update(self.current()) else {
            return Ok(());
        };
        if let Some(path) = &self.persist_path {
            persist_settings_file(path, &next).await?;
        }

        let mut guard = self.lock_current();
        *guard = Some(next.clone());
        // No subscribers is fine; the value is still stored.
        let _ = self.sender.send(next);
        Ok(())
    }
}
