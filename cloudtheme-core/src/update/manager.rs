use std::{fmt, sync::Arc};

use cloudtheme_contracts::{
    media::MediaFetcher,
    resources::ResourceCache,
    settings::{SettingsStore, SettingsStream},
    theme::{RemoteThemeFetcher, ThemeParser, WallpaperCache},
};
use cloudtheme_model::ThemeIdentity;
use tokio::{
    runtime::Handle,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{observer::ReconcileLoop, pipeline::PipelineDeps};
use crate::{
    config::ThemeUpdateConfig,
    error::{Result, ThemeUpdateError},
};

/// Shared settings entry and resource cache the manager reads and writes.
#[derive(Clone)]
pub struct SharedSettingsAccessor {
    pub stream: Arc<dyn SettingsStream>,
    pub store: Arc<dyn SettingsStore>,
    pub resources: Arc<dyn ResourceCache>,
}

impl SharedSettingsAccessor {
    pub fn new(
        stream: Arc<dyn SettingsStream>,
        store: Arc<dyn SettingsStore>,
        resources: Arc<dyn ResourceCache>,
    ) -> Self {
        Self {
            stream,
            store,
            resources,
        }
    }

    /// Accessor for a store that serves both the subscription and writes.
    pub fn from_store<S>(store: Arc<S>, resources: Arc<dyn ResourceCache>) -> Self
    where
        S: SettingsStream + SettingsStore + 'static,
    {
        Self {
            stream: store.clone(),
            store,
            resources,
        }
    }
}

impl fmt::Debug for SharedSettingsAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedSettingsAccessor").finish_non_exhaustive()
    }
}

/// Account-scoped collaborators: remote metadata, wallpaper lookup, media
/// download and theme parsing.
#[derive(Clone)]
pub struct AccountHandle {
    pub remote: Arc<dyn RemoteThemeFetcher>,
    pub wallpapers: Arc<dyn WallpaperCache>,
    pub media: Arc<dyn MediaFetcher>,
    pub parser: Arc<dyn ThemeParser>,
}

impl fmt::Debug for AccountHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountHandle").finish_non_exhaustive()
    }
}

/// Keeps the selected cloud theme in the shared settings up to date.
///
/// Starting the manager subscribes to the shared settings. Whenever a cloud
/// theme is selected, a resolution task refreshes its metadata, file and
/// wallpaper, and writes the result back. Selecting anything else stops the
/// task. Dropping the manager, or calling [`shutdown`](Self::shutdown),
/// cancels all of it; no writes happen afterwards.
pub struct ThemeUpdateManager {
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
    active: watch::Receiver<Vec<ThemeIdentity>>,
    config: ThemeUpdateConfig,
}

impl fmt::Debug for ThemeUpdateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThemeUpdateManager")
            .field("active", &*self.active.borrow())
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl ThemeUpdateManager {
    /// Subscribes to the shared settings and spawns the reconciliation loop
    /// on the current tokio runtime.
    pub fn start(
        accessor: SharedSettingsAccessor,
        account: AccountHandle,
        config: ThemeUpdateConfig,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|err| {
            ThemeUpdateError::Internal(format!(
                "theme update manager needs a tokio runtime: {err}"
            ))
        })?;

        let deps = Arc::new(PipelineDeps {
            remote: account.remote,
            resources: accessor.resources,
            wallpapers: account.wallpapers,
            media: account.media,
            parser: account.parser,
            preview_dimensions: config.wallpaper_preview_dimensions.into(),
        });

        let shutdown = CancellationToken::new();
        let (active_tx, active) = watch::channel(Vec::new());
        let (emissions_tx, emissions_rx) =
            mpsc::channel(config.emission_buffer);
        let settings = accessor.stream.subscribe();
        let reconcile = ReconcileLoop::new(
            deps,
            accessor.store,
            emissions_tx,
            shutdown.clone(),
            active_tx,
        );
        let handle = runtime.spawn(reconcile.run(settings, emissions_rx));

        info!(target: "theme::observer", "theme update manager started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
            active,
            config,
        })
    }

    /// Identities that currently have a resolution task.
    pub fn active_identities(&self) -> Vec<ThemeIdentity> {
        self.active.borrow().clone()
    }

    /// Receiver that observes every change of the active identity set.
    pub fn watch_active_identities(&self) -> watch::Receiver<Vec<ThemeIdentity>> {
        self.active.clone()
    }

    /// Stops the loop and every task, waiting up to the configured timeout
    /// for the loop to exit.
    pub async fn shutdown(mut self) -> Result<()> {
        self.shutdown.cancel();
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        match tokio::time::timeout(self.config.shutdown_timeout(), handle).await {
            Ok(Ok(())) => {
                info!(target: "theme::observer", "theme update manager stopped");
                Ok(())
            }
            Ok(Err(err)) => Err(ThemeUpdateError::Internal(format!(
                "theme update loop failed: {err}"
            ))),
            Err(_) => {
                warn!(target: "theme::observer", timeout_ms = self.config.shutdown_timeout_ms, "theme update loop did not stop in time");
                Err(ThemeUpdateError::Cancelled(
                    "timed out waiting for the theme update loop".into(),
                ))
            }
        }
    }
}

impl Drop for ThemeUpdateManager {
    fn drop(&mut self) {
        // Every task token is a child of this one, so pending pipelines and
        // writes observe the cancellation before the loop itself wakes up.
        self.shutdown.cancel();
    }
}
