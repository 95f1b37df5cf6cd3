#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use cloudtheme_contracts::prelude::*;
use cloudtheme_core::{
    AccountHandle, InMemorySettingsStore, JsonThemeParser, ResourceBlobStore,
    ResourceCacheRoot, SharedSettingsAccessor, ThemeUpdateConfig,
    ThemeUpdateManager,
};
use cloudtheme_model::{
    BuiltinTheme, CloudTheme, FileId, MediaFile, RemoteTheme, ResourceId,
    SharedThemeSettings, ThemeIdentity, ThemeObject, ThemeReference, Wallpaper,
    WallpaperFile, WallpaperSettings,
};
use futures::{StreamExt, stream::BoxStream};
use tempfile::TempDir;
use tokio::sync::Semaphore;

pub const WAIT: Duration = Duration::from_secs(2);
pub const SETTLE: Duration = Duration::from_millis(60);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Polls `check` until it holds or [`WAIT`] elapses.
pub async fn wait_for<F>(what: &str, mut check: F)
where
    F: FnMut() -> bool,
{
    let reached = tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(reached.is_ok(), "timed out waiting for {what}");
}

pub fn resource(key: &str) -> ResourceId {
    ResourceId::new(key).expect("resource id")
}

pub fn theme_resource(id: i64) -> ResourceId {
    resource(&format!("theme-file-{id}"))
}

/// Metadata as the server currently reports it.
pub fn remote_theme(id: i64) -> RemoteTheme {
    RemoteTheme {
        id,
        access_hash: id * 31,
        slug: format!("theme-{id}"),
        title: format!("Theme {id}"),
        file: Some(MediaFile::new(FileId(id * 10), theme_resource(id))),
        is_creator: false,
        is_default: false,
        install_count: 1,
    }
}

/// Metadata as it was stored when the user picked the theme.
pub fn stored_theme(id: i64) -> RemoteTheme {
    RemoteTheme {
        install_count: 0,
        ..remote_theme(id)
    }
}

pub fn cloud_reference(id: i64) -> ThemeReference {
    ThemeReference::Cloud(CloudTheme::new(stored_theme(id)))
}

pub fn theme_object(name: &str, default_wallpaper: Wallpaper) -> ThemeObject {
    ThemeObject {
        name: name.into(),
        base: BuiltinTheme::Night,
        is_dark: true,
        accent_color: Some(0x5a9e6f),
        colors: [("chat.background".to_string(), 0x101010)]
            .into_iter()
            .collect(),
        default_wallpaper,
    }
}

pub fn wallpaper_file(id: i64, slug: &str) -> WallpaperFile {
    WallpaperFile {
        id,
        access_hash: 5,
        is_creator: false,
        is_default: false,
        is_pattern: false,
        is_dark: true,
        slug: slug.into(),
        file: MediaFile::new(FileId(900 + id), resource(&format!("wallpaper-{slug}"))),
        settings: WallpaperSettings::default(),
    }
}

/// Remote metadata source. Themes without a script report
/// [`remote_theme`] once; a gate holds every item until permits are added.
#[derive(Default)]
pub struct FakeRemote {
    scripts: Mutex<HashMap<i64, Vec<RemoteTheme>>>,
    gates: Mutex<HashMap<i64, Arc<Semaphore>>>,
    calls: Mutex<Vec<i64>>,
}

impl FakeRemote {
    pub fn script(&self, id: i64, versions: Vec<RemoteTheme>) {
        self.scripts.lock().expect("scripts").insert(id, versions);
    }

    pub fn gate(&self, id: i64) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates.lock().expect("gates").insert(id, gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<i64> {
        self.calls.lock().expect("calls").clone()
    }
}

impl RemoteThemeFetcher for FakeRemote {
    fn actualize(&self, theme: &RemoteTheme) -> BoxStream<'static, RemoteTheme> {
        self.calls.lock().expect("calls").push(theme.id);
        let versions = self
            .scripts
            .lock()
            .expect("scripts")
            .get(&theme.id)
            .cloned()
            .unwrap_or_else(|| vec![remote_theme(theme.id)]);
        let gate = self.gates.lock().expect("gates").get(&theme.id).cloned();

        futures::stream::iter(versions)
            .then(move |version| {
                let gate = gate.clone();
                async move {
                    if let Some(gate) = gate {
                        gate.acquire().await.expect("gate open").forget();
                    }
                    version
                }
            })
            .boxed()
    }
}

/// Remote origin for theme and wallpaper files.
#[derive(Default)]
pub struct FakeSource {
    files: Mutex<HashMap<ResourceId, Vec<u8>>>,
    downloads: AtomicUsize,
}

impl FakeSource {
    pub fn publish(&self, id: ResourceId, bytes: Vec<u8>) {
        self.files.lock().expect("files").insert(id, bytes);
    }

    pub fn publish_theme(&self, id: i64, theme: &ThemeObject) {
        self.publish(
            theme_resource(id),
            serde_json::to_vec(theme).expect("encode theme"),
        );
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceSource for FakeSource {
    async fn download(&self, id: &ResourceId) -> Option<Vec<u8>> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.files.lock().expect("files").get(id).cloned()
    }
}

#[derive(Default)]
pub struct FakeWallpapers {
    by_slug: Mutex<HashMap<String, Wallpaper>>,
}

impl FakeWallpapers {
    pub fn insert(&self, slug: &str, wallpaper: Wallpaper) {
        self.by_slug
            .lock()
            .expect("wallpapers")
            .insert(slug.into(), wallpaper);
    }
}

#[async_trait]
impl WallpaperCache for FakeWallpapers {
    async fn lookup_by_slug(&self, slug: &str) -> Option<Wallpaper> {
        self.by_slug.lock().expect("wallpapers").get(slug).cloned()
    }
}

/// Reports a thumbnail, then the full-size image when one is configured.
#[derive(Default)]
pub struct FakeMedia {
    full_size: Mutex<HashMap<ResourceId, Vec<u8>>>,
    requests: Mutex<Vec<WallpaperDataRequest>>,
}

impl FakeMedia {
    pub fn serve(&self, id: ResourceId, bytes: Vec<u8>) {
        self.full_size.lock().expect("media").insert(id, bytes);
    }

    pub fn requests(&self) -> Vec<WallpaperDataRequest> {
        self.requests.lock().expect("requests").clone()
    }
}

impl MediaFetcher for FakeMedia {
    fn fetch_full_size(
        &self,
        request: WallpaperDataRequest,
    ) -> BoxStream<'static, WallpaperData> {
        let full = self
            .full_size
            .lock()
            .expect("media")
            .get(&request.file.resource)
            .cloned();
        self.requests.lock().expect("requests").push(request);

        let mut updates = vec![WallpaperData {
            thumbnail: Some(b"thumb".to_vec()),
            full_size: None,
            complete: false,
        }];
        if let Some(full) = full {
            updates.push(WallpaperData {
                thumbnail: None,
                full_size: Some(full),
                complete: true,
            });
        }
        futures::stream::iter(updates).boxed()
    }
}

/// Settings store wrapper that records the writes the manager makes and can
/// hold them at a gate before they reach the inner store.
pub struct RecordingStore {
    inner: Arc<InMemorySettingsStore>,
    gate: Option<Arc<Semaphore>>,
    attempts: AtomicUsize,
    applied: Arc<Mutex<Vec<ThemeIdentity>>>,
}

impl RecordingStore {
    pub fn new(inner: Arc<InMemorySettingsStore>) -> Self {
        Self {
            inner,
            gate: None,
            attempts: AtomicUsize::new(0),
            applied: Arc::default(),
        }
    }

    pub fn gated(inner: Arc<InMemorySettingsStore>) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let store = Self {
            gate: Some(gate.clone()),
            ..Self::new(inner)
        };
        (store, gate)
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Identities of the themes each applied write selected.
    pub fn applied(&self) -> Vec<ThemeIdentity> {
        self.applied.lock().expect("applied").clone()
    }
}

#[async_trait]
impl SettingsStore for RecordingStore {
    async fn transaction(
        &self,
        update: SettingsUpdate,
    ) -> Result<(), SettingsStoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate open").forget();
        }
        let applied = self.applied.clone();
        self.inner
            .transaction(Box::new(move |current| {
                let next = update(current)?;
                applied
                    .lock()
                    .expect("applied")
                    .push(next.theme.identity());
                Some(next)
            }))
            .await
    }
}

/// Settings feed that hands every snapshot to the manager only after
/// `delay`, leaving the store ahead of what the manager has observed.
pub struct DelayedSettings {
    inner: Arc<InMemorySettingsStore>,
    delay: Duration,
}

impl SettingsStream for DelayedSettings {
    fn subscribe(&self) -> BoxStream<'static, SharedThemeSettings> {
        let delay = self.delay;
        self.inner
            .subscribe()
            .then(move |snapshot| async move {
                tokio::time::sleep(delay).await;
                snapshot
            })
            .boxed()
    }
}

/// A running manager wired to in-process fakes.
pub struct Harness {
    pub settings: Arc<InMemorySettingsStore>,
    pub writes: Arc<RecordingStore>,
    pub remote: Arc<FakeRemote>,
    pub source: Arc<FakeSource>,
    pub wallpapers: Arc<FakeWallpapers>,
    pub media: Arc<FakeMedia>,
    pub resources: Arc<ResourceBlobStore>,
    pub manager: Option<ThemeUpdateManager>,
    _cache_dir: TempDir,
}

/// Fakes prepared before the manager starts.
pub struct HarnessBuilder {
    initial: SharedThemeSettings,
    gated_writes: bool,
    settings_delay: Option<Duration>,
    pub remote: Arc<FakeRemote>,
    pub source: Arc<FakeSource>,
    pub wallpapers: Arc<FakeWallpapers>,
    pub media: Arc<FakeMedia>,
}

impl HarnessBuilder {
    pub fn new(initial: SharedThemeSettings) -> Self {
        Self {
            initial,
            gated_writes: false,
            settings_delay: None,
            remote: Arc::default(),
            source: Arc::default(),
            wallpapers: Arc::default(),
            media: Arc::default(),
        }
    }

    pub fn with_gated_writes(mut self) -> Self {
        self.gated_writes = true;
        self
    }

    pub fn with_delayed_settings(mut self, delay: Duration) -> Self {
        self.settings_delay = Some(delay);
        self
    }

    pub fn start(self) -> (Harness, Option<Arc<Semaphore>>) {
        init_tracing();
        let cache_dir = tempfile::tempdir().expect("cache dir");
        let settings =
            Arc::new(InMemorySettingsStore::with_initial(16, self.initial));
        let (writes, write_gate) = if self.gated_writes {
            let (store, gate) = RecordingStore::gated(settings.clone());
            (Arc::new(store), Some(gate))
        } else {
            (Arc::new(RecordingStore::new(settings.clone())), None)
        };
        let resources = Arc::new(
            ResourceBlobStore::new(ResourceCacheRoot::new(
                cache_dir.path().to_path_buf(),
            ))
            .with_source(self.source.clone()),
        );

        let stream: Arc<dyn SettingsStream> = match self.settings_delay {
            Some(delay) => Arc::new(DelayedSettings {
                inner: settings.clone(),
                delay,
            }),
            None => settings.clone(),
        };
        let accessor = SharedSettingsAccessor::new(
            stream,
            writes.clone(),
            resources.clone(),
        );
        let account = AccountHandle {
            remote: self.remote.clone(),
            wallpapers: self.wallpapers.clone(),
            media: self.media.clone(),
            parser: Arc::new(JsonThemeParser),
        };
        let manager =
            ThemeUpdateManager::start(accessor, account, ThemeUpdateConfig::default())
                .expect("manager starts");

        let harness = Harness {
            settings,
            writes,
            remote: self.remote,
            source: self.source,
            wallpapers: self.wallpapers,
            media: self.media,
            resources,
            manager: Some(manager),
            _cache_dir: cache_dir,
        };
        (harness, write_gate)
    }
}

impl Harness {
    pub fn manager(&self) -> &ThemeUpdateManager {
        self.manager.as_ref().expect("manager running")
    }

    pub fn active(&self) -> Vec<ThemeIdentity> {
        self.manager().active_identities()
    }

    pub fn current(&self) -> SharedThemeSettings {
        self.settings.current().unwrap_or_default()
    }

    /// A write made by the user rather than the manager.
    pub async fn user_write<F>(&self, update: F)
    where
        F: FnOnce(&mut SharedThemeSettings) + Send + 'static,
    {
        self.settings
            .transaction(Box::new(move |current| {
                let mut next = current.unwrap_or_default();
                update(&mut next);
                Some(next)
            }))
            .await
            .expect("user write");
    }

    pub async fn select(&self, theme: ThemeReference) {
        self.user_write(move |settings| settings.theme = theme).await;
    }
}
