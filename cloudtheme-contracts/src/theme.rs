use async_trait::async_trait;
use cloudtheme_model::{RemoteTheme, ThemeObject, Wallpaper};
use futures::stream::BoxStream;

/// Keeps remote theme metadata current.
pub trait RemoteThemeFetcher: Send + Sync {
    /// Emits the locally known metadata and then each update the server
    /// reports. An empty stream means nothing could be fetched.
    fn actualize(&self, theme: &RemoteTheme) -> BoxStream<'static, RemoteTheme>;
}

#[async_trait]
pub trait WallpaperCache: Send + Sync {
    async fn lookup_by_slug(&self, slug: &str) -> Option<Wallpaper>;
}

/// Turns theme file bytes into a theme object. Pure and synchronous.
pub trait ThemeParser: Send + Sync {
    fn parse(&self, data: &[u8]) -> Option<ThemeObject>;
}
