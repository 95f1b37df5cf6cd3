//! Trait surfaces for the collaborators the theme resolver depends on.
//!
//! None of these are implemented here; storage, networking, media download
//! and theme parsing all live outside the resolver and are injected at
//! construction time.

pub mod media;
pub mod resources;
pub mod settings;
pub mod theme;

/// Frequently used trait imports for resolver and test crates.
pub mod prelude {
    pub use super::media::{MediaFetcher, WallpaperData, WallpaperDataRequest};
    pub use super::resources::{ResourceCache, ResourceSource};
    pub use super::settings::{
        SettingsStore, SettingsStoreError, SettingsStream, SettingsUpdate,
    };
    pub use super::theme::{RemoteThemeFetcher, ThemeParser, WallpaperCache};
}
