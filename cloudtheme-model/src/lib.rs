//! Core data model definitions shared across the cloud theme crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod media;
pub mod settings;
pub mod theme;
pub mod wallpaper;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use ids::{FileId, ResourceId, ThemeIdentity, ThemeNamespace};
pub use media::{ImageRepresentation, MediaFile, PixelDimensions};
pub use settings::{
    AccentColor, AutoNightTrigger, AutomaticThemeSwitchSetting, FontSize,
    SharedThemeSettings,
};
pub use theme::{
    BuiltinTheme, CloudTheme, LocalTheme, RemoteTheme, ResolvedTheme,
    ThemeObject, ThemeReference,
};
pub use wallpaper::{Wallpaper, WallpaperFile, WallpaperSettings};
