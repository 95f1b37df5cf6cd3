use crate::{
    ids::ResourceId,
    media::{ImageRepresentation, MediaFile},
};

/// Rendering options attached to a wallpaper.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WallpaperSettings {
    pub blur: bool,
    pub motion: bool,
    pub colors: Vec<u32>,
    pub intensity: Option<i32>,
    pub rotation: Option<i32>,
}

/// Wallpaper backed by a remote file.
///
/// An `id` of `0` marks a placeholder that only carries a slug; it has to be
/// resolved against the wallpaper cache before the file can be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WallpaperFile {
    pub id: i64,
    pub access_hash: i64,
    pub is_creator: bool,
    pub is_default: bool,
    pub is_pattern: bool,
    pub is_dark: bool,
    pub slug: String,
    pub file: MediaFile,
    #[cfg_attr(feature = "serde", serde(default))]
    pub settings: WallpaperSettings,
}

impl WallpaperFile {
    pub fn is_placeholder(&self) -> bool {
        self.id == 0
    }

    pub fn resource(&self) -> &ResourceId {
        &self.file.resource
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Wallpaper {
    #[default]
    Builtin,
    Color {
        color: u32,
    },
    Gradient {
        colors: Vec<u32>,
        rotation: Option<i32>,
    },
    Image {
        representations: Vec<ImageRepresentation>,
    },
    File(WallpaperFile),
}

impl Wallpaper {
    pub fn as_file(&self) -> Option<&WallpaperFile> {
        match self {
            Wallpaper::File(file) => Some(file),
            _ => None,
        }
    }

    /// Slug of a file wallpaper that still needs resolving, if any.
    pub fn unresolved_slug(&self) -> Option<&str> {
        self.as_file()
            .filter(|file| file.is_placeholder())
            .map(|file| file.slug.as_str())
    }
}
