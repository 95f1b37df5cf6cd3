use std::collections::BTreeMap;

use crate::{
    ids::{ResourceId, ThemeIdentity, ThemeNamespace},
    media::MediaFile,
    wallpaper::Wallpaper,
};

/// Themes bundled with the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BuiltinTheme {
    #[default]
    DayClassic,
    Day,
    Night,
    NightAccent,
}

impl BuiltinTheme {
    fn local_id(self) -> i64 {
        match self {
            BuiltinTheme::DayClassic => 0,
            BuiltinTheme::Day => 1,
            BuiltinTheme::Night => 2,
            BuiltinTheme::NightAccent => 3,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, BuiltinTheme::Night | BuiltinTheme::NightAccent)
    }
}

/// Theme imported from a file on this device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalTheme {
    pub id: i64,
    pub title: String,
    pub resource: Option<ResourceId>,
}

/// Theme metadata as published by the remote theme service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RemoteTheme {
    pub id: i64,
    pub access_hash: i64,
    pub slug: String,
    pub title: String,
    pub file: Option<MediaFile>,
    pub is_creator: bool,
    pub is_default: bool,
    pub install_count: i32,
}

/// A remote theme plus the wallpaper resolved for it, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CloudTheme {
    pub theme: RemoteTheme,
    pub resolved_wallpaper: Option<Wallpaper>,
}

impl CloudTheme {
    pub fn new(theme: RemoteTheme) -> Self {
        Self {
            theme,
            resolved_wallpaper: None,
        }
    }
}

/// The theme a user selected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ThemeReference {
    Builtin { theme: BuiltinTheme },
    Local(LocalTheme),
    Cloud(CloudTheme),
}

impl Default for ThemeReference {
    fn default() -> Self {
        ThemeReference::Builtin {
            theme: BuiltinTheme::default(),
        }
    }
}

impl ThemeReference {
    pub fn identity(&self) -> ThemeIdentity {
        match self {
            ThemeReference::Builtin { theme } => {
                ThemeIdentity::new(ThemeNamespace::Builtin, theme.local_id())
            }
            ThemeReference::Local(local) => {
                ThemeIdentity::new(ThemeNamespace::Local, local.id)
            }
            ThemeReference::Cloud(cloud) => ThemeIdentity::cloud(cloud.theme.id),
        }
    }

    pub fn as_cloud(&self) -> Option<&CloudTheme> {
        match self {
            ThemeReference::Cloud(cloud) => Some(cloud),
            _ => None,
        }
    }
}

/// A parsed theme file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThemeObject {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub base: BuiltinTheme,
    #[cfg_attr(feature = "serde", serde(default))]
    pub is_dark: bool,
    pub accent_color: Option<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub colors: BTreeMap<String, u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub default_wallpaper: Wallpaper,
}

/// Outcome of one successful resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTheme {
    pub updated_reference: ThemeReference,
    pub parsed_theme: Option<ThemeObject>,
}
