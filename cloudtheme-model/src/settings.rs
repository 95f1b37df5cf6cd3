use std::collections::BTreeMap;

use crate::{
    ids::ThemeIdentity,
    theme::{BuiltinTheme, ThemeReference},
    wallpaper::Wallpaper,
};

/// Accent override a user picked for a particular theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccentColor {
    pub base_color: u32,
    pub bubble_color: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FontSize {
    ExtraSmall,
    Small,
    #[default]
    Regular,
    Large,
    ExtraLarge,
}

/// What flips the client into its night theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum AutoNightTrigger {
    System,
    #[default]
    None,
    Timed {
        from_minutes: u32,
        to_minutes: u32,
    },
    Brightness {
        threshold: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutomaticThemeSwitchSetting {
    pub trigger: AutoNightTrigger,
    pub theme: ThemeReference,
}

impl Default for AutomaticThemeSwitchSetting {
    fn default() -> Self {
        Self {
            trigger: AutoNightTrigger::default(),
            theme: ThemeReference::Builtin {
                theme: BuiltinTheme::NightAccent,
            },
        }
    }
}

/// Persisted presentation settings shared by every account session.
///
/// Resolution only ever replaces `theme` and `chat_wallpaper`; everything
/// else belongs to other subsystems and must round-trip untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SharedThemeSettings {
    pub chat_wallpaper: Wallpaper,
    pub theme: ThemeReference,
    pub theme_specific_accent_colors: BTreeMap<ThemeIdentity, AccentColor>,
    pub theme_specific_chat_wallpapers: BTreeMap<ThemeIdentity, Wallpaper>,
    pub font_size: FontSize,
    pub automatic_theme_switch: AutomaticThemeSwitchSetting,
    pub large_emoji: bool,
    pub disable_animations: bool,
}

impl Default for SharedThemeSettings {
    fn default() -> Self {
        Self {
            chat_wallpaper: Wallpaper::Builtin,
            theme: ThemeReference::default(),
            theme_specific_accent_colors: BTreeMap::new(),
            theme_specific_chat_wallpapers: BTreeMap::new(),
            font_size: FontSize::Regular,
            automatic_theme_switch: AutomaticThemeSwitchSetting::default(),
            large_emoji: true,
            disable_animations: false,
        }
    }
}

impl SharedThemeSettings {
    /// Copy of `self` with only the theme and chat wallpaper replaced.
    pub fn with_theme(
        &self,
        theme: ThemeReference,
        chat_wallpaper: Wallpaper,
    ) -> Self {
        Self {
            chat_wallpaper,
            theme,
            theme_specific_accent_colors: self
                .theme_specific_accent_colors
                .clone(),
            theme_specific_chat_wallpapers: self
                .theme_specific_chat_wallpapers
                .clone(),
            font_size: self.font_size,
            automatic_theme_switch: self.automatic_theme_switch.clone(),
            large_emoji: self.large_emoji,
            disable_animations: self.disable_animations,
        }
    }

    pub fn chat_wallpaper_override(
        &self,
        identity: &ThemeIdentity,
    ) -> Option<&Wallpaper> {
        self.theme_specific_chat_wallpapers.get(identity)
    }
}
