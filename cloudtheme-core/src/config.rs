use anyhow::{Context, anyhow};
use cloudtheme_model::PixelDimensions;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{Result, ThemeUpdateError};

const CONFIG_PATH_ENV: &str = "THEME_UPDATE_CONFIG_PATH";
const CONFIG_JSON_ENV: &str = "THEME_UPDATE_CONFIG_JSON";

/// Source that produced the theme update configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ThemeUpdateConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
}

/// Wallpaper preview size requested alongside the full-size download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PreviewDimensions {
    pub width: u32,
    pub height: u32,
}

impl Default for PreviewDimensions {
    fn default() -> Self {
        Self {
            width: 100,
            height: 100,
        }
    }
}

impl From<PreviewDimensions> for PixelDimensions {
    fn from(value: PreviewDimensions) -> Self {
        PixelDimensions::new(value.width, value.height)
    }
}

/// Tuning for the theme update manager and its default collaborators.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ThemeUpdateConfig {
    /// Capacity of the channel carrying resolved themes back to the
    /// reconciliation loop. Pipelines wait when it is full.
    pub emission_buffer: usize,
    /// Snapshots the in-memory settings store buffers per subscriber before
    /// a slow subscriber starts skipping stale ones.
    pub settings_broadcast_capacity: usize,
    /// How long `shutdown` waits for the reconciliation loop to exit.
    pub shutdown_timeout_ms: u64,
    /// Representation size passed to the media fetcher for wallpapers.
    pub wallpaper_preview_dimensions: PreviewDimensions,
    /// Root of the on-disk resource cache. `None` leaves cache placement to
    /// the embedding application.
    pub resource_cache_dir: Option<PathBuf>,
    /// JSON file backing the in-memory settings store.
    pub settings_path: Option<PathBuf>,
}

impl Default for ThemeUpdateConfig {
    fn default() -> Self {
        Self {
            emission_buffer: 64,
            settings_broadcast_capacity: 32,
            shutdown_timeout_ms: 5_000,
            wallpaper_preview_dimensions: PreviewDimensions::default(),
            resource_cache_dir: None,
            settings_path: None,
        }
    }
}

impl ThemeUpdateConfig {
    /// Load configuration overrides using environment variables.
    /// Evaluation order:
    /// 1) `$THEME_UPDATE_CONFIG_PATH` (TOML or JSON file),
    /// 2) `$THEME_UPDATE_CONFIG_JSON` (inline JSON),
    /// 3) defaults if neither is set.
    pub fn load_from_env() -> anyhow::Result<(Self, ThemeUpdateConfigSource)>
    {
        let (config, source) = if let Ok(path_str) = env::var(CONFIG_PATH_ENV)
            && !path_str.trim().is_empty()
        {
            let path = PathBuf::from(path_str);
            (Self::read_file(&path)?, ThemeUpdateConfigSource::EnvPath(path))
        } else if let Ok(raw) = env::var(CONFIG_JSON_ENV)
            && !raw.trim().is_empty()
        {
            let parsed = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {CONFIG_JSON_ENV}"))?;
            (parsed, ThemeUpdateConfigSource::EnvInline)
        } else {
            (Self::default(), ThemeUpdateConfigSource::Default)
        };

        config.validate()?;
        Ok((config, source))
    }

    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path).with_context(|| {
            format!("failed to read theme update config from {}", path.display())
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::from_str(&contents).with_context(|| {
                format!("invalid theme update config {}", path.display())
            }),
            Some("toml") | Some("tml") => toml::from_str(&contents).map_err(|err| {
                anyhow!("invalid theme update config {}: {}", path.display(), err)
            }),
            _ => Self::parse_from_str(&contents, &path.display().to_string()),
        }
    }

    /// Unknown extension: try JSON first, then TOML.
    fn parse_from_str(raw: &str, origin: &str) -> anyhow::Result<Self> {
        if let Ok(config) = serde_json::from_str::<Self>(raw) {
            return Ok(config);
        }
        toml::from_str(raw).map_err(|err| {
            anyhow!("theme update config {origin} is neither JSON nor TOML: {err}")
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.emission_buffer == 0 {
            return Err(ThemeUpdateError::Config(
                "emission_buffer must be greater than zero".into(),
            ));
        }
        if self.settings_broadcast_capacity == 0 {
            return Err(ThemeUpdateError::Config(
                "settings_broadcast_capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}
