//! Keeps the selected cloud theme in the shared settings current.
//!
//! [`ThemeUpdateManager`] watches the shared theme settings. While a cloud
//! theme is selected it refreshes the theme metadata, downloads and parses
//! the theme file, resolves the default wallpaper and writes the result back
//! into the settings, leaving every unrelated field untouched.
//!
//! Collaborators are injected through the traits in `cloudtheme-contracts`;
//! [`infra`] ships default implementations for the settings entry, the
//! resource cache and the theme parser.
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod infra;
pub mod update;

pub use config::{PreviewDimensions, ThemeUpdateConfig, ThemeUpdateConfigSource};
pub use error::{Result, ThemeUpdateError};
pub use infra::{InMemorySettingsStore, JsonThemeParser, ResourceBlobStore, ResourceCacheRoot};
pub use update::{AccountHandle, SharedSettingsAccessor, ThemeUpdateManager};
