//! Default implementations of the resolver's collaborators.

pub mod cache;
pub mod settings_store;
pub mod theme_parser;

pub use cache::{ResourceBlobStore, ResourceCacheRoot};
pub use settings_store::InMemorySettingsStore;
pub use theme_parser::JsonThemeParser;
