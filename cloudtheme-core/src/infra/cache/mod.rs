//! On-disk cache infra.
//!
//! This module provides a typed facade around `cacache` for integrity-checked
//! theme and wallpaper blobs.

pub mod resource_store;

pub use resource_store::*;
