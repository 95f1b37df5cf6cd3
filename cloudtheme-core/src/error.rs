use cloudtheme_contracts::settings::SettingsStoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThemeUpdateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Resource cache error: {0}")]
    Cache(String),

    #[error("Settings store error: {0}")]
    Store(#[from] SettingsStoreError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ThemeUpdateError>;
