use std::fmt::{self, Display};

/// Errors produced by model constructors and validation routines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    UnknownNamespace(String),
    InvalidThemeIdentity(String),
    InvalidResourceId(String),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::UnknownNamespace(raw) => {
                write!(f, "unknown theme namespace: {raw}")
            }
            ModelError::InvalidThemeIdentity(raw) => {
                write!(f, "invalid theme identity: {raw}")
            }
            ModelError::InvalidResourceId(msg) => {
                write!(f, "invalid resource id: {msg}")
            }
        }
    }
}

impl std::error::Error for ModelError {}

pub type Result<T> = std::result::Result<T, ModelError>;
