use std::{fmt, str::FromStr};

use crate::error::{ModelError, Result};

/// Kind of theme an identity was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ThemeNamespace {
    Builtin,
    Local,
    Cloud,
}

impl ThemeNamespace {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeNamespace::Builtin => "builtin",
            ThemeNamespace::Local => "local",
            ThemeNamespace::Cloud => "cloud",
        }
    }
}

impl FromStr for ThemeNamespace {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "builtin" => Ok(ThemeNamespace::Builtin),
            "local" => Ok(ThemeNamespace::Local),
            "cloud" => Ok(ThemeNamespace::Cloud),
            other => Err(ModelError::UnknownNamespace(other.to_string())),
        }
    }
}

/// Stable key naming a theme reference.
///
/// The namespace and the full 64-bit id are kept side by side, so two themes
/// share an identity only when both match. Serialized as `"cloud:42"` so it
/// can key JSON maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(into = "String", try_from = "String")
)]
pub struct ThemeIdentity {
    namespace: ThemeNamespace,
    id: i64,
}

impl ThemeIdentity {
    pub fn new(namespace: ThemeNamespace, id: i64) -> Self {
        Self { namespace, id }
    }

    pub fn cloud(id: i64) -> Self {
        Self::new(ThemeNamespace::Cloud, id)
    }

    pub fn namespace(&self) -> ThemeNamespace {
        self.namespace
    }

    /// Id within the namespace.
    pub fn local_id(&self) -> i64 {
        self.id
    }
}

impl fmt::Display for ThemeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace.as_str(), self.id)
    }
}

impl FromStr for ThemeIdentity {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self> {
        let (namespace, id) = raw
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidThemeIdentity(raw.to_string()))?;
        let id = id
            .parse::<i64>()
            .map_err(|_| ModelError::InvalidThemeIdentity(raw.to_string()))?;
        Ok(Self::new(namespace.parse()?, id))
    }
}

impl From<ThemeIdentity> for String {
    fn from(identity: ThemeIdentity) -> Self {
        identity.to_string()
    }
}

impl TryFrom<String> for ThemeIdentity {
    type Error = ModelError;

    fn try_from(raw: String) -> Result<Self> {
        raw.parse()
    }
}

/// Strongly typed id for remote media files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileId(pub i64);

/// Key of a blob inside the content-addressed resource cache.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ResourceId(String);

impl ResourceId {
    pub fn new(key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ModelError::InvalidResourceId(
                "resource id must not be empty".into(),
            ));
        }
        Ok(Self(key))
    }

    /// Resource id of a remote file stored under the given datacenter.
    pub fn remote_file(datacenter_id: i32, file_id: FileId) -> Self {
        Self(format!("cloud-document-{datacenter_id}-{}", file_id.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResourceId").field(&self.0).finish()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
