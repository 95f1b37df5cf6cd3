use crate::ids::{FileId, ResourceId};

/// Width/height pair in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PixelDimensions {
    pub width: u32,
    pub height: u32,
}

impl PixelDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// A remote file together with the cache key of its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaFile {
    pub id: FileId,
    pub resource: ResourceId,
    pub mime_type: String,
    pub size: Option<u64>,
}

impl MediaFile {
    pub fn new(id: FileId, resource: ResourceId) -> Self {
        Self {
            id,
            resource,
            mime_type: "application/octet-stream".to_string(),
            size: None,
        }
    }
}

/// One sized rendition of an image.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ImageRepresentation {
    pub dimensions: PixelDimensions,
    pub resource: ResourceId,
}
