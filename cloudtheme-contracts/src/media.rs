use cloudtheme_model::{ImageRepresentation, MediaFile};
use futures::stream::BoxStream;

/// Request for the image data of a file-backed wallpaper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallpaperDataRequest {
    pub file: MediaFile,
    pub representations: Vec<ImageRepresentation>,
    pub only_full_size: bool,
    pub auto_fetch_full_size: bool,
}

/// One progress update of a wallpaper download.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WallpaperData {
    pub thumbnail: Option<Vec<u8>>,
    pub full_size: Option<Vec<u8>>,
    pub complete: bool,
}

impl WallpaperData {
    /// Full-size bytes, but only once the download has finished.
    pub fn into_complete_full_size(self) -> Option<Vec<u8>> {
        if self.complete { self.full_size } else { None }
    }
}

pub trait MediaFetcher: Send + Sync {
    fn fetch_full_size(
        &self,
        request: WallpaperDataRequest,
    ) -> BoxStream<'static, WallpaperData>;
}
