use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("image has invalid size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
    #[error("cannot allocate {width}x{height} drawing surface")]
    SurfaceAllocation { width: u32, height: u32 },
    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("cannot encode PNG: {0}")]
    Encode(#[source] image::ImageError),
    #[error("config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
    #[error("region {width}x{height} is too small to process")]
    RegionTooSmall { width: u32, height: u32 },
    #[error("unable to resolve config directory")]
    NoConfigDirectory,
}

pub type Result<T> = std::result::Result<T, EditorError>;
