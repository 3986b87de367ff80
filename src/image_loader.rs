//! Image decoding behind the `ImageLoader` seam.
//!
//! The orchestrator only ever sees `Option<DecodedImage>`: a missing or
//! corrupt file decodes to `None` with a logged warning, never an error
//! crossing the component boundary. The typed `LoadError` stays internal
//! to loader implementations.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, DynamicImage, ImageFormat, ImageReader};
use thiserror::Error;
use tracing::{debug, warn};

/// A decoded RGBA8 bitmap ready for display.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            pixels: rgba.into_raw(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixel data, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Size of the pixel buffer, used for cache accounting.
    pub fn byte_len(&self) -> usize {
        self.pixels.len()
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read image {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("animation has no frames: {path:?}")]
    EmptyAnimation { path: PathBuf },
}

/// Decodes a file path into a displayable bitmap, or fails as a value.
///
/// Implementations must be callable from load worker threads and must not
/// panic on bad input; all failure is reported as `None`.
pub trait ImageLoader: Send + Sync {
    fn load_image(&self, path: &Path) -> Option<DecodedImage>;
}

/// Filesystem-backed loader using the `image` crate.
///
/// Relative paths are resolved against an optional base directory, so
/// image collections can carry portable paths.
#[derive(Debug, Default)]
pub struct FileImageLoader {
    base_dir: Option<PathBuf>,
}

impl FileImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.base_dir {
            Some(base) => base.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Decode with a typed error, for callers that want the cause.
    pub fn try_load(&self, path: &Path) -> Result<DecodedImage, LoadError> {
        let resolved = self.resolve(path);
        let image = open_image(&resolved)?;
        debug!("Decoded image {:?}", resolved);
        Ok(DecodedImage::from_dynamic(image))
    }
}

impl ImageLoader for FileImageLoader {
    fn load_image(&self, path: &Path) -> Option<DecodedImage> {
        match self.try_load(path) {
            Ok(image) => Some(image),
            Err(err) => {
                warn!("Failed to load image {:?}: {}", path, err);
                None
            }
        }
    }
}

fn open_image(path: &Path) -> Result<DynamicImage, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let format = image::guess_format(&bytes).ok();

    // GIFs decode frame-by-frame; display the first frame.
    if format == Some(ImageFormat::Gif) {
        let decoder = GifDecoder::new(Cursor::new(bytes)).map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let mut frames = decoder.into_frames();
        return match frames.next() {
            Some(frame) => {
                let frame = frame.map_err(|source| LoadError::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;
                Ok(DynamicImage::ImageRgba8(frame.into_buffer()))
            }
            None => Err(LoadError::EmptyAnimation {
                path: path.to_path_buf(),
            }),
        };
    }

    let decoded = match format {
        Some(fmt) => image::load_from_memory_with_format(&bytes, fmt),
        None => image::load_from_memory(&bytes),
    };
    decoded.map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Read image dimensions from the header without a full decode.
pub fn probe_dimensions(path: &Path) -> Result<(u32, u32), LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    reader.into_dimensions().map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_test_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        let image = RgbaImage::from_pixel(width, height, Rgba([20, 40, 60, 255]));
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn loads_and_converts_to_rgba() {
        let dir = tempdir().unwrap();
        let path = write_test_png(dir.path(), "scan.png", 8, 6);

        let loader = FileImageLoader::new();
        let decoded = loader.load_image(&path).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 6);
        assert_eq!(decoded.byte_len(), 8 * 6 * 4);
        assert_eq!(&decoded.pixels()[..4], &[20, 40, 60, 255]);
    }

    #[test]
    fn missing_file_yields_none() {
        let loader = FileImageLoader::new();
        assert!(loader
            .load_image(Path::new("/nonexistent/scan.png"))
            .is_none());
    }

    #[test]
    fn corrupt_file_yields_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not an image").unwrap();

        let loader = FileImageLoader::new();
        assert!(loader.load_image(&path).is_none());
    }

    #[test]
    fn relative_paths_resolve_against_base_dir() {
        let dir = tempdir().unwrap();
        write_test_png(dir.path(), "scan.png", 4, 4);

        let loader = FileImageLoader::with_base_dir(dir.path());
        assert!(loader.load_image(Path::new("scan.png")).is_some());
        assert!(loader.load_image(Path::new("other.png")).is_none());
    }

    #[test]
    fn probe_reads_dimensions() {
        let dir = tempdir().unwrap();
        let path = write_test_png(dir.path(), "scan.png", 12, 34);
        assert_eq!(probe_dimensions(&path).unwrap(), (12, 34));
        assert!(probe_dimensions(Path::new("/nonexistent.png")).is_err());
    }
}
