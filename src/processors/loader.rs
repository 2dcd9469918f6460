// resizekro/src/processors/loader.rs
use crate::core::{DecodeError, Dimensions};
use crate::utils::image_format_to_string;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// A decoded source image. Never mutated; a new load replaces it wholesale.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub pixels: DynamicImage,
    pub format: ImageFormat,
    pub dimensions: Dimensions,
}

impl SourceImage {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn format_name(&self) -> String {
        image_format_to_string(self.format)
    }
}

#[derive(Clone)]
pub struct Loader {
    max_dimensions: Option<(u32, u32)>,
}

impl Loader {
    pub fn new() -> Self {
        Self {
            max_dimensions: Some((100_000, 100_000)),
        }
    }

    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_dimensions = Some((width, height));
        self
    }

    pub fn read_file(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        log::debug!("Reading image from: {}", path.display());
        std::fs::read(path)
    }

    pub fn decode(&self, bytes: Vec<u8>) -> Result<SourceImage, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader.format().ok_or(DecodeError::UnknownFormat)?;
        let pixels = reader.decode()?;

        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(DecodeError::ZeroArea);
        }

        if let Some((max_width, max_height)) = self.max_dimensions {
            if width > max_width || height > max_height {
                return Err(DecodeError::TooLarge {
                    width,
                    height,
                    max_width,
                    max_height,
                });
            }
        }

        log::info!(
            "Decoded image: {}x{} pixels, format: {:?}, color: {:?}",
            width,
            height,
            format,
            pixels.color()
        );

        Ok(SourceImage {
            bytes,
            pixels,
            format,
            dimensions: Dimensions::new(width, height),
        })
    }

    /// Decodes on a blocking worker so the caller's task is not held up.
    pub async fn decode_async(&self, bytes: Vec<u8>) -> Result<SourceImage, DecodeError> {
        let loader = self.clone();
        tokio::task::spawn_blocking(move || loader.decode(bytes))
            .await
            .map_err(|e| DecodeError::Worker(e.to_string()))?
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}
