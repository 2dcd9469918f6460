// resizekro/src/core/mod.rs
pub mod session;

use crate::utils::{artifact_file_name, bytes_to_kb, generate_output_path};
use image::imageops::FilterType;
use image::ImageFormat;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use session::{
    ActionKind, ActionTicket, CompressRequest, LoadTicket, ResizeRequest, SessionState,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResizeAlgorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl ResizeAlgorithm {
    pub fn filter_type(self) -> FilterType {
        match self {
            ResizeAlgorithm::Nearest => FilterType::Nearest,
            ResizeAlgorithm::Bilinear => FilterType::Triangle,
            ResizeAlgorithm::Bicubic => FilterType::CatmullRom,
            ResizeAlgorithm::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero, which is the state before decode.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

/// `width:height` in lowest terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatio {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOrigin {
    Resize,
    Compress,
}

impl fmt::Display for ArtifactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactOrigin::Resize => write!(f, "resize"),
            ArtifactOrigin::Compress => write!(f, "compress"),
        }
    }
}

/// The single output image held by a session.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedArtifact {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub dimensions: Dimensions,
    pub origin: ArtifactOrigin,
}

impl ProcessedArtifact {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Achieved size rounded to whole kilobytes, as shown to the user.
    pub fn size_kb(&self) -> u64 {
        bytes_to_kb(self.size_bytes())
    }

    pub fn file_name(&self, stem: &str) -> String {
        artifact_file_name(stem, self.format)
    }

    pub fn save(&self, output_dir: &Path, stem: &str) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;
        let path = generate_output_path(output_dir, stem, self.format);
        std::fs::write(&path, &self.bytes)?;
        log::info!(
            "Saved {} artifact: {} ({} bytes)",
            self.origin,
            path.display(),
            self.bytes.len()
        );
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quality hint handed to the compression capability, 0.0..=1.0.
    pub initial_quality: f32,
    pub max_iterations: u32,
    pub algorithm: ResizeAlgorithm,
    pub lock_aspect_ratio: bool,
    pub output_stem: String,
    pub max_dimensions: (u32, u32),
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            initial_quality: 0.9,
            max_iterations: 10,
            algorithm: ResizeAlgorithm::Bilinear,
            lock_aspect_ratio: true,
            output_stem: "processed-image".to_string(),
            max_dimensions: (100_000, 100_000),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_quality > 0.0 && self.initial_quality <= 1.0) {
            return Err(ResizeKroError::InvalidParameter(
                "Initial quality must be in (0, 1]".to_string(),
            ));
        }

        if self.max_iterations == 0 {
            return Err(ResizeKroError::InvalidParameter(
                "At least one compression iteration is required".to_string(),
            ));
        }

        if self.output_stem.trim().is_empty() {
            return Err(ResizeKroError::InvalidParameter(
                "Output file name cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File is empty")]
    Empty,

    #[error("Unrecognized image format")]
    UnknownFormat,

    #[error("Failed to decode image: {0}")]
    Image(#[from] image::ImageError),

    #[error("Image dimensions {width}x{height} exceed maximum {max_width}x{max_height}")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("Image has no pixels")]
    ZeroArea,

    #[error("Decode worker failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Cannot render to a zero-area target {0}")]
    ZeroArea(Dimensions),

    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Rasterized output is {actual}, expected {expected}")]
    DimensionMismatch {
        expected: Dimensions,
        actual: Dimensions,
    },

    #[error("Render worker failed: {0}")]
    Worker(String),
}

#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("Encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Compression failed: {0}")]
    Capability(String),

    #[error("Compression worker failed: {0}")]
    Worker(String),
}

impl CompressionError {
    pub fn user_message(&self) -> &'static str {
        "Error compressing image. Please try a larger target size."
    }
}

/// Reasons an action is refused before it has any effect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActionRejected {
    #[error("No image is loaded")]
    NotLoaded,

    #[error("Image is still decoding")]
    NotDecoded,

    #[error("Dimensions are unchanged")]
    Unchanged,

    #[error("Target dimensions {0} must both be positive")]
    ZeroDimension(Dimensions),

    #[error("No target size set")]
    MissingTarget,

    #[error("Target size must be a positive number of KB, got {0}")]
    InvalidTarget(f64),

    #[error("A {0:?} action is already in progress")]
    InFlight(ActionKind),

    #[error("Result belongs to an image that has since been replaced")]
    Stale,
}

#[derive(Error, Debug)]
pub enum ResizeKroError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Compression error: {0}")]
    Compression(#[from] CompressionError),

    #[error("Action rejected: {0}")]
    Rejected(#[from] ActionRejected),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, ResizeKroError>;
