// resizekro/src/processors/resizer.rs
use crate::core::{
    ActionRejected, ArtifactOrigin, Dimensions, ProcessedArtifact, RenderError, ResizeAlgorithm,
    Result,
};
use crate::processors::compressor::encode_jpeg;
use crate::processors::dimensions::DimensionModel;
use crate::processors::loader::SourceImage;
use image::{DynamicImage, ImageFormat};
use std::sync::Arc;

/// JPEG quality of every resize output. Not user adjustable.
pub const RESIZE_QUALITY: u8 = 90;

/// Encoded output of a rasterize call.
#[derive(Debug, Clone)]
pub struct RasterOutput {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub dimensions: Dimensions,
}

/// Draws an image onto a surface of exactly `width` x `height` and encodes it.
pub trait Rasterizer: Send + Sync {
    fn rasterize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> std::result::Result<RasterOutput, RenderError>;
}

pub struct Resizer {
    algorithm: ResizeAlgorithm,
}

impl Resizer {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn resize_exact(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        if width == image.width() && height == image.height() {
            log::debug!("Image dimensions unchanged, skipping resample");
            return image.clone();
        }

        log::debug!(
            "Resizing image from {}x{} to {}x{}",
            image.width(),
            image.height(),
            width,
            height
        );

        image.resize_exact(width, height, self.algorithm.filter_type())
    }
}

impl Rasterizer for Resizer {
    fn rasterize(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> std::result::Result<RasterOutput, RenderError> {
        let target = Dimensions::new(width, height);
        if target.is_empty() {
            return Err(RenderError::ZeroArea(target));
        }

        let surface = self.resize_exact(image, width, height);
        let bytes = encode_jpeg(&surface, RESIZE_QUALITY)?;

        Ok(RasterOutput {
            bytes,
            format: ImageFormat::Jpeg,
            dimensions: Dimensions::new(surface.width(), surface.height()),
        })
    }
}

/// Turns an edited [`DimensionModel`] into a resized artifact.
#[derive(Clone)]
pub struct ResizeController {
    rasterizer: Arc<dyn Rasterizer>,
}

impl ResizeController {
    pub fn new(rasterizer: Arc<dyn Rasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Checks every precondition of a resize and returns the target.
    pub fn validate(source: Option<&SourceImage>, model: &DimensionModel) -> Result<Dimensions> {
        let source = source.ok_or(ActionRejected::NotLoaded)?;
        if source.dimensions.is_empty() || model.original().is_empty() {
            return Err(ActionRejected::NotDecoded.into());
        }

        let target = model.current();
        if target.is_empty() {
            return Err(ActionRejected::ZeroDimension(target).into());
        }

        if !model.is_dirty() {
            return Err(ActionRejected::Unchanged.into());
        }

        Ok(target)
    }

    pub fn resize(
        &self,
        source: &SourceImage,
        model: &DimensionModel,
    ) -> Result<ProcessedArtifact> {
        let target = Self::validate(Some(source), model)?;
        self.render(source, target)
    }

    /// Rasterizes an already-validated target.
    pub fn render(&self, source: &SourceImage, target: Dimensions) -> Result<ProcessedArtifact> {
        if target.is_empty() {
            return Err(RenderError::ZeroArea(target).into());
        }

        let output = self
            .rasterizer
            .rasterize(&source.pixels, target.width, target.height)?;

        if output.dimensions != target {
            return Err(RenderError::DimensionMismatch {
                expected: target,
                actual: output.dimensions,
            }
            .into());
        }

        log::info!(
            "Resized {} -> {} ({} bytes)",
            source.dimensions,
            target,
            output.bytes.len()
        );

        Ok(ProcessedArtifact {
            bytes: output.bytes,
            format: output.format,
            dimensions: output.dimensions,
            origin: ArtifactOrigin::Resize,
        })
    }

    pub async fn render_async(
        &self,
        source: Arc<SourceImage>,
        target: Dimensions,
    ) -> Result<ProcessedArtifact> {
        let controller = self.clone();
        tokio::task::spawn_blocking(move || controller.render(&source, target))
            .await
            .map_err(|e| RenderError::Worker(e.to_string()))?
    }
}
