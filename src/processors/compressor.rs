// resizekro/src/processors/compressor.rs
use crate::core::{
    ActionRejected, ArtifactOrigin, CompressionError, Dimensions, ProcessedArtifact,
    ResizeAlgorithm, Result,
};
use crate::processors::loader::SourceImage;
use crate::utils::kb_to_bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, ImageResult};
use std::sync::Arc;

/// Shrink factor applied to both sides and to quality on each extra round.
const STEP_FACTOR: f32 = 0.95;

/// Encodes to baseline JPEG. Alpha is dropped since JPEG has no alpha channel.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> ImageResult<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100));
    encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
    Ok(buffer)
}

fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionOptions {
    pub max_size_bytes: u64,
    /// Longest side allowed in the output.
    pub max_width_or_height: u32,
    pub initial_quality: f32,
    pub max_iterations: u32,
}

#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    pub dimensions: Dimensions,
}

/// Shrinks an image toward a byte budget. Meeting the budget is best effort.
pub trait CompressionCapability: Send + Sync {
    fn compress(
        &self,
        source: &SourceImage,
        options: &CompressionOptions,
    ) -> std::result::Result<CompressedImage, CompressionError>;
}

/// Lowers quality and scale together until the encoding fits the budget or
/// the iteration limit is reached. The output is never larger than the
/// source file; if no encoding beats it, the source bytes are returned as is.
pub struct TargetSizeCompressor {
    algorithm: ResizeAlgorithm,
}

impl TargetSizeCompressor {
    pub fn new(algorithm: ResizeAlgorithm) -> Self {
        Self { algorithm }
    }

    fn passthrough(source: &SourceImage) -> CompressedImage {
        CompressedImage {
            bytes: source.bytes.clone(),
            format: source.format,
            dimensions: source.dimensions,
        }
    }
}

impl CompressionCapability for TargetSizeCompressor {
    fn compress(
        &self,
        source: &SourceImage,
        options: &CompressionOptions,
    ) -> std::result::Result<CompressedImage, CompressionError> {
        let budget = options.max_size_bytes;
        let cap = options.max_width_or_height.max(1);

        if source.size_bytes() <= budget && source.dimensions.longest_side() <= cap {
            log::debug!(
                "Source already fits budget ({} <= {} bytes), keeping original",
                source.size_bytes(),
                budget
            );
            return Ok(Self::passthrough(source));
        }

        let filter = self.algorithm.filter_type();
        let mut surface = if source.dimensions.longest_side() > cap {
            source.pixels.resize(cap, cap, filter)
        } else {
            source.pixels.clone()
        };

        let mut quality = options.initial_quality;
        let mut best = CompressedImage {
            bytes: encode_jpeg(&surface, quality_percent(quality))?,
            format: ImageFormat::Jpeg,
            dimensions: Dimensions::new(surface.width(), surface.height()),
        };
        let mut iteration = 1;

        while best.bytes.len() as u64 > budget && iteration < options.max_iterations {
            let width = (surface.width() as f32 * STEP_FACTOR) as u32;
            let height = (surface.height() as f32 * STEP_FACTOR) as u32;
            if width == 0 || height == 0 {
                log::debug!("Cannot shrink {}x{} any further", surface.width(), surface.height());
                break;
            }

            surface = surface.resize_exact(width, height, filter);
            quality *= STEP_FACTOR;

            let bytes = encode_jpeg(&surface, quality_percent(quality))?;
            log::debug!(
                "Iteration {}: {}x{} at quality {} -> {} bytes (budget {})",
                iteration,
                width,
                height,
                quality_percent(quality),
                bytes.len(),
                budget
            );

            if bytes.len() < best.bytes.len() {
                best = CompressedImage {
                    bytes,
                    format: ImageFormat::Jpeg,
                    dimensions: Dimensions::new(width, height),
                };
            }
            iteration += 1;
        }

        if best.bytes.len() as u64 > source.size_bytes() {
            log::debug!("Re-encoding grew the file, keeping original");
            return Ok(Self::passthrough(source));
        }

        Ok(best)
    }
}

impl Default for TargetSizeCompressor {
    fn default() -> Self {
        Self::new(ResizeAlgorithm::Bilinear)
    }
}

/// Turns a target size in KB into a call to a [`CompressionCapability`].
#[derive(Clone)]
pub struct CompressionController {
    capability: Arc<dyn CompressionCapability>,
    initial_quality: f32,
    max_iterations: u32,
}

impl CompressionController {
    pub fn new(capability: Arc<dyn CompressionCapability>) -> Self {
        Self {
            capability,
            initial_quality: 0.9,
            max_iterations: 10,
        }
    }

    pub fn with_initial_quality(mut self, quality: f32) -> Self {
        self.initial_quality = quality;
        self
    }

    pub fn with_max_iterations(mut self, iterations: u32) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn validate_target(target_kb: Option<f64>) -> Result<f64> {
        match target_kb {
            None => Err(ActionRejected::MissingTarget.into()),
            Some(kb) if !kb.is_finite() || kb <= 0.0 => {
                Err(ActionRejected::InvalidTarget(kb).into())
            }
            Some(kb) => Ok(kb),
        }
    }

    pub fn options_for(&self, source: &SourceImage, target_kb: f64) -> Result<CompressionOptions> {
        let target_kb = Self::validate_target(Some(target_kb))?;
        if source.dimensions.is_empty() {
            return Err(ActionRejected::NotDecoded.into());
        }

        Ok(CompressionOptions {
            max_size_bytes: kb_to_bytes(target_kb),
            max_width_or_height: source.dimensions.longest_side(),
            initial_quality: self.initial_quality,
            max_iterations: self.max_iterations,
        })
    }

    pub fn compress_to_target(
        &self,
        source: &SourceImage,
        target_kb: f64,
    ) -> Result<ProcessedArtifact> {
        let options = self.options_for(source, target_kb)?;
        log::debug!("Compressing with {:?}", options);

        let compressed = self.capability.compress(source, &options)?;

        let artifact = ProcessedArtifact {
            bytes: compressed.bytes,
            format: compressed.format,
            dimensions: compressed.dimensions,
            origin: ArtifactOrigin::Compress,
        };

        if artifact.size_bytes() > options.max_size_bytes {
            log::warn!(
                "Target of {} KB not reached, achieved {} KB",
                target_kb,
                artifact.size_kb()
            );
        } else {
            log::info!("Compressed image size: {} KB", artifact.size_kb());
        }

        Ok(artifact)
    }

    pub async fn compress_to_target_async(
        &self,
        source: Arc<SourceImage>,
        target_kb: f64,
    ) -> Result<ProcessedArtifact> {
        let controller = self.clone();
        tokio::task::spawn_blocking(move || controller.compress_to_target(&source, target_kb))
            .await
            .map_err(|e| CompressionError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResizeKroError;
    use crate::processors::Loader;
    use std::io::Cursor;
    use std::sync::Mutex;

    /// Deterministic noise so JPEG output has a realistic size.
    fn noisy_source(width: u32, height: u32, format: ImageFormat) -> SourceImage {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(2654435761).wrapping_add(y.wrapping_mul(40503));
            image::Rgb([(v >> 3) as u8, (v >> 11) as u8, (v >> 19) as u8])
        });
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, format)
            .unwrap();
        Loader::new().decode(buffer.into_inner()).unwrap()
    }

    fn controller() -> CompressionController {
        CompressionController::new(Arc::new(TargetSizeCompressor::default()))
    }

    #[test]
    fn test_target_above_source_size_keeps_size_at_or_below_source() {
        let source = noisy_source(64, 48, ImageFormat::Png);
        let target_kb = (source.size_bytes() as f64 / 1024.0) * 2.0;

        let artifact = controller().compress_to_target(&source, target_kb).unwrap();
        assert_eq!(artifact.origin, ArtifactOrigin::Compress);
        assert!(artifact.size_bytes() <= source.size_bytes());
    }

    #[test]
    fn test_small_target_shrinks_output() {
        let source = noisy_source(256, 256, ImageFormat::Png);
        let artifact = controller().compress_to_target(&source, 8.0).unwrap();

        assert!(artifact.size_bytes() < source.size_bytes());
        assert_eq!(artifact.format, ImageFormat::Jpeg);
        assert!(artifact.dimensions.longest_side() <= 256);
    }

    #[test]
    fn test_never_upsizes() {
        let source = noisy_source(120, 80, ImageFormat::Png);
        let artifact = controller().compress_to_target(&source, 1.0).unwrap();
        assert!(artifact.dimensions.width <= 120);
        assert!(artifact.dimensions.height <= 80);
    }

    #[test]
    fn test_options_derived_from_source() {
        let source = noisy_source(300, 200, ImageFormat::Png);
        let options = controller().options_for(&source, 50.0).unwrap();
        assert_eq!(options.max_size_bytes, 50 * 1024);
        assert_eq!(options.max_width_or_height, 300);
        assert_eq!(options.initial_quality, 0.9);
    }

    #[test]
    fn test_longest_side_capped_before_encoding() {
        let source = noisy_source(200, 100, ImageFormat::Png);
        let options = CompressionOptions {
            max_size_bytes: source.size_bytes() * 4,
            max_width_or_height: 50,
            initial_quality: 0.9,
            max_iterations: 10,
        };

        let compressed = TargetSizeCompressor::default()
            .compress(&source, &options)
            .unwrap();
        assert_eq!(compressed.dimensions, Dimensions::new(50, 25));
        assert_eq!(compressed.format, ImageFormat::Jpeg);
        assert!(compressed.bytes.len() as u64 <= source.size_bytes());
    }

    #[derive(Default)]
    struct RecordingCapability {
        calls: Mutex<Vec<CompressionOptions>>,
    }

    impl CompressionCapability for RecordingCapability {
        fn compress(
            &self,
            source: &SourceImage,
            options: &CompressionOptions,
        ) -> std::result::Result<CompressedImage, CompressionError> {
            self.calls.lock().unwrap().push(options.clone());
            Ok(TargetSizeCompressor::passthrough(source))
        }
    }

    #[test]
    fn test_invalid_targets_never_reach_capability() {
        let capability = Arc::new(RecordingCapability::default());
        let controller = CompressionController::new(capability.clone());
        let source = noisy_source(16, 16, ImageFormat::Png);

        for target in [0.0, -5.0, f64::NAN] {
            let result = controller.compress_to_target(&source, target);
            assert!(matches!(
                result,
                Err(ResizeKroError::Rejected(ActionRejected::InvalidTarget(_)))
            ));
        }
        assert!(matches!(
            CompressionController::validate_target(None),
            Err(ResizeKroError::Rejected(ActionRejected::MissingTarget))
        ));
        assert!(capability.calls.lock().unwrap().is_empty());
    }

    struct FailingCapability;

    impl CompressionCapability for FailingCapability {
        fn compress(
            &self,
            _source: &SourceImage,
            _options: &CompressionOptions,
        ) -> std::result::Result<CompressedImage, CompressionError> {
            Err(CompressionError::Capability("target unattainable".to_string()))
        }
    }

    #[test]
    fn test_capability_failure_is_compression_error() {
        let controller = CompressionController::new(Arc::new(FailingCapability));
        let source = noisy_source(16, 16, ImageFormat::Png);
        match controller.compress_to_target(&source, 1.0) {
            Err(ResizeKroError::Compression(e)) => {
                assert!(e.user_message().contains("larger target"))
            }
            other => panic!("expected compression error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_compress_async() {
        let source = Arc::new(noisy_source(64, 64, ImageFormat::Png));
        let artifact = controller()
            .compress_to_target_async(source.clone(), 4.0)
            .await
            .unwrap();
        assert!(artifact.size_bytes() <= source.size_bytes());
    }
}
