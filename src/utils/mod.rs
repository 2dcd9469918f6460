// resizekro/src/utils/mod.rs
use crate::core::AspectRatio;
use image::ImageFormat;
use std::path::{Path, PathBuf};

pub fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

/// Reduces `width:height` to lowest terms. Any zero side has no ratio.
pub fn calculate_aspect_ratio(width: u32, height: u32) -> Option<AspectRatio> {
    if width == 0 || height == 0 {
        return None;
    }

    let divisor = gcd(width, height);
    Some(AspectRatio {
        width: width / divisor,
        height: height / divisor,
    })
}

/// Rounds a non-negative value half away from zero into a pixel count.
pub fn round_to_pixels(value: f64) -> u32 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    value.round().min(u32::MAX as f64) as u32
}

pub fn bytes_to_kb(bytes: u64) -> u64 {
    (bytes as f64 / 1024.0).round() as u64
}

pub fn kb_to_bytes(kb: f64) -> u64 {
    (kb * 1024.0).floor() as u64
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes == 0 {
        return "0 B".to_string();
    }

    let base = 1024_f64;
    let bytes_f64 = bytes as f64;
    let exponent = ((bytes_f64.log10() / base.log10()).floor() as usize).min(UNITS.len() - 1);
    let size = bytes_f64 / base.powi(exponent as i32);

    format!("{:.2} {}", size, UNITS[exponent])
}

pub fn calculate_savings(original_size: u64, compressed_size: u64) -> f64 {
    if original_size == 0 {
        return 0.0;
    }

    let savings = (original_size as f64 - compressed_size as f64) / original_size as f64 * 100.0;
    savings.max(0.0)
}

pub fn image_format_to_string(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "JPEG",
        ImageFormat::Png => "PNG",
        ImageFormat::Gif => "GIF",
        ImageFormat::WebP => "WebP",
        ImageFormat::Tiff => "TIFF",
        ImageFormat::Bmp => "BMP",
        _ => "Unknown",
    }
    .to_string()
}

/// Download name for an artifact: the fixed stem plus the format's extension.
pub fn artifact_file_name(stem: &str, format: ImageFormat) -> String {
    let extension = format.extensions_str().first().copied().unwrap_or("jpg");
    format!("{}.{}", sanitize_filename(stem), extension)
}

pub fn generate_output_path(output_dir: &Path, stem: &str, format: ImageFormat) -> PathBuf {
    output_dir.join(artifact_file_name(stem, format))
}

pub fn sanitize_filename(filename: &str) -> String {
    let invalid_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
    filename
        .chars()
        .map(|c| if invalid_chars.contains(&c) { '_' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_reduction() {
        let ratio = calculate_aspect_ratio(1920, 1080).unwrap();
        assert_eq!(ratio.to_string(), "16:9");
        assert_eq!(calculate_aspect_ratio(1000, 500).unwrap().to_string(), "2:1");
        assert_eq!(calculate_aspect_ratio(7, 13).unwrap().to_string(), "7:13");
    }

    #[test]
    fn test_aspect_ratio_zero_is_undefined() {
        assert!(calculate_aspect_ratio(0, 0).is_none());
        assert!(calculate_aspect_ratio(640, 0).is_none());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(round_to_pixels(2.5), 3);
        assert_eq!(round_to_pixels(2.49), 2);
        assert_eq!(round_to_pixels(0.0), 0);
        assert_eq!(round_to_pixels(f64::NAN), 0);
    }

    #[test]
    fn test_kb_conversions() {
        assert_eq!(kb_to_bytes(1.0), 1024);
        assert_eq!(kb_to_bytes(0.5), 512);
        assert_eq!(bytes_to_kb(1536), 2);
        assert_eq!(bytes_to_kb(1535), 1);
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(0), "0 B");
        assert_eq!(format_file_size(512), "512.00 B");
        assert_eq!(format_file_size(2048), "2.00 KB");
    }

    #[test]
    fn test_calculate_savings() {
        assert_eq!(calculate_savings(200, 50), 75.0);
        assert_eq!(calculate_savings(0, 50), 0.0);
        assert_eq!(calculate_savings(50, 200), 0.0);
    }

    #[test]
    fn test_artifact_file_name() {
        assert_eq!(
            artifact_file_name("processed-image", ImageFormat::Jpeg),
            "processed-image.jpg"
        );
        assert_eq!(artifact_file_name("a/b", ImageFormat::Png), "a_b.png");
    }
}
