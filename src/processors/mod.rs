// resizekro/src/processors/mod.rs
mod compressor;
mod dimensions;
mod loader;
mod resizer;

pub use compressor::{
    encode_jpeg, CompressedImage, CompressionCapability, CompressionController,
    CompressionOptions, TargetSizeCompressor,
};
pub use dimensions::DimensionModel;
pub use loader::{Loader, SourceImage};
pub use resizer::{RasterOutput, Rasterizer, ResizeController, Resizer, RESIZE_QUALITY};

