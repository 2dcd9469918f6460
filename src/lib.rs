mod cli;
mod core;
mod processors;
mod utils;

pub use cli::{Algorithm, Cli, Commands};
pub use self::core::{
    ActionKind, ActionRejected, ActionTicket, ArtifactOrigin, AspectRatio, Axis,
    CompressRequest, CompressionError, DecodeError, Dimensions, LoadTicket, ProcessedArtifact,
    RenderError, ResizeAlgorithm, ResizeKroError, ResizeRequest, Result, SessionConfig,
    SessionState,
};
pub use processors::{
    encode_jpeg, CompressedImage, CompressionCapability, CompressionController,
    CompressionOptions, DimensionModel, Loader, RasterOutput, Rasterizer, ResizeController,
    Resizer, SourceImage, TargetSizeCompressor, RESIZE_QUALITY,
};
pub use utils::{
    artifact_file_name, bytes_to_kb, calculate_aspect_ratio, calculate_savings, format_file_size,
    generate_output_path, kb_to_bytes,
};

pub mod prelude {
    pub use crate::{
        Axis, CompressionController, DimensionModel, Loader, ResizeController, Resizer,
        SessionConfig, SessionState,
    };
}
