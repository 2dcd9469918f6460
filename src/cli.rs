// resizekro/src/cli.rs
use crate::core::ResizeAlgorithm;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "resizekro",
    version,
    about = "Resize an image or compress it toward a target size"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show size, dimensions and aspect ratio of an image
    Info {
        input: PathBuf,
    },

    /// Resize to new pixel dimensions
    Resize {
        input: PathBuf,

        /// New width in pixels
        #[arg(long)]
        width: Option<u32>,

        /// New height in pixels
        #[arg(long)]
        height: Option<u32>,

        /// Let width and height change independently
        #[arg(long)]
        no_lock: bool,

        #[arg(short, long, value_enum, default_value_t = Algorithm::Bilinear)]
        algorithm: Algorithm,

        /// Directory the processed image is written to
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        /// File name of the processed image, without extension
        #[arg(long, default_value = "processed-image")]
        name: String,
    },

    /// Compress toward a target file size
    Compress {
        input: PathBuf,

        /// Desired file size in KB
        #[arg(short, long)]
        target_kb: f64,

        /// Maximum number of shrink rounds
        #[arg(long, default_value_t = 10)]
        max_iterations: u32,

        #[arg(short, long, value_enum, default_value_t = Algorithm::Bilinear)]
        algorithm: Algorithm,

        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,

        #[arg(long, default_value = "processed-image")]
        name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    Nearest,
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<Algorithm> for ResizeAlgorithm {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Nearest => ResizeAlgorithm::Nearest,
            Algorithm::Bilinear => ResizeAlgorithm::Bilinear,
            Algorithm::Bicubic => ResizeAlgorithm::Bicubic,
            Algorithm::Lanczos3 => ResizeAlgorithm::Lanczos3,
        }
    }
}
