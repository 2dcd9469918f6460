use anyhow::{bail, Context};
use clap::Parser;
use log::LevelFilter;
use resizekro::{
    bytes_to_kb, calculate_savings, format_file_size, Axis, Cli, Commands, Loader, ResizeKroError,
    SessionConfig, SessionState,
};
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .init();

    match cli.command {
        Commands::Info { input } => process_info(&input)?,
        Commands::Resize {
            input,
            width,
            height,
            no_lock,
            algorithm,
            out_dir,
            name,
        } => {
            let config = SessionConfig {
                algorithm: algorithm.into(),
                lock_aspect_ratio: !no_lock,
                output_stem: name,
                ..Default::default()
            };
            process_resize(&input, config, width, height, &out_dir)?;
        }
        Commands::Compress {
            input,
            target_kb,
            max_iterations,
            algorithm,
            out_dir,
            name,
        } => {
            let config = SessionConfig {
                max_iterations,
                algorithm: algorithm.into(),
                output_stem: name,
                ..Default::default()
            };
            process_compress(&input, config, target_kb, &out_dir)?;
        }
    }

    Ok(())
}

fn open_session(input: &Path, config: SessionConfig) -> anyhow::Result<SessionState> {
    config.validate()?;

    let bytes = Loader::new()
        .read_file(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let mut session = SessionState::new(config);
    session
        .load_image(bytes)
        .with_context(|| format!("{} is not a readable image", input.display()))?;
    Ok(session)
}

fn process_info(input: &Path) -> anyhow::Result<()> {
    let session = open_session(input, SessionConfig::default())?;
    let Some(source) = session.source() else {
        bail!("No image loaded from {}", input.display());
    };

    println!("=== Original Image Details ===");
    println!("File: {}", input.display());
    println!(
        "Size: {}KB ({})",
        bytes_to_kb(source.size_bytes()),
        format_file_size(source.size_bytes())
    );
    println!("Dimensions: {} x {}", source.dimensions.width, source.dimensions.height);
    if let Some(ratio) = session.aspect_ratio() {
        println!("Aspect Ratio: {}", ratio);
    }
    println!("Format: {}", source.format_name());

    Ok(())
}

fn process_resize(
    input: &Path,
    config: SessionConfig,
    width: Option<u32>,
    height: Option<u32>,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let mut session = open_session(input, config)?;

    // Same order as typing into the width field and then the height field.
    if let Some(width) = width {
        session.set_dimension(Axis::Width, width);
    }
    if let Some(height) = height {
        session.set_dimension(Axis::Height, height);
    }

    let stem = session.config().output_stem.clone();
    let controller = session.resize_controller();
    let artifact = session.resize(&controller)?;
    let saved = artifact.save(out_dir, &stem)?;
    println!("Resized image saved to: {}", saved.display());

    Ok(())
}

fn process_compress(
    input: &Path,
    config: SessionConfig,
    target_kb: f64,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let mut session = open_session(input, config)?;
    session.set_target_kb(Some(target_kb));

    let stem = session.config().output_stem.clone();
    let original_size = session.source().map(|s| s.size_bytes()).unwrap_or(0);
    let controller = session.compression_controller();
    let artifact = match session.compress(&controller) {
        Ok(artifact) => artifact,
        Err(ResizeKroError::Compression(e)) => {
            log::error!("Error compressing image: {}", e);
            bail!(e.user_message());
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "Compressed image size: {}KB ({:.1}% smaller)",
        artifact.size_kb(),
        calculate_savings(original_size, artifact.size_bytes())
    );
    let saved = artifact.save(out_dir, &stem)?;
    println!("Compressed image saved to: {}", saved.display());

    Ok(())
}
