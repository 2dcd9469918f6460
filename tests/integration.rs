#[cfg(test)]
mod tests {
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use resizekro::{
        ActionRejected, ArtifactOrigin, Axis, Dimensions, ResizeKroError, SessionConfig,
        SessionState,
    };
    use std::fs;

    fn write_gradient(path: &std::path::Path, width: u32, height: u32) {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        img.save(path).unwrap();
    }

    #[test]
    fn test_resize_and_save() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.child("photo.png");
        write_gradient(input.path(), 200, 100);

        let mut session = SessionState::default();
        session.load_image(fs::read(input.path()).unwrap()).unwrap();
        session.set_dimension(Axis::Width, 80);

        let controller = session.resize_controller();
        let artifact = session.resize(&controller).unwrap();
        assert_eq!(artifact.dimensions, Dimensions::new(80, 40));

        let saved = artifact.save(temp_dir.path(), "processed-image").unwrap();
        assert!(temp_dir.child("processed-image.jpg").path().exists());

        let reloaded = image::open(&saved).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (80, 40));
    }

    #[test]
    fn test_unlocked_resize_changes_one_axis() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.child("wide.png");
        write_gradient(input.path(), 100, 50);

        let config = SessionConfig {
            lock_aspect_ratio: false,
            ..Default::default()
        };
        let mut session = SessionState::new(config);
        session.load_image(fs::read(input.path()).unwrap()).unwrap();

        assert_eq!(session.set_dimension(Axis::Width, 30), Dimensions::new(30, 50));
        let controller = session.resize_controller();
        assert_eq!(
            session.resize(&controller).unwrap().dimensions,
            Dimensions::new(30, 50)
        );
    }

    #[test]
    fn test_compress_to_target_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("large.png");
        write_gradient(&input, 400, 300);
        let source_size = fs::metadata(&input).unwrap().len();

        let mut session = SessionState::default();
        session.load_image(fs::read(&input).unwrap()).unwrap();
        session.set_target_kb(Some(20.0));

        let controller = session.compression_controller();
        let artifact = session.compress(&controller).unwrap();
        assert_eq!(artifact.origin, ArtifactOrigin::Compress);
        assert!(artifact.size_bytes() <= source_size);
        assert!(artifact.dimensions.longest_side() <= 400);

        let saved = artifact.save(dir.path(), "processed-image").unwrap();
        assert_eq!(fs::metadata(saved).unwrap().len(), artifact.size_bytes());
    }

    #[test]
    fn test_unloaded_session_rejects_actions() {
        let mut session = SessionState::default();
        session.set_target_kb(Some(10.0));

        let compress = session.compression_controller();
        assert!(matches!(
            session.compress(&compress),
            Err(ResizeKroError::Rejected(ActionRejected::NotLoaded))
        ));

        let resize = session.resize_controller();
        assert!(session.resize(&resize).is_err());
        assert!(session.artifact().is_none());
    }

    #[test]
    fn test_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.child("notes.jpg");
        input.write_str("this is not a jpeg").unwrap();

        let mut session = SessionState::default();
        let result = session.load_image(fs::read(input.path()).unwrap());

        assert!(matches!(result, Err(ResizeKroError::Decode(_))));
        assert!(session.source().is_none());
    }
}
