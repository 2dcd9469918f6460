// resizekro/src/processors/dimensions.rs
use crate::core::{AspectRatio, Axis, Dimensions};
use crate::utils::{calculate_aspect_ratio, round_to_pixels};

/// Original and edited dimensions of the loaded image, plus the aspect lock.
///
/// `dirty` flips to true on any edit and back to false on reset or a new
/// load; the resize action is only offered while it is set.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionModel {
    original: Dimensions,
    current: Dimensions,
    lock_aspect_ratio: bool,
    dirty: bool,
}

impl DimensionModel {
    pub fn new(lock_aspect_ratio: bool) -> Self {
        Self {
            original: Dimensions::default(),
            current: Dimensions::default(),
            lock_aspect_ratio,
            dirty: false,
        }
    }

    pub fn original(&self) -> Dimensions {
        self.original
    }

    pub fn current(&self) -> Dimensions {
        self.current
    }

    pub fn is_locked(&self) -> bool {
        self.lock_aspect_ratio
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Takes new original dimensions after a load. `(0, 0)` while decoding.
    pub fn load(&mut self, original: Dimensions) {
        self.original = original;
        self.current = original;
        self.dirty = false;
    }

    pub fn set_lock_aspect_ratio(&mut self, locked: bool) {
        self.lock_aspect_ratio = locked;
    }

    /// Width over height of the original image, when both are known.
    fn ratio(&self) -> Option<f64> {
        if self.original.is_empty() {
            None
        } else {
            Some(self.original.width as f64 / self.original.height as f64)
        }
    }

    pub fn set_dimension(&mut self, axis: Axis, value: u32) -> Dimensions {
        let ratio = if self.lock_aspect_ratio { self.ratio() } else { None };

        self.current = match (ratio, axis) {
            (Some(r), Axis::Width) => Dimensions::new(value, round_to_pixels(value as f64 / r)),
            (Some(r), Axis::Height) => Dimensions::new(round_to_pixels(value as f64 * r), value),
            (None, Axis::Width) => Dimensions::new(value, self.current.height),
            (None, Axis::Height) => Dimensions::new(self.current.width, value),
        };
        self.dirty = true;

        log::debug!("Dimensions set to {} (locked: {})", self.current, ratio.is_some());
        self.current
    }

    pub fn reset_to_original(&mut self) -> Dimensions {
        self.current = self.original;
        self.dirty = false;
        self.current
    }

    pub fn aspect_ratio(&self) -> Option<AspectRatio> {
        calculate_aspect_ratio(self.original.width, self.original.height)
    }
}

impl Default for DimensionModel {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(width: u32, height: u32) -> DimensionModel {
        let mut model = DimensionModel::new(true);
        model.load(Dimensions::new(width, height));
        model
    }

    #[test]
    fn test_locked_width_derives_height() {
        let mut model = loaded(1000, 500);
        assert_eq!(model.set_dimension(Axis::Width, 300), Dimensions::new(300, 150));
        assert!(model.is_dirty());
    }

    #[test]
    fn test_locked_height_derives_width() {
        let mut model = loaded(1000, 500);
        assert_eq!(model.set_dimension(Axis::Height, 300), Dimensions::new(600, 300));
    }

    #[test]
    fn test_locked_rounds_half_away_from_zero() {
        // 3:2, width 5 -> height 3.333 -> 3; height 5 -> width 7.5 -> 8
        let mut model = loaded(300, 200);
        assert_eq!(model.set_dimension(Axis::Width, 5), Dimensions::new(5, 3));
        assert_eq!(model.set_dimension(Axis::Height, 5), Dimensions::new(8, 5));
    }

    #[test]
    fn test_unlocked_only_changes_edited_axis() {
        let mut model = loaded(1000, 500);
        model.set_lock_aspect_ratio(false);
        assert_eq!(model.set_dimension(Axis::Width, 300), Dimensions::new(300, 500));
        assert_eq!(model.set_dimension(Axis::Height, 42), Dimensions::new(300, 42));
    }

    #[test]
    fn test_lock_is_inert_without_original() {
        let mut model = DimensionModel::new(true);
        assert_eq!(model.set_dimension(Axis::Width, 300), Dimensions::new(300, 0));
        assert!(model.is_dirty());
    }

    #[test]
    fn test_zero_value_is_accepted_and_marks_dirty() {
        let mut model = loaded(1000, 500);
        assert_eq!(model.set_dimension(Axis::Width, 0), Dimensions::new(0, 0));
        assert!(model.is_dirty());
    }

    #[test]
    fn test_reset_restores_original_after_edits() {
        let mut model = loaded(1000, 500);
        model.set_dimension(Axis::Width, 300);
        model.set_lock_aspect_ratio(false);
        model.set_dimension(Axis::Height, 7);

        assert_eq!(model.reset_to_original(), Dimensions::new(1000, 500));
        assert!(!model.is_dirty());
    }

    #[test]
    fn test_toggling_lock_keeps_current_and_dirty() {
        let mut model = loaded(1000, 500);
        model.set_lock_aspect_ratio(false);
        assert_eq!(model.current(), Dimensions::new(1000, 500));
        assert!(!model.is_dirty());
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(loaded(1920, 1080).aspect_ratio().unwrap().to_string(), "16:9");
        assert!(DimensionModel::default().aspect_ratio().is_none());
    }
}
