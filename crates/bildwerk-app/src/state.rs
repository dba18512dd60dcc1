// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Session state — the document batch plus the two single-image slots.
//
// Nothing here survives the process. Each slot is replace-or-clear with no
// history; replacing discards the previous value outright.

use bildwerk_core::BatchCollection;
use bildwerk_core::types::{ImageItem, TargetFormat};

/// Everything the user has loaded in this session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Images queued for the PDF workflow.
    batch: BatchCollection,
    /// Image selected for compression.
    compression_image: Option<ImageItem>,
    /// Image selected for format conversion.
    conversion_image: Option<ImageItem>,
    /// Format the conversion workflow currently targets.
    conversion_target: TargetFormat,
}

#[allow(dead_code)]
impl SessionState {
    /// Fresh session whose batch holds at most `batch_capacity` images.
    pub fn new(batch_capacity: usize) -> Self {
        Self {
            batch: BatchCollection::new(batch_capacity),
            ..Self::default()
        }
    }

    // -- Batch ----------------------------------------------------------------

    pub fn batch(&self) -> &BatchCollection {
        &self.batch
    }

    pub fn batch_mut(&mut self) -> &mut BatchCollection {
        &mut self.batch
    }

    pub fn set_batch(&mut self, batch: BatchCollection) {
        self.batch = batch;
    }

    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    // -- Compression slot -------------------------------------------------------

    pub fn compression_image(&self) -> Option<&ImageItem> {
        self.compression_image.as_ref()
    }

    /// Replace the compression image, returning the one it displaced.
    pub fn set_compression_image(&mut self, image: ImageItem) -> Option<ImageItem> {
        self.compression_image.replace(image)
    }

    pub fn clear_compression_image(&mut self) {
        self.compression_image = None;
    }

    // -- Conversion slot --------------------------------------------------------

    pub fn conversion_image(&self) -> Option<&ImageItem> {
        self.conversion_image.as_ref()
    }

    /// Replace the conversion image, returning the one it displaced.
    pub fn set_conversion_image(&mut self, image: ImageItem) -> Option<ImageItem> {
        self.conversion_image.replace(image)
    }

    pub fn clear_conversion_image(&mut self) {
        self.conversion_image = None;
    }

    pub fn conversion_target(&self) -> TargetFormat {
        self.conversion_target
    }

    pub fn set_conversion_target(&mut self, target: TargetFormat) {
        self.conversion_target = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bildwerk_core::types::MediaType;

    fn item(name: &str) -> ImageItem {
        ImageItem::new(name, MediaType::Png, vec![0u8])
    }

    #[test]
    fn slots_are_independent() {
        let mut state = SessionState::new(100);
        state.set_compression_image(item("a.png"));
        state.set_conversion_image(item("b.png"));

        state.clear_compression_image();
        assert!(state.compression_image().is_none());
        assert_eq!(state.conversion_image().map(ImageItem::name), Some("b.png"));
        assert!(state.batch().is_empty());
    }

    #[test]
    fn replacing_a_slot_discards_the_old_value() {
        let mut state = SessionState::default();
        assert!(state.set_conversion_image(item("first.png")).is_none());
        let displaced = state.set_conversion_image(item("second.png"));

        assert_eq!(displaced.map(|i| i.name().to_string()), Some("first.png".into()));
        assert_eq!(state.conversion_image().map(ImageItem::name), Some("second.png"));
    }

    #[test]
    fn set_and_clear_batch() {
        let mut state = SessionState::new(3);
        let mut batch = BatchCollection::new(3);
        batch.append(vec![item("x.png"), item("y.png")]).unwrap();

        state.set_batch(batch);
        assert_eq!(state.batch().len(), 2);

        state.clear_batch();
        assert!(state.batch().is_empty());
        assert_eq!(state.batch().capacity(), 3);
    }

    #[test]
    fn conversion_target_defaults_to_jpeg() {
        let mut state = SessionState::default();
        assert_eq!(state.conversion_target(), TargetFormat::Jpeg);
        state.set_conversion_target(TargetFormat::Png);
        assert_eq!(state.conversion_target(), TargetFormat::Png);
    }
}
