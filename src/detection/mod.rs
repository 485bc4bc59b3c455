pub mod mapping;
pub mod ocr;
pub mod preprocessing;
pub mod yolo;

use image::RgbImage;

use crate::error::DetectionError;
use crate::models::{DetectionBox, DetectorResolution};

pub use ocr::{OcrsRecognizer, TesseractRecognizer, TextRecognizer};
pub use yolo::YoloDetector;

/// Confidence below which the detector discards boxes
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// Finds regions of interest in an image.
///
/// Boxes are reported in the detector's native input space, described by
/// [`RegionDetector::native_resolution`], not in the caller's image space.
/// Implementations hold their model read-only and can be shared across threads.
pub trait RegionDetector: Send + Sync {
    /// Input size the boxes returned by [`RegionDetector::detect`] refer to
    fn native_resolution(&self) -> DetectorResolution;

    /// Run detection once over the whole image, dropping boxes below `confidence_threshold`
    fn detect(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<DetectionBox>, DetectionError>;

    /// Human-readable name (used in log output)
    fn name(&self) -> &str;
}
