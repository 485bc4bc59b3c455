use autolabel::error::{DetectionError, RecognitionError};
use autolabel::{DetectionBox, DetectorResolution, RegionDetector, TextRecognizer};
use image::{GrayImage, ImageBuffer, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::NamedTempFile;

/// Detector that always reports the same boxes
pub struct StubDetector {
    pub resolution: DetectorResolution,
    pub boxes: Vec<DetectionBox>,
}

impl StubDetector {
    pub fn new(boxes: Vec<DetectionBox>) -> Self {
        Self {
            resolution: DetectorResolution::square(640),
            boxes,
        }
    }
}

impl RegionDetector for StubDetector {
    fn native_resolution(&self) -> DetectorResolution {
        self.resolution
    }

    fn detect(&self, _: &RgbImage, threshold: f32) -> Result<Vec<DetectionBox>, DetectionError> {
        Ok(self
            .boxes
            .iter()
            .filter(|b| b.confidence >= threshold)
            .copied()
            .collect())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Detector whose model is broken
pub struct FailingDetector;

impl RegionDetector for FailingDetector {
    fn native_resolution(&self) -> DetectorResolution {
        DetectorResolution::default()
    }

    fn detect(&self, _: &RgbImage, _: f32) -> Result<Vec<DetectionBox>, DetectionError> {
        Err(DetectionError::Inference("weights corrupted".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Recognizer that describes the crop it was given: `<w>x<h>:<dark pixel count>`
pub struct DescribingRecognizer;

impl TextRecognizer for DescribingRecognizer {
    fn recognize(&self, crop: &GrayImage, _: &str) -> Result<String, RecognitionError> {
        let dark = crop.pixels().filter(|p| p[0] == 0).count();
        Ok(format!("{}x{}:{}", crop.width(), crop.height(), dark))
    }

    fn name(&self) -> &str {
        "describing"
    }
}

/// Recognizer that fails on one call (0-based) and succeeds otherwise
pub struct FlakyRecognizer {
    fail_on: usize,
    calls: AtomicUsize,
}

impl FlakyRecognizer {
    pub fn failing_on(fail_on: usize) -> Self {
        Self {
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl TextRecognizer for FlakyRecognizer {
    fn recognize(&self, _: &GrayImage, _: &str) -> Result<String, RecognitionError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == self.fail_on {
            return Err(RecognitionError::Engine("segfault in language model".to_string()));
        }
        Ok(format!("text {}", call))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

pub fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> DetectionBox {
    DetectionBox::new(x1, y1, x2, y2, 0.9).expect("valid test box")
}

/// White page with a few dark glyph-like blocks
pub fn page_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |x, y| {
        let in_glyph = (x / 20) % 3 == 1 && (y / 30) % 2 == 1;
        if in_glyph { Rgb([15, 15, 15]) } else { Rgb([245, 245, 245]) }
    })
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode test image");
    buf.into_inner()
}

/// Writes the image to a temporary `.png` file that is removed on drop
pub fn write_temp_png(img: &RgbImage) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}
