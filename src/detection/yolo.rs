//! YOLOv8-style region detector running on `rten`.
//!
//! The image is stretched (no letterboxing) to the detector's native
//! resolution, so the boxes it reports live in that space and are mapped back
//! with independent x/y factors by [`super::mapping`].

use image::RgbImage;
use image::imageops::FilterType;
use rten::Model;
use rten_tensor::NdTensor;
use rten_tensor::prelude::*;
use std::path::Path;
use tracing::debug;

use super::RegionDetector;
use crate::error::DetectionError;
use crate::models::{DetectionBox, DetectorResolution};

/// IoU above which a lower-scoring box is suppressed
pub const NMS_IOU_THRESHOLD: f32 = 0.7;

/// Upper bound on boxes kept per image
pub const MAX_DETECTIONS: usize = 300;

pub struct YoloDetector {
    model: Model,
    resolution: DetectorResolution,
}

impl YoloDetector {
    /// Load a frozen `.rten` model. Done once per process.
    pub fn load(path: &Path, resolution: DetectorResolution) -> Result<Self, DetectionError> {
        debug!(path = %path.display(), ?resolution, "loading detector model");
        let model = Model::load_file(path).map_err(|e| DetectionError::ModelLoad {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self { model, resolution })
    }
}

impl RegionDetector for YoloDetector {
    fn native_resolution(&self) -> DetectorResolution {
        self.resolution
    }

    fn detect(
        &self,
        image: &RgbImage,
        confidence_threshold: f32,
    ) -> Result<Vec<DetectionBox>, DetectionError> {
        let input = to_input_tensor(image, self.resolution);

        let output = self
            .model
            .run_one(input.view().into(), None)
            .map_err(|e| DetectionError::Inference(e.to_string()))?;
        let output: NdTensor<f32, 3> = output
            .try_into()
            .map_err(|e| DetectionError::Inference(format!("{e:?}")))?;

        let [batch, rows, anchors] = output.shape();
        if batch != 1 || rows <= 4 {
            return Err(DetectionError::OutputShape {
                shape: vec![batch, rows, anchors],
            });
        }

        let mut candidates = Vec::new();
        for a in 0..anchors {
            let score = (4..rows)
                .map(|c| output[[0, c, a]])
                .fold(f32::NEG_INFINITY, f32::max);
            let raw = [
                output[[0, 0, a]],
                output[[0, 1, a]],
                output[[0, 2, a]],
                output[[0, 3, a]],
            ];
            if let Some(b) = decode_anchor(raw, score, confidence_threshold, self.resolution) {
                candidates.push(b);
            }
        }

        let kept = non_max_suppression(candidates, NMS_IOU_THRESHOLD, MAX_DETECTIONS);
        debug!(anchors, kept = kept.len(), "detector finished");
        Ok(kept)
    }

    fn name(&self) -> &str {
        "yolo"
    }
}

/// Resize to the native resolution and lay out as NCHW floats in `[0, 1]`
pub fn to_input_tensor(image: &RgbImage, resolution: DetectorResolution) -> NdTensor<f32, 4> {
    let (w, h) = (resolution.width, resolution.height);
    let resized = image::imageops::resize(image, w, h, FilterType::Triangle);

    let plane = (w * h) as usize;
    let mut data = vec![0.0f32; 3 * plane];
    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * w + x) as usize;
        for c in 0..3 {
            data[c * plane + offset] = pixel[c] as f32 / 255.0;
        }
    }

    NdTensor::from_data([1, 3, h as usize, w as usize], data)
}

/// Turn one `(cx, cy, w, h)` prediction into a corner box clamped to the
/// detector's input bounds, or `None` if it is below threshold or degenerate
pub fn decode_anchor(
    raw: [f32; 4],
    score: f32,
    confidence_threshold: f32,
    resolution: DetectorResolution,
) -> Option<DetectionBox> {
    if !(score >= confidence_threshold) {
        return None;
    }
    let [cx, cy, bw, bh] = raw;
    let max_x = resolution.width as f32;
    let max_y = resolution.height as f32;

    let x1 = (cx - bw / 2.0).clamp(0.0, max_x);
    let y1 = (cy - bh / 2.0).clamp(0.0, max_y);
    let x2 = (cx + bw / 2.0).clamp(0.0, max_x);
    let y2 = (cy + bh / 2.0).clamp(0.0, max_y);

    DetectionBox::new(x1, y1, x2, y2, score)
}

/// Class-agnostic greedy NMS, highest confidence first
pub fn non_max_suppression(
    mut boxes: Vec<DetectionBox>,
    iou_threshold: f32,
    max_detections: usize,
) -> Vec<DetectionBox> {
    boxes.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut kept: Vec<DetectionBox> = Vec::new();
    for candidate in boxes {
        if kept.len() >= max_detections {
            break;
        }
        if kept.iter().all(|k| k.iou(&candidate) <= iou_threshold) {
            kept.push(candidate);
        }
    }
    kept
}
