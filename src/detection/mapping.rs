use crate::models::{DetectionBox, DetectorResolution, ScaledBox};

/// Horizontal and vertical factors from detector space to image space.
/// Computed independently, so non-uniform scaling is expected.
pub fn scale_factors(detector: DetectorResolution, image_width: u32, image_height: u32) -> (f64, f64) {
    let scale_x = image_width as f64 / detector.width as f64;
    let scale_y = image_height as f64 / detector.height as f64;
    (scale_x, scale_y)
}

/// Map a detector-space box into the original image's pixel grid.
///
/// Each coordinate is multiplied by its axis factor and truncated toward zero,
/// then clamped to `[0, width] x [0, height]`. Returns `None` when the result
/// is degenerate (`x2 <= x1` or `y2 <= y1`).
pub fn rescale(
    bbox: &DetectionBox,
    detector: DetectorResolution,
    image_width: u32,
    image_height: u32,
) -> Option<ScaledBox> {
    let (scale_x, scale_y) = scale_factors(detector, image_width, image_height);
    rescale_by(bbox, scale_x, scale_y, image_width, image_height)
}

/// Same as [`rescale`] with precomputed factors
pub fn rescale_by(
    bbox: &DetectionBox,
    scale_x: f64,
    scale_y: f64,
    image_width: u32,
    image_height: u32,
) -> Option<ScaledBox> {
    let x1 = to_pixel(bbox.x1, scale_x, image_width);
    let y1 = to_pixel(bbox.y1, scale_y, image_height);
    let x2 = to_pixel(bbox.x2, scale_x, image_width);
    let y2 = to_pixel(bbox.y2, scale_y, image_height);
    ScaledBox::new(x1, y1, x2, y2, bbox.confidence)
}

fn to_pixel(coord: f32, scale: f64, limit: u32) -> u32 {
    // `as` saturates, so negatives and NaN become 0
    let scaled = (coord as f64 * scale).trunc() as u32;
    scaled.min(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f32, y1: f32, x2: f32, y2: f32) -> DetectionBox {
        DetectionBox::new(x1, y1, x2, y2, 0.9).unwrap()
    }

    #[test]
    fn non_uniform_scale_factors() {
        let (sx, sy) = scale_factors(DetectorResolution::square(640), 1280, 960);
        assert_eq!(sx, 2.0);
        assert_eq!(sy, 1.5);
    }

    #[test]
    fn maps_box_to_image_space() {
        let scaled = rescale(
            &det(100.0, 100.0, 200.0, 200.0),
            DetectorResolution::square(640),
            1280,
            960,
        )
        .unwrap();
        assert_eq!(scaled.corners(), (200, 150, 400, 300));
        assert_eq!(scaled.confidence, 0.9);
    }

    #[test]
    fn downscaling_truncates() {
        // 0.5 scale: 11.9 * 0.5 = 5.95 -> 5, 33.3 * 0.5 = 16.65 -> 16
        let scaled = rescale(
            &det(11.9, 11.9, 33.3, 33.3),
            DetectorResolution::square(640),
            320,
            320,
        )
        .unwrap();
        assert_eq!(scaled.corners(), (5, 5, 16, 16));
    }

    #[test]
    fn collapsed_box_is_dropped() {
        // 10.2 and 10.8 both truncate to 2 when scaled by 0.25
        let out = rescale(
            &det(10.2, 0.0, 10.8, 100.0),
            DetectorResolution::square(640),
            160,
            160,
        );
        assert!(out.is_none());
    }

    #[test]
    fn coordinates_are_clamped_to_image() {
        let scaled = rescale(
            &det(600.0, 600.0, 660.0, 700.0),
            DetectorResolution::square(640),
            640,
            640,
        )
        .unwrap();
        assert_eq!(scaled.corners(), (600, 600, 640, 640));
    }

    #[test]
    fn non_square_detector() {
        let scaled = rescale(
            &det(10.0, 10.0, 20.0, 20.0),
            DetectorResolution::new(320, 640),
            640,
            640,
        )
        .unwrap();
        assert_eq!(scaled.corners(), (20, 10, 40, 20));
    }
}
