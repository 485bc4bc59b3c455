use serde::{Deserialize, Serialize};

/// Fixed input size the region detector was trained on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorResolution {
    pub width: u32,
    pub height: u32,
}

impl DetectorResolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn square(size: u32) -> Self {
        Self::new(size, size)
    }
}

impl Default for DetectorResolution {
    fn default() -> Self {
        Self::square(640)
    }
}

/// Box reported by the detector, in its native input coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub confidence: f32,
}

impl DetectionBox {
    /// Returns `None` unless `x2 > x1`, `y2 > y1` and every coordinate is non-negative.
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32) -> Option<Self> {
        let finite = [x1, y1, x2, y2].iter().all(|v| v.is_finite());
        if !finite || x1 < 0.0 || y1 < 0.0 || x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self { x1, y1, x2, y2, confidence })
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &DetectionBox) -> f32 {
        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);

        let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
        let union = self.area() + other.area() - inter;
        if union <= 0.0 {
            return 0.0;
        }
        inter / union
    }
}

/// Box in the original image's pixel coordinates.
///
/// Only built through [`ScaledBox::new`], so `x2 > x1` and `y2 > y1` always hold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledBox {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    pub confidence: f32,
}

impl ScaledBox {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32, confidence: f32) -> Option<Self> {
        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self { x1, y1, x2, y2, confidence })
    }

    pub fn x1(&self) -> u32 {
        self.x1
    }

    pub fn y1(&self) -> u32 {
        self.y1
    }

    pub fn x2(&self) -> u32 {
        self.x2
    }

    pub fn y2(&self) -> u32 {
        self.y2
    }

    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    pub fn corners(&self) -> (u32, u32, u32, u32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Four corners, clockwise from the top-left
pub type Polygon = [Point; 4];

/// Shape tag understood by the labeling UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Polygon,
}

/// Origin of a label; everything this crate emits is `auto`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelClass {
    Auto,
}

/// One labeled region as consumed by the labeling UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: i64,
    pub shape: Shape,
    pub points: Polygon,
    pub description: String,
    pub class: LabelClass,
}
