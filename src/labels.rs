use crate::models::{Annotation, LabelClass, Point, Polygon, ScaledBox, Shape};

/// Corners of the box, clockwise from the top-left
pub fn polygon(bbox: &ScaledBox) -> Polygon {
    let (x1, y1, x2, y2) = bbox.corners();
    let (x1, y1, x2, y2) = (x1 as f64, y1 as f64, x2 as f64, y2 as f64);
    [
        Point::new(x1, y1),
        Point::new(x2, y1),
        Point::new(x2, y2),
        Point::new(x1, y2),
    ]
}

/// Identifier derived from the top-left corner. Boxes whose corners share the
/// same `x1 + y1` collide; consumers already key on this value.
pub fn annotation_id(bbox: &ScaledBox) -> i64 {
    bbox.x1() as i64 + bbox.y1() as i64
}

/// Build the annotation for one region
pub fn assemble(bbox: &ScaledBox, text: impl Into<String>) -> Annotation {
    Annotation {
        id: annotation_id(bbox),
        shape: Shape::Polygon,
        points: polygon(bbox),
        description: text.into(),
        class: LabelClass::Auto,
    }
}
