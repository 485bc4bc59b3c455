pub mod decode;
pub mod detection;
pub mod error;
pub mod labels;
pub mod models;
pub mod pipeline;

pub use detection::{RegionDetector, TextRecognizer};
pub use error::{AutolabelError, DecodeError, DetectionError, MissingInputError, RegionError};
pub use models::{Annotation, DetectionBox, DetectorResolution, Point, ScaledBox};
pub use pipeline::{AutoLabeler, AutolabelConfig, DebugConfig, RegionOutcome, SkipReason};
