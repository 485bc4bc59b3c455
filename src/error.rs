use std::path::PathBuf;
use thiserror::Error;

/// Input could not be turned into a pixel buffer
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read image file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid base64 image: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("image decoding failed: {0}")]
    Codec(#[from] image::ImageError),

    #[error("decoded image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// No image argument was supplied
#[derive(Debug, Error)]
#[error("no image input provided")]
pub struct MissingInputError;

/// The region detector failed as a whole
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("failed to load detector model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("detector inference failed: {0}")]
    Inference(String),

    #[error("unexpected detector output shape {shape:?}")]
    OutputShape { shape: Vec<usize> },
}

/// Failure reported by a text recognition engine
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("OCR engine unavailable: {0}")]
    Unavailable(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("language '{0}' is not supported by this recognizer")]
    UnsupportedLanguage(String),

    #[error("failed to stage crop for OCR: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode crop for OCR: {0}")]
    Encode(#[from] image::ImageError),
}

/// Failure confined to a single detected region
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("region {index}: recognition failed: {source}")]
    Recognition {
        index: usize,
        #[source]
        source: RecognitionError,
    },

    #[error("region {index}: failed to write debug output: {message}")]
    Debug { index: usize, message: String },
}

/// Errors that abort a whole labeling run; `Display` names the failing stage
#[derive(Debug, Error)]
pub enum AutolabelError {
    #[error("input: {0}")]
    MissingInput(#[from] MissingInputError),

    #[error("decode: {0}")]
    Decode(#[from] DecodeError),

    #[error("detection: {0}")]
    Detection(#[from] DetectionError),

    #[error("config: {0}")]
    Config(String),

    #[error("debug: {0}")]
    Debug(String),

    #[error("output: {0}")]
    Output(String),
}

pub type Result<T, E = AutolabelError> = std::result::Result<T, E>;
