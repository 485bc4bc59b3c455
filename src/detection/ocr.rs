use image::{DynamicImage, GrayImage};
use ocrs::{ImageSource, OcrEngine, OcrEngineParams};
use rten::Model;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::RecognitionError;

/// Language pack used when none is configured (Khmer)
pub const DEFAULT_LANGUAGE: &str = "khm";

/// Runs text recognition over a binarized crop
pub trait TextRecognizer: Send + Sync {
    /// Best-effort text, whitespace-trimmed. An empty string means nothing was found.
    fn recognize(&self, crop: &GrayImage, language: &str) -> Result<String, RecognitionError>;

    /// Human-readable name (used in log output)
    fn name(&self) -> &str;
}

/// Recognizer backed by the `tesseract` executable
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    pub command: PathBuf,
    pub page_segmentation: Option<u32>,
}

impl TesseractRecognizer {
    pub fn new() -> Self {
        Self {
            command: PathBuf::from("tesseract"),
            page_segmentation: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.command = command.into();
        self
    }

    pub fn with_page_segmentation(mut self, psm: Option<u32>) -> Self {
        self.page_segmentation = psm;
        self
    }

    fn run(&self, image_path: &Path, language: &str) -> Result<String, RecognitionError> {
        let mut cmd = Command::new(&self.command);
        cmd.arg(image_path).arg("stdout").arg("-l").arg(language);
        if let Some(psm) = self.page_segmentation {
            cmd.arg("--psm").arg(psm.to_string());
        }

        let output = cmd.output().map_err(|e| {
            RecognitionError::Unavailable(format!(
                "failed to run {} (is it installed?): {}",
                self.command.display(),
                e
            ))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RecognitionError::Engine(stderr.trim().to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, crop: &GrayImage, language: &str) -> Result<String, RecognitionError> {
        // tesseract reads from a file, so stage the crop as a PNG
        let staged = tempfile::Builder::new().suffix(".png").tempfile()?;
        crop.save_with_format(staged.path(), image::ImageFormat::Png)?;

        let text = self.run(staged.path(), language)?;
        debug!(chars = text.chars().count(), "tesseract finished");
        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "tesseract"
    }
}

/// Languages the bundled ocrs models can read
const OCRS_LANGUAGES: [&str; 2] = ["eng", "latin"];

/// Recognizer backed by the ocrs engine, for documents in Latin script
/// (English labels, Latin transliterations).
///
/// The published ocrs models only cover Latin script, so it cannot read the
/// default Khmer language pack; Khmer documents go through [`TesseractRecognizer`].
pub struct OcrsRecognizer {
    engine: OcrEngine,
}

impl OcrsRecognizer {
    /// Standard cache location used by `ocrs-cli`
    pub fn default_model_dir() -> anyhow::Result<PathBuf> {
        let home_dir = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE"))?;
        Ok(Path::new(&home_dir).join(".cache/ocrs"))
    }

    /// Load detection and recognition models from `model_dir`
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let detection_model_path = model_dir.join("text-detection.rten");
        let recognition_model_path = model_dir.join("text-recognition.rten");

        if !detection_model_path.exists() || !recognition_model_path.exists() {
            anyhow::bail!(
                "OCR models not found (expected {} and {}; fetch them with ocrs-cli)",
                detection_model_path.display(),
                recognition_model_path.display()
            );
        }

        let detection_model = Model::load_file(&detection_model_path)?;
        let recognition_model = Model::load_file(&recognition_model_path)?;

        let engine = OcrEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })?;

        Ok(Self { engine })
    }

    pub fn supports(language: &str) -> bool {
        OCRS_LANGUAGES.contains(&language)
    }
}

impl TextRecognizer for OcrsRecognizer {
    fn recognize(&self, crop: &GrayImage, language: &str) -> Result<String, RecognitionError> {
        if !Self::supports(language) {
            return Err(RecognitionError::UnsupportedLanguage(language.to_string()));
        }

        let img = DynamicImage::ImageLuma8(crop.clone()).to_rgb8();
        let img_source = ImageSource::from_bytes(img.as_raw(), img.dimensions())
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        let ocr_input = self
            .engine
            .prepare_input(img_source)
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;
        let text = self
            .engine
            .get_text(&ocr_input)
            .map_err(|e| RecognitionError::Engine(e.to_string()))?;

        Ok(text.trim().to_string())
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}
