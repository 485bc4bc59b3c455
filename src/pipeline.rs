use image::RgbImage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::decode;
use crate::detection::mapping;
use crate::detection::ocr::DEFAULT_LANGUAGE;
use crate::detection::preprocessing;
use crate::detection::{DEFAULT_CONFIDENCE, RegionDetector, TextRecognizer};
use crate::error::{AutolabelError, RegionError, Result};
use crate::labels;
use crate::models::{Annotation, DetectionBox};

/// Debug output settings; present in [`AutolabelConfig`] only when debug mode is on
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    fn step_dir(&self, step_index: usize, step_name: &str) -> PathBuf {
        let name = format!("{:02}_{}", step_index, step_name.to_lowercase().replace(' ', "_"));
        self.output_dir.join(name)
    }
}

/// Settings for one labeling run
#[derive(Clone, Debug)]
pub struct AutolabelConfig {
    pub confidence_threshold: f32,
    /// Language pack handed to the recognizer
    pub language: String,
    pub debug: Option<DebugConfig>,
}

impl Default for AutolabelConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE,
            language: DEFAULT_LANGUAGE.to_string(),
            debug: None,
        }
    }
}

/// Why a detected region produced no annotation without failing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Collapsed to zero width or height when mapped to image space
    Degenerate,
    /// Nothing left to crop after clamping to the image
    EmptyCrop,
}

/// What happened to one detected region, in detection order
#[derive(Debug)]
pub enum RegionOutcome {
    Labeled(Annotation),
    Skipped(SkipReason),
    Failed(RegionError),
}

impl RegionOutcome {
    pub fn annotation(&self) -> Option<&Annotation> {
        match self {
            RegionOutcome::Labeled(a) => Some(a),
            _ => None,
        }
    }

    pub fn into_annotation(self) -> Option<Annotation> {
        match self {
            RegionOutcome::Labeled(a) => Some(a),
            _ => None,
        }
    }
}

/// Turns one image into a list of labeled polygons.
///
/// The detector and recognizer are loaded once by the caller and injected, so
/// the same instance can label any number of images.
pub struct AutoLabeler {
    detector: Arc<dyn RegionDetector>,
    recognizer: Arc<dyn TextRecognizer>,
    config: AutolabelConfig,
}

impl AutoLabeler {
    pub fn new(detector: Arc<dyn RegionDetector>, recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            detector,
            recognizer,
            config: AutolabelConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AutolabelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_confidence(mut self, confidence_threshold: f32) -> Self {
        self.config.confidence_threshold = confidence_threshold;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self> {
        prepare_debug_dir(&output_dir)?;
        self.config.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn config(&self) -> &AutolabelConfig {
        &self.config
    }

    /// Decode a path or base64 payload, then label it
    pub fn label_input(&self, input: &str) -> Result<Vec<Annotation>> {
        let image = decode::decode(input)?;
        self.label_image(&image)
    }

    /// Label an already decoded image. Regions that fail are logged and left out.
    pub fn label_image(&self, image: &RgbImage) -> Result<Vec<Annotation>> {
        let outcomes = self.label_regions(image)?;
        Ok(outcomes
            .into_iter()
            .filter_map(RegionOutcome::into_annotation)
            .collect())
    }

    /// Run the pipeline and report what happened to every detected region.
    ///
    /// Only decoding and detection failures abort the run.
    pub fn label_regions(&self, image: &RgbImage) -> Result<Vec<RegionOutcome>> {
        self.save_debug_input(image)?;

        let (width, height) = image.dimensions();
        let native = self.detector.native_resolution();
        let boxes = self
            .detector
            .detect(image, self.config.confidence_threshold)?;
        debug!(
            detector = self.detector.name(),
            count = boxes.len(),
            "detection finished"
        );

        let (scale_x, scale_y) = mapping::scale_factors(native, width, height);
        debug!(scale_x, scale_y, ?native, width, height, "mapping to image space");

        let outcomes: Vec<RegionOutcome> = boxes
            .iter()
            .enumerate()
            .map(|(i, det)| self.process_region(i + 1, image, det, scale_x, scale_y))
            .collect();

        for outcome in &outcomes {
            if let RegionOutcome::Failed(err) = outcome {
                warn!("dropping region: {}", err);
            }
        }

        Ok(outcomes)
    }

    fn process_region(
        &self,
        index: usize,
        image: &RgbImage,
        det: &DetectionBox,
        scale_x: f64,
        scale_y: f64,
    ) -> RegionOutcome {
        let (width, height) = image.dimensions();
        let Some(scaled) = mapping::rescale_by(det, scale_x, scale_y, width, height) else {
            debug!(index, ?det, "degenerate box skipped");
            return RegionOutcome::Skipped(SkipReason::Degenerate);
        };

        let Some(binary) = preprocessing::process(image, &scaled) else {
            debug!(index, ?scaled, "empty crop skipped");
            return RegionOutcome::Skipped(SkipReason::EmptyCrop);
        };

        if let Err(err) = self.save_debug_crop(index, &binary) {
            return RegionOutcome::Failed(err);
        }

        match self.recognizer.recognize(&binary, &self.config.language) {
            Ok(text) => {
                debug!(index, recognizer = self.recognizer.name(), text = %text, "region labeled");
                RegionOutcome::Labeled(labels::assemble(&scaled, text))
            }
            Err(source) => RegionOutcome::Failed(RegionError::Recognition { index, source }),
        }
    }

    fn save_debug_input(&self, image: &RgbImage) -> Result<()> {
        let Some(debug_config) = self.config.debug.as_ref() else {
            return Ok(());
        };
        let input_dir = debug_config.output_dir.join("00_input");
        std::fs::create_dir_all(&input_dir).map_err(|e| AutolabelError::Debug(e.to_string()))?;
        image
            .save(input_dir.join("01.png"))
            .map_err(|e| AutolabelError::Debug(format!("failed to save debug input: {}", e)))?;
        debug!("saved 00_input/01.png");
        Ok(())
    }

    fn save_debug_crop(&self, index: usize, binary: &image::GrayImage) -> Result<(), RegionError> {
        let Some(debug_config) = self.config.debug.as_ref() else {
            return Ok(());
        };
        let to_region_err = |message: String| RegionError::Debug { index, message };

        let step_dir = debug_config.step_dir(1, "Binarized");
        std::fs::create_dir_all(&step_dir).map_err(|e| to_region_err(e.to_string()))?;
        let filename = format!("{:02}.png", index);
        binary
            .save(step_dir.join(&filename))
            .map_err(|e| to_region_err(e.to_string()))?;
        debug!(file = %filename, "saved binarized crop");
        Ok(())
    }
}

fn prepare_debug_dir(output_dir: &Path) -> Result<()> {
    if output_dir.exists() {
        let entries = std::fs::read_dir(output_dir).map_err(|e| AutolabelError::Config(e.to_string()))?;
        if entries.count() > 0 {
            return Err(AutolabelError::Config(format!(
                "Debug directory is not empty: {}",
                output_dir.display()
            )));
        }
    } else {
        std::fs::create_dir_all(output_dir).map_err(|e| AutolabelError::Config(e.to_string()))?;
    }
    Ok(())
}
