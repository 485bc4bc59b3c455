use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use autolabel::detection::ocr::DEFAULT_LANGUAGE;
use autolabel::detection::{
    DEFAULT_CONFIDENCE, OcrsRecognizer, TesseractRecognizer, TextRecognizer, YoloDetector,
};
use autolabel::{AutoLabeler, AutolabelError, DetectorResolution, MissingInputError, decode};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RecognizerKind {
    /// tesseract executable with the configured language pack
    Tesseract,
    /// ocrs engine, for Latin-script (English) documents; needs `--lang eng`
    Ocrs,
}

#[derive(Parser)]
#[command(name = "autolabel", version)]
#[command(about = "Detect text regions in an image and print labeled polygons as JSON")]
struct Cli {
    /// Image path (.png, .jpg, .jpeg) or base64-encoded image
    #[arg(value_name = "INPUT")]
    input: Option<String>,

    /// Detector model in .rten format
    #[arg(long, env = "AUTOLABEL_MODEL", default_value = "Aksorv3.rten")]
    model: PathBuf,

    /// Minimum detection confidence
    #[arg(long = "conf", env = "AUTOLABEL_CONF", default_value_t = DEFAULT_CONFIDENCE)]
    confidence: f32,

    /// Detector input size, either `N` or `WxH`
    #[arg(long, env = "AUTOLABEL_INPUT_SIZE", default_value = "640", value_parser = parse_resolution)]
    input_size: DetectorResolution,

    /// OCR language pack
    #[arg(long, env = "AUTOLABEL_LANG", default_value = DEFAULT_LANGUAGE)]
    lang: String,

    /// Text recognition backend. Khmer and other non-Latin packs need tesseract
    #[arg(long, env = "AUTOLABEL_RECOGNIZER", value_enum, default_value_t = RecognizerKind::Tesseract)]
    recognizer: RecognizerKind,

    /// tesseract executable
    #[arg(long, env = "AUTOLABEL_TESSERACT", default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    /// tesseract page segmentation mode
    #[arg(long, env = "AUTOLABEL_PSM")]
    psm: Option<u32>,

    /// Directory holding the ocrs models (defaults to ~/.cache/ocrs)
    #[arg(long, env = "AUTOLABEL_OCRS_MODELS", value_name = "DIR")]
    ocrs_models: Option<PathBuf>,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn parse_resolution(value: &str) -> Result<DetectorResolution, String> {
    let parse = |s: &str| {
        s.trim()
            .parse::<u32>()
            .ok()
            .filter(|v| *v > 0)
            .ok_or_else(|| format!("invalid size '{}'", value))
    };
    match value.split_once(['x', 'X']) {
        Some((w, h)) => Ok(DetectorResolution::new(parse(w)?, parse(h)?)),
        None => Ok(DetectorResolution::square(parse(value)?)),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "autolabel=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_recognizer(args: &Cli) -> autolabel::error::Result<Arc<dyn TextRecognizer>> {
    match args.recognizer {
        RecognizerKind::Tesseract => Ok(Arc::new(
            TesseractRecognizer::new()
                .with_command(&args.tesseract_cmd)
                .with_page_segmentation(args.psm),
        )),
        RecognizerKind::Ocrs => {
            let dir = match &args.ocrs_models {
                Some(dir) => dir.clone(),
                None => OcrsRecognizer::default_model_dir().map_err(|e| {
                    AutolabelError::Config(format!("cannot locate ocrs models: {e}"))
                })?,
            };
            let recognizer = OcrsRecognizer::load(&dir).map_err(|e| {
                AutolabelError::Config(format!("failed to load ocrs models: {e}"))
            })?;
            Ok(Arc::new(recognizer))
        }
    }
}

/// Settings that can be rejected without touching the input or any model
fn validate(args: &Cli) -> autolabel::error::Result<()> {
    if !(0.0..=1.0).contains(&args.confidence) {
        return Err(AutolabelError::Config(format!(
            "confidence must be within [0, 1], got {}",
            args.confidence
        )));
    }
    if matches!(args.recognizer, RecognizerKind::Ocrs) && !OcrsRecognizer::supports(&args.lang) {
        return Err(AutolabelError::Config(format!(
            "the ocrs recognizer reads Latin script only and cannot read language '{}'; use --recognizer tesseract",
            args.lang
        )));
    }
    Ok(())
}

fn run(args: Cli) -> autolabel::error::Result<String> {
    let input = args.input.as_deref().ok_or(AutolabelError::from(MissingInputError))?;
    validate(&args)?;

    let image = decode::decode(input)?;
    tracing::debug!(width = image.width(), height = image.height(), "image loaded");

    let detector = YoloDetector::load(&args.model, args.input_size)?;
    let recognizer = build_recognizer(&args)?;

    let mut labeler = AutoLabeler::new(Arc::new(detector), recognizer)
        .with_confidence(args.confidence)
        .with_language(args.lang.clone());
    if let Some(debug_dir) = args.debug_out.clone() {
        labeler = labeler.with_debug(debug_dir)?;
    }

    let annotations = labeler.label_image(&image)?;
    tracing::debug!(count = annotations.len(), "labeling finished");

    serde_json::to_string(&annotations).map_err(|e| AutolabelError::Output(e.to_string()))
}

fn main() -> ExitCode {
    let args = Cli::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(json) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(json.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("❌ Error: {}", AutolabelError::Output(e.to_string()));
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        // Each stage message already embeds its cause, so only the top level is printed
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
