//! Contract with the external detection/training library.
//!
//! Nothing here trains or runs a network. [`DetectionBackend`] is the call
//! contract the rest of the tooling relies on, and [`UltralyticsCli`] meets
//! it by driving the Ultralytics `yolo` command.

mod descriptor;
mod ultralytics;

pub use descriptor::DatasetDescriptor;
pub use ultralytics::{inference_args, read_frame_results, train_args, UltralyticsCli};

use std::path::{Path, PathBuf};

use crate::error::ArenaLabelError;
use crate::ir::{BBoxXYXY, ClassId, Normalized};

pub const DEFAULT_MODEL: &str = "yolov8n.pt";
pub const DEFAULT_EPOCHS: u32 = 50;
pub const DEFAULT_IMGSZ: u32 = 640;
pub const DEFAULT_BATCH: u32 = 16;
pub const DEFAULT_RUN_NAME: &str = "robo_detector";
pub const DEFAULT_CONF: f64 = 0.25;
pub const RUNS_DIR: &str = "runs/detect";

/// Recordings tried, in order, when no source is given.
pub const DEFAULT_VIDEO_CANDIDATES: [&str; 2] =
    ["data/videos/video 1.mp4", "data/images/videos/video 1.mp4"];

/// Where a training run leaves its best weights.
pub fn weights_path(runs_dir: &Path, run_name: &str) -> PathBuf {
    runs_dir.join(run_name).join("weights").join("best.pt")
}

/// Returns the first candidate that is an existing file.
pub fn first_existing<P: AsRef<Path>>(candidates: &[P]) -> Option<PathBuf> {
    candidates
        .iter()
        .map(|p| p.as_ref())
        .find(|p| p.is_file())
        .map(Path::to_path_buf)
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrainRequest {
    /// Dataset descriptor YAML.
    pub data: PathBuf,
    /// Pretrained backbone to start from.
    pub model: String,
    pub epochs: u32,
    pub imgsz: u32,
    pub batch: u32,
    pub run_name: String,
}

impl TrainRequest {
    pub fn new(data: impl Into<PathBuf>) -> Self {
        Self {
            data: data.into(),
            model: DEFAULT_MODEL.to_string(),
            epochs: DEFAULT_EPOCHS,
            imgsz: DEFAULT_IMGSZ,
            batch: DEFAULT_BATCH,
            run_name: DEFAULT_RUN_NAME.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct InferenceRequest {
    /// Image, directory, video file, or webcam index such as `0`.
    pub source: String,
    pub weights: PathBuf,
    pub stream: bool,
    pub show: bool,
    pub save: bool,
    pub conf: f64,
}

impl InferenceRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            weights: weights_path(Path::new(RUNS_DIR), DEFAULT_RUN_NAME),
            stream: true,
            show: true,
            save: false,
            conf: DEFAULT_CONF,
        }
    }
}

/// Whether a source is run through the tracker or plain prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Videos and webcams: object ids persist across frames.
    Track,
    /// Still images or image directories.
    Predict,
}

impl SourceKind {
    pub fn classify(source: &str) -> Self {
        if Path::new(source).is_dir() {
            return SourceKind::Predict;
        }
        let ext = Path::new(source)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            None | Some("mp4") | Some("avi") => SourceKind::Track,
            Some(_) => SourceKind::Predict,
        }
    }

    pub fn mode(self) -> &'static str {
        match self {
            SourceKind::Track => "track",
            SourceKind::Predict => "predict",
        }
    }
}

/// One detected object.
///
/// The box is `(x1, y1, x2, y2)` normalized to the frame size, which is how
/// the detector's saved labels carry it; the frame size is not part of that
/// output. Use [`BBoxXYXY::to_pixel`] with the frame dimensions for pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBoxXYXY<Normalized>,
    pub confidence: f64,
    pub class_id: ClassId,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameResult {
    /// 1-based frame number.
    pub frame: usize,
    pub detections: Vec<Detection>,
}

impl FrameResult {
    pub fn summary_line(&self) -> String {
        if self.detections.is_empty() {
            format!("Frame {}: no detections", self.frame)
        } else {
            format!(
                "Frame {}: {} boxes detected",
                self.frame,
                self.detections.len()
            )
        }
    }
}

/// The fixed call contract of the detection library.
pub trait DetectionBackend {
    /// Trains on the dataset described by `request.data` and returns the
    /// path of the resulting weights.
    fn train(&mut self, request: &TrainRequest) -> Result<PathBuf, ArenaLabelError>;

    /// Runs prediction (or tracking, for videos) and returns per-frame
    /// results.
    fn predict_or_track(
        &mut self,
        request: &InferenceRequest,
    ) -> Result<Vec<FrameResult>, ArenaLabelError>;
}
