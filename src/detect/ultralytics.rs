//! [`DetectionBackend`] backed by the Ultralytics `yolo` command.
//!
//! Training runs `yolo detect train`; inference runs `yolo detect track`
//! or `yolo detect predict` with `save_txt`/`save_conf` enabled and reads
//! the per-frame label files back as one [`FrameResult`] per frame.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

use super::{
    weights_path, Detection, DetectionBackend, FrameResult, InferenceRequest, SourceKind,
    TrainRequest,
};
use crate::error::ArenaLabelError;
use crate::files::{file_stem, list_files_with_extensions};
use crate::ir::io_label::{read_label_file, LABEL_EXTENSION};

const INFERENCE_RUN_NAME: &str = "predict";

#[derive(Clone, Debug)]
pub struct UltralyticsCli {
    program: PathBuf,
    runs_dir: PathBuf,
}

impl UltralyticsCli {
    pub fn new(program: impl Into<PathBuf>, runs_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            runs_dir: runs_dir.into(),
        }
    }

    fn run(&self, args: &[String]) -> Result<(), ArenaLabelError> {
        debug!("Running {} {}", self.program.display(), args.join(" "));
        let status = Command::new(&self.program)
            .args(args)
            .status()
            .map_err(|err| ArenaLabelError::Detector {
                message: format!("failed to launch '{}': {err}", self.program.display()),
            })?;

        if !status.success() {
            return Err(ArenaLabelError::Detector {
                message: format!("'{}' exited with {status}", self.program.display()),
            });
        }
        Ok(())
    }
}

impl DetectionBackend for UltralyticsCli {
    fn train(&mut self, request: &TrainRequest) -> Result<PathBuf, ArenaLabelError> {
        info!(
            "Training {} for {} epochs (imgsz={}, batch={})",
            request.model, request.epochs, request.imgsz, request.batch
        );
        self.run(&train_args(request, &self.runs_dir))?;

        let weights = weights_path(&self.runs_dir, &request.run_name);
        if !weights.is_file() {
            return Err(ArenaLabelError::Detector {
                message: format!("training finished but {} is missing", weights.display()),
            });
        }
        info!("Training complete; weights at {}", weights.display());
        Ok(weights)
    }

    fn predict_or_track(
        &mut self,
        request: &InferenceRequest,
    ) -> Result<Vec<FrameResult>, ArenaLabelError> {
        if !request.weights.is_file() {
            return Err(ArenaLabelError::Detector {
                message: format!(
                    "weights not found at {}; train a model first",
                    request.weights.display()
                ),
            });
        }

        let labels_dir = self.runs_dir.join(INFERENCE_RUN_NAME).join("labels");
        if labels_dir.is_dir() {
            fs::remove_dir_all(&labels_dir)?;
        }

        self.run(&inference_args(request, &self.runs_dir))?;

        if !labels_dir.is_dir() {
            return Ok(Vec::new());
        }
        read_frame_results(&labels_dir)
    }
}

fn py_bool(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Arguments for `yolo detect train`.
pub fn train_args(request: &TrainRequest, runs_dir: &Path) -> Vec<String> {
    vec![
        "detect".to_string(),
        "train".to_string(),
        format!("data={}", request.data.display()),
        format!("model={}", request.model),
        format!("epochs={}", request.epochs),
        format!("imgsz={}", request.imgsz),
        format!("batch={}", request.batch),
        format!("project={}", runs_dir.display()),
        format!("name={}", request.run_name),
        "exist_ok=True".to_string(),
    ]
}

/// Arguments for `yolo detect track|predict`.
pub fn inference_args(request: &InferenceRequest, runs_dir: &Path) -> Vec<String> {
    let mode = SourceKind::classify(&request.source).mode();
    vec![
        "detect".to_string(),
        mode.to_string(),
        format!("model={}", request.weights.display()),
        format!("source={}", request.source),
        format!("conf={}", request.conf),
        format!("stream={}", py_bool(request.stream)),
        format!("show={}", py_bool(request.show)),
        format!("save={}", py_bool(request.save)),
        "save_txt=True".to_string(),
        "save_conf=True".to_string(),
        format!("project={}", runs_dir.display()),
        format!("name={INFERENCE_RUN_NAME}"),
        "exist_ok=True".to_string(),
    ]
}

/// Reads saved `<source>_<frame>.txt` label files into frame results,
/// ordered by frame number.
///
/// Ultralytics writes no file for a frame without detections. When every
/// file carries a frame number, the gaps in `1..=last` are filled with
/// empty results so there is one result per frame. Files without a numeric
/// suffix (still images) are numbered by file-name order instead.
pub fn read_frame_results(labels_dir: &Path) -> Result<Vec<FrameResult>, ArenaLabelError> {
    let files = list_files_with_extensions(labels_dir, &[LABEL_EXTENSION])?;
    let suffixes: Vec<Option<usize>> = files
        .iter()
        .map(|path| frame_number(&file_stem(path)))
        .collect();
    let numbered = suffixes.iter().all(Option::is_some);
    let mut by_frame: BTreeMap<usize, Vec<Detection>> = BTreeMap::new();

    for (index, (path, suffix)) in files.iter().zip(&suffixes).enumerate() {
        let frame = match suffix {
            Some(frame) if numbered => *frame,
            _ => index + 1,
        };
        let detections = read_label_file(path)?
            .into_iter()
            .map(|row| Detection {
                bbox: row.label.to_normalized_box(),
                confidence: row.confidence.unwrap_or(1.0),
                class_id: row.label.class_id,
            });
        by_frame.entry(frame).or_default().extend(detections);
    }

    if numbered {
        if let Some(&last) = by_frame.keys().next_back() {
            for frame in 1..=last {
                by_frame.entry(frame).or_default();
            }
        }
    }

    Ok(by_frame
        .into_iter()
        .map(|(frame, detections)| FrameResult { frame, detections })
        .collect())
}

fn frame_number(stem: &str) -> Option<usize> {
    let (_, suffix) = stem.rsplit_once('_')?;
    suffix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn train_args_carry_request_fields() {
        let request = TrainRequest::new("robos.yaml");
        let args = train_args(&request, Path::new("runs/detect"));
        assert_eq!(&args[..2], ["detect", "train"]);
        assert!(args.contains(&"data=robos.yaml".to_string()));
        assert!(args.contains(&"epochs=50".to_string()));
        assert!(args.contains(&"name=robo_detector".to_string()));
    }

    #[test]
    fn inference_args_pick_mode_from_source() {
        let mut request = InferenceRequest::new("data/videos/video 1.mp4");
        request.save = true;
        let args = inference_args(&request, Path::new("runs/detect"));
        assert_eq!(args[1], "track");
        assert!(args.contains(&"save=True".to_string()));
        assert!(args.contains(&"show=True".to_string()));
        assert!(args.contains(&"conf=0.25".to_string()));

        assert!(args.contains(&"stream=True".to_string()));

        let mut request = InferenceRequest::new("frame.jpg");
        request.stream = false;
        let args = inference_args(&request, Path::new("runs"));
        assert_eq!(args[1], "predict");
        assert!(args.contains(&"stream=False".to_string()));
    }

    #[test]
    fn frame_results_are_ordered_by_frame_number() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(
            temp.path().join("video 1_10.txt"),
            "0 0.5 0.5 0.2 0.2 0.91\n",
        )
        .expect("write");
        fs::write(
            temp.path().join("video 1_2.txt"),
            "0 0.5 0.5 0.2 0.2 0.40\n0 0.1 0.1 0.1 0.1 0.12\n",
        )
        .expect("write");

        let frames = read_frame_results(temp.path()).expect("read frames");
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[1].frame, 2);
        assert_eq!(frames[1].detections.len(), 2);
        assert_eq!(frames[1].detections[1].confidence, 0.12);
        assert_eq!(frames[9].frame, 10);

        let bbox = frames[9].detections[0].bbox;
        assert!((bbox.xmin() - 0.4).abs() < 1e-9);
        assert!((bbox.xmax() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn frames_without_detections_are_filled_in() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("video 1_1.txt"), "0 0.5 0.5 0.2 0.2 0.9\n").expect("write");
        fs::write(temp.path().join("video 1_3.txt"), "0 0.5 0.5 0.2 0.2 0.8\n").expect("write");

        let frames = read_frame_results(temp.path()).expect("read frames");
        let numbers: Vec<usize> = frames.iter().map(|f| f.frame).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(frames[1].detections.is_empty());
        assert_eq!(frames[1].summary_line(), "Frame 2: no detections");
    }

    #[test]
    fn still_images_are_numbered_by_name() {
        let temp = tempfile::tempdir().expect("create temp dir");
        fs::write(temp.path().join("arena.txt"), "0 0.5 0.5 0.2 0.2 0.9\n").expect("write");
        fs::write(temp.path().join("robot_7.txt"), "0 0.5 0.5 0.2 0.2 0.9\n").expect("write");

        let frames = read_frame_results(temp.path()).expect("read frames");
        let numbers: Vec<usize> = frames.iter().map(|f| f.frame).collect();
        assert_eq!(numbers, vec![1, 2]);
    }

    #[test]
    fn missing_weights_fail_before_launching() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut backend = UltralyticsCli::new("yolo-not-installed", temp.path());
        let mut request = InferenceRequest::new("clip.mp4");
        request.weights = temp.path().join("best.pt");

        let err = backend.predict_or_track(&request).unwrap_err();
        assert!(err.to_string().contains("train a model first"));
    }

    #[test]
    fn missing_program_is_a_detector_error() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let mut backend = UltralyticsCli::new(temp.path().join("no-such-yolo"), temp.path());
        let err = backend.train(&TrainRequest::new("robos.yaml")).unwrap_err();
        assert!(matches!(err, ArenaLabelError::Detector { .. }));
    }
}
