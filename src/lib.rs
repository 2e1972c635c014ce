//! Arenalabel: dataset tooling for an arena robot detector.
//!
//! Two utilities prepare data for a single-class object detector. The
//! annotator walks a directory of images and writes one YOLO label file
//! per image; the organizer takes a flat pool of image + label pairs and
//! lays them out as a seeded train/val split. A thin wrapper around the
//! external detection library trains on the result and runs tracking.
//!
//! # Modules
//!
//! - [`ir`]: Box geometry, label records and the label file format
//! - [`annotate`]: Interactive annotation driven through a [`annotate::Frontend`]
//! - [`organize`]: Train/val planning and the file moves that apply it
//! - [`detect`]: Call contract with the detection/training library
//! - [`error`]: Error types for arenalabel operations

pub mod annotate;
pub mod detect;
pub mod error;
pub mod files;
pub mod ir;
pub mod organize;

use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use log::info;

pub use error::ArenaLabelError;

use annotate::{AnnotateOptions, Frontend, ScriptFrontend};
use detect::{
    first_existing, weights_path, DatasetDescriptor, DetectionBackend, InferenceRequest,
    TrainRequest, UltralyticsCli,
};
use organize::SplitOptions;

/// Installs the `env_logger` backend. `RUST_LOG` overrides the `info` default.
fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Where annotation events come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputMode {
    /// An OpenCV window with mouse and keyboard input.
    Window,
    /// An event script read from stdin.
    Script,
}

impl Default for InputMode {
    fn default() -> Self {
        if cfg!(feature = "gui") {
            InputMode::Window
        } else {
            InputMode::Script
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Draw bounding boxes on images and save them as YOLO labels.
#[derive(Parser)]
#[command(name = "arena-annotate")]
#[command(version, author, about)]
struct AnnotateCli {
    /// Directory of images to annotate.
    #[arg(long, default_value = annotate::DEFAULT_IMG_DIR)]
    img_dir: PathBuf,

    /// Directory that receives one `.txt` label file per saved image.
    #[arg(long, default_value = annotate::DEFAULT_LABEL_DIR)]
    label_dir: PathBuf,

    /// Class id written for every box in this run.
    #[arg(long, default_value_t = 0)]
    class_id: u32,

    /// Event source: an interactive window, or a script on stdin.
    #[arg(long, value_enum, default_value_t = InputMode::default())]
    input: InputMode,
}

/// Split a flat pool of image + label pairs into train and val.
#[derive(Parser)]
#[command(name = "arena-organize")]
#[command(version, author, about)]
struct OrganizeCli {
    /// Dataset root; the pool is `<root>/labels/`.
    #[arg(long, env = "ARENA_DATA_ROOT", default_value = "data")]
    data_root: PathBuf,

    /// Fraction of pairs routed to val.
    #[arg(long, default_value_t = organize::DEFAULT_VAL_RATIO)]
    val_ratio: f64,

    /// Shuffle seed.
    #[arg(long, default_value_t = organize::DEFAULT_SEED)]
    seed: u64,

    /// Output format for the report.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

/// Train the robot detector and run it on video.
#[derive(Parser)]
#[command(name = "arena-detect")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct DetectCli {
    /// The Ultralytics command to invoke.
    #[arg(long, env = "ARENA_YOLO_BIN", default_value = "yolo", global = true)]
    yolo: PathBuf,

    /// Directory that holds training and inference runs.
    #[arg(long, default_value = detect::RUNS_DIR, global = true)]
    runs_dir: PathBuf,

    #[command(subcommand)]
    command: DetectCommand,
}

#[derive(Subcommand)]
enum DetectCommand {
    /// Train on a dataset descriptor.
    Train(TrainArgs),
    /// Track objects in a video (or predict on images).
    Track(TrackArgs),
}

#[derive(clap::Args)]
struct TrainArgs {
    /// Dataset descriptor YAML.
    #[arg(long)]
    data: PathBuf,

    /// Pretrained model to start from.
    #[arg(long, default_value = detect::DEFAULT_MODEL)]
    model: String,

    #[arg(long, default_value_t = detect::DEFAULT_EPOCHS)]
    epochs: u32,

    /// Training image size.
    #[arg(long, default_value_t = detect::DEFAULT_IMGSZ)]
    imgsz: u32,

    #[arg(long, default_value_t = detect::DEFAULT_BATCH)]
    batch: u32,

    /// Run name under the runs directory.
    #[arg(long, default_value = detect::DEFAULT_RUN_NAME)]
    name: String,
}

#[derive(clap::Args)]
struct TrackArgs {
    /// Video, image, directory or webcam index. Defaults to the first
    /// recording found under `data/`.
    #[arg(long)]
    source: Option<String>,

    /// Trained weights. Defaults to the best weights of the default run.
    #[arg(long)]
    weights: Option<PathBuf>,

    /// Minimum confidence for a detection to be reported.
    #[arg(long, default_value_t = detect::DEFAULT_CONF)]
    conf: f64,

    /// Do not open a preview window.
    #[arg(long)]
    no_show: bool,

    /// Let the detector load the whole source before yielding results.
    #[arg(long)]
    no_stream: bool,

    /// Save annotated frames.
    #[arg(long)]
    save: bool,
}

/// Run the annotator CLI.
pub fn run_annotate() -> Result<(), ArenaLabelError> {
    let cli = AnnotateCli::parse();
    init_logging();

    let opts = AnnotateOptions {
        img_dir: cli.img_dir,
        label_dir: cli.label_dir,
        class_id: cli.class_id,
    };
    info!(
        "Single-class mode: every box is saved with class {}",
        opts.class_id
    );

    let mut frontend = make_frontend(cli.input)?;
    let report = annotate::annotate_dir(&opts, frontend.as_mut())?;
    print!("{report}");
    Ok(())
}

fn make_frontend(input: InputMode) -> Result<Box<dyn Frontend>, ArenaLabelError> {
    match input {
        InputMode::Script => Ok(Box::new(ScriptFrontend::new(io::stdin().lock()))),
        #[cfg(feature = "gui")]
        InputMode::Window => Ok(Box::new(annotate::WindowFrontend::new())),
        #[cfg(not(feature = "gui"))]
        InputMode::Window => Err(ArenaLabelError::Display {
            message: "built without the `gui` feature; use --input script".to_string(),
        }),
    }
}

/// Run the organizer CLI.
pub fn run_organize() -> Result<(), ArenaLabelError> {
    let cli = OrganizeCli::parse();
    init_logging();

    let opts = SplitOptions {
        val_ratio: cli.val_ratio,
        seed: cli.seed,
    };
    let report = organize::organize_dataset(&cli.data_root, &opts)?;

    match cli.output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).map_err(io::Error::from)?;
            println!("{json}");
        }
        OutputFormat::Text => print!("{report}"),
    }
    Ok(())
}

/// Run the detector CLI.
pub fn run_detect() -> Result<(), ArenaLabelError> {
    let cli = DetectCli::parse();
    init_logging();

    let mut backend = UltralyticsCli::new(&cli.yolo, &cli.runs_dir);
    match cli.command {
        DetectCommand::Train(args) => run_train(&mut backend, args),
        DetectCommand::Track(args) => run_track(&mut backend, &cli.runs_dir, args),
    }
}

fn run_train<B: DetectionBackend>(backend: &mut B, args: TrainArgs) -> Result<(), ArenaLabelError> {
    let descriptor = DatasetDescriptor::load(&args.data)?;
    descriptor.check(&args.data)?;
    info!(
        "Dataset {}: classes {:?}",
        args.data.display(),
        descriptor.class_names()
    );

    let request = TrainRequest {
        data: args.data,
        model: args.model,
        epochs: args.epochs,
        imgsz: args.imgsz,
        batch: args.batch,
        run_name: args.name,
    };
    let weights = backend.train(&request)?;
    println!("Weights saved to {}", weights.display());
    Ok(())
}

fn run_track<B: DetectionBackend>(
    backend: &mut B,
    runs_dir: &Path,
    args: TrackArgs,
) -> Result<(), ArenaLabelError> {
    let source = match args.source {
        Some(source) => source,
        None => first_existing(&detect::DEFAULT_VIDEO_CANDIDATES)
            .map(|path| path.to_string_lossy().into_owned())
            .ok_or_else(|| ArenaLabelError::Detector {
                message: format!(
                    "no --source given and none of {:?} exist",
                    detect::DEFAULT_VIDEO_CANDIDATES
                ),
            })?,
    };

    let mut request = InferenceRequest::new(source);
    request.weights = args
        .weights
        .unwrap_or_else(|| weights_path(runs_dir, detect::DEFAULT_RUN_NAME));
    request.conf = args.conf;
    request.show = !args.no_show;
    request.stream = !args.no_stream;
    request.save = args.save;

    info!("Running {} on {}", request.weights.display(), request.source);
    let frames = backend.predict_or_track(&request)?;
    for frame in &frames {
        println!("{}", frame.summary_line());
    }
    info!("{} frame(s) with detections", frames.len());
    Ok(())
}
