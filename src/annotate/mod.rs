//! Interactive bounding-box annotation.
//!
//! Walks a directory of images in file-name order and, for each one, lets
//! the user drag rectangles until they save, skip or quit. Saved boxes are
//! written as a YOLO label file named after the image stem.
//!
//! Every box drawn in one run gets the same class id; annotating several
//! classes takes one run per class.

mod frontend;
#[cfg(feature = "gui")]
mod gui;
mod report;
mod session;

pub use frontend::{parse_script_line, Command, Event, Frontend, ScriptFrontend};
#[cfg(feature = "gui")]
pub use gui::WindowFrontend;
pub use report::AnnotationReport;
pub use session::{AnnotationSession, DrawState, PointerEvent};

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::ArenaLabelError;
use crate::files::{ensure_dir, file_stem, list_files_with_extensions};
use crate::ir::io_label::{label_path_for, write_label_file};
use crate::ir::ClassId;

pub const DEFAULT_IMG_DIR: &str = "data/images/train";
pub const DEFAULT_LABEL_DIR: &str = "data/images/labels";

/// Extensions the annotator picks up, matched case-insensitively.
pub const ANNOTATE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

/// An image queued for annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageEntry {
    pub path: PathBuf,
    pub stem: String,
    pub width: u32,
    pub height: u32,
}

impl ImageEntry {
    /// Reads the image header to learn its size.
    pub fn probe(path: &Path) -> Result<Self, ArenaLabelError> {
        let unreadable = |message: String| ArenaLabelError::ImageUnreadable {
            path: path.to_path_buf(),
            message,
        };

        let size = imagesize::size(path).map_err(|err| unreadable(err.to_string()))?;
        let width = u32::try_from(size.width)
            .map_err(|_| unreadable(format!("width {} does not fit in u32", size.width)))?;
        let height = u32::try_from(size.height)
            .map_err(|_| unreadable(format!("height {} does not fit in u32", size.height)))?;
        if width == 0 || height == 0 {
            return Err(unreadable(format!("empty image ({width}x{height})")));
        }

        Ok(Self {
            path: path.to_path_buf(),
            stem: file_stem(path),
            width,
            height,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
pub struct AnnotateOptions {
    pub img_dir: PathBuf,
    pub label_dir: PathBuf,
    pub class_id: ClassId,
}

/// Images in `img_dir` the annotator will visit, sorted by file name.
pub fn list_images(img_dir: &Path) -> Result<Vec<PathBuf>, ArenaLabelError> {
    list_files_with_extensions(img_dir, &ANNOTATE_EXTENSIONS)
}

/// Runs an annotation pass over `opts.img_dir`.
///
/// Setup failures (missing input directory, label directory that cannot
/// be created) are returned before any file is written. Unreadable images
/// are logged and recorded in the report.
pub fn annotate_dir<F>(
    opts: &AnnotateOptions,
    frontend: &mut F,
) -> Result<AnnotationReport, ArenaLabelError>
where
    F: Frontend + ?Sized,
{
    if !opts.img_dir.is_dir() {
        return Err(ArenaLabelError::InputDirMissing {
            path: opts.img_dir.clone(),
        });
    }
    ensure_dir(&opts.label_dir)?;

    let images = list_images(&opts.img_dir)?;
    info!(
        "Found {} image(s) in {}; every box gets class {}",
        images.len(),
        opts.img_dir.display(),
        opts.class_id
    );

    let mut report = AnnotationReport::new(images.len());
    let outcome = annotate_images(opts, &images, frontend, &mut report);
    let closed = frontend.close();
    outcome?;
    closed?;
    Ok(report)
}

fn annotate_images<F>(
    opts: &AnnotateOptions,
    images: &[PathBuf],
    frontend: &mut F,
    report: &mut AnnotationReport,
) -> Result<(), ArenaLabelError>
where
    F: Frontend + ?Sized,
{
    for path in images {
        let image = match ImageEntry::probe(path) {
            Ok(image) => image,
            Err(err) => {
                warn!("{err}; skipping");
                report.unreadable.push(path.clone());
                continue;
            }
        };
        if !frontend.open(&image)? {
            warn!("Could not decode '{}', skipping", image.file_name());
            report.unreadable.push(path.clone());
            continue;
        }

        info!(
            "Annotating '{}' ({}x{})",
            image.file_name(),
            image.width,
            image.height
        );

        match run_session(&image, frontend)? {
            SessionOutcome::Save(session) => {
                let labels = session.labels(opts.class_id);
                let label_path = label_path_for(&opts.label_dir, &image.stem);
                write_label_file(&label_path, &labels)?;
                info!(
                    "Saved {} box(es) to '{}'",
                    labels.len(),
                    label_path.display()
                );
                report.saved += 1;
                report.boxes_written += labels.len();
            }
            SessionOutcome::Skip => {
                info!("Skipped '{}'", image.file_name());
                report.skipped += 1;
            }
            SessionOutcome::Quit => {
                info!("Quit requested; stopping");
                report.quit_early = true;
                return Ok(());
            }
        }
    }
    Ok(())
}

enum SessionOutcome {
    Save(AnnotationSession),
    Skip,
    Quit,
}

fn run_session<F>(image: &ImageEntry, frontend: &mut F) -> Result<SessionOutcome, ArenaLabelError>
where
    F: Frontend + ?Sized,
{
    let mut session = AnnotationSession::new(image.width, image.height);
    loop {
        match frontend.next_event(&session)? {
            Event::Pointer(event) => {
                if let Some(bbox) = session.handle(event) {
                    info!(
                        "Box {}: ({:.0}, {:.0}) - ({:.0}, {:.0})",
                        session.boxes().len(),
                        bbox.xmin(),
                        bbox.ymin(),
                        bbox.xmax(),
                        bbox.ymax()
                    );
                }
            }
            Event::Command(Command::Undo) => {
                if session.undo().is_some() {
                    info!("Removed last box; {} left", session.boxes().len());
                }
            }
            Event::Command(Command::Save) => return Ok(SessionOutcome::Save(session)),
            Event::Command(Command::Skip) => return Ok(SessionOutcome::Skip),
            Event::Command(Command::Quit) => return Ok(SessionOutcome::Quit),
        }
    }
}
