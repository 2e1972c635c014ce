//! Train/val partitioning of a flat pool of image + label pairs.
//!
//! The pool is `<root>/labels/`, holding images next to their `.txt`
//! labels. Partitioning runs in two steps: [`plan_split`] decides which
//! stem goes where without touching the disk, then [`apply_split`] moves
//! each pair into `images/<split>` + `labels/<split>`.
//!
//! This is a one-shot operation. After a successful run the pool no longer
//! holds the moved pairs, so running it again does not reproduce or extend
//! the split. A run interrupted between moving an image and its label
//! leaves the label in the pool; the next run finds the image under
//! `images/<split>` and moves the label after it. Pairs still wholly in the
//! pool are planned afresh.

mod report;

pub use report::OrganizeReport;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::error::ArenaLabelError;
use crate::files::{ensure_dir, file_stem, list_files_with_extensions, move_file, IMAGE_EXTENSIONS};
use crate::ir::io_label::{label_path_for, LABEL_EXTENSION};

pub const DEFAULT_VAL_RATIO: f64 = 0.2;
pub const DEFAULT_SEED: u64 = 42;

/// Split parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitOptions {
    /// Fraction of pairs routed to `val`, in `[0, 1]`.
    pub val_ratio: f64,
    /// Seed for the shuffle; equal seeds over equal stem sets give equal plans.
    pub seed: u64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            val_ratio: DEFAULT_VAL_RATIO,
            seed: DEFAULT_SEED,
        }
    }
}

pub fn validate_split_options(opts: &SplitOptions) -> Result<(), ArenaLabelError> {
    if !(0.0..=1.0).contains(&opts.val_ratio) {
        return Err(ArenaLabelError::InvalidSplitParams {
            message: format!("val_ratio must be in [0.0, 1.0], got {}", opts.val_ratio),
        });
    }
    Ok(())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Val,
}

impl Split {
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
        }
    }
}

/// Directory layout of a dataset root.
#[derive(Clone, Debug)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The flat, unsplit pool.
    pub fn pool_dir(&self) -> PathBuf {
        self.root.join("labels")
    }

    pub fn images_dir(&self, split: Split) -> PathBuf {
        self.root.join("images").join(split.dir_name())
    }

    pub fn labels_dir(&self, split: Split) -> PathBuf {
        self.root.join("labels").join(split.dir_name())
    }

    /// The split whose `images/` directory already holds an image for `stem`.
    pub fn placed_split(&self, stem: &str) -> Option<Split> {
        [Split::Train, Split::Val]
            .into_iter()
            .find(|split| find_image_for_stem(&self.images_dir(*split), stem).is_some())
    }

    /// Creates `images/{train,val}` and `labels/{train,val}`.
    pub fn ensure_split_dirs(&self) -> Result<(), ArenaLabelError> {
        for split in [Split::Train, Split::Val] {
            ensure_dir(&self.images_dir(split))?;
            ensure_dir(&self.labels_dir(split))?;
        }
        Ok(())
    }
}

/// An image and its label file, matched by stem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SamplePair {
    pub stem: String,
    pub image: PathBuf,
    pub label: PathBuf,
}

/// Result of scanning the pool.
#[derive(Clone, Debug, Default)]
pub struct PoolScan {
    /// Pairs sorted by stem.
    pub pairs: Vec<SamplePair>,
    /// Label stems with no matching image, sorted.
    pub orphans: Vec<String>,
}

/// Collects the `.txt` labels directly inside `pool_dir` and pairs each
/// with an image of the same stem, trying extensions in
/// [`IMAGE_EXTENSIONS`] order.
pub fn scan_pool(pool_dir: &Path) -> Result<PoolScan, ArenaLabelError> {
    let labels = list_files_with_extensions(pool_dir, &[LABEL_EXTENSION])?;
    let mut scan = PoolScan::default();

    for label in labels {
        let stem = file_stem(&label);
        match find_image_for_stem(pool_dir, &stem) {
            Some(image) => scan.pairs.push(SamplePair { stem, image, label }),
            None => scan.orphans.push(stem),
        }
    }

    scan.pairs.sort_by(|a, b| a.stem.cmp(&b.stem));
    scan.orphans.sort();
    Ok(scan)
}

fn find_image_for_stem(dir: &Path, stem: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{stem}.{ext}")))
        .find(|candidate| candidate.is_file())
}

/// `floor(total * val_ratio)`, capped at `total`.
pub fn val_count(total: usize, val_ratio: f64) -> usize {
    ((total as f64 * val_ratio).floor() as usize).min(total)
}

/// A stem → split assignment, kept in shuffled order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitPlan {
    assignments: Vec<(String, Split)>,
}

impl SplitPlan {
    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Split)> {
        self.assignments
            .iter()
            .map(|(stem, split)| (stem.as_str(), *split))
    }

    pub fn stems(&self, split: Split) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(move |(_, s)| *s == split)
            .map(|(stem, _)| stem)
    }

    pub fn count(&self, split: Split) -> usize {
        self.stems(split).count()
    }

    pub fn split_of(&self, stem: &str) -> Option<Split> {
        self.iter().find(|(s, _)| *s == stem).map(|(_, split)| split)
    }
}

/// Assigns every stem to exactly one split.
///
/// Stems are sorted and deduplicated before the seeded shuffle, so the
/// plan depends only on the stem set, the ratio and the seed. The first
/// [`val_count`] stems of the shuffled order go to `val`.
pub fn plan_split<S: AsRef<str>>(stems: &[S], opts: &SplitOptions) -> SplitPlan {
    let mut ordered: Vec<String> = stems.iter().map(|s| s.as_ref().to_string()).collect();
    ordered.sort();
    ordered.dedup();

    let mut rng = StdRng::seed_from_u64(opts.seed);
    ordered.shuffle(&mut rng);

    let n_val = val_count(ordered.len(), opts.val_ratio);
    let assignments = ordered
        .into_iter()
        .enumerate()
        .map(|(i, stem)| {
            let split = if i < n_val { Split::Val } else { Split::Train };
            (stem, split)
        })
        .collect();

    SplitPlan { assignments }
}

/// Outcome of [`apply_split`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyCounts {
    pub train: usize,
    pub val: usize,
    pub already_placed: usize,
}

/// Moves each planned pair into its split directories.
///
/// Files whose source is gone but whose destination exists are treated as
/// moved by an earlier, interrupted run. Pairs missing from the plan are
/// left alone. A failed move aborts the run.
pub fn apply_split(
    layout: &DatasetLayout,
    pairs: &[SamplePair],
    plan: &SplitPlan,
) -> Result<ApplyCounts, ArenaLabelError> {
    let by_stem: HashMap<&str, &SamplePair> =
        pairs.iter().map(|pair| (pair.stem.as_str(), pair)).collect();
    let mut counts = ApplyCounts::default();

    for (stem, split) in plan.iter() {
        let Some(pair) = by_stem.get(stem) else {
            continue;
        };

        let moved_image = place(&pair.image, &layout.images_dir(split))?;
        let moved_label = place(&pair.label, &layout.labels_dir(split))?;
        if !moved_image && !moved_label {
            counts.already_placed += 1;
        }

        match split {
            Split::Train => counts.train += 1,
            Split::Val => counts.val += 1,
        }
    }

    Ok(counts)
}

/// Moves `src` into `dest_dir`. Returns false if it was already there.
fn place(src: &Path, dest_dir: &Path) -> Result<bool, ArenaLabelError> {
    let Some(name) = src.file_name() else {
        return Err(ArenaLabelError::Move {
            from: src.to_path_buf(),
            to: dest_dir.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
        });
    };
    let dest = dest_dir.join(name);

    if !src.exists() && dest.is_file() {
        return Ok(false);
    }
    move_file(src, &dest)?;
    Ok(true)
}

/// Moves the pool label of every orphan whose image an earlier run already
/// placed under `images/<split>`. Such stems leave `scan.orphans`.
pub fn finish_stranded(
    layout: &DatasetLayout,
    scan: &mut PoolScan,
) -> Result<ApplyCounts, ArenaLabelError> {
    let pool_dir = layout.pool_dir();
    let mut counts = ApplyCounts::default();
    let mut orphans = Vec::with_capacity(scan.orphans.len());

    for stem in std::mem::take(&mut scan.orphans) {
        let Some(split) = layout.placed_split(&stem) else {
            orphans.push(stem);
            continue;
        };
        let label = label_path_for(&pool_dir, &stem);
        place(&label, &layout.labels_dir(split))?;
        info!(
            "Finished moving '{stem}' into {} from an earlier run",
            split.dir_name()
        );

        counts.already_placed += 1;
        match split {
            Split::Train => counts.train += 1,
            Split::Val => counts.val += 1,
        }
    }

    scan.orphans = orphans;
    Ok(counts)
}

/// Scans, plans and applies a split of `<root>/labels/`.
///
/// Fails before touching any file if the options are invalid, the pool is
/// missing, or a split directory cannot be created.
pub fn organize_dataset(root: &Path, opts: &SplitOptions) -> Result<OrganizeReport, ArenaLabelError> {
    validate_split_options(opts)?;

    let layout = DatasetLayout::new(root);
    let pool_dir = layout.pool_dir();
    if !pool_dir.is_dir() {
        return Err(ArenaLabelError::InputDirMissing { path: pool_dir });
    }
    layout.ensure_split_dirs()?;

    let mut scan = scan_pool(&pool_dir)?;
    let resumed = finish_stranded(&layout, &mut scan)?;
    for stem in &scan.orphans {
        warn!("No image found for '{stem}', leaving {stem}.{LABEL_EXTENSION} in place");
    }
    info!(
        "Found {} pair(s) and {} orphan label(s) in {}",
        scan.pairs.len(),
        scan.orphans.len(),
        pool_dir.display()
    );

    let stems: Vec<&str> = scan.pairs.iter().map(|pair| pair.stem.as_str()).collect();
    let plan = plan_split(&stems, opts);
    let counts = apply_split(&layout, &scan.pairs, &plan)?;

    Ok(OrganizeReport {
        seed: opts.seed,
        val_ratio: opts.val_ratio,
        train: counts.train + resumed.train,
        val: counts.val + resumed.val,
        already_placed: counts.already_placed + resumed.already_placed,
        orphans: scan.orphans,
    })
}
