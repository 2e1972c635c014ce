//! Summary of a dataset reorganization.

use serde::Serialize;
use std::fmt;

/// Counts of pairs routed into each split, plus what was left behind.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct OrganizeReport {
    pub seed: u64,
    pub val_ratio: f64,
    /// Pairs now under `images/train` + `labels/train`.
    pub train: usize,
    /// Pairs now under `images/val` + `labels/val`.
    pub val: usize,
    /// Pairs found already at their destination (resumed run).
    pub already_placed: usize,
    /// Label stems with no matching image; their label files were not moved.
    pub orphans: Vec<String>,
}

impl OrganizeReport {
    pub fn total(&self) -> usize {
        self.train + self.val
    }
}

impl fmt::Display for OrganizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset reorganized:")?;
        writeln!(f, "  train -> {} pairs", self.train)?;
        writeln!(f, "  val   -> {} pairs", self.val)?;

        if self.already_placed > 0 {
            writeln!(
                f,
                "  ({} pair(s) were already in place from an earlier run)",
                self.already_placed
            )?;
        }

        if !self.orphans.is_empty() {
            writeln!(f)?;
            writeln!(f, "Labels without an image ({}):", self.orphans.len())?;
            for stem in &self.orphans {
                writeln!(f, "  - {stem}.txt")?;
            }
        }

        Ok(())
    }
}
