//! Summary of an annotation run.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Clone, Debug, Default, Serialize)]
pub struct AnnotationReport {
    /// Images found in the input directory.
    pub images_found: usize,
    /// Label files written.
    pub saved: usize,
    /// Images advanced past without writing.
    pub skipped: usize,
    /// Boxes written across all saved label files.
    pub boxes_written: usize,
    /// Images that could not be read or decoded.
    pub unreadable: Vec<PathBuf>,
    /// True when the run ended on an explicit quit.
    pub quit_early: bool,
}

impl AnnotationReport {
    pub fn new(images_found: usize) -> Self {
        Self {
            images_found,
            ..Default::default()
        }
    }

    /// Images that were neither saved, skipped, nor unreadable.
    pub fn remaining(&self) -> usize {
        self.images_found
            .saturating_sub(self.saved + self.skipped + self.unreadable.len())
    }
}

impl fmt::Display for AnnotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Annotated {} of {} image(s): {} saved ({} box(es)), {} skipped",
            self.saved + self.skipped,
            self.images_found,
            self.saved,
            self.boxes_written,
            self.skipped
        )?;

        if !self.unreadable.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unreadable ({}):", self.unreadable.len())?;
            for path in &self.unreadable {
                writeln!(f, "  - {}", path.display())?;
            }
        }

        if self.quit_early {
            writeln!(f)?;
            writeln!(f, "Stopped early; {} image(s) not visited.", self.remaining())?;
        }

        Ok(())
    }
}
