//! Reading and writing per-image YOLO label files.
//!
//! A label file lives at `<label_dir>/<image_stem>.txt` and holds one
//! [`NormalizedLabel`] per line. Writes go through a temporary file in the
//! destination directory and are renamed into place, so a label file is
//! either the previous version or the complete new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder;

use super::label::{parse_label_line, LabelRow, NormalizedLabel};
use crate::error::ArenaLabelError;

pub const LABEL_EXTENSION: &str = "txt";

/// Mode requested for new label files; the process umask still applies.
#[cfg(unix)]
const LABEL_FILE_MODE: u32 = 0o644;

/// Path of the label file for an image stem.
pub fn label_path_for(label_dir: &Path, stem: &str) -> PathBuf {
    label_dir.join(format!("{stem}.{LABEL_EXTENSION}"))
}

/// Atomically replaces `path` with one line per label.
///
/// An empty slice still creates (or truncates to) an empty file. On unix
/// the file is created readable by group and others, like a plain
/// `File::create` under the default umask.
pub fn write_label_file(path: &Path, labels: &[NormalizedLabel]) -> Result<(), ArenaLabelError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_err = |source| ArenaLabelError::LabelWrite {
        path: path.to_path_buf(),
        source,
    };

    let mut builder = Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(LABEL_FILE_MODE));
    }
    let mut tmp = builder.tempfile_in(dir).map_err(write_err)?;
    for label in labels {
        writeln!(tmp, "{label}").map_err(write_err)?;
    }
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}

/// Reads every non-blank row of a label file.
pub fn read_label_file(path: &Path) -> Result<Vec<LabelRow>, ArenaLabelError> {
    let content = fs::read_to_string(path)?;
    let mut rows = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        if let Some(row) = parse_label_line(line, path, line_idx + 1)? {
            rows.push(row);
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_path_uses_stem_and_txt() {
        let path = label_path_for(Path::new("data/labels"), "video 1_00012");
        assert_eq!(path, Path::new("data/labels/video 1_00012.txt"));
    }

    #[test]
    fn write_then_read_preserves_rows() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("frame.txt");
        let labels = vec![
            NormalizedLabel {
                class_id: 0,
                cx: 0.5,
                cy: 0.5,
                w: 0.25,
                h: 0.125,
            },
            NormalizedLabel {
                class_id: 0,
                cx: 0.1,
                cy: 0.2,
                w: 0.05,
                h: 0.05,
            },
        ];

        write_label_file(&path, &labels).expect("write labels");

        let content = fs::read_to_string(&path).expect("read back");
        assert_eq!(
            content,
            "0 0.500000 0.500000 0.250000 0.125000\n0 0.100000 0.200000 0.050000 0.050000\n"
        );

        let rows = read_label_file(&path).expect("parse back");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, labels[0]);
    }

    #[test]
    fn empty_write_creates_empty_file() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("empty.txt");

        write_label_file(&path, &[]).expect("write labels");

        assert!(path.is_file());
        assert!(fs::read_to_string(&path).expect("read").is_empty());
    }

    #[test]
    fn write_replaces_existing_file_and_leaves_no_temp_files() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("frame.txt");
        fs::write(&path, "stale contents\n").expect("seed file");

        write_label_file(&path, &[]).expect("write labels");

        assert!(fs::read_to_string(&path).expect("read").is_empty());
        let entries = fs::read_dir(temp.path()).expect("list").count();
        assert_eq!(entries, 1);
    }

    #[cfg(unix)]
    #[test]
    fn written_labels_are_readable_by_others() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("frame.txt");
        write_label_file(&path, &[]).expect("write labels");

        let mode = fs::metadata(&path).expect("metadata").permissions().mode() & 0o777;
        assert_eq!(mode & 0o644, 0o644, "label mode was {mode:o}");
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("missing/frame.txt");
        let err = write_label_file(&path, &[]).unwrap_err();
        assert!(matches!(err, ArenaLabelError::LabelWrite { .. }));
    }
}
