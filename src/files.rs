//! Small filesystem helpers shared by the annotator and the organizer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::ArenaLabelError;

/// Image extensions, in the order they are tried when pairing a label with
/// its image.
pub const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "bmp"];

/// Lists regular files directly inside `dir` whose extension is one of
/// `extensions` (case-insensitive), sorted by file name.
pub fn list_files_with_extensions(
    dir: &Path,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, ArenaLabelError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| ArenaLabelError::DirWalk {
            path: dir.to_path_buf(),
            source,
        })?;

        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

pub fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext))
}

/// The file name without its extension, lossily decoded.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Creates `path` and its parents, mapping failure to a setup error.
pub fn ensure_dir(path: &Path) -> Result<(), ArenaLabelError> {
    fs::create_dir_all(path).map_err(|source| ArenaLabelError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Moves a file, falling back to copy + remove when a rename is refused
/// (for example across filesystems).
pub fn move_file(from: &Path, to: &Path) -> Result<(), ArenaLabelError> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) if from.is_file() => copy_then_remove(from, to, |src| fs::remove_file(src)),
        Err(source) => Err(move_error(from, to, source)),
    }
}

/// Copies `from` to `to`, then removes `from` with `remove`. If the removal
/// fails the copy is deleted again, so a failed move leaves only the source.
fn copy_then_remove<R>(from: &Path, to: &Path, remove: R) -> Result<(), ArenaLabelError>
where
    R: FnOnce(&Path) -> io::Result<()>,
{
    fs::copy(from, to).map_err(|source| move_error(from, to, source))?;
    if let Err(source) = remove(from) {
        let _ = fs::remove_file(to);
        return Err(move_error(from, to, source));
    }
    Ok(())
}

fn move_error(from: &Path, to: &Path, source: io::Error) -> ArenaLabelError {
    ArenaLabelError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    }
}
