use std::path::PathBuf;
use thiserror::Error;

/// The main error type for arenalabel operations.
#[derive(Debug, Error)]
pub enum ArenaLabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Input directory does not exist: {path}")]
    InputDirMissing { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed while listing {path}: {source}")]
    DirWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Cannot read image {path}: {message}")]
    ImageUnreadable { path: PathBuf, message: String },

    #[error("Failed to write label file {path}: {source}")]
    LabelWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse label file {path} at line {line}: {message}")]
    LabelParse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Invalid annotation script at line {line}: {message}")]
    ScriptParse { line: usize, message: String },

    #[error("Invalid split parameters: {message}")]
    InvalidSplitParams { message: String },

    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse dataset descriptor {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid dataset descriptor {path}: {message}")]
    DescriptorInvalid { path: PathBuf, message: String },

    #[error("Detector failed: {message}")]
    Detector { message: String },

    #[error("Display error: {message}")]
    Display { message: String },
}

#[cfg(feature = "gui")]
impl From<opencv::Error> for ArenaLabelError {
    fn from(err: opencv::Error) -> Self {
        ArenaLabelError::Display {
            message: err.to_string(),
        }
    }
}
