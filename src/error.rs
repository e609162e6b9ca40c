//! Error types shared by the conversion pipeline

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid input folder: {0}")]
    InvalidInputDir(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to scan input folder: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{file} is not inside input folder {root}")]
    OutsideInputRoot { file: PathBuf, root: PathBuf },

    #[error("refusing to overwrite source file {0}")]
    OutputCollision(PathBuf),

    #[error("{output} is already written from {first}")]
    DuplicateOutput { output: PathBuf, first: PathBuf },

    #[error("failed to run encoder {program}: {source}")]
    EncoderSpawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("encoder exited with {status}: {stderr}")]
    EncoderFailed { status: ExitStatus, stderr: String },

    #[error("encoder reported success but {0} was not written")]
    MissingOutput(PathBuf),

    #[error("failed to update tags of {path}: {source}")]
    Tag {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },

    #[error("failed to write report: {0}")]
    Report(#[from] serde_json::Error),

    #[error("conversion interrupted")]
    Interrupted,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
