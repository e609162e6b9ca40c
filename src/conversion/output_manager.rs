//! Output path planning
//!
//! Every converted file lands in the output folder at the same relative
//! location it had under the input folder, renamed to `.mp3`:
//! `<input>/Artist/Album/01.flac` -> `<output>/Artist/Album/01.mp3`

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Where a single input file gets written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPlan {
    /// Source audio file
    pub input: PathBuf,
    /// Mirrored directory under the output root
    pub output_dir: PathBuf,
    /// Final `.mp3` path
    pub output_file: PathBuf,
}

impl OutputPlan {
    /// Plan the output location of `matched_file`
    ///
    /// `matched_file` must live under `input_root`.
    pub fn new(input_root: &Path, output_root: &Path, matched_file: &Path) -> Result<Self> {
        let relative = matched_file
            .strip_prefix(input_root)
            .map_err(|_| Error::OutsideInputRoot {
                file: matched_file.to_path_buf(),
                root: input_root.to_path_buf(),
            })?;

        let output_dir = match relative.parent() {
            Some(parent) => output_root.join(parent),
            None => output_root.to_path_buf(),
        };

        let output_file = output_dir.join(output_file_name(matched_file));

        Ok(Self {
            input: matched_file.to_path_buf(),
            output_dir,
            output_file,
        })
    }

    /// Create the mirrored directory; no error if it already exists
    pub fn ensure_output_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir).map_err(|e| Error::io(&self.output_dir, e))
    }

    /// Whether writing the output would clobber the source file
    pub fn overwrites_input(&self) -> bool {
        self.output_file == self.input || resolve_path(&self.input) == resolve_path(&self.output_file)
    }
}

/// `path` with its nearest existing ancestor canonicalized
///
/// Paths that do not exist yet resolve the same way before and after their
/// directories are created, so they can be compared across a whole run.
pub fn resolve_path(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut missing: Vec<&OsStr> = Vec::new();

    loop {
        let candidate = if existing.as_os_str().is_empty() {
            Path::new(".")
        } else {
            existing
        };
        if let Ok(resolved) = fs::canonicalize(candidate) {
            return missing.iter().rev().fold(resolved, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}

/// Input base name with its extension replaced by `.mp3`
pub fn output_file_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    format!("{}.mp3", stem)
}
