//! Audio file discovery
//!
//! Walks the input folder and collects every file with a recognized audio
//! extension. Hidden files and folders are skipped, like a shell glob would.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::audio::is_audio_file;
use crate::error::Result;

/// Find all audio files below `input_root`, sorted by path
///
/// An unreadable root is an error; unreadable entries further down are
/// logged and skipped.
pub fn find_audio_files(input_root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(input_root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        if is_regular_file(&entry) && is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();
    log::debug!("Found {} audio files under {}", files.len(), input_root.display());
    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Regular files, plus symlinks that point at one
fn is_regular_file(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}
