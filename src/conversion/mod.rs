//! Audio conversion module
//!
//! Handles output path planning and transcoding audio files to MP3 using ffmpeg.

mod ffmpeg;
mod output_manager;

pub use ffmpeg::{Encoder, Transcoder};
pub use output_manager::{resolve_path, OutputPlan};

use std::path::PathBuf;

/// Encoder used when nothing else is configured; resolved through PATH
pub const DEFAULT_FFMPEG: &str = "ffmpeg";

/// Pick the encoder executable
///
/// The command line (which also covers the environment variable) wins over
/// the settings file, which wins over plain `ffmpeg`.
pub fn resolve_ffmpeg_path(from_cli: Option<PathBuf>, from_settings: Option<PathBuf>) -> PathBuf {
    from_cli
        .or(from_settings)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FFMPEG))
}
