//! semp3fix - Walkman MP3 converter
//!
//! Converts a folder tree of audio files to MP3 and rewrites their tags so
//! Sony Ericsson Walkman phones show titles and cover art.

mod audio;
mod conversion;
mod core;
mod error;
mod logging;
#[cfg(test)]
mod test_fixtures;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};

use crate::conversion::{resolve_ffmpeg_path, Encoder};
use crate::core::{find_audio_files, interrupt, run_batch, BatchSettings, BatchSummary, Settings};
use crate::error::{Error, Result};

/// Batch finished but some files failed
const EXIT_FILES_FAILED: u8 = 2;

/// 128 + SIGINT, as a shell would report it
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser, Debug)]
#[command(name = "semp3fix", version)]
#[command(about = "Converts audio files to MP3 and fixes metadata for Sony Ericsson Walkman phones")]
struct Cli {
    /// Folder containing the audio files
    #[arg(short = 'i', long = "input-folder", alias = "input_folder")]
    input_folder: PathBuf,

    /// Folder where the converted files will be saved
    #[arg(short = 'o', long = "output-folder", alias = "output_folder")]
    output_folder: PathBuf,

    /// Path to the ffmpeg executable (default: ffmpeg from PATH)
    #[arg(long = "ffmpeg-path", env = "SEMP3FIX_FFMPEG")]
    ffmpeg_path: Option<PathBuf>,

    /// Keep existing output files and only fix their tags
    #[arg(long)]
    skip_existing: bool,

    /// Stop at the first file that fails
    #[arg(long)]
    fail_fast: bool,

    /// List what would be converted without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Write a JSON summary of the run to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// More terminal output (-vv for trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only warnings and errors, no progress bar
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Do not write a log file
    #[arg(long)]
    no_log_file: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    logging::init_logging(logging::terminal_level(cli.verbose, cli.quiet), !cli.no_log_file);

    match run(cli) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(EXIT_FILES_FAILED),
        Err(Error::Interrupted) => {
            log::error!("[!] Conversion interrupted");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            log::error!("[!] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<BatchSummary> {
    if !cli.input_folder.is_dir() {
        return Err(Error::InvalidInputDir(cli.input_folder));
    }

    let settings = Settings::load();
    let encoder = Encoder::new(resolve_ffmpeg_path(cli.ffmpeg_path, settings.ffmpeg_path));
    let batch = BatchSettings {
        input_root: cli.input_folder,
        output_root: cli.output_folder,
        skip_existing: cli.skip_existing || settings.skip_existing,
        fail_fast: cli.fail_fast || settings.fail_fast,
        dry_run: cli.dry_run,
    };

    interrupt::install_handler();

    let files = find_audio_files(&batch.input_root)?;
    log::info!("[✓] Found {} audio files to convert", files.len());
    log::info!("[i] Output folder: {}", batch.output_root.display());

    if !files.is_empty() && !batch.dry_run {
        let version = encoder.verify()?;
        log::debug!("Using {}: {}", encoder.program().display(), version);
    }

    log::info!("[i] Starting conversion");
    let progress = progress_bar(files.len() as u64, cli.quiet);
    let result = run_batch(&files, &batch, &encoder, &progress, interrupt::flag());
    progress.finish_and_clear();
    let summary = result?;

    if summary.dry_run {
        log::info!("[i] Dry run: {} files would be converted", summary.planned);
    } else {
        log::info!(
            "[i] Converted {}, kept {} existing, {} failed",
            summary.converted,
            summary.skipped,
            summary.failed()
        );
    }
    for failure in &summary.failures {
        log::error!("[!] {}: {}", failure.input.display(), failure.error);
    }
    if summary.stopped_early {
        log::warn!("[!] Stopped at the first failure; remaining files were not converted");
    }

    if let Some(report) = &cli.report {
        summary.write_report(report)?;
        log::info!("[i] Report written to {}", report.display());
    }

    Ok(summary)
}

fn progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("Converting files [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
