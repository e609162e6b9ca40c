//! Sequential conversion of a discovered file list
//!
//! Each file is planned, transcoded and tag-normalized before the next one
//! starts. A failed file is recorded and the batch moves on, unless
//! `fail_fast` is set.
//!
//! Outputs are claimed as files are planned: an output may not land on any
//! discovered input, and two inputs may not share one output.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::Serialize;

use super::state::BatchSettings;
use crate::audio::normalize_tags;
use crate::conversion::{resolve_path, OutputPlan, Transcoder};
use crate::error::{Error, Result};

/// A file that could not be converted
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: String,
}

/// Outcome of a whole run, also written as the JSON report
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub input_root: PathBuf,
    pub output_root: PathBuf,
    pub dry_run: bool,
    pub found: usize,
    pub converted: usize,
    /// Output already existed; only tags were normalized
    pub skipped: usize,
    /// Dry run only
    pub planned: usize,
    pub failures: Vec<FileFailure>,
    /// Set when `fail_fast` ended the batch before the last file
    pub stopped_early: bool,
}

impl BatchSummary {
    fn new(settings: &BatchSettings, found: usize) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            input_root: settings.input_root.clone(),
            output_root: settings.output_root.clone(),
            dry_run: settings.dry_run,
            found,
            converted: 0,
            skipped: 0,
            planned: 0,
            failures: Vec::new(),
            stopped_early: false,
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.stopped_early
    }

    /// Write the summary as pretty JSON
    pub fn write_report(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| Error::io(path, e))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FileOutcome {
    Converted,
    Skipped,
    /// Dry run; holds the output file that would be written
    Planned(PathBuf),
}

/// Output paths handed out so far in one run
struct OutputClaims {
    /// Every discovered input, resolved
    inputs: HashSet<PathBuf>,
    /// Resolved output -> input that claimed it first
    claimed: HashMap<PathBuf, PathBuf>,
}

impl OutputClaims {
    fn new(files: &[PathBuf]) -> Self {
        Self {
            inputs: files.iter().map(|f| resolve_path(f)).collect(),
            claimed: HashMap::new(),
        }
    }

    fn claim(&mut self, plan: &OutputPlan) -> Result<()> {
        let output = resolve_path(&plan.output_file);

        if plan.overwrites_input() || self.inputs.contains(&output) {
            return Err(Error::OutputCollision(plan.output_file.clone()));
        }
        if let Some(first) = self.claimed.get(&output) {
            return Err(Error::DuplicateOutput {
                output: plan.output_file.clone(),
                first: first.clone(),
            });
        }

        self.claimed.insert(output, plan.input.clone());
        Ok(())
    }
}

/// Convert `files` one after another
///
/// Returns `Error::Interrupted` as soon as `cancel` is raised; files already
/// written stay where they are.
pub fn run_batch<T: Transcoder + ?Sized>(
    files: &[PathBuf],
    settings: &BatchSettings,
    transcoder: &T,
    progress: &ProgressBar,
    cancel: &AtomicBool,
) -> Result<BatchSummary> {
    let mut summary = BatchSummary::new(settings, files.len());
    let mut claims = OutputClaims::new(files);

    for file in files {
        if cancel.load(Ordering::SeqCst) {
            return Err(Error::Interrupted);
        }

        if let Some(name) = file.file_name() {
            progress.set_message(name.to_string_lossy().into_owned());
        }

        match process_file(file, settings, &mut claims, transcoder, progress, cancel) {
            Ok(FileOutcome::Converted) => summary.converted += 1,
            Ok(FileOutcome::Skipped) => summary.skipped += 1,
            Ok(FileOutcome::Planned(output)) => {
                progress.suspend(|| {
                    log::info!("Would convert {} -> {}", file.display(), output.display())
                });
                summary.planned += 1;
            }
            Err(Error::Interrupted) => return Err(Error::Interrupted),
            Err(e) => {
                progress.suspend(|| log::warn!("Failed to convert {}: {}", file.display(), e));
                summary.failures.push(FileFailure {
                    input: file.clone(),
                    error: e.to_string(),
                });
                if settings.fail_fast {
                    summary.stopped_early = true;
                    break;
                }
            }
        }

        progress.inc(1);
    }

    summary.finished_at = Some(Utc::now());
    Ok(summary)
}

fn process_file<T: Transcoder + ?Sized>(
    file: &Path,
    settings: &BatchSettings,
    claims: &mut OutputClaims,
    transcoder: &T,
    progress: &ProgressBar,
    cancel: &AtomicBool,
) -> Result<FileOutcome> {
    let plan = OutputPlan::new(&settings.input_root, &settings.output_root, file)?;
    claims.claim(&plan)?;

    if settings.dry_run {
        return Ok(FileOutcome::Planned(plan.output_file));
    }

    plan.ensure_output_dir()?;

    let skip = settings.skip_existing && plan.output_file.is_file();
    if skip {
        progress.suspend(|| {
            log::debug!("Output exists, skipping transcode: {}", plan.output_file.display())
        });
    } else {
        progress.suspend(|| {
            log::debug!("Converting: {} -> {}", plan.input.display(), plan.output_file.display())
        });
        let transcoded = transcoder.transcode(&plan.input, &plan.output_file);
        // ffmpeg gets the same SIGINT and dies; report that as the interrupt
        if cancel.load(Ordering::SeqCst) {
            return Err(Error::Interrupted);
        }
        transcoded?;
    }

    let report = normalize_tags(&plan.output_file)?;
    progress.suspend(|| {
        log::debug!("Normalized tags of {}: {:?}", plan.output_file.display(), report)
    });

    Ok(if skip {
        FileOutcome::Skipped
    } else {
        FileOutcome::Converted
    })
}
