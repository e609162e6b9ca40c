//! Logging configuration for semp3fix
//!
//! Logs go to the terminal and, unless disabled, to a file at:
//! - macOS: `~/Library/Logs/semp3fix/semp3fix.log`
//! - elsewhere: `<local data dir>/semp3fix/logs/semp3fix.log`

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "semp3fix.log";

/// Rotate the log file once it grows past this size
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Get the log directory path
pub fn get_log_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Logs").join("semp3fix"))
    } else {
        dirs::data_local_dir().map(|d| d.join("semp3fix").join("logs"))
    }
}

/// Terminal level for the `-v`/`-q` flags
pub fn terminal_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Warn;
    }
    match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}

/// Initialize the logging system
///
/// Terminal output at `level`; when `to_file` is set, debug and above also go
/// to the log file. Returns the log file path when file logging is active.
pub fn init_logging(level: LevelFilter, to_file: bool) -> Option<PathBuf> {
    if !to_file {
        init_terminal_only(level);
        return None;
    }

    let log_dir = match get_log_directory() {
        Some(d) => d,
        None => {
            eprintln!("Warning: Could not determine log directory");
            init_terminal_only(level);
            return None;
        }
    };

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        init_terminal_only(level);
        return None;
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    if let Ok(metadata) = fs::metadata(&log_path) {
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = log_dir.join(format!("{}.old", LOG_FILE_NAME));
            let _ = fs::rename(&log_path, &backup_path);
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            init_terminal_only(level);
            return None;
        }
    };

    let file_level = level.max(LevelFilter::Debug);
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(level, log_config(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(file_level, log_config(), log_file),
    ];

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: Logger already initialized");
    }

    log::debug!("=== semp3fix session started ===");
    log::debug!("Log file: {}", log_path.display());

    Some(log_path)
}

/// Terminal-only logging (no file, or file logging failed)
fn init_terminal_only(level: LevelFilter) {
    let term_logger = TermLogger::new(level, log_config(), TerminalMode::Mixed, ColorChoice::Auto);
    let _ = CombinedLogger::init(vec![term_logger]);
}
