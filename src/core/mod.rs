//! Core pipeline logic
//!
//! This module contains:
//! - Audio file discovery
//! - The sequential batch driver
//! - User settings and per-run batch settings
//! - Interrupt handling

mod batch;
pub mod interrupt;
mod scanning;
mod state;

pub use batch::{run_batch, BatchSummary};
pub use scanning::find_audio_files;
pub use state::{BatchSettings, Settings};
