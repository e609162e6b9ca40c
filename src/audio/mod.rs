// Audio module - contains input format detection and tag normalization

pub mod detection;
pub mod metadata_writer;

pub use detection::is_audio_file;
pub use metadata_writer::normalize_tags;
