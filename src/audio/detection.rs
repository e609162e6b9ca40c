use std::path::Path;

/// Input formats the converter picks up
///
/// Matching is case-sensitive: `Song.FLAC` is not an audio file here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioExtension {
    Mp3,
    Flac,
    Ogg,
    Wav,
    M4a,
    Wma,
    Aac,
    Opus,
}

impl AudioExtension {
    pub const ALL: [AudioExtension; 8] = [
        AudioExtension::Mp3,
        AudioExtension::Flac,
        AudioExtension::Ogg,
        AudioExtension::Wav,
        AudioExtension::M4a,
        AudioExtension::Wma,
        AudioExtension::Aac,
        AudioExtension::Opus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AudioExtension::Mp3 => "mp3",
            AudioExtension::Flac => "flac",
            AudioExtension::Ogg => "ogg",
            AudioExtension::Wav => "wav",
            AudioExtension::M4a => "m4a",
            AudioExtension::Wma => "wma",
            AudioExtension::Aac => "aac",
            AudioExtension::Opus => "opus",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::ALL.into_iter().find(|e| e.as_str() == ext)
    }
}

/// Check if a file is an audio file based on its extension
pub fn is_audio_file(path: &Path) -> bool {
    AudioExtension::from_path(path).is_some()
}
