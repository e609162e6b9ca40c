//! FFmpeg subprocess handling for audio conversion

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Audio bitrate of every converted file, in kbps
pub const AUDIO_BITRATE_KBPS: u32 = 192;

/// Cover art edge length; Walkman parsers reject anything larger
pub const COVER_SIZE: u32 = 500;

/// Walkman 3.0 only decodes 4:2:0 art
pub const COVER_PIXEL_FORMAT: &str = "yuv420p";

/// Something that turns one audio file into a Walkman-ready MP3
pub trait Transcoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// The external ffmpeg executable
#[derive(Debug, Clone)]
pub struct Encoder {
    program: PathBuf,
}

impl Encoder {
    /// `program` may be a bare name (looked up on `PATH`) or a full path
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Check that the encoder can be started at all
    ///
    /// Returns the first line of `ffmpeg -version`.
    pub fn verify(&self) -> Result<String> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::EncoderSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(Error::EncoderFailed {
                status: output.status,
                stderr: last_line(&output.stderr),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    }
}

impl Transcoder for Encoder {
    fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.program)
            .args(build_args(input, output))
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::EncoderSpawn {
                program: self.program.clone(),
                source: e,
            })?;

        if !result.status.success() {
            return Err(Error::EncoderFailed {
                status: result.status,
                stderr: last_line(&result.stderr),
            });
        }

        if !output.is_file() {
            return Err(Error::MissingOutput(output.to_path_buf()));
        }

        Ok(())
    }
}

/// Build the ffmpeg argument list for one file
///
/// -hide_banner -loglevel error : Only report errors
/// -nostdin -y                  : Never prompt, overwrite existing output
/// -map 0:a:0                   : First audio stream
/// -map 0:v:0?                  : Cover art, if the source has any
/// -map_metadata 0              : Copy all tags from the source
/// -c:a mp3 -b:a 192k           : MP3 audio at a fixed bitrate
/// -c:v mjpeg -vf scale -pix_fmt: Cover art as 500x500 4:2:0 JPEG
pub fn build_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostdin",
        "-y",
        "-i",
    ]
    .iter()
    .map(OsString::from)
    .collect();

    args.push(input.as_os_str().to_owned());

    let bitrate = format!("{}k", AUDIO_BITRATE_KBPS);
    let scale = format!("scale={}:{}", COVER_SIZE, COVER_SIZE);
    args.extend(
        [
            "-map",
            "0:a:0",
            "-map",
            "0:v:0?",
            "-map_metadata",
            "0",
            "-c:a",
            "mp3",
            "-b:a",
            bitrate.as_str(),
            "-c:v",
            "mjpeg",
            "-vf",
            scale.as_str(),
            "-pix_fmt",
            COVER_PIXEL_FORMAT,
        ]
        .iter()
        .map(OsString::from),
    );

    args.push(output.as_os_str().to_owned());
    args
}

fn last_line(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr)
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("Unknown error")
        .to_string()
}
