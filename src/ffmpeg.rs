//! ffmpeg executable discovery and capability checks

use crate::{Codec, Error, Result};
use std::process::{Command, Stdio};
use tracing::debug;

/// Locations probed when no custom ffmpeg path is given
const SEARCH_PATHS: &[&str] = &["ffmpeg", "/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg"];

/// Audio encoder used for the output track
pub const AUDIO_ENCODER: &str = "aac";

impl Codec {
    /// Name of the ffmpeg video encoder for this codec
    pub fn ffmpeg_encoder(&self) -> &'static str {
        match self {
            Codec::H264 => "libx264",
            Codec::Av1 => "libaom-av1",
        }
    }

    /// Map quality (0-100) to the encoder's CRF scale
    pub fn crf(&self, quality: u8) -> u32 {
        let max_crf = match self {
            Codec::H264 => 51,
            Codec::Av1 => 63,
        };
        ((100 - quality.min(100)) as u32 * max_crf) / 100
    }
}

/// Find ffmpeg executable
pub fn find_ffmpeg(custom_path: Option<&str>) -> Result<String> {
    if let Some(path) = custom_path {
        if std::path::Path::new(path).exists() {
            return Ok(path.to_string());
        }
        return Err(Error::CodecUnavailable(format!(
            "FFmpeg not found at: {}",
            path
        )));
    }

    for path in SEARCH_PATHS {
        if Command::new(path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
        {
            debug!(ffmpeg = path, "found ffmpeg");
            return Ok(path.to_string());
        }
    }

    Err(Error::CodecUnavailable(
        "FFmpeg not found in PATH".to_string(),
    ))
}

/// Check that ffmpeg has the encoders needed for `codec`
pub fn check_available(codec: Codec, ffmpeg_path: Option<&str>) -> Result<()> {
    let ffmpeg = find_ffmpeg(ffmpeg_path)?;

    let output = Command::new(&ffmpeg)
        .args(["-hide_banner", "-encoders"])
        .stdin(Stdio::null())
        .output()
        .map_err(|e| Error::CodecUnavailable(format!("Failed to run ffmpeg: {}", e)))?;

    let encoders = String::from_utf8_lossy(&output.stdout);
    for required in [codec.ffmpeg_encoder(), AUDIO_ENCODER] {
        if !has_encoder(&encoders, required) {
            return Err(Error::CodecUnavailable(format!(
                "FFmpeg does not have {} support",
                required
            )));
        }
    }

    Ok(())
}

/// Look for an encoder name in the `ffmpeg -encoders` listing
fn has_encoder(listing: &str, name: &str) -> bool {
    // lines look like " V....D libx264    libx264 H.264 ..."
    listing
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(name))
}
