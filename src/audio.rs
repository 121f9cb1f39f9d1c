//! Audio track probing

use crate::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::debug;

/// File extensions accepted as audio input
pub const SUPPORTED_AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a"];

/// Audio file with its probed duration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioTrack {
    /// Path to the audio file
    pub path: PathBuf,
    /// Playable length in whole seconds (truncated)
    pub duration_secs: u64,
}

impl AudioTrack {
    /// Validate the extension and probe the duration of an audio file
    pub fn probe<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        validate_extension(path)?;
        let duration_secs = resolve_duration(path)?;

        Ok(Self {
            path: path.to_path_buf(),
            duration_secs,
        })
    }
}

/// Reject paths whose extension is not a supported audio container
pub fn validate_extension<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) if SUPPORTED_AUDIO_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(Error::InvalidInput(format!(
            "{} is not an audio file (expected one of: {})",
            path.display(),
            SUPPORTED_AUDIO_EXTENSIONS.join(", ")
        ))),
    }
}

/// Whole seconds of audio, read from the container metadata
///
/// The stream is probed, not decoded. A file that exists but has no parsable
/// header, no audio track, or no duration information is [`Error::CorruptAudio`].
pub fn resolve_duration<P: AsRef<Path>>(path: P) -> Result<u64> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(Error::InvalidInput(format!(
            "Audio file not found: {}",
            path.display()
        )));
    }

    let file = File::open(path)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| Error::CorruptAudio(format!("{}: {}", path.display(), e)))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::CorruptAudio(format!("{}: no audio track", path.display())))?;

    let params = &track.codec_params;
    let n_frames = params.n_frames.ok_or_else(|| {
        Error::CorruptAudio(format!("{}: no duration metadata", path.display()))
    })?;

    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or_else(|| Error::CorruptAudio(format!("{}: no time base", path.display())))?;

    let time = time_base.calc_time(n_frames);
    debug!(
        path = %path.display(),
        n_frames,
        seconds = time.seconds,
        frac = time.frac,
        "probed audio duration"
    );

    Ok(time.seconds)
}
