//! Audio/video muxing into an MP4 container

use crate::ffmpeg::{find_ffmpeg, AUDIO_ENCODER};
use crate::sequence::IntermediateSequence;
use crate::{Codec, Error, Result};
use mp4::{Mp4Reader, TrackType};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tempfile::{NamedTempFile, TempPath};
use tracing::{debug, info};

/// Bitrate of the re-encoded audio track
const AUDIO_BITRATE: &str = "192k";

/// Number of stderr lines kept in a mux error message
const STDERR_TAIL_LINES: usize = 8;

/// Muxer configuration
#[derive(Debug, Clone)]
pub struct MuxConfig {
    /// Output frame rate (fps)
    pub frame_rate: u32,
    /// Video codec
    pub codec: Codec,
    /// Quality (0-100)
    pub quality: u8,
    /// Path to ffmpeg executable
    pub ffmpeg_path: Option<String>,
}

/// Container and track facts read back from a finished MP4
#[derive(Debug, Clone, PartialEq)]
pub struct MuxedFile {
    /// Output file path
    pub path: PathBuf,
    /// Movie duration from the container header
    pub duration: Duration,
    /// Duration of the video track
    pub video_duration: Duration,
    /// Number of encoded video samples
    pub video_frames: u32,
    /// Duration of the audio track, if any
    pub audio_duration: Option<Duration>,
}

/// Re-encode `sequence` and `audio_path` into one MP4 at `output_path`
///
/// The output runs for one pass of the sequence; longer audio is cut off.
/// ffmpeg writes to a staging file beside `output_path`, which replaces
/// `output_path` only once the result reads back as a valid MP4. On any
/// error `output_path` is left as it was.
pub fn mux<P: AsRef<Path>, Q: AsRef<Path>>(
    sequence: &IntermediateSequence,
    audio_path: P,
    output_path: Q,
    config: &MuxConfig,
) -> Result<MuxedFile> {
    let audio_path = audio_path.as_ref();
    let output_path = output_path.as_ref();

    if !sequence.path.is_file() {
        return Err(Error::Mux(format!(
            "Sequence not readable: {}",
            sequence.path.display()
        )));
    }
    if !audio_path.is_file() {
        return Err(Error::Mux(format!(
            "Audio not readable: {}",
            audio_path.display()
        )));
    }

    let ffmpeg = find_ffmpeg(config.ffmpeg_path.as_deref())?;
    let staging = staging_path(output_path)?;
    let args = build_args(sequence, audio_path, &staging, config);
    debug!(ffmpeg = %ffmpeg, args = ?args, "running ffmpeg");

    let output = Command::new(&ffmpeg)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::Mux(format!("Failed to start ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::Mux(format!(
            "ffmpeg exited with {}: {}",
            output.status,
            stderr_tail(&stderr)
        )));
    }

    let mut muxed = inspect_output(&staging)?;
    staging.persist(output_path).map_err(|e| {
        Error::Mux(format!(
            "Failed to move output into place {}: {}",
            output_path.display(),
            e.error
        ))
    })?;
    muxed.path = output_path.to_path_buf();

    info!(
        path = %output_path.display(),
        duration_ms = muxed.duration.as_millis() as u64,
        video_frames = muxed.video_frames,
        "muxed output"
    );

    Ok(muxed)
}

/// Command line for one mux run
pub fn build_args(
    sequence: &IntermediateSequence,
    audio_path: &Path,
    output_path: &Path,
    config: &MuxConfig,
) -> Vec<String> {
    let visual_secs = sequence.total_duration().as_secs_f64();

    let mut args: Vec<String> = vec![
        "-y".into(),
        "-nostdin".into(),
        "-v".into(),
        "error".into(),
        // GIF delays are in centiseconds; below min_delay the demuxer uses 10cs
        "-min_delay".into(),
        "1".into(),
        // follow the GIF's infinite loop; -t below ends the output
        "-ignore_loop".into(),
        "0".into(),
        "-i".into(),
        sequence.path.to_string_lossy().into_owned(),
        "-i".into(),
        audio_path.to_string_lossy().into_owned(),
        "-map".into(),
        "0:v:0".into(),
        "-map".into(),
        "1:a:0".into(),
        "-t".into(),
        format!("{:.3}", visual_secs),
        "-r".into(),
        config.frame_rate.to_string(),
        "-c:v".into(),
        config.codec.ffmpeg_encoder().into(),
        "-crf".into(),
        config.codec.crf(config.quality).to_string(),
    ];

    match config.codec {
        Codec::H264 => args.extend(["-preset".into(), "medium".into()]),
        Codec::Av1 => args.extend([
            "-b:v".into(),
            "0".into(),
            "-cpu-used".into(),
            "6".into(),
        ]),
    }

    args.extend([
        "-pix_fmt".into(),
        "yuv420p".into(),
        "-c:a".into(),
        AUDIO_ENCODER.into(),
        "-b:a".into(),
        AUDIO_BITRATE.into(),
        "-map_metadata".into(),
        "-1".into(),
        "-fflags".into(),
        "+bitexact".into(),
        "-movflags".into(),
        "+faststart".into(),
        "-f".into(),
        "mp4".into(),
        output_path.to_string_lossy().into_owned(),
    ]);

    args
}

/// Read the header of a finished MP4
pub fn inspect_output<P: AsRef<Path>>(path: P) -> Result<MuxedFile> {
    let path = path.as_ref();

    let file = File::open(path)
        .map_err(|e| Error::Mux(format!("Output not readable {}: {}", path.display(), e)))?;
    let size = file.metadata()?.len();

    let reader = Mp4Reader::read_header(BufReader::new(file), size)
        .map_err(|e| Error::Mux(format!("Output is not a valid MP4: {}", e)))?;

    let mut video = None;
    let mut audio_duration = None;
    for track in reader.tracks().values() {
        match track.track_type() {
            Ok(TrackType::Video) => video = Some((track.duration(), track.sample_count())),
            Ok(TrackType::Audio) => audio_duration = Some(track.duration()),
            _ => {}
        }
    }

    let (video_duration, video_frames) =
        video.ok_or_else(|| Error::Mux("Output has no video track".to_string()))?;

    Ok(MuxedFile {
        path: path.to_path_buf(),
        duration: reader.duration(),
        video_duration,
        video_frames,
        audio_duration,
    })
}

/// Empty file in the output's directory for ffmpeg to overwrite
fn staging_path(output_path: &Path) -> Result<TempPath> {
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    builder.prefix(".slidemux-").suffix(".mp4");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o644));
    }

    builder
        .tempfile_in(dir)
        .map(NamedTempFile::into_temp_path)
        .map_err(|e| Error::Mux(format!("Output directory not writable {}: {}", dir.display(), e)))
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("; ")
}
