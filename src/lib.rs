//! slidemux - Audio + still images to MP4 slideshow library
//!
//! The single pipeline operation is [`assemble`]: the audio duration is
//! spread evenly over the images, the images become a looping GIF, and the
//! GIF is muxed with the audio into an MP4. Each stage is also exposed on
//! its own through the modules below.

pub mod assembler;
pub mod audio;
pub mod error;
pub mod ffi;
pub mod ffmpeg;
pub mod image_loader;
pub mod muxer;
pub mod sequence;
pub mod timing;

pub use assembler::{assemble, Assembler, OutputVideo, Stage};
pub use error::{AssemblyError, Error, Result};
pub use timing::{compute_frame_duration, FrameTiming};

use std::path::PathBuf;

/// Video codec types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum Codec {
    /// H.264 codec (libx264)
    H264 = 0,
    /// AV1 codec (libaom)
    Av1 = 1,
}

/// Default output frame rate
pub const DEFAULT_FRAME_RATE: u32 = 30;

/// Default side length of the canonical image box
pub const DEFAULT_CANONICAL_SIZE: u32 = 800;

/// Default encoding quality
pub const DEFAULT_QUALITY: u8 = 75;

/// Highest frame rate accepted by [`AssemblerConfig::validate`]
const MAX_FRAME_RATE: u32 = 240;

/// Options for slideshow assembly
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Output frame rate (fps)
    pub frame_rate: u32,
    /// Width every image is resized to
    pub width: u32,
    /// Height every image is resized to
    pub height: u32,
    /// Video codec
    pub codec: Codec,
    /// Quality (0-100, where 100 is highest quality)
    pub quality: u8,
    /// Path to ffmpeg executable
    pub ffmpeg_path: Option<String>,
    /// Directory for the intermediate sequence
    ///
    /// `None` creates a fresh temporary directory per call. A fixed directory
    /// always uses the same file name, so calls sharing it must not overlap.
    pub work_dir: Option<PathBuf>,
    /// Leave the intermediate sequence on disk after muxing
    pub keep_intermediate: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            frame_rate: DEFAULT_FRAME_RATE,
            width: DEFAULT_CANONICAL_SIZE,
            height: DEFAULT_CANONICAL_SIZE,
            codec: Codec::H264,
            quality: DEFAULT_QUALITY,
            ffmpeg_path: None,
            work_dir: None,
            keep_intermediate: false,
        }
    }
}

impl AssemblerConfig {
    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.frame_rate == 0 || self.frame_rate > MAX_FRAME_RATE {
            return Err(Error::InvalidInput(format!(
                "Frame rate must be between 1 and {}, got {}",
                MAX_FRAME_RATE, self.frame_rate
            )));
        }

        // yuv420p needs even dimensions
        if self.width == 0 || self.height == 0 || self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::InvalidInput(format!(
                "Canonical size must be non-zero and even, got {}x{}",
                self.width, self.height
            )));
        }

        if self.quality > 100 {
            return Err(Error::InvalidInput(format!(
                "Quality must be 0-100, got {}",
                self.quality
            )));
        }

        Ok(())
    }
}

/// Check if a codec is available on the current system
pub fn available(codec: Codec, ffmpeg_path: Option<&str>) -> Result<()> {
    ffmpeg::check_available(codec, ffmpeg_path)
}

/// Install a `tracing` subscriber that writes to stderr
///
/// The filter is read from `SLIDEMUX_LOG` (EnvFilter syntax) and defaults to
/// `slidemux=info`. Returns false if a global subscriber was already set.
pub fn init_logging() -> bool {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("SLIDEMUX_LOG").unwrap_or_else(|_| "slidemux=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
