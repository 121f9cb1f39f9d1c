//! Per-frame display duration derived from audio length

use crate::{Error, Result};

/// Shortest frame delay ever produced, in milliseconds
pub const MIN_FRAME_DURATION_MS: u32 = 1;

/// Longest frame delay, in milliseconds
///
/// Animated-image containers store the inter-frame delay in a 16-bit field.
pub const MAX_FRAME_DURATION_MS: u32 = u16::MAX as u32;

/// Frame duration together with whether the ceiling was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Display time of every frame in milliseconds
    pub frame_duration_ms: u32,
    /// True when the unclamped value exceeded [`MAX_FRAME_DURATION_MS`]
    pub capped: bool,
}

impl FrameTiming {
    /// Compute the timing for `image_count` images spread over `seconds` of audio
    pub fn compute(seconds: u64, image_count: usize) -> Result<Self> {
        if image_count == 0 {
            return Err(Error::InvalidInput("No images provided".to_string()));
        }

        let raw = seconds.saturating_mul(1000) / image_count as u64;
        let frame_duration_ms = raw.clamp(
            MIN_FRAME_DURATION_MS as u64,
            MAX_FRAME_DURATION_MS as u64,
        ) as u32;

        Ok(Self {
            frame_duration_ms,
            capped: raw > MAX_FRAME_DURATION_MS as u64,
        })
    }
}

/// Milliseconds each image is shown, clamped to `[1, 65535]`
///
/// Over-long durations are capped silently; the slideshow then ends before the
/// audio does. Use [`FrameTiming::compute`] to learn whether that happened.
pub fn compute_frame_duration(seconds: u64, image_count: usize) -> Result<u32> {
    FrameTiming::compute(seconds, image_count).map(|t| t.frame_duration_ms)
}
