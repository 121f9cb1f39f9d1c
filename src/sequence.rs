//! Intermediate animated GIF sequence

use crate::image_loader::LoadedImage;
use crate::{Error, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// File name of the intermediate sequence inside a working directory
pub const SEQUENCE_FILE_NAME: &str = "temp.gif";

/// GIF delays are stored in units of 10ms
const GIF_DELAY_UNIT_MS: u32 = 10;

/// NeuQuant sampling factor (1 = best quality, 30 = fastest)
const QUANTIZER_SPEED: i32 = 10;

/// Animated sequence written to disk by [`build_sequence`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntermediateSequence {
    /// Location of the GIF file
    pub path: PathBuf,
    /// Number of frames
    pub frame_count: usize,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Delay actually stored for each frame, in milliseconds
    pub frame_duration_ms: u32,
}

impl IntermediateSequence {
    /// Total display time of one pass through the sequence
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.frame_duration_ms as u64 * self.frame_count as u64)
    }

    /// Read back the timing metadata of a GIF on disk
    pub fn inspect<P: AsRef<Path>>(path: P) -> Result<SequenceInfo> {
        let path = path.as_ref();
        let decode_error = |message: String| Error::ImageDecode {
            path: path.to_path_buf(),
            message,
        };

        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = options
            .read_info(BufReader::new(File::open(path)?))
            .map_err(|e| decode_error(e.to_string()))?;

        let mut frame_delays = Vec::new();
        while let Some(frame) = decoder
            .read_next_frame()
            .map_err(|e| decode_error(e.to_string()))?
        {
            frame_delays.push(Duration::from_millis(
                frame.delay as u64 * GIF_DELAY_UNIT_MS as u64,
            ));
        }

        Ok(SequenceInfo {
            frame_count: frame_delays.len(),
            width: decoder.width() as u32,
            height: decoder.height() as u32,
            frame_delays,
            // the loop extension may follow the first frame
            infinite_loop: decoder.repeat() == gif::Repeat::Infinite,
        })
    }

    /// Delete the sequence file
    pub fn remove(&self) -> Result<()> {
        std::fs::remove_file(&self.path)?;
        Ok(())
    }
}

/// Timing metadata decoded from a GIF file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceInfo {
    pub frame_count: usize,
    pub width: u32,
    pub height: u32,
    pub frame_delays: Vec<Duration>,
    /// Loop count in the NETSCAPE2.0 extension is zero
    pub infinite_loop: bool,
}

/// Round a delay down to what a GIF can store, never below one unit
pub fn effective_delay_ms(frame_duration_ms: u32) -> u32 {
    (frame_duration_ms / GIF_DELAY_UNIT_MS).max(1) * GIF_DELAY_UNIT_MS
}

/// Write `images` as an infinitely looping GIF at `output_path`
///
/// Frames keep their input order and all share the same delay. An existing
/// file at `output_path` is replaced.
pub fn build_sequence<P: AsRef<Path>>(
    images: &[LoadedImage],
    frame_duration_ms: u32,
    output_path: P,
) -> Result<IntermediateSequence> {
    let output_path = output_path.as_ref();

    let first = images
        .first()
        .ok_or_else(|| Error::InvalidInput("No frames to write".to_string()))?;
    let (width, height) = (first.width, first.height);

    if let Some(odd) = images
        .iter()
        .find(|img| img.width != width || img.height != height)
    {
        return Err(Error::InvalidInput(format!(
            "Frame size {}x{} differs from first frame {}x{}",
            odd.width, odd.height, width, height
        )));
    }

    let delay_ms = effective_delay_ms(frame_duration_ms);
    debug!(
        path = %output_path.display(),
        frames = images.len(),
        requested_ms = frame_duration_ms,
        delay_ms,
        "writing sequence"
    );

    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);

    {
        let mut encoder = GifEncoder::new_with_speed(&mut writer, QUANTIZER_SPEED);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| Error::Encode(format!("Failed to set loop count: {}", e)))?;

        for img in images {
            let frame = Frame::from_parts(
                img.to_rgba_image()?,
                0,
                0,
                Delay::from_numer_denom_ms(delay_ms, 1),
            );
            encoder
                .encode_frame(frame)
                .map_err(|e| Error::Encode(format!("Failed to write frame: {}", e)))?;
        }
        // Dropping the encoder writes the GIF trailer
    }

    writer
        .flush()
        .map_err(|e| Error::Encode(format!("Failed to flush sequence: {}", e)))?;

    Ok(IntermediateSequence {
        path: output_path.to_path_buf(),
        frame_count: images.len(),
        width,
        height,
        frame_duration_ms: delay_ms,
    })
}
