//! Slideshow assembly pipeline

use crate::audio;
use crate::image_loader;
use crate::muxer::{self, MuxConfig, MuxedFile};
use crate::sequence::{self, SEQUENCE_FILE_NAME};
use crate::timing::FrameTiming;
use crate::{AssemblerConfig, AssemblyError, Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, info_span, warn};

/// Pipeline stages, in the order they complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Start,
    DurationResolved,
    TimingComputed,
    ImagesNormalized,
    SequenceBuilt,
    Muxed,
}

/// A finished slideshow video
#[derive(Debug, Clone)]
pub struct OutputVideo {
    /// Output file path
    pub path: PathBuf,
    /// Audio length in whole seconds
    pub audio_duration_secs: u64,
    /// Number of images in the slideshow
    pub frame_count: usize,
    /// Display time of each image, as stored in the sequence
    pub frame_duration_ms: u32,
    /// Output frame rate
    pub frame_rate: u32,
    /// Length of the visual track
    pub visual_duration: Duration,
    /// The frame duration hit its ceiling, so the video ends before the audio
    pub truncated: bool,
    /// What the output container reports
    pub file: MuxedFile,
    /// Intermediate sequence, when kept
    pub intermediate: Option<PathBuf>,
}

/// Runs the slideshow pipeline with a fixed configuration
#[derive(Debug, Clone)]
pub struct Assembler {
    config: AssemblerConfig,
}

impl Assembler {
    pub fn new(config: AssemblerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AssemblerConfig {
        &self.config
    }

    /// Build the slideshow for `audio_path` and `image_paths` at `output_path`
    ///
    /// Images are shown in the given order. Inputs are validated before any
    /// file is touched, and the audio is probed before any image is decoded.
    /// A failed run leaves any existing file at `output_path` untouched.
    pub fn assemble<A, I, O>(
        &self,
        audio_path: A,
        image_paths: &[I],
        output_path: O,
    ) -> std::result::Result<OutputVideo, AssemblyError>
    where
        A: AsRef<Path>,
        I: AsRef<Path>,
        O: AsRef<Path>,
    {
        let audio_path = audio_path.as_ref();
        let output_path = output_path.as_ref();
        let _span = info_span!("assemble", output = %output_path.display()).entered();

        let fail = |stage: Stage| move |e: Error| AssemblyError::new(stage, e);

        if image_paths.is_empty() {
            return Err(AssemblyError::new(
                Stage::Start,
                Error::InvalidInput("No images provided".to_string()),
            ));
        }
        audio::validate_extension(audio_path).map_err(fail(Stage::Start))?;

        let duration_secs = audio::resolve_duration(audio_path).map_err(fail(Stage::Start))?;
        info!(duration_secs, "duration resolved");

        let timing = FrameTiming::compute(duration_secs, image_paths.len())
            .map_err(fail(Stage::DurationResolved))?;
        if timing.capped {
            warn!(
                duration_secs,
                images = image_paths.len(),
                frame_duration_ms = timing.frame_duration_ms,
                "frame duration capped, video will be shorter than the audio"
            );
        }
        info!(frame_duration_ms = timing.frame_duration_ms, "timing computed");

        let images = image_loader::normalize(image_paths, self.config.width, self.config.height)
            .map_err(fail(Stage::TimingComputed))?;
        info!(images = images.len(), "images normalized");

        // The temp dir (if any) must outlive the mux step
        let (temp_dir, work_dir) = self
            .work_dir()
            .map_err(fail(Stage::ImagesNormalized))?;
        let sequence_path = work_dir.join(SEQUENCE_FILE_NAME);

        let sequence = sequence::build_sequence(&images, timing.frame_duration_ms, &sequence_path)
            .map_err(fail(Stage::ImagesNormalized))?;
        drop(images);
        info!(
            path = %sequence.path.display(),
            frames = sequence.frame_count,
            "sequence built"
        );

        let mux_config = MuxConfig {
            frame_rate: self.config.frame_rate,
            codec: self.config.codec,
            quality: self.config.quality,
            ffmpeg_path: self.config.ffmpeg_path.clone(),
        };

        let muxed = match muxer::mux(&sequence, audio_path, output_path, &mux_config) {
            Ok(muxed) => muxed,
            Err(e) => {
                self.discard_sequence(&sequence);
                return Err(AssemblyError::new(Stage::SequenceBuilt, e));
            }
        };

        let intermediate = if self.config.keep_intermediate {
            Some(sequence.path.clone())
        } else {
            self.discard_sequence(&sequence);
            None
        };
        drop(temp_dir);
        info!(stage = ?Stage::Muxed, truncated = timing.capped, "assembly complete");

        Ok(OutputVideo {
            path: output_path.to_path_buf(),
            audio_duration_secs: duration_secs,
            frame_count: sequence.frame_count,
            frame_duration_ms: sequence.frame_duration_ms,
            frame_rate: self.config.frame_rate,
            visual_duration: sequence.total_duration(),
            truncated: timing.capped,
            file: muxed,
            intermediate,
        })
    }

    fn work_dir(&self) -> Result<(Option<tempfile::TempDir>, PathBuf)> {
        match &self.config.work_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                Ok((None, dir.clone()))
            }
            None => {
                let dir = tempfile::Builder::new()
                    .prefix("slidemux-")
                    .keep(self.config.keep_intermediate)
                    .tempdir()?;
                let path = dir.path().to_path_buf();
                Ok((Some(dir), path))
            }
        }
    }

    fn discard_sequence(&self, sequence: &sequence::IntermediateSequence) {
        if self.config.keep_intermediate {
            return;
        }
        if let Err(e) = sequence.remove() {
            warn!(path = %sequence.path.display(), error = %e, "failed to remove sequence");
        }
    }
}

/// Assemble a slideshow with [`AssemblerConfig::default`]
pub fn assemble<A, I, O>(
    audio_path: A,
    image_paths: &[I],
    output_path: O,
) -> std::result::Result<OutputVideo, AssemblyError>
where
    A: AsRef<Path>,
    I: AsRef<Path>,
    O: AsRef<Path>,
{
    Assembler::new(AssemblerConfig::default())
        .map_err(|e| AssemblyError::new(Stage::Start, e))?
        .assemble(audio_path, image_paths, output_path)
}
