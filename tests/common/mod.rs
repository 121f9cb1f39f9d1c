//! Common test utilities

#![allow(dead_code)]

use image::{ImageBuffer, Rgba, RgbaImage};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Solid colors used for numbered slides
pub const SLIDE_COLORS: [[u8; 4]; 3] = [
    [230, 20, 20, 255], // Red
    [20, 230, 20, 255], // Green
    [20, 20, 230, 255], // Blue
];

/// Generate a test image with a solid color and a subtle gradient
pub fn generate_test_image(width: u32, height: u32, base_color: [u8; 4]) -> RgbaImage {
    let mut img = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let r = base_color[0].saturating_add((x % 16) as u8);
        let g = base_color[1].saturating_add((y % 16) as u8);
        *pixel = Rgba([r, g, base_color[2], base_color[3]]);
    }

    img
}

/// Generate the `number`th slide, cycling through [`SLIDE_COLORS`]
pub fn generate_numbered_image(width: u32, height: u32, number: usize) -> RgbaImage {
    generate_test_image(width, height, SLIDE_COLORS[number % SLIDE_COLORS.len()])
}

/// Save a test image as JPEG
pub fn save_jpeg<P: AsRef<Path>>(img: &RgbaImage, path: P, quality: u8) -> std::io::Result<()> {
    // Convert RGBA to RGB for JPEG
    let rgb_img: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let file = std::fs::File::create(path)?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, quality);
    encoder
        .encode_image(&rgb_img)
        .map_err(std::io::Error::other)?;

    Ok(())
}

/// Save a test image as PNG
pub fn save_png<P: AsRef<Path>>(img: &RgbaImage, path: P) -> std::io::Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .map_err(std::io::Error::other)
}

/// Write `count` numbered slides into `dir`, alternating JPEG and PNG
pub fn write_slides(dir: &Path, count: usize, width: u32, height: u32) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let img = generate_numbered_image(width, height, i);
            if i % 2 == 0 {
                let path = dir.join(format!("slide_{}.png", i));
                save_png(&img, &path).unwrap();
                path
            } else {
                let path = dir.join(format!("slide_{}.jpg", i));
                save_jpeg(&img, &path, 90).unwrap();
                path
            }
        })
        .collect()
}

/// Write a mono 16-bit PCM WAV file holding a 440Hz tone
pub fn write_wav<P: AsRef<Path>>(path: P, duration_ms: u32, sample_rate: u32) -> std::io::Result<()> {
    let samples = (sample_rate as u64 * duration_ms as u64 / 1000) as u32;
    let data_len = samples * 2;

    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());

    for n in 0..samples {
        let t = n as f64 / sample_rate as f64;
        let sample = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        out.extend_from_slice(&sample.to_le_bytes());
    }

    let mut file = std::fs::File::create(path)?;
    file.write_all(&out)
}

/// Write a silent CBR MP3 (MPEG-1 Layer III, 128kbps, 44.1kHz, mono)
///
/// An Info header frame carrying the frame count precedes `frames` audio frames.
pub fn write_mp3<P: AsRef<Path>>(path: P, frames: u32) -> std::io::Result<()> {
    const HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC0];
    // 144 * 128000 / 44100, unpadded
    const FRAME_LEN: usize = 417;
    // frame header plus mono side info
    const INFO_OFFSET: usize = 4 + 17;

    let mut out = vec![0u8; FRAME_LEN];
    out[..4].copy_from_slice(&HEADER);
    out[INFO_OFFSET..INFO_OFFSET + 4].copy_from_slice(b"Info");
    // flags: frame count present
    out[INFO_OFFSET + 4..INFO_OFFSET + 8].copy_from_slice(&1u32.to_be_bytes());
    out[INFO_OFFSET + 8..INFO_OFFSET + 12].copy_from_slice(&frames.to_be_bytes());

    let mut silent = [0u8; FRAME_LEN];
    silent[..4].copy_from_slice(&HEADER);
    for _ in 0..frames {
        out.extend_from_slice(&silent);
    }

    std::fs::write(path, out)
}

/// Write a file that is not a valid media file of any kind
pub fn write_garbage<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    std::fs::write(path, b"this file only pretends to be media\n")
}

/// Whether ffmpeg with libx264 and aac is installed
pub fn ffmpeg_available() -> bool {
    slidemux::available(slidemux::Codec::H264, None).is_ok()
}

/// Decode every frame of `video` into PNG files under `dir`, in order
pub fn extract_frames(video: &Path, dir: &Path) -> Vec<PathBuf> {
    let ffmpeg = slidemux::ffmpeg::find_ffmpeg(None).unwrap();
    let status = std::process::Command::new(ffmpeg)
        .args(["-v", "error", "-nostdin", "-i"])
        .arg(video)
        .arg(dir.join("frame_%04d.png"))
        .status()
        .unwrap();
    assert!(status.success(), "frame extraction failed");

    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
        .collect();
    frames.sort();
    frames
}

/// Index of the [`SLIDE_COLORS`] entry nearest to an image's center pixel
pub fn nearest_slide_color<P: AsRef<Path>>(path: P) -> usize {
    let img = image::open(path).unwrap().to_rgba8();
    let center = img.get_pixel(img.width() / 2, img.height() / 2);

    let distance = |color: &[u8; 4]| -> u32 {
        (0..3)
            .map(|c| (center[c] as i32 - color[c] as i32).unsigned_abs().pow(2))
            .sum()
    };

    (0..SLIDE_COLORS.len())
        .min_by_key(|&i| distance(&SLIDE_COLORS[i]))
        .unwrap()
}

/// Verify that a file exists and has non-zero size
pub fn verify_file_exists_with_size<P: AsRef<Path>>(path: P) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => meta.len() > 0,
        Err(_) => false,
    }
}

/// Parse MP4 header to verify it's a valid MP4 file
pub fn verify_mp4_header<P: AsRef<Path>>(path: P) -> bool {
    use std::io::Read;

    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut header = [0u8; 12];
    if file.read_exact(&mut header).is_err() {
        return false;
    }

    // MP4 files have 'ftyp' box at offset 4
    &header[4..8] == b"ftyp"
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_wav_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");

        write_wav(&path, 1000, 8000).unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        assert_eq!(size, 44 + 16000);
    }

    #[test]
    fn test_write_mp3_size() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("silence.mp3");

        write_mp3(&path, 10).unwrap();

        let size = std::fs::metadata(&path).unwrap().len();
        assert_eq!(size, 11 * 417);
    }

    #[test]
    fn test_nearest_slide_color() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_slides(temp_dir.path(), 3, 32, 32);

        let colors: Vec<usize> = paths.iter().map(nearest_slide_color).collect();
        assert_eq!(colors, [0, 1, 2]);
    }

    #[test]
    fn test_write_slides() {
        let temp_dir = TempDir::new().unwrap();
        let paths = write_slides(temp_dir.path(), 3, 64, 48);

        assert_eq!(paths.len(), 3);
        assert!(paths.iter().all(verify_file_exists_with_size));
    }
}
