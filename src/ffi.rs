//! FFI (Foreign Function Interface) for C/Go interoperability

use crate::error::ErrorCode;
use crate::{available, init_logging, Assembler, AssemblerConfig, Codec};
use libc::{c_char, size_t};
use std::ffi::{CStr, CString};
use std::path::PathBuf;
use std::ptr;
use std::slice;

/// FFI result structure
#[repr(C)]
pub struct FfiResult {
    pub code: ErrorCode,
    pub message: *mut c_char,
    /// Set on success when the video ends before the audio does
    pub truncated: bool,
}

impl FfiResult {
    fn ok(truncated: bool) -> Self {
        Self {
            code: ErrorCode::Ok,
            message: ptr::null_mut(),
            truncated,
        }
    }

    fn error(code: ErrorCode, message: &str) -> Self {
        let c_message = CString::new(message.replace('\0', " "))
            .unwrap_or_else(|_| CString::from(c"Unknown error"));
        Self {
            code,
            message: c_message.into_raw(),
            truncated: false,
        }
    }
}

/// FFI assembly options
///
/// Zero numeric fields and null strings select the library defaults.
#[repr(C)]
pub struct FfiAssembleOptions {
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub codec: Codec,
    /// 1-100. Zero selects the default of 75, so the lowest quality a C
    /// caller can request is 1.
    pub quality: u8,
    pub ffmpeg_path: *const c_char,
    pub work_dir: *const c_char,
    pub keep_intermediate: bool,
}

/// Convert a nullable C string
///
/// # Safety
/// - `s` must be a valid null-terminated string or null
unsafe fn optional_str<'a>(s: *const c_char, what: &str) -> Result<Option<&'a str>, FfiResult> {
    if s.is_null() {
        return Ok(None);
    }
    CStr::from_ptr(s)
        .to_str()
        .map(Some)
        .map_err(|_| FfiResult::error(ErrorCode::InvalidInput, &format!("Invalid {}", what)))
}

/// Convert a required C string
///
/// # Safety
/// - `s` must be a valid null-terminated string or null
unsafe fn required_str<'a>(s: *const c_char, what: &str) -> Result<&'a str, FfiResult> {
    optional_str(s, what)?
        .ok_or_else(|| FfiResult::error(ErrorCode::InvalidInput, &format!("{} is null", what)))
}

/// Build a config from FFI options
///
/// # Safety
/// - `options` must be null or point to a valid `FfiAssembleOptions`
unsafe fn config_from_options(
    options: *const FfiAssembleOptions,
) -> Result<AssemblerConfig, FfiResult> {
    let mut config = AssemblerConfig::default();
    if options.is_null() {
        return Ok(config);
    }

    let options = &*options;
    if options.frame_rate != 0 {
        config.frame_rate = options.frame_rate;
    }
    if options.width != 0 {
        config.width = options.width;
    }
    if options.height != 0 {
        config.height = options.height;
    }
    if options.quality != 0 {
        config.quality = options.quality;
    }
    config.codec = options.codec;
    config.ffmpeg_path = optional_str(options.ffmpeg_path, "ffmpeg path")?.map(str::to_string);
    config.work_dir = optional_str(options.work_dir, "work dir")?.map(PathBuf::from);
    config.keep_intermediate = options.keep_intermediate;

    Ok(config)
}

/// Check if a codec is available
///
/// # Safety
/// - `ffmpeg_path` must be a valid null-terminated string or null
#[no_mangle]
pub unsafe extern "C" fn slidemux_available(codec: Codec, ffmpeg_path: *const c_char) -> FfiResult {
    let ffmpeg_path = match optional_str(ffmpeg_path, "ffmpeg path") {
        Ok(p) => p,
        Err(e) => return e,
    };

    match available(codec, ffmpeg_path) {
        Ok(_) => FfiResult::ok(false),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Create a slideshow video from an audio file and images
///
/// # Safety
/// - `audio_path` and `output_path` must be valid null-terminated strings
/// - `image_paths` must point to `image_count` valid null-terminated strings
/// - `options` must be null or point to a valid `FfiAssembleOptions`
#[no_mangle]
pub unsafe extern "C" fn slidemux_assemble(
    audio_path: *const c_char,
    image_paths: *const *const c_char,
    image_count: size_t,
    output_path: *const c_char,
    options: *const FfiAssembleOptions,
) -> FfiResult {
    if image_paths.is_null() || image_count == 0 {
        return FfiResult::error(ErrorCode::InvalidInput, "No images provided");
    }

    let audio_path = match required_str(audio_path, "Audio path") {
        Ok(s) => s,
        Err(e) => return e,
    };
    let output_path = match required_str(output_path, "Output path") {
        Ok(s) => s,
        Err(e) => return e,
    };

    let mut images: Vec<&str> = Vec::with_capacity(image_count);
    for &path in slice::from_raw_parts(image_paths, image_count) {
        match required_str(path, "Image path") {
            Ok(s) => images.push(s),
            Err(e) => return e,
        }
    }

    let config = match config_from_options(options) {
        Ok(c) => c,
        Err(e) => return e,
    };

    let assembler = match Assembler::new(config) {
        Ok(a) => a,
        Err(e) => return FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    };

    match assembler.assemble(audio_path, &images, output_path) {
        Ok(video) => FfiResult::ok(video.truncated),
        Err(e) => FfiResult::error(ErrorCode::from(&e), &e.to_string()),
    }
}

/// Free a result's message string
///
/// # Safety
/// - `result` must point to a valid `FfiResult` that was returned by a slidemux function
#[no_mangle]
pub unsafe extern "C" fn slidemux_free_result(result: *mut FfiResult) {
    if result.is_null() {
        return;
    }

    let result = &mut *result;
    if !result.message.is_null() {
        // Reclaim the CString and let it drop
        let _ = CString::from_raw(result.message);
        result.message = ptr::null_mut();
    }
}

/// Enable log output on stderr, filtered by `SLIDEMUX_LOG`
///
/// Returns false if logging was already initialized.
#[no_mangle]
pub extern "C" fn slidemux_init_logging() -> bool {
    init_logging()
}

/// Get version string
#[no_mangle]
pub extern "C" fn slidemux_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
