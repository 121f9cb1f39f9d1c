//! Error types for slidemux

use crate::assembler::Stage;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for slidemux operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for slidemux operations
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input parameter, rejected before any work starts
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Audio file exists but its container header cannot be parsed
    #[error("Corrupt audio: {0}")]
    CorruptAudio(String),

    /// Image file is unreadable or in an unsupported format
    #[error("Cannot decode image {}: {message}", .path.display())]
    ImageDecode { path: PathBuf, message: String },

    /// Writing the intermediate sequence failed
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Re-encoding or muxing the output video failed
    #[error("Muxing error: {0}")]
    Mux(String),

    /// Encoder is not available on this system
    #[error("Codec unavailable: {0}")]
    CodecUnavailable(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a whole assembly run
///
/// `reached` is the last stage that completed before `source` occurred.
#[derive(Error, Debug)]
#[error("Assembly failed after {reached:?}: {source}")]
pub struct AssemblyError {
    pub reached: Stage,
    #[source]
    pub source: Error,
}

impl AssemblyError {
    pub fn new(reached: Stage, source: Error) -> Self {
        Self { reached, source }
    }

    /// The underlying failure reason
    pub fn kind(&self) -> &Error {
        &self.source
    }
}

/// Error code for FFI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub enum ErrorCode {
    /// Success
    Ok = 0,
    /// Invalid input parameter
    InvalidInput = 1,
    /// Corrupt audio container
    CorruptAudio = 2,
    /// Image decoding failed
    ImageDecode = 3,
    /// Intermediate sequence encoding failed
    EncodeError = 4,
    /// Output muxing failed
    MuxError = 5,
    /// Codec not available
    CodecUnavailable = 6,
    /// I/O error
    IoError = 7,
}

impl From<&Error> for ErrorCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::InvalidInput(_) => ErrorCode::InvalidInput,
            Error::CorruptAudio(_) => ErrorCode::CorruptAudio,
            Error::ImageDecode { .. } => ErrorCode::ImageDecode,
            Error::Encode(_) => ErrorCode::EncodeError,
            Error::Mux(_) => ErrorCode::MuxError,
            Error::CodecUnavailable(_) => ErrorCode::CodecUnavailable,
            Error::Io(_) => ErrorCode::IoError,
        }
    }
}

impl From<&AssemblyError> for ErrorCode {
    fn from(err: &AssemblyError) -> Self {
        ErrorCode::from(&err.source)
    }
}
