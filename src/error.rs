use core::fmt::{Display, Formatter, Result as FmtResult};
use std::io;
use thiserror::Error;

/// Result type for wavfile operations
#[allow(clippy::result_large_err)]
pub type WavResult<T> = Result<T, WavFileError>;

/// Error type for reading and writing WAV files.
///
/// Variants separate "bad file" (`MalformedHeader`, `MissingChunk`,
/// `TruncatedData`), "bad usage" (`ChannelMismatch`, `SeekRange`,
/// `ClosedStream`, `InvalidMetadata`) and "unsupported feature"
/// (`UnsupportedFormat`, `UnseekableStore`).
#[derive(Debug, Error)]
pub enum WavFileError {
    /// File I/O errors (file not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Bad RIFF/WAVE magic or an inconsistent header field
    #[error("Malformed header at {position}: {description} - {details}")]
    MalformedHeader {
        description: String,
        details: String,
        position: ErrorPosition,
    },

    #[error("Missing chunk: {0}")]
    MissingChunk(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Data chunk is not a whole number of frames or ends early
    #[error("Truncated data: {0}")]
    TruncatedData(String),

    #[error("Channel mismatch: expected {expected} channels, found {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Seek out of range: {0}")]
    SeekRange(String),

    #[error("Unseekable store: {0}")]
    UnseekableStore(String),

    #[error("Stream is closed: {0}")]
    ClosedStream(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),
}

/// Position information for errors that occur during parsing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorPosition {
    /// Byte offset in the stream where the error occurred
    pub offset: u64,
    /// Human-readable description of the position
    pub description: String,
}

impl ErrorPosition {
    /// Create a new error position at the given byte offset
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            description: format!("byte offset {}", offset),
        }
    }

    /// Set a custom description for the error position
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Display for ErrorPosition {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.description)
    }
}

impl WavFileError {
    /// Create a MalformedHeader error with position information
    pub fn malformed_header(
        description: impl Into<String>,
        details: impl Into<String>,
        position: ErrorPosition,
    ) -> Self {
        WavFileError::MalformedHeader {
            description: description.into(),
            details: details.into(),
            position,
        }
    }

    pub fn missing_chunk(message: impl Into<String>) -> Self {
        WavFileError::MissingChunk(message.into())
    }

    pub fn unsupported_format(message: impl Into<String>) -> Self {
        WavFileError::UnsupportedFormat(message.into())
    }

    pub fn truncated_data(message: impl Into<String>) -> Self {
        WavFileError::TruncatedData(message.into())
    }

    pub const fn channel_mismatch(expected: usize, found: usize) -> Self {
        WavFileError::ChannelMismatch { expected, found }
    }

    pub fn seek_range(message: impl Into<String>) -> Self {
        WavFileError::SeekRange(message.into())
    }

    pub fn unseekable_store(message: impl Into<String>) -> Self {
        WavFileError::UnseekableStore(message.into())
    }

    pub fn closed_stream(message: impl Into<String>) -> Self {
        WavFileError::ClosedStream(message.into())
    }

    pub fn invalid_metadata(message: impl Into<String>) -> Self {
        WavFileError::InvalidMetadata(message.into())
    }

    /// Map an unexpected end of stream onto `TruncatedData`, keeping other I/O errors as they are.
    pub(crate) fn from_read(err: io::Error, context: impl Into<String>) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            WavFileError::TruncatedData(context.into())
        } else {
            WavFileError::Io(err)
        }
    }
}
