pub mod chunk_reader;
pub mod chunk_writer;
pub mod chunks;
pub mod fmt;
pub mod info;
pub mod wav_read;
pub mod wav_write;

use core::fmt::{Display, Formatter, Result as FmtResult};

pub use chunk_reader::ChunkReader;
pub use chunk_writer::{AppendOnly, ChunkWriter};
pub use info::{InfoKey, MetadataMap};
pub use wav_read::{BlockIter, WavRead};
pub use wav_write::WavWrite;

use crate::error::{WavFileError, WavResult};

pub const WAVE_FORMAT_PCM: u16 = 0x0001;
pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;

/// Sample encodings supported in the `fmt ` chunk (wFormatTag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WavFormat {
    /// Signed integer PCM (unsigned for 8-bit)
    Pcm,
    /// IEEE 754 float, 32 or 64 bits
    IeeeFloat,
}

impl WavFormat {
    /// Canonical numeric WAV format tag
    pub const fn as_u16(self) -> u16 {
        match self {
            WavFormat::Pcm => WAVE_FORMAT_PCM,
            WavFormat::IeeeFloat => WAVE_FORMAT_IEEE_FLOAT,
        }
    }

    /// Map a plain format tag. `WAVE_FORMAT_EXTENSIBLE` is not a format in
    /// itself and is resolved by the fmt parser from its sub-format GUID.
    pub const fn const_from(code: u16) -> Option<Self> {
        match code {
            WAVE_FORMAT_PCM => Some(WavFormat::Pcm),
            WAVE_FORMAT_IEEE_FLOAT => Some(WavFormat::IeeeFloat),
            _ => None,
        }
    }

    /// Short symbolic name
    pub const fn as_str(self) -> &'static str {
        match self {
            WavFormat::Pcm => "PCM",
            WavFormat::IeeeFloat => "IEEE_FLOAT",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            WavFormat::Pcm => "Uncompressed PCM",
            WavFormat::IeeeFloat => "IEEE 32-bit or 64-bit floating point",
        }
    }

    pub const fn is_float(self) -> bool {
        matches!(self, WavFormat::IeeeFloat)
    }
}

impl TryFrom<u16> for WavFormat {
    type Error = WavFileError;

    fn try_from(code: u16) -> WavResult<Self> {
        WavFormat::const_from(code).ok_or_else(|| {
            WavFileError::unsupported_format(format!("format tag 0x{:04X}", code))
        })
    }
}

impl From<WavFormat> for u16 {
    fn from(val: WavFormat) -> Self {
        val.as_u16()
    }
}

impl Display for WavFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if f.alternate() {
            write!(f, "{}", self.description())
        } else {
            write!(f, "{}", self.as_str())
        }
    }
}
