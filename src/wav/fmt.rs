use core::fmt::{Display, Formatter, Result as FmtResult};

use log::warn;

use crate::{
    codec::SampleLayout,
    error::{ErrorPosition, WavFileError, WavResult},
    types::FormatDescriptor,
    wav::{WAVE_FORMAT_EXTENSIBLE, WavFormat},
};

/// Size of the plain `fmt ` body this crate writes
pub const FMT_BODY_SIZE: usize = 16;
/// Size of a WAVE_FORMAT_EXTENSIBLE `fmt ` body
pub const FMT_EXTENSIBLE_SIZE: usize = 40;

/// Borrowed view over a `fmt ` chunk body.
///
/// Bodies shorter than 16 bytes are rejected up front; trailing bytes past
/// the fields a layout needs (cbSize extensions) are ignored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmtChunk<'a> {
    bytes: &'a [u8],
}

impl<'a> FmtChunk<'a> {
    /// Wrap a `fmt ` body found at `offset` in the stream.
    pub fn from_bytes(bytes: &'a [u8], offset: u64) -> WavResult<Self> {
        if bytes.len() < FMT_BODY_SIZE {
            return Err(WavFileError::malformed_header(
                "fmt chunk too short",
                format!("{} bytes, need at least {}", bytes.len(), FMT_BODY_SIZE),
                ErrorPosition::new(offset).with_description("fmt chunk body"),
            ));
        }
        Ok(FmtChunk { bytes })
    }

    #[inline]
    fn u16_at(&self, i: usize) -> u16 {
        u16::from_le_bytes([self.bytes[i], self.bytes[i + 1]])
    }

    #[inline]
    fn u32_at(&self, i: usize) -> u32 {
        u32::from_le_bytes([
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ])
    }

    pub fn format_tag(&self) -> u16 {
        self.u16_at(0)
    }

    pub fn channels(&self) -> u16 {
        self.u16_at(2)
    }

    pub fn sample_rate(&self) -> u32 {
        self.u32_at(4)
    }

    pub fn byte_rate(&self) -> u32 {
        self.u32_at(8)
    }

    pub fn block_align(&self) -> u16 {
        self.u16_at(12)
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.u16_at(14)
    }

    pub fn is_extensible(&self) -> bool {
        self.format_tag() == WAVE_FORMAT_EXTENSIBLE
    }

    /// Resolve the effective sample format, following the sub-format GUID
    /// of extensible chunks.
    pub fn format(&self, offset: u64) -> WavResult<WavFormat> {
        if !self.is_extensible() {
            return WavFormat::try_from(self.format_tag());
        }
        if self.bytes.len() < FMT_EXTENSIBLE_SIZE {
            return Err(WavFileError::malformed_header(
                "Extensible fmt chunk too short",
                format!(
                    "{} bytes, need {} for the sub-format",
                    self.bytes.len(),
                    FMT_EXTENSIBLE_SIZE
                ),
                ErrorPosition::new(offset).with_description("fmt chunk body"),
            ));
        }
        // First two bytes of the sub-format GUID carry the plain format tag.
        WavFormat::try_from(self.u16_at(24))
    }

    /// Validate every field and build the descriptor.
    ///
    /// `offset` is the stream position of the body, used in error reports.
    pub fn descriptor(&self, offset: u64) -> WavResult<FormatDescriptor> {
        let format = self.format(offset)?;
        let channels = self.channels();
        let sample_rate = self.sample_rate();
        let bits_per_sample = self.bits_per_sample();
        let position = || ErrorPosition::new(offset).with_description("fmt chunk body");

        if channels == 0 {
            return Err(WavFileError::malformed_header(
                "Invalid channel count",
                "Channels cannot be zero",
                position(),
            ));
        }
        if sample_rate == 0 {
            return Err(WavFileError::malformed_header(
                "Invalid sample rate",
                "Sample rate cannot be zero",
                position(),
            ));
        }

        let layout = SampleLayout::new(format, bits_per_sample)?;

        let expected_block_align = channels as u32 * layout.bytes_per_sample() as u32;
        if self.block_align() as u32 != expected_block_align {
            return Err(WavFileError::malformed_header(
                "Inconsistent block align",
                format!(
                    "Block align {} does not match expected {} (channels {} * bytes_per_sample {})",
                    self.block_align(),
                    expected_block_align,
                    channels,
                    layout.bytes_per_sample()
                ),
                position(),
            ));
        }

        let expected_byte_rate = sample_rate as u64 * expected_block_align as u64;
        if self.byte_rate() as u64 != expected_byte_rate {
            warn!(
                "fmt byte rate {} does not match expected {}; ignoring",
                self.byte_rate(),
                expected_byte_rate
            );
        }

        FormatDescriptor::new(format, channels, sample_rate, bits_per_sample)
    }
}

impl Display for FmtChunk<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "FmtChunk {{ format: 0x{:04X}, channels: {}, sample_rate: {}, byte_rate: {}, block_align: {}, bits_per_sample: {} }}",
            self.format_tag(),
            self.channels(),
            self.sample_rate(),
            self.byte_rate(),
            self.block_align(),
            self.bits_per_sample()
        )
    }
}

/// Encode a plain 16-byte `fmt ` body.
///
/// `channels` may be 0 while the channel count is still unknown; block align
/// and byte rate follow from it.
///
/// # Errors
///
/// `UnsupportedFormat` when a frame would not fit the 16-bit block align field.
pub fn fmt_body(
    layout: SampleLayout,
    channels: u16,
    sample_rate: u32,
) -> WavResult<[u8; FMT_BODY_SIZE]> {
    let block_align = layout.block_align(channels)?;
    let byte_rate = sample_rate.wrapping_mul(block_align as u32);

    let mut bytes = [0u8; FMT_BODY_SIZE];
    bytes[0..2].copy_from_slice(&layout.format().as_u16().to_le_bytes());
    bytes[2..4].copy_from_slice(&channels.to_le_bytes());
    bytes[4..8].copy_from_slice(&sample_rate.to_le_bytes());
    bytes[8..12].copy_from_slice(&byte_rate.to_le_bytes());
    bytes[12..14].copy_from_slice(&block_align.to_le_bytes());
    bytes[14..16].copy_from_slice(&layout.bits_per_sample().to_le_bytes());
    Ok(bytes)
}
