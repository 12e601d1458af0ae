//! Conversion between on-disk sample bytes and [`Sample`] values.
//!
//! PCM samples are little-endian two's complement stored in exactly
//! `bits / 8` bytes, except 8-bit PCM which WAV stores unsigned with a 128
//! offset. Decoding always yields a signed value, so every integer depth
//! shares one domain convention. IEEE float samples are stored as `f32` or
//! `f64` and decode unclamped.

use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::{
    convert,
    error::{WavFileError, WavResult},
    types::Sample,
    wav::WavFormat,
};

/// A validated (format, bit depth) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleLayout {
    U8,
    I16,
    I24,
    I32,
    I64,
    F32,
    F64,
}

impl SampleLayout {
    /// Resolve a layout, rejecting combinations outside
    /// {PCM: 8, 16, 24, 32, 64; IEEE float: 32, 64}.
    pub fn new(format: WavFormat, bits_per_sample: u16) -> WavResult<Self> {
        match (format, bits_per_sample) {
            (WavFormat::Pcm, 8) => Ok(SampleLayout::U8),
            (WavFormat::Pcm, 16) => Ok(SampleLayout::I16),
            (WavFormat::Pcm, 24) => Ok(SampleLayout::I24),
            (WavFormat::Pcm, 32) => Ok(SampleLayout::I32),
            (WavFormat::Pcm, 64) => Ok(SampleLayout::I64),
            (WavFormat::IeeeFloat, 32) => Ok(SampleLayout::F32),
            (WavFormat::IeeeFloat, 64) => Ok(SampleLayout::F64),
            (format, bits) => Err(WavFileError::unsupported_format(format!(
                "{}-bit {} samples are not supported",
                bits, format
            ))),
        }
    }

    pub const fn format(self) -> WavFormat {
        match self {
            SampleLayout::F32 | SampleLayout::F64 => WavFormat::IeeeFloat,
            _ => WavFormat::Pcm,
        }
    }

    pub const fn bits_per_sample(self) -> u16 {
        match self {
            SampleLayout::U8 => 8,
            SampleLayout::I16 => 16,
            SampleLayout::I24 => 24,
            SampleLayout::I32 | SampleLayout::F32 => 32,
            SampleLayout::I64 | SampleLayout::F64 => 64,
        }
    }

    pub const fn bytes_per_sample(self) -> usize {
        self.bits_per_sample() as usize / 8
    }

    pub const fn is_float(self) -> bool {
        matches!(self, SampleLayout::F32 | SampleLayout::F64)
    }

    /// Frame size in bytes for `channels` channels, as stored in the 16-bit
    /// `block_align` field.
    ///
    /// # Errors
    ///
    /// `UnsupportedFormat` when the frame does not fit in 65535 bytes.
    pub fn block_align(self, channels: u16) -> WavResult<u16> {
        let frame_size = channels as usize * self.bytes_per_sample();
        u16::try_from(frame_size).map_err(|_| {
            WavFileError::unsupported_format(format!(
                "{} channels of {}-bit samples make a {}-byte frame, above the 65535-byte limit",
                channels,
                self.bits_per_sample(),
                frame_size
            ))
        })
    }

    /// Decode one sample from exactly `bytes_per_sample()` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `bytes_per_sample()`; callers slice
    /// with `chunks_exact`.
    pub fn decode(self, bytes: &[u8]) -> Sample {
        let bits = self.bits_per_sample();
        match self {
            SampleLayout::U8 => Sample::int(8, bytes[0] as i64 - 128),
            SampleLayout::F32 => Sample::float(
                bits,
                f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f64,
            ),
            SampleLayout::F64 => Sample::float(
                bits,
                f64::from_le_bytes([
                    bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
                ]),
            ),
            _ => {
                let width = self.bytes_per_sample();
                // Sign-extend into the unused high bytes.
                let fill = if bytes[width - 1] & 0x80 != 0 { 0xFF } else { 0x00 };
                let mut wide = [fill; 8];
                wide[..width].copy_from_slice(&bytes[..width]);
                Sample::int(bits, i64::from_le_bytes(wide))
            }
        }
    }

    /// Encode one sample into `out[..bytes_per_sample()]`.
    ///
    /// Samples from a different domain are first conformed to this layout
    /// (see [`convert::conform`]), so integer values outside the target range
    /// are saturated. Returns `true` when saturation occurred.
    pub fn encode(self, sample: Sample, out: &mut [u8]) -> bool {
        let (native, saturated) = convert::conform(sample, self);
        match (self, native) {
            (SampleLayout::U8, Sample::Int { value, .. }) => {
                out[0] = (value + 128) as u8;
            }
            (SampleLayout::F32, Sample::Float { value, .. }) => {
                out[..4].copy_from_slice(&(value as f32).to_le_bytes());
            }
            (SampleLayout::F64, Sample::Float { value, .. }) => {
                out[..8].copy_from_slice(&value.to_le_bytes());
            }
            (_, Sample::Int { value, .. }) => {
                let width = self.bytes_per_sample();
                out[..width].copy_from_slice(&value.to_le_bytes()[..width]);
            }
            // conform() always yields the layout's own domain
            (_, Sample::Float { .. }) => unreachable!("conform returned a float for an integer layout"),
        }
        saturated
    }
}

impl Display for SampleLayout {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            SampleLayout::U8 => "u8",
            SampleLayout::I16 => "i16",
            SampleLayout::I24 => "i24",
            SampleLayout::I32 => "i32",
            SampleLayout::I64 => "i64",
            SampleLayout::F32 => "f32",
            SampleLayout::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

/// Decode a single sample of the given depth and format.
pub fn decode(bytes: &[u8], bits_per_sample: u16, format: WavFormat) -> WavResult<Sample> {
    let layout = SampleLayout::new(format, bits_per_sample)?;
    if bytes.len() != layout.bytes_per_sample() {
        return Err(WavFileError::truncated_data(format!(
            "Expected {} bytes for a {} sample, got {}",
            layout.bytes_per_sample(),
            layout,
            bytes.len()
        )));
    }
    Ok(layout.decode(bytes))
}

/// Encode a single sample to the given depth and format.
pub fn encode(sample: Sample, bits_per_sample: u16, format: WavFormat) -> WavResult<Vec<u8>> {
    let layout = SampleLayout::new(format, bits_per_sample)?;
    let mut out = vec![0u8; layout.bytes_per_sample()];
    layout.encode(sample, &mut out);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_LAYOUTS: [(WavFormat, u16); 7] = [
        (WavFormat::Pcm, 8),
        (WavFormat::Pcm, 16),
        (WavFormat::Pcm, 24),
        (WavFormat::Pcm, 32),
        (WavFormat::Pcm, 64),
        (WavFormat::IeeeFloat, 32),
        (WavFormat::IeeeFloat, 64),
    ];

    #[test]
    fn test_layout_rejects_unsupported_combinations() {
        for (format, bits) in [
            (WavFormat::Pcm, 12),
            (WavFormat::Pcm, 40),
            (WavFormat::IeeeFloat, 16),
            (WavFormat::IeeeFloat, 24),
        ] {
            let err = SampleLayout::new(format, bits).unwrap_err();
            assert!(matches!(err, WavFileError::UnsupportedFormat(_)));
        }
    }

    #[test]
    fn test_decode_sign_extends_24_bit() {
        let s = decode(&[0xFF, 0xFF, 0xFF], 24, WavFormat::Pcm).unwrap();
        assert_eq!(s, Sample::int(24, -1));

        let s = decode(&[0x00, 0x00, 0x80], 24, WavFormat::Pcm).unwrap();
        assert_eq!(s, Sample::int(24, -8_388_608));

        let s = decode(&[0xFF, 0xFF, 0x7F], 24, WavFormat::Pcm).unwrap();
        assert_eq!(s, Sample::int(24, 8_388_607));
    }

    #[test]
    fn test_decode_extremes_64_bit() {
        let s = decode(&i64::MIN.to_le_bytes(), 64, WavFormat::Pcm).unwrap();
        assert_eq!(s, Sample::int(64, i64::MIN));
        let s = decode(&i64::MAX.to_le_bytes(), 64, WavFormat::Pcm).unwrap();
        assert_eq!(s, Sample::int(64, i64::MAX));
    }

    #[test]
    fn test_8_bit_is_offset_binary_on_disk() {
        assert_eq!(decode(&[0x80], 8, WavFormat::Pcm).unwrap(), Sample::int(8, 0));
        assert_eq!(decode(&[0x00], 8, WavFormat::Pcm).unwrap(), Sample::int(8, -128));
        assert_eq!(decode(&[0xFF], 8, WavFormat::Pcm).unwrap(), Sample::int(8, 127));
        assert_eq!(encode(Sample::int(8, 0), 8, WavFormat::Pcm).unwrap(), vec![0x80]);
    }

    #[test]
    fn test_float_decode_is_not_clamped() {
        let s = decode(&1.5f32.to_le_bytes(), 32, WavFormat::IeeeFloat).unwrap();
        assert_eq!(s, Sample::float(32, 1.5));
        let s = decode(&(-2.25f64).to_le_bytes(), 64, WavFormat::IeeeFloat).unwrap();
        assert_eq!(s, Sample::float(64, -2.25));
    }

    #[test]
    fn test_encode_decode_is_identity_on_bytes() {
        // Deterministic byte patterns: edges plus a simple LCG sweep.
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        for (format, bits) in ALL_LAYOUTS {
            let width = bits as usize / 8;
            let mut patterns: Vec<Vec<u8>> = vec![vec![0x00; width], vec![0xFF; width]];
            let mut top = vec![0x00; width];
            top[width - 1] = 0x80;
            patterns.push(top);
            for _ in 0..256 {
                state = state
                    .wrapping_mul(6_364_136_223_846_793_005)
                    .wrapping_add(1_442_695_040_888_963_407);
                patterns.push(state.to_le_bytes()[..width].to_vec());
            }

            for bytes in patterns {
                let sample = decode(&bytes, bits, format).unwrap();
                if let Sample::Float { value, .. } = sample {
                    if value.is_nan() {
                        // NaN payloads are not guaranteed to survive f32 -> f64 -> f32.
                        continue;
                    }
                }
                let encoded = encode(sample, bits, format).unwrap();
                assert_eq!(encoded, bytes, "{}-bit {} pattern {:02X?}", bits, format, bytes);
            }
        }
    }

    #[test]
    fn test_decode_rejects_wrong_length() {
        let err = decode(&[0x00, 0x01], 24, WavFormat::Pcm).unwrap_err();
        assert!(matches!(err, WavFileError::TruncatedData(_)));
    }

    #[test]
    fn test_encode_saturates_out_of_range_ints() {
        let mut out = [0u8; 2];
        let saturated = SampleLayout::I16.encode(Sample::int(16, 40_000), &mut out);
        assert!(saturated);
        assert_eq!(i16::from_le_bytes(out), i16::MAX);
    }

    #[test]
    fn test_encode_converts_foreign_domains() {
        // 16-bit value into a 24-bit container widens by 8 bits
        let bytes = encode(Sample::int(16, -2), 24, WavFormat::Pcm).unwrap();
        assert_eq!(decode(&bytes, 24, WavFormat::Pcm).unwrap(), Sample::int(24, -512));

        // float into PCM uses from_float
        let bytes = encode(Sample::float(64, 0.5), 16, WavFormat::Pcm).unwrap();
        assert_eq!(i16::from_le_bytes([bytes[0], bytes[1]]), 16_384);

        // int into float divides by 2^(bits-1)
        let bytes = encode(Sample::int(16, -16_384), 32, WavFormat::IeeeFloat).unwrap();
        assert_eq!(f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), -0.5);
    }

    #[test]
    fn test_block_align_limit() {
        assert_eq!(SampleLayout::I16.block_align(2).unwrap(), 4);
        assert_eq!(SampleLayout::I64.block_align(8191).unwrap(), 65_528);
        let err = SampleLayout::I64.block_align(8192).unwrap_err();
        assert!(matches!(err, WavFileError::UnsupportedFormat(_)));
    }
}
