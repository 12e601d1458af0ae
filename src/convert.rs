//! Sample domain conversions.
//!
//! Integers move between depths by bit shifting: widening shifts left,
//! narrowing is an arithmetic right shift, which truncates toward negative
//! infinity. No rounding or dither is applied anywhere. Integer to float
//! divides by `2^(bits-1)`; float to integer multiplies by the same factor,
//! truncates toward zero and clamps into the signed range of the target.
//! Floats written to float layouts are clamped into `[-1, 1]`.
//!
//! Bit widths are clamped into `1..=64` so every function is total.

use crate::{codec::SampleLayout, types::Sample};

#[inline]
fn width(bits: u16) -> u32 {
    bits.clamp(1, 64) as u32
}

/// Signed range `[-2^(bits-1), 2^(bits-1) - 1]` of an integer depth.
pub const fn int_range(bits: u16) -> (i64, i64) {
    let bits = if bits == 0 {
        1
    } else if bits > 64 {
        64
    } else {
        bits
    };
    let half = 1i128 << (bits - 1);
    (-half as i64, (half - 1) as i64)
}

/// Clamp `value` into the signed range of `bits`, reporting whether it moved.
pub fn saturate(value: i64, bits: u16) -> (i64, bool) {
    let (min, max) = int_range(bits);
    let clamped = value.clamp(min, max);
    (clamped, clamped != value)
}

/// Change the depth of an integer sample by shifting.
///
/// `value` is first saturated into the range of `from_bits`.
pub fn rescale_int(value: i64, from_bits: u16, to_bits: u16) -> i64 {
    let (value, _) = saturate(value, from_bits);
    let from = width(from_bits);
    let to = width(to_bits);
    if to >= from {
        ((value as i128) << (to - from)) as i64
    } else {
        value >> (from - to)
    }
}

/// `value / 2^(bits-1)`
pub fn int_to_float(value: i64, bits: u16) -> f64 {
    value as f64 / scale(bits)
}

/// Scale a float into the signed range of `to_bits`, truncating toward zero
/// and clamping. NaN maps to 0.
pub fn from_float(value: f64, to_bits: u16) -> i64 {
    float_to_int(value, to_bits).0
}

fn float_to_int(value: f64, to_bits: u16) -> (i64, bool) {
    if value.is_nan() {
        return (0, false);
    }
    // Float to int casts saturate, so i128 holds every finite product and both infinities.
    let truncated = (value * scale(to_bits)).trunc() as i128;
    let (min, max) = int_range(to_bits);
    let clamped = truncated.clamp(min as i128, max as i128);
    (clamped as i64, clamped != truncated)
}

#[inline]
fn scale(bits: u16) -> f64 {
    2f64.powi(width(bits) as i32 - 1)
}

/// Express any sample as an integer of depth `to_bits`.
pub fn to_int(sample: Sample, to_bits: u16) -> i64 {
    match sample {
        Sample::Int { bits, value } => rescale_int(value, bits, to_bits),
        Sample::Float { value, .. } => from_float(value, to_bits),
    }
}

/// Express any sample as a float in the nominal `[-1, 1)` range.
pub fn to_float(sample: Sample) -> f64 {
    match sample {
        Sample::Int { bits, value } => int_to_float(saturate(value, bits).0, bits),
        Sample::Float { value, .. } => value,
    }
}

/// Convert `sample` into the native domain of `layout`.
///
/// Returns the converted sample and whether any value had to be clamped.
pub(crate) fn conform(sample: Sample, layout: SampleLayout) -> (Sample, bool) {
    let target_bits = layout.bits_per_sample();
    match (sample, layout.is_float()) {
        (Sample::Float { value, .. }, true) => {
            let clamped = value.clamp(-1.0, 1.0);
            (Sample::float(target_bits, clamped), clamped != value)
        }
        (Sample::Int { bits, value }, true) => {
            let (value, clipped) = saturate(value, bits);
            (Sample::float(target_bits, int_to_float(value, bits)), clipped)
        }
        (Sample::Int { bits, value }, false) => {
            let (value, clipped) = saturate(value, bits);
            (
                Sample::int(target_bits, rescale_int(value, bits, target_bits)),
                clipped,
            )
        }
        (Sample::Float { value, .. }, false) => {
            let (value, clipped) = float_to_int(value, target_bits);
            (Sample::int(target_bits, value), clipped)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_range() {
        assert_eq!(int_range(8), (-128, 127));
        assert_eq!(int_range(24), (-8_388_608, 8_388_607));
        assert_eq!(int_range(64), (i64::MIN, i64::MAX));
    }

    #[test]
    fn test_from_float_truncates_then_clamps() {
        assert_eq!(from_float(0.99999, 16), 32_767);
        assert_eq!(from_float(1.0, 16), 32_767);
        assert_eq!(from_float(-1.0, 16), -32_768);
        assert_eq!(from_float(-1.5, 8), -128);
        // 0.5 * 2^15 - epsilon truncates toward zero
        assert_eq!(from_float(0.499_99, 16), 16_383);
        assert_eq!(from_float(-0.499_99, 16), -16_383);
        assert_eq!(from_float(f64::NAN, 24), 0);
        assert_eq!(from_float(f64::INFINITY, 64), i64::MAX);
        assert_eq!(from_float(f64::NEG_INFINITY, 64), i64::MIN);
    }

    #[test]
    fn test_rescale_int_shifts() {
        assert_eq!(rescale_int(1, 16, 24), 256);
        assert_eq!(rescale_int(-32_768, 16, 32), i32::MIN as i64);
        assert_eq!(rescale_int(i16::MAX as i64, 16, 64), (i16::MAX as i64) << 48);
        // narrowing floors, it does not round
        assert_eq!(rescale_int(255, 24, 16), 0);
        assert_eq!(rescale_int(-1, 24, 16), -1);
        assert_eq!(rescale_int(0x7F_FFFF, 24, 8), 127);
    }

    #[test]
    fn test_identity_conversions_are_lossless() {
        for v in [i16::MIN as i64, -1, 0, 1, i16::MAX as i64] {
            assert_eq!(rescale_int(v, 16, 16), v);
            assert_eq!(to_int(Sample::int(16, v), 16), v);
        }
        for v in [-1.0, -0.25, 0.0, 0.7, 1.5] {
            assert_eq!(to_float(Sample::float(64, v)), v);
        }
    }

    #[test]
    fn test_int_to_float_and_back() {
        assert_eq!(int_to_float(-32_768, 16), -1.0);
        assert_eq!(int_to_float(16_384, 16), 0.5);
        assert_eq!(int_to_float(-128, 8), -1.0);
        assert_eq!(from_float(int_to_float(12_345, 16), 16), 12_345);
    }

    #[test]
    fn test_saturate_reports_clipping() {
        assert_eq!(saturate(40_000, 16), (32_767, true));
        assert_eq!(saturate(-129, 8), (-128, true));
        assert_eq!(saturate(100, 8), (100, false));
    }

    #[test]
    fn test_conform_into_layouts() {
        let (s, clipped) = conform(Sample::float(32, 2.0), SampleLayout::I16);
        assert_eq!(s, Sample::int(16, 32_767));
        assert!(clipped);

        let (s, clipped) = conform(Sample::int(24, 256), SampleLayout::I16);
        assert_eq!(s, Sample::int(16, 1));
        assert!(!clipped);

        let (s, clipped) = conform(Sample::float(64, 0.25), SampleLayout::F32);
        assert_eq!(s, Sample::float(32, 0.25));
        assert!(!clipped);
    }

    #[test]
    fn test_conform_clamps_floats_into_unit_range() {
        let (s, clipped) = conform(Sample::float(64, 1.5), SampleLayout::F32);
        assert_eq!(s, Sample::float(32, 1.0));
        assert!(clipped);

        let (s, clipped) = conform(Sample::float(32, -3.0), SampleLayout::F64);
        assert_eq!(s, Sample::float(64, -1.0));
        assert!(clipped);

        let (s, clipped) = conform(Sample::float(64, 1.0), SampleLayout::F64);
        assert_eq!(s, Sample::float(64, 1.0));
        assert!(!clipped);
    }
}
