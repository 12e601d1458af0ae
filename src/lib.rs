// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms
#![allow(clippy::result_large_err)] // Allow large error types for comprehensive error handling
#![allow(clippy::missing_const_for_fn)] // Functions may need mutations in the future
#![allow(clippy::collapsible_if)] // Sometimes clearer to have separate conditions
#![allow(clippy::missing_panics_doc)] // Panics are converted to proper errors where needed
#![allow(clippy::needless_borrows_for_generic_args)] // Sometimes clearer with explicit borrows
#![allow(clippy::if_same_then_else)] // Similar blocks may diverge in the future
#![allow(clippy::unnecessary_cast)] // Explicit casts for clarity
#![allow(clippy::identity_op)] // Explicit operations for clarity

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::box_collection)] // Warns on boxed `Vec`, `String`, etc.
#![warn(clippy::vec_box)] // Avoids using `Vec<Box<T>>` when unnecessary
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::identity_op)] // e.g., `x + 0`, `x * 1`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::let_unit_value)] // Avoids binding `()` to variables
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`
#![warn(clippy::panic)] // Avoids using `panic!` in production code

// Maintainability
#![warn(clippy::missing_panics_doc)] // Docs for functions that might panic
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions
#![warn(clippy::missing_const_for_fn)] // Suggests making eligible functions `const`
#![allow(clippy::too_many_arguments)] // Allow functions with many parameters (very few and far between)

//! Read and write PCM and IEEE-float WAV files.
//!
//! Frames are exposed as `Vec`s holding one sample per channel, either as
//! tagged native [`Sample`]s, integers at the file's bit depth, or floats in
//! `[-1, 1)`. PCM depths of 8, 16, 24, 32 and 64 bits and float depths of 32
//! and 64 bits are supported, with `LIST`/`INFO` metadata and frame-accurate
//! seeking on both read and write sessions.
//!
//! ```no_run
//! use wavfile::{WavFormat, WriteSpec};
//!
//! let frames = vec![vec![100i64, -100], vec![0, 0], vec![32_767, -32_768]];
//! wavfile::write_int("out.wav", &frames, WriteSpec::new(44_100, 16, WavFormat::Pcm), None)?;
//!
//! let (back, sample_rate, bits) = wavfile::read_int("out.wav")?;
//! assert_eq!(back, frames);
//! # Ok::<(), wavfile::WavFileError>(())
//! ```

pub mod channels;
pub mod codec;
pub mod convert;
pub mod error;
pub mod traits;
pub mod types;
pub mod wav;

use std::{
    fs::File,
    io::{BufWriter, Read, Seek},
    path::Path,
};

pub use crate::{
    channels::{join, split},
    codec::SampleLayout,
    error::{WavFileError, WavResult},
    traits::{AudioStreamReader, AudioStreamWriter},
    types::{FileSource, FormatDescriptor, Frames, OpenOptions, Sample, WriteSpec},
    wav::{AppendOnly, BlockIter, InfoKey, MetadataMap, WavFormat, WavRead, WavWrite},
};

/// Convenience trait for types that implement both Read and Seek
pub trait ReadSeek: Read + Seek {}

impl<RS: Read + Seek> ReadSeek for RS where RS: Read + Seek {}

// Public API

/// Open a WAV file for reading, memory-mapped where possible.
pub fn open_read<P: AsRef<Path>>(fp: P) -> WavResult<WavRead<FileSource>> {
    open_read_with_options(fp, OpenOptions::default())
}

/// Open a WAV file for reading with explicit [`OpenOptions`].
pub fn open_read_with_options<P: AsRef<Path>>(
    fp: P,
    options: OpenOptions,
) -> WavResult<WavRead<FileSource>> {
    let source = FileSource::open(fp.as_ref(), options)?;
    WavRead::new(source)
}

/// Create (or truncate) a WAV file and open a write session on it.
///
/// # Example
///
/// ```no_run
/// use wavfile::{WavFormat, WriteSpec};
///
/// let mut wav = wavfile::create("out.wav", WriteSpec::new(22_050, 16, WavFormat::Pcm))?;
/// wav.write_int(&[[0i64, 0], [1_000, -1_000]])?;
/// wav.close()?;
/// # Ok::<(), wavfile::WavFileError>(())
/// ```
pub fn create<P: AsRef<Path>>(fp: P, spec: WriteSpec) -> WavResult<WavWrite<BufWriter<File>>> {
    let file = File::create(fp.as_ref())?;
    WavWrite::new(BufWriter::new(file), spec)
}

/// Read every frame of a file in its native domain.
///
/// Returns `(frames, sample_rate, bits_per_sample)`.
pub fn read<P: AsRef<Path>>(fp: P) -> WavResult<(Frames<Sample>, u32, u16)> {
    let mut wav = open_read(fp)?;
    let frames = wav.read(None)?;
    Ok((frames, wav.sample_rate(), wav.bits_per_sample()))
}

/// Read every frame as integers at the file's bit depth.
pub fn read_int<P: AsRef<Path>>(fp: P) -> WavResult<(Frames<i64>, u32, u16)> {
    let mut wav = open_read(fp)?;
    let frames = wav.read_int(None)?;
    Ok((frames, wav.sample_rate(), wav.bits_per_sample()))
}

/// Read every frame as floats in `[-1, 1)`.
pub fn read_float<P: AsRef<Path>>(fp: P) -> WavResult<(Frames<f64>, u32, u16)> {
    let mut wav = open_read(fp)?;
    let frames = wav.read_float(None)?;
    Ok((frames, wav.sample_rate(), wav.bits_per_sample()))
}

fn write_session<P: AsRef<Path>>(
    fp: P,
    spec: WriteSpec,
    metadata: Option<&MetadataMap>,
) -> WavResult<WavWrite<BufWriter<File>>> {
    let mut wav = create(fp, spec)?;
    if let Some(metadata) = metadata {
        wav.add_metadata(metadata.clone())?;
    }
    Ok(wav)
}

/// Write a complete file from tagged samples.
pub fn write<P, F>(
    fp: P,
    frames: &[F],
    spec: WriteSpec,
    metadata: Option<&MetadataMap>,
) -> WavResult<()>
where
    P: AsRef<Path>,
    F: AsRef<[Sample]>,
{
    let mut wav = write_session(fp, spec, metadata)?;
    wav.write(frames)?;
    wav.close()
}

/// Write a complete file from integers at `spec.bits_per_sample`.
pub fn write_int<P, F>(
    fp: P,
    frames: &[F],
    spec: WriteSpec,
    metadata: Option<&MetadataMap>,
) -> WavResult<()>
where
    P: AsRef<Path>,
    F: AsRef<[i64]>,
{
    let mut wav = write_session(fp, spec, metadata)?;
    wav.write_int(frames)?;
    wav.close()
}

/// Write a complete file from floats in `[-1, 1)`.
pub fn write_float<P, F>(
    fp: P,
    frames: &[F],
    spec: WriteSpec,
    metadata: Option<&MetadataMap>,
) -> WavResult<()>
where
    P: AsRef<Path>,
    F: AsRef<[f64]>,
{
    let mut wav = write_session(fp, spec, metadata)?;
    wav.write_float(frames)?;
    wav.close()
}
