use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use memmap2::{Mmap, MmapOptions};

use crate::{
    codec::SampleLayout,
    error::{ErrorPosition, WavFileError, WavResult},
    wav::WavFormat,
};

/// A batch of frames, one inner `Vec` per frame holding one sample per channel.
pub type Frames<T> = Vec<Vec<T>>;

/// A single sample tagged with the domain it lives in.
///
/// Integer samples are always signed, with `value` inside
/// `[-2^(bits-1), 2^(bits-1) - 1]`. Float samples are nominally in `[-1, 1)`
/// and `bits` records the width they were stored with (32 or 64).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    Int { bits: u16, value: i64 },
    Float { bits: u16, value: f64 },
}

impl Sample {
    pub const fn int(bits: u16, value: i64) -> Self {
        Sample::Int { bits, value }
    }

    pub const fn float(bits: u16, value: f64) -> Self {
        Sample::Float { bits, value }
    }

    /// Width of the domain this sample belongs to
    pub const fn bits(&self) -> u16 {
        match self {
            Sample::Int { bits, .. } | Sample::Float { bits, .. } => *bits,
        }
    }

    pub const fn is_float(&self) -> bool {
        matches!(self, Sample::Float { .. })
    }
}

impl From<i16> for Sample {
    fn from(value: i16) -> Self {
        Sample::int(16, value as i64)
    }
}

impl From<i32> for Sample {
    fn from(value: i32) -> Self {
        Sample::int(32, value as i64)
    }
}

impl From<f32> for Sample {
    fn from(value: f32) -> Self {
        Sample::float(32, value as f64)
    }
}

impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Sample::float(64, value)
    }
}

impl Display for Sample {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Sample::Int { bits, value } => write!(f, "{} (i{})", value, bits),
            Sample::Float { bits, value } => write!(f, "{} (f{})", value, bits),
        }
    }
}

/// Format of the audio payload, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FormatDescriptor {
    pub format: WavFormat,
    pub num_channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl FormatDescriptor {
    /// Build a descriptor and check it against the supported layouts.
    pub fn new(
        format: WavFormat,
        num_channels: u16,
        sample_rate: u32,
        bits_per_sample: u16,
    ) -> WavResult<Self> {
        let descriptor = FormatDescriptor {
            format,
            num_channels,
            sample_rate,
            bits_per_sample,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    pub fn validate(&self) -> WavResult<()> {
        if self.num_channels == 0 {
            return Err(WavFileError::malformed_header(
                "Invalid channel count",
                "Channels cannot be zero",
                ErrorPosition::default().with_description("format descriptor"),
            ));
        }
        if self.sample_rate == 0 {
            return Err(WavFileError::malformed_header(
                "Invalid sample rate",
                "Sample rate cannot be zero",
                ErrorPosition::default().with_description("format descriptor"),
            ));
        }
        SampleLayout::new(self.format, self.bits_per_sample)?;
        Ok(())
    }

    /// The validated codec layout for this descriptor.
    pub fn layout(&self) -> WavResult<SampleLayout> {
        SampleLayout::new(self.format, self.bits_per_sample)
    }

    pub const fn byte_depth(&self) -> usize {
        self.bits_per_sample as usize / 8
    }

    /// Bytes per frame (block align)
    pub const fn frame_size(&self) -> usize {
        self.byte_depth() * self.num_channels as usize
    }

    pub const fn byte_rate(&self) -> u32 {
        self.sample_rate * self.frame_size() as u32
    }
}

impl Display for FormatDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} | {} Hz, {} ch, {}-bit",
            self.format, self.sample_rate, self.num_channels, self.bits_per_sample
        )
    }
}

/// Duration of `num_frames` frames at `sample_rate`.
pub fn frames_to_duration(num_frames: u64, sample_rate: u32) -> Duration {
    if sample_rate == 0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(num_frames as f64 / sample_rate as f64)
}

/// Format a duration as `h:mm:ss.ss`.
pub fn format_hms(duration: Duration) -> String {
    let total = duration.as_secs_f64();
    let hours = (total / 3600.0).floor() as u64;
    let minutes = ((total - hours as f64 * 3600.0) / 60.0).floor() as u64;
    let seconds = total - hours as f64 * 3600.0 - minutes as f64 * 60.0;
    format!("{}:{:02}:{:05.2}", hours, minutes, seconds)
}

/// Parameters for a new WAV file.
///
/// `num_channels` may be left unset, in which case it is taken from the
/// width of the first batch of frames written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteSpec {
    pub sample_rate: u32,
    pub num_channels: Option<u16>,
    pub bits_per_sample: u16,
    pub format: WavFormat,
}

impl Default for WriteSpec {
    fn default() -> Self {
        WriteSpec {
            sample_rate: 44_100,
            num_channels: None,
            bits_per_sample: 16,
            format: WavFormat::Pcm,
        }
    }
}

impl WriteSpec {
    pub const fn new(sample_rate: u32, bits_per_sample: u16, format: WavFormat) -> Self {
        WriteSpec {
            sample_rate,
            num_channels: None,
            bits_per_sample,
            format,
        }
    }

    pub const fn with_channels(mut self, num_channels: u16) -> Self {
        self.num_channels = Some(num_channels);
        self
    }

    pub(crate) fn validate(&self) -> WavResult<SampleLayout> {
        if self.sample_rate == 0 {
            return Err(WavFileError::malformed_header(
                "Invalid sample rate",
                "Sample rate cannot be zero",
                ErrorPosition::default().with_description("write spec"),
            ));
        }
        if self.num_channels == Some(0) {
            return Err(WavFileError::malformed_header(
                "Invalid channel count",
                "Channel count must be at least 1",
                ErrorPosition::default().with_description("write spec"),
            ));
        }
        let layout = SampleLayout::new(self.format, self.bits_per_sample)?;
        if let Some(channels) = self.num_channels {
            layout.block_align(channels)?;
        }
        Ok(layout)
    }
}

/// Options for opening files by path.
#[derive(Debug, Clone, Copy)]
pub struct OpenOptions {
    pub use_memory_map: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions {
            use_memory_map: true,
        }
    }
}

/// Byte source backing a path-opened reader.
///
/// Remembers the path it was opened from so that [`reopen`](FileSource::reopen)
/// can hand out further independent sources over the same file.
pub struct FileSource {
    path: PathBuf,
    backing: Backing,
}

enum Backing {
    /// Memory-mapped file (zero-copy, OS-backed)
    MemoryMapped(Cursor<Mmap>),
    /// Buffered file handle
    Buffered(BufReader<File>),
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P, options: OpenOptions) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        // Empty files cannot be mapped on every platform.
        let backing = if options.use_memory_map && file.metadata()?.len() > 0 {
            // SAFETY: the map is read-only and owned by this source; callers must not
            // truncate the file while it is open.
            let mmap = unsafe { MmapOptions::new().map(&file)? };
            Backing::MemoryMapped(Cursor::new(mmap))
        } else {
            Backing::Buffered(BufReader::new(file))
        };
        Ok(FileSource {
            path: path.to_path_buf(),
            backing,
        })
    }

    /// Open the same path again with the same backing, positioned at the start.
    ///
    /// The new source shares no cursor or buffer with this one.
    pub fn reopen(&self) -> io::Result<Self> {
        FileSource::open(
            &self.path,
            OpenOptions {
                use_memory_map: self.is_memory_mapped(),
            },
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub const fn is_memory_mapped(&self) -> bool {
        matches!(self.backing, Backing::MemoryMapped(_))
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.backing {
            Backing::MemoryMapped(cursor) => cursor.read(buf),
            Backing::Buffered(reader) => reader.read(buf),
        }
    }
}

impl Seek for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match &mut self.backing {
            Backing::MemoryMapped(cursor) => cursor.seek(pos),
            Backing::Buffered(reader) => reader.seek(pos),
        }
    }
}

impl Debug for FileSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.backing {
            Backing::MemoryMapped(cursor) => f
                .debug_struct("FileSource::MemoryMapped")
                .field("path", &self.path)
                .field("len", &cursor.get_ref().len())
                .finish(),
            Backing::Buffered(_) => f
                .debug_struct("FileSource::Buffered")
                .field("path", &self.path)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_sizes() {
        let d = FormatDescriptor::new(WavFormat::Pcm, 2, 44_100, 24).unwrap();
        assert_eq!(d.byte_depth(), 3);
        assert_eq!(d.frame_size(), 6);
        assert_eq!(d.byte_rate(), 264_600);
    }

    #[test]
    fn test_descriptor_rejects_unsupported_float_depth() {
        let err = FormatDescriptor::new(WavFormat::IeeeFloat, 1, 48_000, 16).unwrap_err();
        assert!(matches!(err, WavFileError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_write_spec_defaults() {
        let spec = WriteSpec::default();
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.num_channels, None);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.format, WavFormat::Pcm);
    }

    #[test]
    fn test_write_spec_rejects_frames_past_block_align_limit() {
        let spec = WriteSpec::new(8_000, 64, WavFormat::Pcm);
        assert_eq!(spec.with_channels(8191).validate().unwrap(), SampleLayout::I64);
        let err = spec.with_channels(8192).validate().unwrap_err();
        assert!(matches!(err, WavFileError::UnsupportedFormat(_)));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(Duration::from_secs_f64(3723.5)), "1:02:03.50");
        assert_eq!(format_hms(Duration::ZERO), "0:00:00.00");
    }
}
