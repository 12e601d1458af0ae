//! Incremental RIFF/WAVE writer.
//!
//! The preamble and `fmt ` chunk go out on open with `0xFFFFFFFF` size
//! placeholders. The `data` header is emitted lazily so metadata supplied
//! before any audio can precede it. `finalize()` back-patches the sizes,
//! which requires a seekable store; on an append-only store the file keeps
//! its unknown-length header and readers take the payload to end of stream.

use std::io::{self, Seek, SeekFrom, Write};

use log::{debug, warn};

use crate::{
    codec::SampleLayout,
    error::{WavFileError, WavResult},
    types::WriteSpec,
    wav::{
        chunks::{ChunkHeader, DATA_CHUNK, FMT_CHUNK, RIFF_CHUNK, UNKNOWN_LENGTH, WAVE_CHUNK},
        fmt::{FMT_BODY_SIZE, fmt_body},
        info::MetadataMap,
    },
};

/// Offset of the RIFF size field relative to the start of the file
const RIFF_SIZE_OFFSET: u64 = 4;
/// Offset of the `fmt ` body relative to the start of the file
const FMT_BODY_OFFSET: u64 = 20;

/// Adapter presenting a plain [`Write`] sink as an unseekable store.
///
/// Every seek fails, so a [`ChunkWriter`] over it streams with unknown-length
/// headers and cannot finalize.
#[derive(Debug, Default)]
pub struct AppendOnly<W: Write> {
    inner: W,
}

impl<W: Write> AppendOnly<W> {
    pub const fn new(inner: W) -> Self {
        AppendOnly { inner }
    }

    pub const fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for AppendOnly<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W: Write> Seek for AppendOnly<W> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "append-only stream cannot seek",
        ))
    }
}

#[derive(Debug)]
pub struct ChunkWriter<W: Write + Seek> {
    writer: W,
    layout: SampleLayout,
    sample_rate: u32,
    channels: Option<u16>,
    /// Channel count was unknown when the `fmt ` chunk was emitted
    channels_deferred: bool,
    /// Stream offset of the RIFF header; `None` when the store cannot seek
    base: Option<u64>,
    fmt_written: bool,
    /// Bytes emitted ahead of the payload
    head_len: u64,
    /// Offset of the payload relative to the RIFF header, once the `data` header is out
    data_start: Option<u64>,
    data_len: u64,
    /// Write position inside the payload, in bytes
    cursor: u64,
    leading_metadata: Option<MetadataMap>,
    trailing_metadata: Option<MetadataMap>,
    metadata_set: bool,
    finalized: bool,
}

impl<W: Write + Seek> ChunkWriter<W> {
    /// Validate `spec`, probe the store for seekability and emit the file preamble.
    pub fn open(mut writer: W, spec: WriteSpec) -> WavResult<Self> {
        let layout = spec.validate()?;
        let base = writer.stream_position().ok();
        if base.is_none() {
            debug!("Store is not seekable; writing unknown-length WAV headers");
        }

        let mut chunk_writer = ChunkWriter {
            writer,
            layout,
            sample_rate: spec.sample_rate,
            channels: spec.num_channels,
            channels_deferred: spec.num_channels.is_none(),
            base,
            fmt_written: false,
            head_len: 0,
            data_start: None,
            data_len: 0,
            cursor: 0,
            leading_metadata: None,
            trailing_metadata: None,
            metadata_set: false,
            finalized: false,
        };

        chunk_writer.emit(&ChunkHeader::new(RIFF_CHUNK, UNKNOWN_LENGTH).to_bytes())?;
        chunk_writer.emit(WAVE_CHUNK.as_bytes())?;
        // Append-only stores emit fmt once the first frame binds the channel count
        if chunk_writer.channels.is_some() || chunk_writer.is_seekable() {
            chunk_writer.emit_fmt()?;
        }
        Ok(chunk_writer)
    }

    fn emit(&mut self, bytes: &[u8]) -> WavResult<()> {
        self.writer.write_all(bytes)?;
        self.head_len += bytes.len() as u64;
        Ok(())
    }

    fn emit_fmt(&mut self) -> WavResult<()> {
        let body = fmt_body(self.layout, self.channels.unwrap_or(0), self.sample_rate)?;
        self.emit(&ChunkHeader::new(FMT_CHUNK, FMT_BODY_SIZE as u32).to_bytes())?;
        self.emit(&body)?;
        self.fmt_written = true;
        Ok(())
    }

    /// Emit everything that precedes the payload, once.
    fn begin_data(&mut self) -> WavResult<u64> {
        if let Some(start) = self.data_start {
            return Ok(start);
        }
        if !self.fmt_written {
            self.emit_fmt()?;
        }
        if let Some(map) = self.leading_metadata.take() {
            let written = map.write_list_chunk(&mut self.writer)?;
            self.head_len += written;
        }
        self.emit(&ChunkHeader::new(DATA_CHUNK, UNKNOWN_LENGTH).to_bytes())?;
        self.data_start = Some(self.head_len);
        Ok(self.head_len)
    }

    fn ensure_open(&self) -> WavResult<()> {
        if self.finalized {
            return Err(WavFileError::closed_stream("WAV writer has been finalized"));
        }
        Ok(())
    }

    #[inline]
    pub const fn layout(&self) -> SampleLayout {
        self.layout
    }

    #[inline]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count, `None` until the first frame when it was deferred.
    #[inline]
    pub const fn num_channels(&self) -> Option<u16> {
        self.channels
    }

    #[inline]
    pub const fn is_seekable(&self) -> bool {
        self.base.is_some()
    }

    #[inline]
    pub const fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn frame_size(&self) -> Option<u64> {
        self.channels
            .map(|c| c as u64 * self.layout.bytes_per_sample() as u64)
    }

    pub fn frames_written(&self) -> u64 {
        self.frame_size().map_or(0, |fs| self.data_len / fs)
    }

    pub fn frame_position(&self) -> u64 {
        self.frame_size().map_or(0, |fs| self.cursor / fs)
    }

    /// Attach INFO metadata. Allowed once per file.
    ///
    /// Before the first frame it is written ahead of the `data` chunk;
    /// afterwards it is held and written after the payload on finalize.
    pub fn set_metadata(&mut self, metadata: MetadataMap) -> WavResult<()> {
        self.ensure_open()?;
        if self.metadata_set {
            return Err(WavFileError::invalid_metadata(
                "metadata has already been added to this file",
            ));
        }
        self.metadata_set = true;
        if self.data_start.is_none() {
            self.leading_metadata = Some(metadata);
        } else {
            self.trailing_metadata = Some(metadata);
        }
        Ok(())
    }

    /// Append (or overwrite, after a backward seek) interleaved frames.
    ///
    /// `width` is the number of samples per frame in `bytes`. The first call
    /// binds the channel count when it was deferred.
    pub fn write_frame_bytes(&mut self, bytes: &[u8], width: usize) -> WavResult<usize> {
        self.ensure_open()?;
        let binding = match self.channels {
            Some(channels) if channels as usize != width => {
                return Err(WavFileError::channel_mismatch(channels as usize, width));
            }
            Some(_) => None,
            None => {
                let channels = u16::try_from(width)
                    .ok()
                    .filter(|&c| c > 0)
                    .ok_or_else(|| {
                        WavFileError::unsupported_format(format!(
                            "cannot bind a channel count from {}-sample frames",
                            width
                        ))
                    })?;
                self.layout.block_align(channels)?;
                Some(channels)
            }
        };

        let frame_size = width * self.layout.bytes_per_sample();
        if bytes.len() % frame_size != 0 {
            return Err(WavFileError::truncated_data(format!(
                "{} bytes is not a whole number of {}-byte frames",
                bytes.len(),
                frame_size
            )));
        }

        if let Some(channels) = binding {
            debug!("Channel count bound to {} by first write", channels);
            self.channels = Some(channels);
        }

        self.begin_data()?;
        self.writer.write_all(bytes)?;
        self.cursor += bytes.len() as u64;
        self.data_len = self.data_len.max(self.cursor);
        Ok(bytes.len() / frame_size)
    }

    /// Move the write position to `frame`, which may not lie past the frames
    /// already written.
    pub fn seek_frame(&mut self, frame: u64) -> WavResult<u64> {
        self.ensure_open()?;
        let Some(base) = self.base else {
            return Err(WavFileError::unseekable_store(
                "cannot reposition an append-only WAV writer",
            ));
        };
        let written = self.frames_written();
        if frame > written {
            return Err(WavFileError::seek_range(format!(
                "frame {} is past the {} frames written",
                frame, written
            )));
        }
        let Some(frame_size) = self.frame_size() else {
            // nothing written yet, frame is 0
            return Ok(0);
        };
        let data_start = self.begin_data()?;
        let cursor = frame * frame_size;
        self.writer.seek(SeekFrom::Start(base + data_start + cursor))?;
        self.cursor = cursor;
        Ok(frame)
    }

    pub fn flush(&mut self) -> WavResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    /// Complete the file: pad the payload, write trailing metadata and
    /// back-patch every size field. Idempotent.
    ///
    /// # Errors
    ///
    /// `UnseekableStore` on an append-only store. The stream is flushed but
    /// otherwise left as is.
    pub fn finalize(&mut self) -> WavResult<()> {
        if self.finalized {
            return Ok(());
        }
        let Some(base) = self.base else {
            self.finalized = true;
            self.writer.flush()?;
            return Err(WavFileError::unseekable_store(
                "size fields cannot be patched on an append-only store",
            ));
        };

        if self.channels.is_none() {
            debug!("No frames written; recording the file as mono");
            self.channels = Some(1);
        }
        let data_start = self.begin_data()?;

        let data_end = base + data_start + self.data_len;
        self.writer.seek(SeekFrom::Start(data_end))?;
        if self.data_len % 2 == 1 {
            self.writer.write_all(&[0])?;
        }
        if let Some(map) = self.trailing_metadata.take() {
            map.write_list_chunk(&mut self.writer)?;
        }
        let end = self.writer.stream_position()?;

        let riff_size = size_field(end - base - 8);
        let data_size = size_field(self.data_len);

        self.writer.seek(SeekFrom::Start(base + RIFF_SIZE_OFFSET))?;
        self.writer.write_all(&riff_size.to_le_bytes())?;

        self.writer.seek(SeekFrom::Start(base + data_start - 4))?;
        self.writer.write_all(&data_size.to_le_bytes())?;

        if self.channels_deferred {
            let body = fmt_body(self.layout, self.channels.unwrap_or(1), self.sample_rate)?;
            self.writer.seek(SeekFrom::Start(base + FMT_BODY_OFFSET))?;
            self.writer.write_all(&body)?;
        }

        self.writer.seek(SeekFrom::Start(end))?;
        self.writer.flush()?;
        self.finalized = true;

        debug!(
            "Finalized WAV file: {} frames, {} bytes",
            self.frames_written(),
            end - base
        );
        Ok(())
    }

    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Release the underlying stream without finalizing.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Sizes beyond the 32-bit field are recorded as unknown length.
fn size_field(size: u64) -> u32 {
    u32::try_from(size).unwrap_or_else(|_| {
        warn!("size {} does not fit a RIFF size field; writing unknown length", size);
        UNKNOWN_LENGTH
    })
}
