//! RIFF/WAVE container parsing and positioned access to the `data` chunk.
//!
//! `ChunkReader` walks the top-level chunks once on open, validates the
//! `fmt ` chunk, collects INFO metadata from any `LIST` chunk, and records
//! where the audio payload lives. Reads afterwards only touch the payload.

use std::io::SeekFrom;

use log::{debug, warn};

use crate::{
    ReadSeek,
    codec::SampleLayout,
    error::{ErrorPosition, WavFileError, WavResult},
    types::FormatDescriptor,
    wav::{
        chunks::{
            CHUNK_HEADER_SIZE, ChunkHeader, ChunkID, ChunkKind, RIFF_CHUNK, UNKNOWN_LENGTH,
            WAVE_CHUNK,
        },
        fmt::FmtChunk,
        info::MetadataMap,
    },
};

/// Parsed container with a cursor into the audio payload.
#[derive(Debug)]
pub struct ChunkReader<R: ReadSeek> {
    reader: R,
    descriptor: FormatDescriptor,
    layout: SampleLayout,
    metadata: Option<MetadataMap>,
    /// Absolute stream offset of the first payload byte
    data_offset: u64,
    /// Payload length in bytes, always a whole number of frames
    data_len: u64,
    /// Byte offset inside the payload; may run past `data_len` after a seek
    cursor: u64,
}

impl<R: ReadSeek> ChunkReader<R> {
    /// Parse the container headers and position the cursor on frame 0.
    ///
    /// # Errors
    ///
    /// - `MalformedHeader` for a bad RIFF/WAVE preamble or inconsistent `fmt ` fields
    /// - `MissingChunk` when `fmt ` or `data` is absent
    /// - `UnsupportedFormat` for encodings or depths outside the supported set
    /// - `TruncatedData` when the payload is not a whole number of frames or
    ///   extends past the end of the stream
    pub fn open(mut reader: R) -> WavResult<Self> {
        let stream_len = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;

        if stream_len < 12 {
            return Err(WavFileError::malformed_header(
                "Stream too small to be a valid WAV file",
                format!("Stream holds {} bytes", stream_len),
                ErrorPosition::new(0).with_description("start of stream"),
            ));
        }

        let mut preamble = [0u8; 12];
        reader.read_exact(&mut preamble)?;

        let riff = ChunkID::new(&[preamble[0], preamble[1], preamble[2], preamble[3]]);
        if riff != RIFF_CHUNK {
            return Err(WavFileError::malformed_header(
                "Data does not start with RIFF header",
                format!("Found: {}", riff),
                ErrorPosition::new(0).with_description("RIFF header at stream start"),
            ));
        }
        let riff_size = u32::from_le_bytes([preamble[4], preamble[5], preamble[6], preamble[7]]);
        let wave = ChunkID::new(&[preamble[8], preamble[9], preamble[10], preamble[11]]);
        if wave != WAVE_CHUNK {
            return Err(WavFileError::malformed_header(
                "Data does not contain WAVE identifier",
                format!("Found: {}", wave),
                ErrorPosition::new(8).with_description("WAVE identifier"),
            ));
        }

        let riff_end = if riff_size == UNKNOWN_LENGTH {
            stream_len
        } else {
            (riff_size as u64 + CHUNK_HEADER_SIZE).min(stream_len)
        };

        let mut fmt: Option<(Vec<u8>, u64)> = None;
        let mut data: Option<(u64, u32)> = None;
        let mut metadata: Option<MetadataMap> = None;
        let mut pos = 12u64;

        while pos + CHUNK_HEADER_SIZE <= riff_end {
            reader.seek(SeekFrom::Start(pos))?;
            let Some(header) = ChunkHeader::read_from(&mut reader)? else {
                break;
            };
            let body_offset = pos + CHUNK_HEADER_SIZE;

            match header.kind() {
                ChunkKind::Fmt if fmt.is_none() => {
                    let body = read_body(&mut reader, header, body_offset, stream_len)?;
                    fmt = Some((body, body_offset));
                }
                ChunkKind::Data if data.is_none() => {
                    data = Some((body_offset, header.size));
                    if header.size == UNKNOWN_LENGTH {
                        // Payload runs to the end of the stream, nothing follows it.
                        break;
                    }
                }
                ChunkKind::List => {
                    let body = read_body(&mut reader, header, body_offset, stream_len)?;
                    if let Some(map) = MetadataMap::parse_list(&body) {
                        metadata = Some(map);
                    }
                }
                _ => debug!("Skipping {} chunk at offset {}", header, pos),
            }

            pos = body_offset + header.padded_size();
        }

        let (fmt_body, fmt_offset) = fmt.ok_or_else(|| {
            WavFileError::missing_chunk("fmt chunk not found in WAV stream")
        })?;
        let (data_offset, declared_size) = data.ok_or_else(|| {
            WavFileError::missing_chunk("data chunk not found in WAV stream")
        })?;

        let descriptor = FmtChunk::from_bytes(&fmt_body, fmt_offset)?.descriptor(fmt_offset)?;
        let layout = descriptor.layout()?;
        let frame_size = descriptor.frame_size() as u64;

        let data_len = if declared_size == UNKNOWN_LENGTH {
            let available = stream_len.saturating_sub(data_offset);
            warn!(
                "data chunk has unknown length; reading {} bytes to end of stream",
                available
            );
            available - available % frame_size
        } else {
            let declared = declared_size as u64;
            if data_offset + declared > stream_len {
                return Err(WavFileError::truncated_data(format!(
                    "data chunk declares {} bytes but only {} remain in the stream",
                    declared,
                    stream_len.saturating_sub(data_offset)
                )));
            }
            if declared % frame_size != 0 {
                return Err(WavFileError::truncated_data(format!(
                    "data chunk of {} bytes is not a whole number of {}-byte frames",
                    declared, frame_size
                )));
            }
            declared
        };

        reader.seek(SeekFrom::Start(data_offset))?;

        debug!(
            "Opened WAV stream: {}, {} frames at offset {}",
            descriptor,
            data_len / frame_size,
            data_offset
        );

        Ok(ChunkReader {
            reader,
            descriptor,
            layout,
            metadata,
            data_offset,
            data_len,
            cursor: 0,
        })
    }

    #[inline]
    pub const fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    #[inline]
    pub const fn layout(&self) -> SampleLayout {
        self.layout
    }

    pub const fn metadata(&self) -> Option<&MetadataMap> {
        self.metadata.as_ref()
    }

    #[inline]
    const fn frame_size(&self) -> u64 {
        self.descriptor.frame_size() as u64
    }

    /// Total number of frames in the payload.
    #[inline]
    pub const fn num_frames(&self) -> u64 {
        self.data_len / self.frame_size()
    }

    /// Current frame index; may exceed `num_frames()` after seeking past the end.
    #[inline]
    pub const fn frame_position(&self) -> u64 {
        self.cursor / self.frame_size()
    }

    #[inline]
    pub const fn remaining_frames(&self) -> u64 {
        self.num_frames().saturating_sub(self.frame_position())
    }

    /// Read up to `max_frames` whole frames (all remaining when `None`).
    ///
    /// Returns the raw payload bytes and the number of frames they hold.
    /// At or past the end of the payload this returns no bytes.
    pub fn read_frame_bytes(&mut self, max_frames: Option<usize>) -> WavResult<(Vec<u8>, usize)> {
        let remaining = self.remaining_frames();
        let frames = match max_frames {
            Some(n) => (n as u64).min(remaining),
            None => remaining,
        } as usize;
        if frames == 0 {
            return Ok((Vec::new(), 0));
        }

        let mut bytes = vec![0u8; frames * self.descriptor.frame_size()];
        self.reader.read_exact(&mut bytes).map_err(|e| {
            WavFileError::from_read(e, "stream ended inside the data chunk")
        })?;
        self.cursor += bytes.len() as u64;
        Ok((bytes, frames))
    }

    /// Move the cursor in frame units. Positions past the end are allowed.
    ///
    /// # Errors
    ///
    /// `SeekRange` if the resulting position would be negative.
    pub fn seek(&mut self, pos: SeekFrom) -> WavResult<u64> {
        let target: i128 = match pos {
            SeekFrom::Start(frame) => frame as i128,
            SeekFrom::Current(delta) => self.frame_position() as i128 + delta as i128,
            SeekFrom::End(delta) => self.num_frames() as i128 + delta as i128,
        };
        if target < 0 {
            return Err(WavFileError::seek_range(format!(
                "{:?} resolves to frame {}, before the start of the data",
                pos, target
            )));
        }
        let frame = u64::try_from(target)
            .map_err(|_| WavFileError::seek_range(format!("frame {} is out of range", target)))?;
        self.seek_frame(frame)
    }

    /// Position the cursor on an absolute frame index.
    pub fn seek_frame(&mut self, frame: u64) -> WavResult<u64> {
        let cursor = frame.checked_mul(self.frame_size()).ok_or_else(|| {
            WavFileError::seek_range(format!("frame {} is out of range", frame))
        })?;
        self.reader
            .seek(SeekFrom::Start(self.data_offset + cursor.min(self.data_len)))?;
        self.cursor = cursor;
        Ok(frame)
    }

    pub const fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Release the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

fn read_body<R: ReadSeek>(
    reader: &mut R,
    header: ChunkHeader,
    body_offset: u64,
    stream_len: u64,
) -> WavResult<Vec<u8>> {
    let size = header.size as u64;
    if body_offset + size > stream_len {
        return Err(WavFileError::truncated_data(format!(
            "{} chunk at offset {} extends past the end of the stream",
            header.id,
            body_offset - CHUNK_HEADER_SIZE
        )));
    }
    let mut body = vec![0u8; size as usize];
    reader
        .read_exact(&mut body)
        .map_err(|e| WavFileError::from_read(e, format!("{} chunk body", header.id)))?;
    Ok(body)
}
