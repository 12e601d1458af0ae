//! Read sessions over a WAV stream.

use std::io::SeekFrom;
use std::time::Duration;

use crate::{
    ReadSeek, convert,
    error::{WavFileError, WavResult},
    traits::AudioStreamReader,
    types::{FileSource, FormatDescriptor, Frames, Sample, format_hms, frames_to_duration},
    wav::{WavFormat, chunk_reader::ChunkReader, info::MetadataMap},
};

/// An open WAV file being read.
///
/// Frames come back as `Vec`s holding one sample per channel, in one of
/// three domains: native tagged samples, integers at the file's depth, or
/// floats in `[-1, 1)`. Short reads at the end of the data are not errors.
///
/// # Example
///
/// ```no_run
/// let mut wav = wavfile::open_read("song.wav")?;
/// println!("{} Hz, {} channels, {}", wav.sample_rate(), wav.num_channels(), wav.hms());
/// for block in wav.iter_float(1024) {
///     let block = block?;
///     // process block...
/// }
/// wav.close();
/// # Ok::<(), wavfile::WavFileError>(())
/// ```
#[derive(Debug)]
pub struct WavRead<R: ReadSeek> {
    /// `None` once closed
    reader: Option<ChunkReader<R>>,
    descriptor: FormatDescriptor,
    num_frames: u64,
    metadata: Option<MetadataMap>,
}

impl<R: ReadSeek> WavRead<R> {
    /// Parse the headers of `stream` and position on the first frame.
    pub fn new(stream: R) -> WavResult<Self> {
        let reader = ChunkReader::open(stream)?;
        Ok(WavRead {
            descriptor: *reader.descriptor(),
            num_frames: reader.num_frames(),
            metadata: reader.metadata().cloned(),
            reader: Some(reader),
        })
    }

    fn open_reader(&mut self) -> WavResult<&mut ChunkReader<R>> {
        self.reader
            .as_mut()
            .ok_or_else(|| WavFileError::closed_stream("WAV reader has been closed"))
    }

    pub const fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    pub const fn format(&self) -> WavFormat {
        self.descriptor.format
    }

    pub const fn num_channels(&self) -> u16 {
        self.descriptor.num_channels
    }

    pub const fn sample_rate(&self) -> u32 {
        self.descriptor.sample_rate
    }

    pub const fn bits_per_sample(&self) -> u16 {
        self.descriptor.bits_per_sample
    }

    /// Number of frames in the file
    pub const fn num_frames(&self) -> u64 {
        self.num_frames
    }

    pub fn duration(&self) -> Duration {
        frames_to_duration(self.num_frames, self.descriptor.sample_rate)
    }

    /// Duration as `h:mm:ss.ss`
    pub fn hms(&self) -> String {
        format_hms(self.duration())
    }

    /// INFO metadata, `None` when the file carries no `LIST`/`INFO` chunk.
    pub const fn metadata(&self) -> Option<&MetadataMap> {
        self.metadata.as_ref()
    }

    /// Read up to `frames` frames (all remaining when `None`) in the native domain.
    pub fn read(&mut self, frames: Option<usize>) -> WavResult<Frames<Sample>> {
        let reader = self.open_reader()?;
        let (bytes, count) = reader.read_frame_bytes(frames)?;
        let layout = reader.layout();
        let frame_size = reader.descriptor().frame_size();

        let mut out = Vec::with_capacity(count);
        for frame in bytes.chunks_exact(frame_size) {
            out.push(
                frame
                    .chunks_exact(layout.bytes_per_sample())
                    .map(|b| layout.decode(b))
                    .collect(),
            );
        }
        Ok(out)
    }

    /// Read frames as integers at the file's bit depth.
    ///
    /// Float files are scaled by `2^(bits-1)` and clamped.
    pub fn read_int(&mut self, frames: Option<usize>) -> WavResult<Frames<i64>> {
        let bits = self.descriptor.bits_per_sample;
        Ok(self
            .read(frames)?
            .into_iter()
            .map(|frame| frame.into_iter().map(|s| convert::to_int(s, bits)).collect())
            .collect())
    }

    /// Read frames as floats. Integer files are divided by `2^(bits-1)`.
    pub fn read_float(&mut self, frames: Option<usize>) -> WavResult<Frames<f64>> {
        Ok(self
            .read(frames)?
            .into_iter()
            .map(|frame| frame.into_iter().map(convert::to_float).collect())
            .collect())
    }

    /// Lazily read blocks of `block_frames` native frames until the end of the data.
    pub fn iter(&mut self, block_frames: usize) -> BlockIter<'_, R, Sample> {
        BlockIter::new(self, block_frames, Self::read)
    }

    pub fn iter_int(&mut self, block_frames: usize) -> BlockIter<'_, R, i64> {
        BlockIter::new(self, block_frames, Self::read_int)
    }

    pub fn iter_float(&mut self, block_frames: usize) -> BlockIter<'_, R, f64> {
        BlockIter::new(self, block_frames, Self::read_float)
    }

    /// Move the read position in frame units and return the new frame index.
    ///
    /// Seeking past the end is allowed; subsequent reads return no frames.
    ///
    /// # Errors
    ///
    /// `SeekRange` when the target lies before the first frame.
    pub fn seek(&mut self, pos: SeekFrom) -> WavResult<u64> {
        self.open_reader()?.seek(pos)
    }

    /// Current frame index.
    pub fn tell(&self) -> WavResult<u64> {
        self.reader
            .as_ref()
            .map(ChunkReader::frame_position)
            .ok_or_else(|| WavFileError::closed_stream("WAV reader has been closed"))
    }

    /// Release the stream. Further reads fail with `ClosedStream`.
    pub fn close(&mut self) {
        self.reader = None;
    }

    pub const fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Recover the underlying stream.
    pub fn into_inner(self) -> WavResult<R> {
        self.reader
            .map(ChunkReader::into_inner)
            .ok_or_else(|| WavFileError::closed_stream("WAV reader has been closed"))
    }
}

impl WavRead<FileSource> {
    /// Open an independent read session over the same file, positioned at
    /// this session's current frame.
    ///
    /// The two sessions seek and read without affecting each other.
    ///
    /// # Errors
    ///
    /// `ClosedStream` when this session has been closed, or any error from
    /// reopening and parsing the file.
    pub fn try_clone(&self) -> WavResult<Self> {
        let reader = self
            .reader
            .as_ref()
            .ok_or_else(|| WavFileError::closed_stream("WAV reader has been closed"))?;
        let mut view = WavRead::new(reader.get_ref().reopen()?)?;
        view.seek(SeekFrom::Start(reader.frame_position()))?;
        Ok(view)
    }
}

impl<R: ReadSeek> AudioStreamReader for WavRead<R> {
    fn descriptor(&self) -> &FormatDescriptor {
        &self.descriptor
    }

    fn total_frames(&self) -> u64 {
        self.num_frames
    }

    fn current_frame(&self) -> WavResult<u64> {
        self.tell()
    }

    fn seek_to_frame(&mut self, frame: u64) -> WavResult<u64> {
        self.open_reader()?.seek_frame(frame)
    }

    fn read_samples(&mut self, frames: Option<usize>) -> WavResult<Frames<Sample>> {
        self.read(frames)
    }
}

type ReadBlock<R, T> = fn(&mut WavRead<R>, Option<usize>) -> WavResult<Frames<T>>;

/// Iterator over successive blocks of frames.
///
/// Ends after the last (possibly short) block. Stopping early leaves the
/// session positioned after the last block yielded, so iteration can resume.
pub struct BlockIter<'a, R: ReadSeek, T> {
    session: &'a mut WavRead<R>,
    block_frames: usize,
    read_block: ReadBlock<R, T>,
    done: bool,
}

impl<'a, R: ReadSeek, T> BlockIter<'a, R, T> {
    fn new(session: &'a mut WavRead<R>, block_frames: usize, read_block: ReadBlock<R, T>) -> Self {
        BlockIter {
            session,
            block_frames,
            read_block,
            done: block_frames == 0,
        }
    }
}

impl<R: ReadSeek, T> Iterator for BlockIter<'_, R, T> {
    type Item = WavResult<Frames<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match (self.read_block)(&mut *self.session, Some(self.block_frames)) {
            Ok(block) if block.is_empty() => {
                self.done = true;
                None
            }
            Ok(block) => Some(Ok(block)),
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: ReadSeek, T> core::iter::FusedIterator for BlockIter<'_, R, T> {}
