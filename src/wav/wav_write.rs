//! Write sessions producing a WAV stream.

use std::io::{Seek, SeekFrom, Write};

use log::warn;

use crate::{
    error::{WavFileError, WavResult},
    traits::AudioStreamWriter,
    types::{Sample, WriteSpec},
    wav::{WavFormat, chunk_writer::ChunkWriter, info::MetadataMap},
};

/// An open WAV file being written.
///
/// Every write converts its input to the file's native format. Values that
/// do not fit are saturated, with a single warning per session. Closing (or
/// dropping) the session finalizes the file.
///
/// # Example
///
/// ```no_run
/// use wavfile::{WavFormat, WriteSpec};
///
/// let spec = WriteSpec::new(48_000, 24, WavFormat::Pcm);
/// let mut wav = wavfile::create("tone.wav", spec)?;
/// let frames: Vec<Vec<f64>> = (0..480)
///     .map(|i| vec![(i as f64 * 0.05).sin() * 0.5; 2])
///     .collect();
/// wav.write_float(&frames)?;
/// wav.close()?;
/// # Ok::<(), wavfile::WavFileError>(())
/// ```
#[derive(Debug)]
pub struct WavWrite<W: Write + Seek> {
    /// `None` once closed
    writer: Option<ChunkWriter<W>>,
    format: WavFormat,
    sample_rate: u32,
    bits_per_sample: u16,
    num_channels: Option<u16>,
    frames_written: u64,
    saturation_warned: bool,
}

impl<W: Write + Seek> WavWrite<W> {
    /// Start a WAV file on `stream`.
    ///
    /// Wrap plain `Write` sinks in [`crate::AppendOnly`]; such files are
    /// streamed with unknown-length headers.
    pub fn new(stream: W, spec: WriteSpec) -> WavResult<Self> {
        let writer = ChunkWriter::open(stream, spec)?;
        Ok(WavWrite {
            writer: Some(writer),
            format: spec.format,
            sample_rate: spec.sample_rate,
            bits_per_sample: spec.bits_per_sample,
            num_channels: spec.num_channels,
            frames_written: 0,
            saturation_warned: false,
        })
    }

    fn open_writer(&mut self) -> WavResult<&mut ChunkWriter<W>> {
        self.writer
            .as_mut()
            .ok_or_else(|| WavFileError::closed_stream("WAV writer has been closed"))
    }

    pub const fn format(&self) -> WavFormat {
        self.format
    }

    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub const fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// Channel count, `None` until the first write when it was not specified.
    pub const fn num_channels(&self) -> Option<u16> {
        self.num_channels
    }

    /// Number of frames in the data chunk so far
    pub const fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Write frames of tagged samples.
    pub fn write<F: AsRef<[Sample]>>(&mut self, frames: &[F]) -> WavResult<usize> {
        self.write_with(frames, |s| s)
    }

    /// Write frames of integers at the file's bit depth.
    pub fn write_int<F: AsRef<[i64]>>(&mut self, frames: &[F]) -> WavResult<usize> {
        let bits = self.bits_per_sample;
        self.write_with(frames, |v| Sample::int(bits, v))
    }

    /// Write frames of floats in the nominal `[-1, 1)` range.
    pub fn write_float<F: AsRef<[f64]>>(&mut self, frames: &[F]) -> WavResult<usize> {
        self.write_with(frames, |v| Sample::float(64, v))
    }

    fn write_with<T, F, C>(&mut self, frames: &[F], to_sample: C) -> WavResult<usize>
    where
        T: Copy,
        F: AsRef<[T]>,
        C: Fn(T) -> Sample,
    {
        let Some(writer) = self.writer.as_mut() else {
            return Err(WavFileError::closed_stream("WAV writer has been closed"));
        };
        let Some(first) = frames.first() else {
            return Ok(0);
        };
        let width = writer
            .num_channels()
            .map_or(first.as_ref().len(), |c| c as usize);
        if let Some(bad) = frames.iter().find(|f| f.as_ref().len() != width) {
            return Err(WavFileError::channel_mismatch(width, bad.as_ref().len()));
        }

        let layout = writer.layout();
        let sample_size = layout.bytes_per_sample();
        let mut bytes = vec![0u8; frames.len() * width * sample_size];
        let mut saturated = false;
        for (out, &value) in bytes
            .chunks_exact_mut(sample_size)
            .zip(frames.iter().flat_map(|f| f.as_ref().iter()))
        {
            saturated |= layout.encode(to_sample(value), out);
        }

        let written = writer.write_frame_bytes(&bytes, width)?;
        self.num_channels = writer.num_channels();
        self.frames_written = writer.frames_written();

        if saturated && !self.saturation_warned {
            warn!(
                "Samples exceeded the range of {}-bit {} output and were clipped",
                self.bits_per_sample, self.format
            );
            self.saturation_warned = true;
        }
        Ok(written)
    }

    /// Attach INFO metadata. Only one call per session is accepted.
    ///
    /// Metadata added before the first write is placed ahead of the audio,
    /// later metadata after it.
    pub fn add_metadata(&mut self, metadata: MetadataMap) -> WavResult<()> {
        self.open_writer()?.set_metadata(metadata)
    }

    /// Move the write position in frame units. Only positions up to the
    /// number of frames already written can be reached; writes after a
    /// backward seek overwrite existing frames.
    pub fn seek(&mut self, pos: SeekFrom) -> WavResult<u64> {
        let writer = self.open_writer()?;
        let target: i128 = match pos {
            SeekFrom::Start(frame) => frame as i128,
            SeekFrom::Current(delta) => writer.frame_position() as i128 + delta as i128,
            SeekFrom::End(delta) => writer.frames_written() as i128 + delta as i128,
        };
        let frame = u64::try_from(target).map_err(|_| {
            WavFileError::seek_range(format!("{:?} resolves to frame {}", pos, target))
        })?;
        writer.seek_frame(frame)
    }

    /// Current frame index.
    pub fn tell(&self) -> WavResult<u64> {
        self.writer
            .as_ref()
            .map(ChunkWriter::frame_position)
            .ok_or_else(|| WavFileError::closed_stream("WAV writer has been closed"))
    }

    pub fn flush(&mut self) -> WavResult<()> {
        self.open_writer()?.flush()
    }

    /// Finalize the file and release the stream. Idempotent.
    ///
    /// On an append-only store this reports `UnseekableStore`; the file is
    /// still complete but keeps its unknown-length header.
    pub fn close(&mut self) -> WavResult<()> {
        match self.writer.take() {
            Some(mut writer) => writer.finalize(),
            None => Ok(()),
        }
    }

    pub const fn is_closed(&self) -> bool {
        self.writer.is_none()
    }

    /// Finalize (when the store can seek) and recover the underlying stream.
    pub fn into_inner(mut self) -> WavResult<W> {
        let mut writer = self
            .writer
            .take()
            .ok_or_else(|| WavFileError::closed_stream("WAV writer has been closed"))?;
        if writer.is_seekable() {
            writer.finalize()?;
        }
        Ok(writer.into_inner())
    }
}

impl<W: Write + Seek> Drop for WavWrite<W> {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.finalize() {
                warn!("Failed to finalize WAV file on drop: {}", e);
            }
        }
    }
}

impl<W: Write + Seek> AudioStreamWriter for WavWrite<W> {
    fn write_samples(&mut self, frames: &[Vec<Sample>]) -> WavResult<usize> {
        self.write(frames)
    }

    fn flush(&mut self) -> WavResult<()> {
        WavWrite::flush(self)
    }

    fn finalize(&mut self) -> WavResult<()> {
        self.close()
    }

    fn is_finalized(&self) -> bool {
        self.is_closed()
    }

    fn frames_written(&self) -> u64 {
        self.frames_written
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn num_channels(&self) -> Option<u16> {
        self.num_channels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wav::{AppendOnly, InfoKey, WavRead};
    use std::io::Cursor;

    fn session(bits: u16, format: WavFormat) -> WavWrite<Cursor<Vec<u8>>> {
        WavWrite::new(Cursor::new(Vec::new()), WriteSpec::new(44_100, bits, format)).unwrap()
    }

    #[test]
    fn test_write_then_read_back() {
        let mut wav = session(16, WavFormat::Pcm);
        let frames = vec![vec![0i64, 0], vec![16_384, -16_384], vec![32_767, -32_768]];
        assert_eq!(wav.write_int(&frames).unwrap(), 3);
        assert_eq!(wav.num_channels(), Some(2));

        let mut read = WavRead::new(wav.into_inner().unwrap()).unwrap();
        assert_eq!(read.num_frames(), 3);
        assert_eq!(read.read_int(None).unwrap(), frames);
    }

    #[test]
    fn test_channel_mismatch_after_binding() {
        let mut wav = session(16, WavFormat::Pcm);
        wav.write_int(&[[1i64, 2, 3]]).unwrap();
        let err = wav.write_int(&[[1i64, 2]]).unwrap_err();
        assert!(matches!(err, WavFileError::ChannelMismatch { expected: 3, found: 2 }));

        // ragged batch is rejected before anything is written
        let err = wav.write_int(&[vec![1i64, 2, 3], vec![4, 5]]).unwrap_err();
        assert!(matches!(err, WavFileError::ChannelMismatch { .. }));
        assert_eq!(wav.frames_written(), 1);
    }

    #[test]
    fn test_float_input_to_pcm_truncates_and_clamps() {
        let mut wav = session(16, WavFormat::Pcm);
        wav.write_float(&[[0.99999f64, -1.0, 2.0, f64::NAN]]).unwrap();
        let mut read = WavRead::new(wav.into_inner().unwrap()).unwrap();
        assert_eq!(read.read_int(None).unwrap(), vec![vec![32_767, -32_768, 32_767, 0]]);
    }

    #[test]
    fn test_float_file_clamps_to_unit_range() {
        let mut wav = session(32, WavFormat::IeeeFloat);
        wav.write_float(&[[1.5f64, -3.0], [0.5, -1.0]]).unwrap();
        assert!(wav.saturation_warned);
        let mut read = WavRead::new(wav.into_inner().unwrap()).unwrap();
        assert_eq!(read.read_float(None).unwrap(), vec![vec![1.0, -1.0], vec![0.5, -1.0]]);
    }

    #[test]
    fn test_int_input_to_float_file() {
        let mut wav = session(32, WavFormat::IeeeFloat);
        wav.write(&[[Sample::int(16, -16_384), Sample::int(8, 64)]]).unwrap();
        let mut read = WavRead::new(wav.into_inner().unwrap()).unwrap();
        assert_eq!(read.read_float(None).unwrap(), vec![vec![-0.5, 0.5]]);
    }

    #[test]
    fn test_seek_and_overwrite() {
        let mut wav = session(24, WavFormat::Pcm);
        wav.write_int(&[[1i64], [2], [3]]).unwrap();
        assert_eq!(wav.seek(SeekFrom::Current(-2)).unwrap(), 1);
        wav.write_int(&[[20i64]]).unwrap();
        assert_eq!(wav.tell().unwrap(), 2);

        let err = wav.seek(SeekFrom::End(1)).unwrap_err();
        assert!(matches!(err, WavFileError::SeekRange(_)));
        let err = wav.seek(SeekFrom::Current(-5)).unwrap_err();
        assert!(matches!(err, WavFileError::SeekRange(_)));

        let mut read = WavRead::new(wav.into_inner().unwrap()).unwrap();
        assert_eq!(read.read_int(None).unwrap(), vec![vec![1], vec![20], vec![3]]);
    }

    #[test]
    fn test_metadata_once() {
        let mut wav = session(16, WavFormat::Pcm);
        let map = MetadataMap::from_pairs([("comment", "test")]).unwrap();
        wav.add_metadata(map.clone()).unwrap();
        let err = wav.add_metadata(map).unwrap_err();
        assert!(matches!(err, WavFileError::InvalidMetadata(_)));
        wav.write_int(&[[1i64]]).unwrap();

        let read = WavRead::new(wav.into_inner().unwrap()).unwrap();
        assert_eq!(read.metadata().unwrap().get(InfoKey::Comment), Some("test"));
    }

    #[test]
    fn test_closed_session() {
        let mut wav = session(16, WavFormat::Pcm);
        wav.write_int(&[[1i64]]).unwrap();
        wav.close().unwrap();
        wav.close().unwrap();
        assert!(wav.is_closed());
        assert!(matches!(
            wav.write_int(&[[1i64]]).unwrap_err(),
            WavFileError::ClosedStream(_)
        ));
        assert!(matches!(wav.tell().unwrap_err(), WavFileError::ClosedStream(_)));
        assert_eq!(wav.sample_rate(), 44_100);
        assert_eq!(wav.frames_written(), 1);
    }

    #[test]
    fn test_append_only_session() {
        let spec = WriteSpec::new(8_000, 8, WavFormat::Pcm).with_channels(1);
        let mut wav = WavWrite::new(AppendOnly::new(Vec::new()), spec).unwrap();
        wav.write_int(&[[-128i64], [0], [127]]).unwrap();
        let bytes = wav.into_inner().unwrap().into_inner();

        let mut read = WavRead::new(Cursor::new(bytes)).unwrap();
        assert_eq!(read.read_int(None).unwrap(), vec![vec![-128], vec![0], vec![127]]);
    }

    #[test]
    fn test_drop_finalizes() {
        let mut buf = Vec::new();
        {
            let mut wav = WavWrite::new(
                Cursor::new(&mut buf),
                WriteSpec::new(8_000, 16, WavFormat::Pcm),
            )
            .unwrap();
            wav.write_int(&[[5i64, 6]]).unwrap();
        }
        let read = WavRead::new(Cursor::new(buf)).unwrap();
        assert_eq!(read.num_frames(), 1);
    }
}
