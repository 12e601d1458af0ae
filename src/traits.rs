use crate::{
    error::WavResult,
    types::{FormatDescriptor, Frames, Sample},
};

/// Object-safe view of a frame source.
///
/// Lets code such as [`crate::join`] hold several readers as
/// `Box<dyn AudioStreamReader>` regardless of their stream type.
///
/// # Example
///
/// ```no_run
/// use wavfile::traits::AudioStreamReader;
///
/// fn rewind_all(streams: &mut [Box<dyn AudioStreamReader>]) -> wavfile::WavResult<()> {
///     for stream in streams {
///         stream.reset()?;
///     }
///     Ok(())
/// }
/// ```
pub trait AudioStreamReader {
    /// Format of the stream; available even after it is closed.
    fn descriptor(&self) -> &FormatDescriptor;

    /// Get the total number of frames in the stream.
    fn total_frames(&self) -> u64;

    /// Get the current frame position (0-indexed).
    fn current_frame(&self) -> WavResult<u64>;

    /// Get the number of remaining frames from current position.
    fn remaining_frames(&self) -> WavResult<u64> {
        Ok(self.total_frames().saturating_sub(self.current_frame()?))
    }

    /// Seek to a specific frame position. Positions past the end are allowed.
    fn seek_to_frame(&mut self, frame: u64) -> WavResult<u64>;

    /// Reset to the beginning of the audio data.
    fn reset(&mut self) -> WavResult<()> {
        self.seek_to_frame(0).map(|_| ())
    }

    /// Read up to `frames` frames (all remaining when `None`) in the file's native domain.
    fn read_samples(&mut self, frames: Option<usize>) -> WavResult<Frames<Sample>>;

    fn sample_rate(&self) -> u32 {
        self.descriptor().sample_rate
    }

    fn num_channels(&self) -> u16 {
        self.descriptor().num_channels
    }

    fn bits_per_sample(&self) -> u16 {
        self.descriptor().bits_per_sample
    }
}

/// Object-safe view of a frame sink.
///
/// WAV headers carry sizes that are only known once writing ends, so
/// [`finalize()`](AudioStreamWriter::finalize) must run before the output is
/// complete. Implementations track finalization internally and treat repeat
/// calls as no-ops.
pub trait AudioStreamWriter {
    /// Write frames of tagged samples, converting them to the output format.
    ///
    /// # Errors
    ///
    /// `ChannelMismatch` when the frame width differs from the channel count.
    fn write_samples(&mut self, frames: &[Vec<Sample>]) -> WavResult<usize>;

    /// Flush any buffered data to the underlying writer.
    fn flush(&mut self) -> WavResult<()>;

    /// Finalize the audio stream, updating headers with final size information.
    fn finalize(&mut self) -> WavResult<()>;

    /// Check if the stream has been finalized.
    fn is_finalized(&self) -> bool;

    /// Get the number of frames written so far.
    fn frames_written(&self) -> u64;

    /// Get the sample rate this writer was configured with.
    fn sample_rate(&self) -> u32;

    /// Channel count, `None` until bound by the first write.
    fn num_channels(&self) -> Option<u16>;
}
