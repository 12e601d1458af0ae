//! Splitting multichannel files into mono files and joining files into one
//! multichannel file.

use std::path::{Path, PathBuf};

use log::debug;

use crate::{
    create,
    error::{WavFileError, WavResult},
    open_read,
    traits::{AudioStreamReader, AudioStreamWriter},
    types::{Sample, WriteSpec},
    wav::WavFormat,
};

/// Frames moved per read/write round
const BLOCK_FRAMES: usize = 4096;

/// Output path for channel `index` of `path`: `<stem>_NN<.ext>` beside the input.
pub fn channel_path(path: &Path, index: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{:02}.{}", stem, index, ext.to_string_lossy()),
        None => format!("{}_{:02}", stem, index),
    };
    path.with_file_name(name)
}

/// Split a multichannel WAV file into one mono file per channel.
///
/// Each output keeps the input's format, rate and depth. Returns the paths
/// written, in channel order.
pub fn split<P: AsRef<Path>>(path: P) -> WavResult<Vec<PathBuf>> {
    let path = path.as_ref();
    let mut input = open_read(path)?;
    let descriptor = *input.descriptor();
    let spec = WriteSpec::new(
        descriptor.sample_rate,
        descriptor.bits_per_sample,
        descriptor.format,
    )
    .with_channels(1);

    let paths: Vec<PathBuf> = (0..descriptor.num_channels as usize)
        .map(|i| channel_path(path, i))
        .collect();
    let mut outputs: Vec<Box<dyn AudioStreamWriter>> = Vec::with_capacity(paths.len());
    for out in &paths {
        outputs.push(Box::new(create(out, spec)?));
    }

    loop {
        let block = input.read(Some(BLOCK_FRAMES))?;
        if block.is_empty() {
            break;
        }
        for (channel, output) in outputs.iter_mut().enumerate() {
            let mono: Vec<Vec<Sample>> = block.iter().map(|frame| vec![frame[channel]]).collect();
            output.write_samples(&mono)?;
        }
    }

    for output in &mut outputs {
        output.finalize()?;
    }
    debug!("Split {} into {} files", path.display(), paths.len());
    Ok(paths)
}

/// Join several WAV files into one multichannel file.
///
/// Channels appear in input order. The output is as long as the longest
/// input, with shorter inputs padded with silence. Its depth is the largest
/// input depth; it is IEEE float only when every input is.
///
/// # Errors
///
/// `UnsupportedFormat` when the inputs' sample rates differ.
pub fn join<P, Q>(output: P, inputs: &[Q]) -> WavResult<()>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut readers: Vec<Box<dyn AudioStreamReader>> = Vec::with_capacity(inputs.len());
    for input in inputs {
        readers.push(Box::new(open_read(input)?));
    }
    let Some(first) = readers.first() else {
        return Err(WavFileError::missing_chunk("no input files to join"));
    };

    let sample_rate = first.sample_rate();
    if let Some(other) = readers.iter().find(|r| r.sample_rate() != sample_rate) {
        return Err(WavFileError::unsupported_format(format!(
            "Sample rates of input files do not match: {} Hz and {} Hz",
            sample_rate,
            other.sample_rate()
        )));
    }

    let bits_per_sample = readers
        .iter()
        .map(|r| r.bits_per_sample())
        .max()
        .unwrap_or(16);
    let format = if readers.iter().all(|r| r.descriptor().format.is_float()) {
        WavFormat::IeeeFloat
    } else {
        WavFormat::Pcm
    };
    let num_channels = joined_channels(readers.iter().map(|r| r.num_channels()))?;
    let total_frames = readers
        .iter()
        .map(|r| r.total_frames())
        .max()
        .unwrap_or(0);

    let spec = WriteSpec::new(sample_rate, bits_per_sample, format).with_channels(num_channels);
    let mut writer = create(output.as_ref(), spec)?;

    let silence: Vec<Sample> = readers
        .iter()
        .map(|r| {
            let d = r.descriptor();
            if d.format.is_float() {
                Sample::float(d.bits_per_sample, 0.0)
            } else {
                Sample::int(d.bits_per_sample, 0)
            }
        })
        .collect();

    let mut done = 0u64;
    while done < total_frames {
        let block_len = (total_frames - done).min(BLOCK_FRAMES as u64) as usize;
        let mut frames: Vec<Vec<Sample>> =
            vec![Vec::with_capacity(num_channels as usize); block_len];

        for (reader, zero) in readers.iter_mut().zip(&silence) {
            let block = reader.read_samples(Some(block_len))?;
            let width = reader.num_channels() as usize;
            for (i, frame) in frames.iter_mut().enumerate() {
                match block.get(i) {
                    Some(samples) => frame.extend_from_slice(samples),
                    None => frame.extend(std::iter::repeat_n(*zero, width)),
                }
            }
        }

        writer.write(&frames)?;
        done += block_len as u64;
    }

    writer.close()?;
    debug!(
        "Joined {} files into {} ({} channels)",
        inputs.len(),
        output.as_ref().display(),
        num_channels
    );
    Ok(())
}

/// Total channel count of the joined output, which must fit the 16-bit field.
fn joined_channels(mut counts: impl Iterator<Item = u16>) -> WavResult<u16> {
    counts
        .try_fold(0u16, |total, count| total.checked_add(count))
        .ok_or_else(|| {
            WavFileError::unsupported_format("joined output would exceed 65535 channels")
        })
}
