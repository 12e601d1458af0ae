use std::f64::consts::TAU;

use wavfile::{MetadataMap, WavFormat, WavResult, WriteSpec};

pub fn main() -> WavResult<()> {
    // write ten seconds of a 440 Hz tone as 24-bit PCM and read it back
    let sample_rate = 44_100;
    let tone: Vec<[f64; 1]> = (0..sample_rate * 10)
        .map(|n| [0.5 * (TAU * 440.0 * n as f64 / sample_rate as f64).sin()])
        .collect();

    let metadata = MetadataMap::from_pairs([("track", "A440"), ("comment", "demo tone")])?;
    wavfile::write_float(
        "./sine_wave.wav",
        &tone,
        WriteSpec::new(sample_rate, 24, WavFormat::Pcm),
        Some(&metadata),
    )?;

    let mut wav = wavfile::open_read("./sine_wave.wav")?;
    println!("{}", wav.descriptor());
    println!("Duration: {}", wav.hms());
    if let Some(metadata) = wav.metadata() {
        for (key, value) in metadata {
            println!("{}: {}", key, value);
        }
    }

    let mut peak_error = 0.0f64;
    let mut offset = 0;
    for block in wav.iter_float(4096) {
        for (frame, original) in block?.iter().zip(&tone[offset..]) {
            peak_error = peak_error.max((frame[0] - original[0]).abs());
        }
        offset += 4096;
    }
    println!("Peak quantisation error: {:.3e}", peak_error);
    Ok(())
}
