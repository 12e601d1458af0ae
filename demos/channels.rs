use std::{
    f64::consts::TAU,
    time::Instant,
};

use wavfile::{WavFormat, WavResult, WriteSpec};

pub fn main() -> WavResult<()> {
    let sample_rate = 44_100u32;
    let frames: Vec<[f64; 2]> = (0..sample_rate as usize * 60)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            [0.5 * (TAU * 440.0 * t).sin(), (TAU * 440.0 * t).cos()]
        })
        .collect();
    wavfile::write_float(
        "channels.wav",
        &frames,
        WriteSpec::new(sample_rate, 16, WavFormat::Pcm),
        None,
    )?;

    let t0 = Instant::now();
    let parts = wavfile::split("channels.wav")?;
    for (idx, part) in parts.iter().enumerate() {
        let (samples, _, _) = wavfile::read_int(part)?;
        let max = samples.iter().map(|f| f[0]).max().unwrap_or(0);
        println!("Channel {} ({}): Max sample value: {}", idx + 1, part.display(), max);
    }
    wavfile::join("channels_joined.wav", &parts)?;
    let joined = wavfile::open_read("channels_joined.wav")?;
    println!("Rejoined: {}", joined.descriptor());

    println!("Elapsed {:.3}ms", t0.elapsed().as_millis());
    Ok(())
}
