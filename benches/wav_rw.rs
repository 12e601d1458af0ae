use std::{f64::consts::TAU, fs, hint::black_box, io::Cursor, path::PathBuf, time::Duration};

use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use hound::{SampleFormat, WavReader, WavSpec};
use wavfile::{Frames, WavFormat, WavWrite, WriteSpec};

const SAMPLE_RATES: &[u32] = &[44_100, 96_000];
const CHANNEL_OPTIONS: &[u16] = &[1, 2, 6];
const ASSET_DIR: &str = "target/bench_assets";
const SIGNAL_DURATION_MS: u64 = 250;

/// (format, bits, hound can handle it)
const LAYOUTS: &[(WavFormat, u16, bool)] = &[
    (WavFormat::Pcm, 16, true),
    (WavFormat::Pcm, 24, false),
    (WavFormat::Pcm, 32, true),
    (WavFormat::IeeeFloat, 32, true),
    (WavFormat::IeeeFloat, 64, false),
];

#[derive(Clone)]
struct ReadScenario {
    path: PathBuf,
    bytes: u64,
}

type Group<'a> = criterion::BenchmarkGroup<'a, criterion::measurement::WallTime>;

fn bench_wav_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("wav_read");
    configure_group(&mut group);

    for &sample_rate in SAMPLE_RATES {
        for &channels in CHANNEL_OPTIONS {
            for &(format, bits, hound_ok) in LAYOUTS {
                let spec = WriteSpec::new(sample_rate, bits, format).with_channels(channels);
                let scenario = prepare_read_scenario(spec);
                let label = case_label(sample_rate, channels);
                bench_wavfile_read(&mut group, &scenario, spec, &label);
                if hound_ok && channels <= 2 {
                    bench_hound_read(&mut group, &scenario, spec, &label);
                }
            }
        }
    }

    group.finish();
}

fn bench_wav_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("wav_write");
    configure_group(&mut group);

    for &sample_rate in SAMPLE_RATES {
        for &channels in CHANNEL_OPTIONS {
            let signal = generate_signal(sample_rate, channels);
            for &(format, bits, hound_ok) in LAYOUTS {
                let spec = WriteSpec::new(sample_rate, bits, format).with_channels(channels);
                let label = case_label(sample_rate, channels);
                bench_wavfile_write(&mut group, &signal, spec, &label);
                if hound_ok && channels <= 2 {
                    bench_hound_write(&mut group, &signal, spec, &label);
                }
            }
        }
    }

    group.finish();
}

fn configure_group(group: &mut Group<'_>) {
    group.sample_size(30);
    group.warm_up_time(Duration::from_secs(3));
    group.measurement_time(Duration::from_secs(8));
}

fn prepare_read_scenario(spec: WriteSpec) -> ReadScenario {
    let channels = spec.num_channels.expect("bench specs carry a channel count");
    let signal = generate_signal(spec.sample_rate, channels);
    let path = asset_path(spec);
    wavfile::write_float(&path, &signal, spec, None).expect("failed to create wav asset");
    let bytes = fs::metadata(&path).expect("asset metadata").len();
    ReadScenario { path, bytes }
}

fn bench_wavfile_read(
    group: &mut Group<'_>,
    scenario: &ReadScenario,
    spec: WriteSpec,
    case_label: &str,
) {
    let bench_id = BenchmarkId::new(format!("wavfile-{}", layout_label(spec)), case_label);
    let path = scenario.path.clone();
    let is_float = spec.format.is_float();

    group.throughput(Throughput::Bytes(scenario.bytes));
    group.bench_function(bench_id, move |b| {
        b.iter_batched(
            || wavfile::open_read(&path).expect("open wav"),
            |mut wav| {
                if is_float {
                    black_box(wav.read_float(None).expect("read wav"));
                } else {
                    black_box(wav.read_int(None).expect("read wav"));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_hound_read(
    group: &mut Group<'_>,
    scenario: &ReadScenario,
    spec: WriteSpec,
    case_label: &str,
) {
    let bench_id = BenchmarkId::new(format!("hound-{}", layout_label(spec)), case_label);
    let path = scenario.path.clone();
    let is_float = spec.format.is_float();

    group.throughput(Throughput::Bytes(scenario.bytes));
    group.bench_function(bench_id, move |b| {
        b.iter_batched(
            || WavReader::open(&path).expect("open wav"),
            |mut reader| {
                if is_float {
                    let samples: Vec<f32> =
                        reader.samples::<f32>().map(|s| s.expect("hound read")).collect();
                    black_box(samples);
                } else {
                    let samples: Vec<i32> =
                        reader.samples::<i32>().map(|s| s.expect("hound read")).collect();
                    black_box(samples);
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_wavfile_write(
    group: &mut Group<'_>,
    signal: &Frames<f64>,
    spec: WriteSpec,
    case_label: &str,
) {
    let bench_id = BenchmarkId::new(format!("wavfile-{}", layout_label(spec)), case_label);
    let payload_bytes = payload_bytes(signal, spec);
    let capacity = payload_bytes as usize + 1024;
    let signal = signal.clone();

    group.throughput(Throughput::Bytes(payload_bytes));
    group.bench_function(bench_id, move |b| {
        b.iter_batched(
            || Cursor::new(Vec::with_capacity(capacity)),
            |writer| {
                let mut wav = WavWrite::new(writer, spec).expect("open writer");
                wav.write_float(&signal).expect("write wav");
                black_box(wav.into_inner().expect("finalize"));
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_hound_write(
    group: &mut Group<'_>,
    signal: &Frames<f64>,
    spec: WriteSpec,
    case_label: &str,
) {
    let bench_id = BenchmarkId::new(format!("hound-{}", layout_label(spec)), case_label);
    let payload_bytes = payload_bytes(signal, spec);
    let capacity = payload_bytes as usize + 1024;
    let hound_spec = WavSpec {
        channels: spec.num_channels.unwrap_or(1),
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        sample_format: if spec.format.is_float() {
            SampleFormat::Float
        } else {
            SampleFormat::Int
        },
    };
    let interleaved: Vec<f64> = signal.iter().flatten().copied().collect();
    let scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
    let max = scale - 1.0;

    group.throughput(Throughput::Bytes(payload_bytes));
    group.bench_function(bench_id, move |b| {
        b.iter_batched(
            || Cursor::new(Vec::with_capacity(capacity)),
            |writer| {
                let mut wav_writer = hound::WavWriter::new(writer, hound_spec).expect("hound writer");
                for &sample in &interleaved {
                    if hound_spec.sample_format == SampleFormat::Float {
                        wav_writer.write_sample(sample as f32).expect("hound write");
                    } else {
                        let value = (sample * scale).clamp(-scale, max) as i32;
                        wav_writer.write_sample(value).expect("hound write");
                    }
                }
                wav_writer.finalize().expect("finalize");
            },
            BatchSize::SmallInput,
        );
    });
}

/// A different tone per channel
fn generate_signal(sample_rate: u32, channels: u16) -> Frames<f64> {
    let num_frames = (sample_rate as u64 * SIGNAL_DURATION_MS / 1000) as usize;
    (0..num_frames)
        .map(|n| {
            let t = n as f64 / sample_rate as f64;
            (0..channels)
                .map(|ch| {
                    let freq = 110.0 + 55.0 * ch as f64;
                    let amplitude = 0.35 + 0.1 * (ch % 4) as f64;
                    amplitude * (TAU * freq * t).sin()
                })
                .collect()
        })
        .collect()
}

fn layout_label(spec: WriteSpec) -> String {
    let prefix = if spec.format.is_float() { "f" } else { "i" };
    format!("{}{}", prefix, spec.bits_per_sample)
}

fn asset_path(spec: WriteSpec) -> PathBuf {
    let mut dir = assets_dir();
    dir.push(format!(
        "{}_{}hz_{}ch.wav",
        layout_label(spec),
        spec.sample_rate,
        spec.num_channels.unwrap_or(1)
    ));
    dir
}

fn assets_dir() -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(ASSET_DIR);
    fs::create_dir_all(&dir).expect("Failed to create asset directory");
    dir
}

fn case_label(sample_rate: u32, channels: u16) -> String {
    format!("{}hz_{}ch", sample_rate, channels)
}

fn payload_bytes(signal: &Frames<f64>, spec: WriteSpec) -> u64 {
    let channels = spec.num_channels.unwrap_or(1) as u64;
    signal.len() as u64 * channels * (spec.bits_per_sample as u64 / 8)
}

criterion_group!(
    name = wav_benches;
    config = Criterion::default()
        .sample_size(50)
        .warm_up_time(Duration::from_secs(3))
        .measurement_time(Duration::from_secs(8))
        .configure_from_args();
    targets = bench_wav_read, bench_wav_write
);
criterion_main!(wav_benches);
