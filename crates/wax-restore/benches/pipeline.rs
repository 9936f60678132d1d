//! Restoration pipeline benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use wax_restore::{process, AudioBuffer, AutoSettings, ProcessingSettings, RepairOptions};

const SAMPLE_RATE: u32 = 44_100;

/// One second of quiet program material with periodic surface defects.
fn crackly_signal(seconds: usize) -> AudioBuffer {
    let len = SAMPLE_RATE as usize * seconds;
    let mut samples: Vec<f32> = (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * 220.0 * t).sin() * 0.05
        })
        .collect();

    let mut state = 0x2545_f491_4f6c_dd1du64;
    for i in (0..len).step_by(1_500) {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        let amplitude = ((state >> 33) & 0xffff) as f32 / 65_535.0;
        samples[i] = (amplitude - 0.5) * 1.4;
    }

    AudioBuffer::new(samples, 1, SAMPLE_RATE).unwrap()
}

fn bench_declick_only(c: &mut Criterion) {
    let buffer = crackly_signal(2);
    let settings = ProcessingSettings::Auto(AutoSettings {
        click_sensitivity: 0.3,
        pop_sensitivity: 0.3,
        ..AutoSettings::default()
    });

    c.bench_function("declick_2s", |b| {
        b.iter(|| process(black_box(&buffer), black_box(&settings)).unwrap())
    });
}

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_pipeline");

    for seconds in [1usize, 4] {
        let buffer = crackly_signal(seconds);
        let settings = ProcessingSettings::Auto(AutoSettings {
            click_sensitivity: 0.3,
            pop_sensitivity: 0.3,
            noise_reduction_amount: 0.5,
            options: RepairOptions {
                use_multiband_transient_detection: true,
                use_decrackle: true,
                ..RepairOptions::default()
            },
        });

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}s", seconds)),
            &seconds,
            |b, _| b.iter(|| process(black_box(&buffer), black_box(&settings)).unwrap()),
        );
    }

    group.finish();
}

criterion_group!(benches, bench_declick_only, bench_full_pipeline);
criterion_main!(benches);
