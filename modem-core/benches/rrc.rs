use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modem_core::config::WireConfig;
use modem_core::dsp::Rrc;
use num_complex::Complex64;

fn benchmark_single_sample(c: &mut Criterion) {
    let wire = WireConfig::default();
    let mut rrc = Rrc::new(
        wire.sample_rate as f64,
        wire.baud as f64,
        wire.rolloff,
        wire.n_taps,
    )
    .unwrap();

    c.bench_function("rrc_filter_one_sample", |b| {
        b.iter(|| rrc.filter(black_box(Complex64::new(0.5, -0.25))))
    });
}

fn benchmark_block_sizes(c: &mut Criterion) {
    let wire = WireConfig::default();

    let mut group = c.benchmark_group("rrc_filter_block");
    for size in [64, 256, 1024, 4096].iter() {
        let samples: Vec<Complex64> = (0..*size)
            .map(|i| Complex64::new((i as f64 * 0.01).sin(), (i as f64 * 0.013).cos()))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            let mut rrc = Rrc::new(
                wire.sample_rate as f64,
                wire.baud as f64,
                wire.rolloff,
                wire.n_taps,
            )
            .unwrap();
            let mut block = samples.clone();
            b.iter(|| rrc.filter_block(black_box(&mut block)))
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_single_sample, benchmark_block_sizes);
criterion_main!(benches);
