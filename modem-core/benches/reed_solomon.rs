use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use modem_core::reed_solomon::RsCodec;

fn benchmark_encode(c: &mut Criterion) {
    let codec = RsCodec::for_parity(16);
    let data = vec![0xA5u8; 239];

    c.bench_function("rs_encode_239_data_16_parity", |b| {
        b.iter(|| codec.encode(black_box(&data)))
    });
}

fn benchmark_decode_clean(c: &mut Criterion) {
    let codec = RsCodec::for_parity(16);
    let data = vec![0xA5u8; 239];
    let parity = codec.encode(&data);

    c.bench_function("rs_decode_239_data_16_parity_no_errors", |b| {
        b.iter(|| {
            let mut data = data.clone();
            let mut parity = parity.clone();
            codec.decode(black_box(&mut data), black_box(&mut parity), 0)
        })
    });
}

fn benchmark_decode_by_parity_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("rs_decode_by_parity");
    for nparity in [2, 4, 6, 8, 16].iter() {
        let codec = RsCodec::for_parity(*nparity);
        let data = vec![0x3Cu8; 239];
        let parity = codec.encode(&data);

        group.bench_with_input(BenchmarkId::from_parameter(nparity), nparity, |b, _| {
            b.iter(|| {
                let mut data = data.clone();
                let mut parity = parity.clone();
                codec.decode(black_box(&mut data), black_box(&mut parity), 0)
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    benchmark_encode,
    benchmark_decode_clean,
    benchmark_decode_by_parity_count
);
criterion_main!(benches);
