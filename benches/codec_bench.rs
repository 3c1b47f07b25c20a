use byteorder::{ByteOrder, LittleEndian};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use metexon_ble::{decode, encode, encode_with, MergePolicy, Record, StructKind};
use pprof::criterion::Output;

/// BlowerPID payload with every field populated
fn blower_pid_payload() -> Vec<u8> {
    let mut data = vec![0u8; 72];
    for (i, offset) in (0..28).step_by(4).enumerate() {
        LittleEndian::write_f32(&mut data[offset..offset + 4], i as f32 * 0.5);
    }
    for (i, offset) in (28..36).step_by(2).enumerate() {
        LittleEndian::write_u16(&mut data[offset..offset + 2], 100 * i as u16);
    }
    for (i, offset) in (36..48).step_by(4).enumerate() {
        LittleEndian::write_u32(&mut data[offset..offset + 4], 1000 * i as u32);
    }
    for offset in (48..72).step_by(4) {
        LittleEndian::write_f32(&mut data[offset..offset + 4], 1.0);
    }
    data
}

fn manual_control_payload() -> Vec<u8> {
    let mut data = vec![0u8; 25];
    LittleEndian::write_f32(&mut data[0..4], 800.0);
    LittleEndian::write_f32(&mut data[4..8], 12.5);
    LittleEndian::write_f32(&mut data[8..12], 30.0);
    data[12] = 1;
    LittleEndian::write_f32(&mut data[13..17], 2.0);
    data
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for (kind, payload) in [
        (StructKind::BlowerPid, blower_pid_payload()),
        (StructKind::ManualControl, manual_control_payload()),
    ] {
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_function(BenchmarkId::new(kind.name(), payload.len()), |b| {
            b.iter(|| {
                let record = decode(kind, black_box(&payload)).unwrap();
                black_box(record);
            });
        });
    }

    group.finish();
}

fn benchmark_encode(c: &mut Criterion) {
    let full = decode(StructKind::BlowerPid, &blower_pid_payload()).unwrap();
    let partial = Record::new().with("kp", 1.2f32);

    let mut group = c.benchmark_group("encode");

    group.bench_function("blower_pid_full", |b| {
        b.iter(|| {
            let bytes = encode(StructKind::BlowerPid, black_box(&full), None).unwrap();
            black_box(bytes);
        });
    });

    group.bench_function("blower_pid_sentinel_partial", |b| {
        b.iter(|| {
            let bytes = encode(StructKind::BlowerPid, black_box(&partial), None).unwrap();
            black_box(bytes);
        });
    });

    group.finish();
}

fn benchmark_baseline_merge(c: &mut Criterion) {
    let baseline = decode(StructKind::ManualControl, &manual_control_payload()).unwrap();
    let changes = Record::new().with("blower_rpm", 1500.0f32);

    c.bench_function("manual_control_baseline_fill", |b| {
        b.iter(|| {
            let bytes = encode_with(
                StructKind::ManualControl,
                black_box(&changes),
                MergePolicy::BaselineFill(&baseline),
            )
            .unwrap();
            black_box(bytes);
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(pprof::criterion::PProfProfiler::new(100, Output::Flamegraph(None)));
    targets =
        benchmark_decode,
        benchmark_encode,
        benchmark_baseline_merge
}
criterion_main!(benches);
