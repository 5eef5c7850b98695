use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use seqset::{
    Instant, Interpolation, Period, PeriodSet, Sequence, SequenceSet, TimestampTz, Value,
};

/// `n` linear float sequences of 16 instants each, 100 microseconds apart.
fn float_set(n: usize, offset: i64) -> SequenceSet {
    let sequences = (0..n as i64)
        .map(|s| {
            let start = offset + s * 2_000;
            let instants = (0..16)
                .map(|k| {
                    let value = ((s * 16 + k) % 37) as f64;
                    Instant::new(value, TimestampTz::from_micros(start + k * 100))
                })
                .collect();
            Sequence::new(instants, true, s % 2 == 0, Interpolation::Linear, true).unwrap()
        })
        .collect();
    SequenceSet::new(sequences, true).unwrap()
}

fn benchmark_construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("construction");

    for n in [10usize, 100, 1_000] {
        let sequences = float_set(n, 0).sequences().unwrap();
        group.bench_with_input(BenchmarkId::new("build", n), &sequences, |b, seqs| {
            b.iter(|| SequenceSet::new(black_box(seqs.clone()), true).unwrap())
        });
    }

    let set = float_set(1_000, 0);
    let mut next = set.end_timestamp().micros();
    group.bench_function("append_instant", |b| {
        b.iter(|| {
            next += 100;
            set.append_instant(Instant::new(1.0, TimestampTz::from_micros(next)))
                .unwrap()
        })
    });

    group.finish();
}

fn benchmark_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    let set = float_set(1_000, 0);
    let end = set.end_timestamp().micros();
    group.bench_function("locate", |b| {
        let mut t = 0i64;
        b.iter(|| {
            t = (t + 7_919) % end;
            set.locate(black_box(TimestampTz::from_micros(t))).unwrap()
        })
    });
    group.bench_function("value_at_timestamp", |b| {
        let mut t = 0i64;
        b.iter(|| {
            t = (t + 7_919) % end;
            set.value_at_timestamp(black_box(TimestampTz::from_micros(t)))
                .unwrap()
        })
    });

    group.finish();
}

fn benchmark_restrictions(c: &mut Criterion) {
    let mut group = c.benchmark_group("restrictions");

    let set = float_set(1_000, 0);
    let window = Period::new(
        TimestampTz::from_micros(500_000),
        TimestampTz::from_micros(1_500_000),
        true,
        false,
    )
    .unwrap();
    let windows = PeriodSet::new(
        (0..50)
            .map(|i| {
                let lower = TimestampTz::from_micros(i * 40_000);
                let upper = TimestampTz::from_micros(i * 40_000 + 10_000);
                Period::new(lower, upper, true, true).unwrap()
            })
            .collect(),
    )
    .unwrap();

    group.bench_function("at_period", |b| {
        b.iter(|| set.at_period(black_box(&window)).unwrap())
    });
    group.bench_function("minus_period", |b| {
        b.iter(|| set.minus_period(black_box(&window)).unwrap())
    });
    group.bench_function("at_periodset", |b| {
        b.iter(|| set.at_periodset(black_box(&windows)).unwrap())
    });
    group.bench_function("at_value", |b| {
        b.iter(|| set.at_value(black_box(&Value::Float(12.0))).unwrap())
    });
    group.bench_function("at_min", |b| b.iter(|| set.at_min().unwrap()));

    group.finish();
}

fn benchmark_algebra(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebra");

    let left = float_set(1_000, 0);
    let right = float_set(1_000, 750);
    group.bench_function("intersect", |b| {
        b.iter(|| left.intersect(black_box(&right)).unwrap())
    });
    group.bench_function("synchronize_crossings", |b| {
        b.iter(|| left.synchronize(black_box(&right), true).unwrap())
    });
    group.bench_function("hash32", |b| b.iter(|| black_box(&left).hash32()));

    group.finish();
}

fn benchmark_codecs(c: &mut Criterion) {
    let mut group = c.benchmark_group("codecs");

    let set = float_set(1_000, 0);
    let wire = set.to_wire().unwrap();
    group.bench_function("to_wire", |b| b.iter(|| set.to_wire().unwrap()));
    group.bench_function("from_wire", |b| {
        b.iter(|| SequenceSet::from_wire(black_box(&wire), set.kind()).unwrap())
    });
    group.bench_function("from_layout_bytes", |b| {
        b.iter(|| SequenceSet::from_layout_bytes(black_box(set.as_bytes().clone())).unwrap())
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_construction,
    benchmark_lookup,
    benchmark_restrictions,
    benchmark_algebra,
    benchmark_codecs
);

criterion_main!(benches);
