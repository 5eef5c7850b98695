use seqset::prelude::*;
use seqset::{GeoPoint, Location};

fn t(us: i64) -> TimestampTz {
    TimestampTz::from_micros(us)
}

/// Stepwise integer sequences, one per block of `(start, values, lower_inc, upper_inc)`,
/// with instants 10 microseconds apart.
fn int_set(blocks: &[(i64, &[i32], bool, bool)], normalize: bool) -> SequenceSet {
    let sequences = blocks
        .iter()
        .map(|&(start, values, lower_inc, upper_inc)| {
            let instants = values
                .iter()
                .enumerate()
                .map(|(k, &v)| Instant::new(v, t(start + 10 * k as i64)))
                .collect();
            Sequence::new(instants, lower_inc, upper_inc, Interpolation::Stepwise, true)
                .expect("valid sequence")
        })
        .collect();
    SequenceSet::new(sequences, normalize).expect("valid set")
}

fn float_set() -> SequenceSet {
    let seq = |points: &[(f64, i64)], lower_inc, upper_inc| {
        let instants = points.iter().map(|&(v, us)| Instant::new(v, t(us))).collect();
        Sequence::new(instants, lower_inc, upper_inc, Interpolation::Linear, true)
            .expect("valid sequence")
    };
    SequenceSet::new(
        vec![
            seq(&[(0.0, 0), (10.0, 10), (5.0, 20)], true, false),
            seq(&[(5.0, 20), (5.0, 40)], true, true),
            seq(&[(-2.0, 60), (8.0, 80)], false, true),
        ],
        true,
    )
    .expect("valid set")
}

fn samples() -> &'static [SequenceSet] {
    static SETS: std::sync::OnceLock<Vec<SequenceSet>> = std::sync::OnceLock::new();
    SETS.get_or_init(|| {
        vec![
            int_set(&[(0, &[1, 2, 3], true, true)], true),
            int_set(
                &[
                    (0, &[1, 2], true, false),
                    (10, &[5, 6], true, true),
                    (50, &[7], true, true),
                    (70, &[1, 1, 2], false, false),
                ],
                false,
            ),
            float_set(),
        ]
    })
}

fn follows(prev: &Period, next: &Period) -> bool {
    prev.upper() < next.lower()
        || (prev.upper() == next.lower() && !(prev.upper_inc() && next.lower_inc()))
}

#[test]
fn test_sequences_are_ordered_and_disjoint() {
    for set in samples() {
        let seqs = set.sequences().unwrap();
        assert_eq!(seqs.len(), set.count());
        assert_eq!(
            seqs.iter().map(Sequence::count).sum::<usize>(),
            set.total_count()
        );
        for pair in seqs.windows(2) {
            assert!(follows(pair[0].period(), pair[1].period()));
        }
    }
}

#[test]
fn test_normalization_is_idempotent() {
    for set in samples() {
        let once = SequenceSet::new(set.sequences().unwrap(), true).unwrap();
        let twice = SequenceSet::new(once.sequences().unwrap(), true).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.as_bytes(), twice.as_bytes());
    }
}

#[test]
fn test_normalization_joins_equal_touching_sequences() {
    let raw = int_set(&[(0, &[1, 1], true, false), (10, &[1, 3], true, true)], false);
    assert_eq!(raw.count(), 2);
    let joined = int_set(&[(0, &[1, 1], true, false), (10, &[1, 3], true, true)], true);
    assert_eq!(joined.count(), 1);
    for us in 0..=20 {
        assert_eq!(
            raw.value_at_timestamp(t(us)).unwrap(),
            joined.value_at_timestamp(t(us)).unwrap()
        );
    }
}

#[test]
fn test_wire_round_trip_preserves_equality() {
    let mut sets = samples().to_vec();
    sets.push(SequenceSet::from_base(
        Value::Text("idle".to_string()),
        &PeriodSet::new(vec![
            Period::new(t(0), t(5), true, false).unwrap(),
            Period::new(t(9), t(12), false, true).unwrap(),
        ])
        .unwrap(),
        Interpolation::Stepwise,
    ));
    let track = Sequence::new(
        vec![
            Instant::new(GeoPoint::new(0.0, 0.0), t(0)),
            Instant::new(GeoPoint::new(3.0, 4.0), t(10)),
        ],
        true,
        true,
        Interpolation::Linear,
        true,
    )
    .unwrap();
    sets.push(SequenceSet::from_sequence(track));

    for set in sets {
        let wire = set.to_wire().unwrap();
        let back = SequenceSet::from_wire(&wire, set.kind()).unwrap();
        assert_eq!(back, set);
        assert_eq!(back.bbox().unwrap(), set.bbox().unwrap());
    }
}

#[test]
fn test_locate_matches_linear_scan() {
    for set in samples() {
        let seqs = set.sequences().unwrap();
        let end = set.end_timestamp().micros() + 10;
        for us in -10..=end {
            let ts = t(us);
            let expected = match seqs.iter().position(|s| s.period().contains_timestamp(ts)) {
                Some(i) => Location::Ok(i),
                None => Location::Err(
                    seqs.iter()
                        .take_while(|s| {
                            s.period().upper() < ts
                                || (s.period().upper() == ts && !s.period().upper_inc())
                        })
                        .count(),
                ),
            };
            assert_eq!(set.locate(ts).unwrap(), expected, "at {}", us);
        }
    }
}

#[test]
fn test_period_restrictions_are_complementary() {
    let windows = [
        Period::new(t(5), t(25), true, false).unwrap(),
        Period::new(t(10), t(70), false, true).unwrap(),
        Period::new(t(-5), t(200), true, true).unwrap(),
        Period::instant(t(20)),
    ];
    // float interpolation at cut points is not exact, so only stepwise sets
    for set in samples().iter().filter(|s| !s.is_linear()) {
        for window in &windows {
            let inside = set.at_period(window).unwrap();
            let outside = set.minus_period(window).unwrap();
            let end = set.end_timestamp().micros();
            for us in set.start_timestamp().micros()..=end {
                let ts = t(us);
                let whole = set.value_at_timestamp(ts).unwrap();
                let a = match &inside {
                    Some(s) => s.value_at_timestamp(ts).unwrap(),
                    None => None,
                };
                let b = match &outside {
                    Some(s) => s.value_at_timestamp(ts).unwrap(),
                    None => None,
                };
                assert!(a.is_none() || b.is_none(), "both sides defined at {}", us);
                assert_eq!(whole, a.or(b), "at {}", us);
            }
        }
    }
}

#[test]
fn test_value_restrictions_are_complementary() {
    let set = &samples()[1];
    for value in [Value::Int(1), Value::Int(6), Value::Int(42)] {
        let inside = set.at_value(&value).unwrap();
        let outside = set.minus_value(&value).unwrap();
        for us in 0..=100 {
            let ts = t(us);
            let whole = set.value_at_timestamp(ts).unwrap();
            let a = inside
                .as_ref()
                .and_then(|s| s.value_at_timestamp(ts).unwrap());
            let b = outside
                .as_ref()
                .and_then(|s| s.value_at_timestamp(ts).unwrap());
            assert!(a.is_none() || b.is_none());
            if let Some(v) = &a {
                assert_eq!(v, &value);
            }
            assert_eq!(whole, a.or(b), "at {}", us);
        }
    }
}

#[test]
fn test_merge_join_covers_common_time() {
    let left = &samples()[1];
    let right = int_set(&[(5, &[9, 9], true, true), (45, &[3, 4, 5, 6], true, false)], true);
    let expected = left
        .time()
        .unwrap()
        .intersection(&right.time().unwrap())
        .expect("sets overlap");

    match left.intersect(&right).unwrap() {
        Intersection::Overlap(a, b) => {
            assert_eq!(a.time().unwrap(), expected);
            assert_eq!(b.time().unwrap(), expected);
        }
        Intersection::Disjoint => panic!("sets overlap"),
    }

    let far = right.shift(1_000).unwrap();
    assert!(left.intersect(&far).unwrap().is_disjoint());
}

#[test]
fn test_synchronize_aligns_instants() {
    let a = &samples()[2];
    let b = float_set().shift(5).unwrap();
    let (sa, sb) = a
        .synchronize(&b, true)
        .unwrap()
        .into_option()
        .expect("sets overlap");
    assert_eq!(sa.count(), sb.count());
    assert_eq!(sa.timestamps().unwrap(), sb.timestamps().unwrap());
}
