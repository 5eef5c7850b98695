use crate::temporal::Sequence;

/// Whether `next` continues `prev` without a visible seam: the two touch,
/// one of them includes the shared instant, and both agree on its value.
fn joinable(prev: &Sequence, next: &Sequence) -> bool {
    let (p, n) = (prev.period(), next.period());
    p.upper() == n.lower()
        && (p.upper_inc() || n.lower_inc())
        && prev.interpolation() == next.interpolation()
        && prev.end_instant().value() == next.start_instant().value()
}

fn join(prev: Sequence, next: &Sequence) -> Sequence {
    let lower_inc = prev.period().lower_inc();
    let mut instants = prev.instants().to_vec();
    instants.pop();
    instants.extend_from_slice(next.instants());
    Sequence::make(
        instants,
        lower_inc,
        next.period().upper_inc(),
        prev.interpolation(),
        true,
    )
}

/// Merge runs of joinable neighbours in one left-to-right pass.
///
/// The input must already be time ordered. The output never has more
/// sequences than the input, and normalizing it again changes nothing.
pub(crate) fn normalize_sequences(sequences: Vec<Sequence>) -> Vec<Sequence> {
    let before = sequences.len();
    let mut out: Vec<Sequence> = Vec::with_capacity(before);
    for seq in sequences {
        match out.pop() {
            Some(prev) if joinable(&prev, &seq) => out.push(join(prev, &seq)),
            Some(prev) => {
                out.push(prev);
                out.push(seq);
            }
            None => out.push(seq),
        }
    }
    if out.len() < before {
        log::debug!("normalized {} sequences into {}", before, out.len());
    }
    out
}
