//! The sequence set: an ordered collection of time-disjoint sequences packed
//! into one immutable arena.
//!
//! A [`SequenceSet`] is built once (see [`SequenceSet::new`] and the other
//! constructors in `build`) and never mutated. Operators read sequences out
//! of the arena on demand and pack their results into fresh arenas, so a
//! set can be shared freely between threads.

mod bbox;
mod build;
mod locate;

pub(crate) use build::{Part, align_interpolation};
pub use locate::Location;

use crate::error::{Result, SeqSetError};
use crate::storage::codec;
use crate::storage::layout::{self, Arena, Header};
use crate::temporal::{Interpolation, Sequence};
use bitflags::bitflags;
use bytes::Bytes;
use seqset_types::{Period, TimestampTz, Value, ValueKind};
use std::fmt;

bitflags! {
    /// Summary flags stored in the arena header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SetFlags: u8 {
        /// Sequences interpolate linearly
        const LINEAR = 1;
        /// Values have a value or spatial dimension
        const X = 1 << 1;
        /// Values have a time dimension (always set)
        const T = 1 << 2;
        /// Points carry a Z coordinate
        const Z = 1 << 3;
        /// Points are geodetic
        const GEODETIC = 1 << 4;
    }
}

impl SetFlags {
    pub(crate) fn for_values(interp: Interpolation, sample: &Value) -> Self {
        let mut flags = SetFlags::T;
        if interp.is_linear() {
            flags |= SetFlags::LINEAR;
        }
        let kind = sample.kind();
        if kind.is_numeric() || kind.is_spatial() {
            flags |= SetFlags::X;
        }
        if let Value::Point(p) = sample {
            if p.has_z() {
                flags |= SetFlags::Z;
            }
            if p.geodetic {
                flags |= SetFlags::GEODETIC;
            }
        }
        flags
    }
}

/// A temporal value made of one or more time-disjoint sequences.
///
/// Invariants:
/// - at least one sequence;
/// - sequences are strictly ordered in time, and two touching sequences
///   never both include the shared instant;
/// - all sequences share value kind, interpolation and, for points, SRID
///   and dimensionality;
/// - the trailing box is the union of the per-sequence boxes;
/// - the total count is the sum of the per-sequence instant counts.
#[derive(Clone)]
pub struct SequenceSet {
    header: Header,
    period: Period,
    buf: Bytes,
}

impl SequenceSet {
    fn arena(&self) -> Arena<'_> {
        Arena::new(&self.buf, self.header)
    }

    /// Number of sequences.
    pub fn count(&self) -> usize {
        self.header.count
    }

    /// Sum of the per-sequence instant counts, boundary duplicates included.
    pub fn total_count(&self) -> usize {
        self.header.totalcount
    }

    pub fn kind(&self) -> ValueKind {
        self.header.kind
    }

    pub fn flags(&self) -> SetFlags {
        SetFlags::from_bits_truncate(self.header.flags)
    }

    pub fn interpolation(&self) -> Interpolation {
        if self.is_linear() {
            Interpolation::Linear
        } else {
            Interpolation::Stepwise
        }
    }

    pub fn is_linear(&self) -> bool {
        self.flags().contains(SetFlags::LINEAR)
    }

    /// Byte alignment of the packed sequences.
    pub fn alignment(&self) -> usize {
        self.header.align
    }

    /// Bounding period, from the first lower bound to the last upper bound.
    pub fn period(&self) -> Period {
        self.period
    }

    pub fn start_timestamp(&self) -> TimestampTz {
        self.period.lower()
    }

    pub fn end_timestamp(&self) -> TimestampTz {
        self.period.upper()
    }

    /// Decode sequence `i` (0-based).
    pub(crate) fn seq(&self, i: usize) -> Result<Sequence> {
        codec::get_packed(&self.arena().packed(i)?, false)
    }

    /// Period of sequence `i` read from its packed header only.
    pub(crate) fn seq_period(&self, i: usize) -> Result<Period> {
        Ok(codec::read_packed_header(&self.arena().packed(i)?)?.period)
    }

    /// Packed bytes of sequence `i`, for verbatim reuse.
    pub(crate) fn packed(&self, i: usize) -> Result<Bytes> {
        self.arena().packed_exact(i)
    }

    /// Sequence `n`, counting from 1; `None` when out of range.
    pub fn sequence_n(&self, n: usize) -> Result<Option<Sequence>> {
        if n == 0 || n > self.count() {
            return Ok(None);
        }
        self.seq(n - 1).map(Some)
    }

    pub fn sequences(&self) -> Result<Vec<Sequence>> {
        (0..self.count()).map(|i| self.seq(i)).collect()
    }

    pub fn start_sequence(&self) -> Result<Sequence> {
        self.seq(0)
    }

    pub fn end_sequence(&self) -> Result<Sequence> {
        self.seq(self.count() - 1)
    }

    /// The arena bytes.
    pub fn as_bytes(&self) -> &Bytes {
        &self.buf
    }

    /// Load an arena from untrusted bytes, validating the whole layout.
    pub fn from_layout_bytes(bytes: Bytes) -> Result<Self> {
        Self::validate_layout(bytes).inspect_err(|e| {
            log::warn!("rejected sequence set layout: {}", e);
        })
    }

    fn validate_layout(bytes: Bytes) -> Result<Self> {
        let header = layout::read_header(&bytes)?;
        let arena = Arena::new(&bytes, header);
        let mut sequences = Vec::with_capacity(header.count);
        for i in 0..header.count {
            let padded = arena.packed(i)?;
            let seq = codec::get_packed(&padded, true)?;
            if seq.kind() != header.kind {
                return Err(SeqSetError::KindMismatch {
                    expected: header.kind,
                    found: seq.kind(),
                });
            }
            sequences.push(seq);
        }
        build::check_sequences(&sequences)?;
        let totalcount: usize = sequences.iter().map(Sequence::count).sum();
        if totalcount != header.totalcount {
            return Err(SeqSetError::CorruptLayout(format!(
                "totalcount {} does not match {} stored instants",
                header.totalcount, totalcount
            )));
        }
        let expected_flags = SetFlags::for_values(
            sequences[0].interpolation(),
            sequences[0].start_instant().value(),
        );
        if header.flags != expected_flags.bits() {
            return Err(SeqSetError::CorruptLayout(format!(
                "flags {:#04x} do not match the stored sequences ({:#04x})",
                header.flags,
                expected_flags.bits()
            )));
        }
        let stored_box = codec::get_bbox(&mut &arena.bbox_bytes()?[..], header.kind)?;
        if stored_box != build::union_bbox(&sequences) {
            return Err(SeqSetError::CorruptLayout(
                "stored bounding box does not match the sequences".to_string(),
            ));
        }
        let period = sequences[0]
            .period()
            .span(sequences[sequences.len() - 1].period());
        Ok(Self {
            header,
            period,
            buf: bytes,
        })
    }
}

impl fmt::Debug for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceSet")
            .field("count", &self.count())
            .field("total_count", &self.total_count())
            .field("kind", &self.kind())
            .field("flags", &self.flags())
            .field("period", &self.period)
            .finish()
    }
}

/// Renders `{[v@t, v@t), [v@t]}`; float and point sets with stepwise
/// interpolation are prefixed with `Interp=Stepwise;`.
impl fmt::Display for SequenceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.kind().is_continuous() && !self.is_linear() {
            write!(f, "Interp=Stepwise;")?;
        }
        write!(f, "{{")?;
        for i in 0..self.count() {
            let seq = self.seq(i).map_err(|_| fmt::Error)?;
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", seq)?;
        }
        write!(f, "}}")
    }
}
