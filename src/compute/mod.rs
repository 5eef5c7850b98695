//! Operators on sequence sets.
//!
//! Every operator reads its inputs through the arena accessors, prunes with
//! the bounding period or box, hands single-sequence work to
//! [`Sequence`](crate::temporal::Sequence), and packs the fragments it keeps
//! into a fresh set.

pub mod aggregate;
pub mod algebra;
pub(crate) mod normalize;
pub mod order;
pub mod restrict;
pub mod transform;

pub use algebra::Intersection;

use crate::error::Result;
use crate::seqset::SequenceSet;
use crate::temporal::Sequence;

/// Decodes sequences of one set on demand, keeping the last one so repeated
/// lookups of the same index during a merge-join decode it once.
pub(crate) struct SeqCursor<'a> {
    set: &'a SequenceSet,
    index: usize,
    seq: Sequence,
}

impl<'a> SeqCursor<'a> {
    pub fn new(set: &'a SequenceSet) -> Result<Self> {
        Ok(Self {
            set,
            index: 0,
            seq: set.seq(0)?,
        })
    }

    pub fn get(&mut self, i: usize) -> Result<&Sequence> {
        if i != self.index {
            self.seq = self.set.seq(i)?;
            self.index = i;
        }
        Ok(&self.seq)
    }
}
