//! Wire form of sequences and sequence sets.
//!
//! ```text
//! set:      count:i32 | sequence*
//! sequence: count:i32 | lower_inc:u8 | upper_inc:u8 | linear:u8 | (value, t:i64)*
//! ```
//!
//! Unlike the arena there is no offset table or box on the wire; readers
//! rebuild both. The value kind is not written either and must be supplied
//! by the reader.

use super::codec::{get_bool, get_i32, get_timestamp, get_value, put_value};
use crate::error::{Result, SeqSetError};
use crate::seqset::SequenceSet;
use crate::temporal::{Instant, Interpolation, Sequence};
use bytes::{BufMut, Bytes, BytesMut};
use seqset_types::ValueKind;

fn get_count(buf: &mut &[u8], what: &str) -> Result<usize> {
    let count = get_i32(buf)?;
    if count < 1 {
        return Err(SeqSetError::CorruptLayout(format!(
            "{} count {} must be positive",
            what, count
        )));
    }
    Ok(count as usize)
}

pub(crate) fn put_sequence(buf: &mut BytesMut, seq: &Sequence) {
    buf.put_i32(seq.count() as i32);
    buf.put_u8(seq.period().lower_inc() as u8);
    buf.put_u8(seq.period().upper_inc() as u8);
    buf.put_u8(seq.is_linear() as u8);
    for inst in seq.instants() {
        put_value(buf, inst.value());
        buf.put_i64(inst.t().micros());
    }
}

pub(crate) fn get_sequence(buf: &mut &[u8], kind: ValueKind) -> Result<Sequence> {
    let count = get_count(buf, "instant")?;
    let lower_inc = get_bool(buf)?;
    let upper_inc = get_bool(buf)?;
    let interp = if get_bool(buf)? {
        Interpolation::Linear
    } else {
        Interpolation::Stepwise
    };
    // each instant takes at least its timestamp
    let mut instants = Vec::with_capacity(count.min(buf.len() / 8));
    for _ in 0..count {
        let value = get_value(buf, kind)?;
        let t = get_timestamp(buf)?;
        instants.push(Instant::new(value, t));
    }
    Sequence::new(instants, lower_inc, upper_inc, interp, false)
}

impl Sequence {
    pub fn to_wire(&self) -> Bytes {
        let mut buf = BytesMut::new();
        put_sequence(&mut buf, self);
        buf.freeze()
    }

    pub fn from_wire(bytes: &[u8], kind: ValueKind) -> Result<Sequence> {
        let mut buf = bytes;
        let seq = get_sequence(&mut buf, kind)?;
        expect_consumed(buf)?;
        Ok(seq)
    }
}

impl SequenceSet {
    /// Encode in wire form.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.as_bytes().len());
        buf.put_i32(self.count() as i32);
        for i in 0..self.count() {
            put_sequence(&mut buf, &self.seq(i)?);
        }
        Ok(buf.freeze())
    }

    /// Decode the wire form of a set of `kind` values.
    ///
    /// A previously written set is already normalized, so it is rebuilt
    /// without normalization, keeping it equal to what was written.
    pub fn from_wire(bytes: &[u8], kind: ValueKind) -> Result<SequenceSet> {
        let mut buf = bytes;
        let count = get_count(&mut buf, "sequence")?;
        let mut sequences = Vec::with_capacity(count.min(buf.len() / 4));
        for _ in 0..count {
            sequences.push(get_sequence(&mut buf, kind)?);
        }
        expect_consumed(buf)?;
        log::debug!("read {} sequences of kind {} from wire", count, kind);
        SequenceSet::new(sequences, false)
    }
}

fn expect_consumed(buf: &[u8]) -> Result<()> {
    if buf.is_empty() {
        Ok(())
    } else {
        Err(SeqSetError::CorruptLayout(format!(
            "{} trailing bytes after wire form",
            buf.len()
        )))
    }
}
