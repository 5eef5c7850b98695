//! The contiguous arena a sequence set lives in.
//!
//! ```text
//! header  (16 bytes): count:i32 | totalcount:i32 | kind:u8 | flags:u8 | align:u8 | pad
//! offsets ((count+1) x u64): start of each packed sequence, then of the box,
//!                            relative to the start of the data area
//! data:   packed seq 0 | pad | packed seq 1 | pad | ... | bbox | pad
//! ```
//!
//! Every offset read from an arena is checked against the arena length
//! before it is dereferenced.

use super::codec::{self, need};
use crate::error::{Result, SeqSetError};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use seqset_types::{BBox, ValueKind};

pub(crate) const HEADER_SIZE: usize = 16;
const OFFSET_SIZE: usize = 8;

/// Round `len` up to a multiple of `align` (a power of two).
pub(crate) fn pad_to(len: usize, align: usize) -> usize {
    (len + align - 1) & !(align - 1)
}

/// Fields of the fixed-size arena header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Header {
    pub count: usize,
    pub totalcount: usize,
    pub kind: ValueKind,
    pub flags: u8,
    pub align: usize,
}

impl Header {
    pub fn data_start(&self) -> usize {
        HEADER_SIZE + (self.count + 1) * OFFSET_SIZE
    }
}

/// Pack already-encoded sequences and the summary box into one arena.
///
/// `packed` holds each sequence's packed bytes; reused sequences are passed
/// as slices of their original arena and copied verbatim.
pub(crate) fn assemble(header: &Header, packed: &[Bytes], bbox: Option<&BBox>) -> Bytes {
    let mut bbox_bytes = BytesMut::new();
    if let Some(bbox) = bbox {
        codec::put_bbox(&mut bbox_bytes, bbox);
    }
    let data_len: usize = packed
        .iter()
        .map(|p| pad_to(p.len(), header.align))
        .sum::<usize>()
        + pad_to(bbox_bytes.len(), header.align);

    let mut buf = BytesMut::with_capacity(header.data_start() + data_len);
    buf.put_i32(header.count as i32);
    buf.put_i32(header.totalcount as i32);
    buf.put_u8(header.kind.tag());
    buf.put_u8(header.flags);
    buf.put_u8(header.align.trailing_zeros() as u8);
    buf.put_bytes(0, HEADER_SIZE - 11);

    let mut offset = 0usize;
    for p in packed {
        buf.put_u64(offset as u64);
        offset += pad_to(p.len(), header.align);
    }
    buf.put_u64(offset as u64);

    for p in packed {
        buf.put_slice(p);
        buf.put_bytes(0, pad_to(p.len(), header.align) - p.len());
    }
    buf.put_slice(&bbox_bytes);
    buf.put_bytes(0, pad_to(bbox_bytes.len(), header.align) - bbox_bytes.len());
    buf.freeze()
}

pub(crate) fn read_header(bytes: &[u8]) -> Result<Header> {
    let mut buf = bytes;
    need(buf, HEADER_SIZE)?;
    let count = buf.get_i32();
    let totalcount = buf.get_i32();
    let kind = ValueKind::from_tag(buf.get_u8())?;
    let flags = buf.get_u8();
    let align_log2 = buf.get_u8();
    if count < 1 || totalcount < count {
        return Err(SeqSetError::CorruptLayout(format!(
            "header count {} / totalcount {} out of range",
            count, totalcount
        )));
    }
    if align_log2 > 6 {
        return Err(SeqSetError::CorruptLayout(format!(
            "alignment 2^{} out of range",
            align_log2
        )));
    }
    Ok(Header {
        count: count as usize,
        totalcount: totalcount as usize,
        kind,
        flags,
        align: 1 << align_log2,
    })
}

/// Bounds-checked read access to an arena.
pub(crate) struct Arena<'a> {
    bytes: &'a Bytes,
    header: Header,
}

impl<'a> Arena<'a> {
    pub fn new(bytes: &'a Bytes, header: Header) -> Self {
        Self { bytes, header }
    }

    fn data_len(&self) -> usize {
        self.bytes.len().saturating_sub(self.header.data_start())
    }

    /// Offset `i` (`0..=count`) relative to the data area.
    pub fn offset(&self, i: usize) -> Result<usize> {
        if i > self.header.count {
            return Err(SeqSetError::CorruptLayout(format!(
                "offset index {} beyond count {}",
                i, self.header.count
            )));
        }
        let at = HEADER_SIZE + i * OFFSET_SIZE;
        let mut buf = self.bytes.get(at..).unwrap_or_default();
        need(buf, OFFSET_SIZE)?;
        let offset = usize::try_from(buf.get_u64()).map_err(|_| {
            SeqSetError::CorruptLayout(format!("offset {} does not fit in memory", i))
        })?;
        if offset > self.data_len() {
            return Err(SeqSetError::CorruptLayout(format!(
                "offset {} = {} beyond data area of {} bytes",
                i,
                offset,
                self.data_len()
            )));
        }
        Ok(offset)
    }

    /// Byte range of element `i`, where element `count` is the box.
    fn element(&self, i: usize) -> Result<Bytes> {
        let start = self.offset(i)?;
        let end = if i == self.header.count {
            self.data_len()
        } else {
            self.offset(i + 1)?
        };
        if end < start {
            return Err(SeqSetError::CorruptLayout(format!(
                "offsets {} and {} are not increasing",
                i,
                i + 1
            )));
        }
        let base = self.header.data_start();
        Ok(self.bytes.slice(base + start..base + end))
    }

    /// Packed bytes of sequence `i`, padding included.
    pub fn packed(&self, i: usize) -> Result<Bytes> {
        if i >= self.header.count {
            return Err(SeqSetError::CorruptLayout(format!(
                "sequence index {} beyond count {}",
                i, self.header.count
            )));
        }
        self.element(i)
    }

    /// Packed bytes of sequence `i` without trailing padding.
    pub fn packed_exact(&self, i: usize) -> Result<Bytes> {
        let padded = self.packed(i)?;
        let header = codec::read_packed_header(&padded)?;
        Ok(padded.slice(..header.len))
    }

    pub fn bbox_bytes(&self) -> Result<Bytes> {
        self.element(self.header.count)
    }
}
