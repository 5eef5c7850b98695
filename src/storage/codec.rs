//! Byte encodings of values, boxes and packed sequences.
//!
//! All integers and floats are big-endian. Readers take `&mut &[u8]` and
//! check the remaining length before every fixed-size read, so a short or
//! corrupt buffer yields an error instead of a panic.

use crate::error::{Result, SeqSetError};
use crate::temporal::{Instant, Interpolation, Sequence};
use bytes::{Buf, BufMut, BytesMut};
use geo::Point;
use seqset_types::{BBox, GeoPoint, Period, STBox, TBox, TimestampTz, Value, ValueKind};

const POINT_HAS_Z: u8 = 0b0000_0001;
const POINT_GEODETIC: u8 = 0b0000_0010;

const SEQ_LOWER_INC: u8 = 0b0000_0001;
const SEQ_UPPER_INC: u8 = 0b0000_0010;
const SEQ_LINEAR: u8 = 0b0000_0100;

/// `len:u32 | count:u32 | flags:u8 | kind:u8 | pad(6) | lower:i64 | upper:i64`
pub(crate) const PACKED_HEADER_SIZE: usize = 32;

/// Fail unless `n` more bytes are available.
pub(crate) fn need(buf: &[u8], n: usize) -> Result<()> {
    if buf.remaining() < n {
        return Err(SeqSetError::UnexpectedEof {
            needed: n,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

fn get_u8(buf: &mut &[u8]) -> Result<u8> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn get_u32(buf: &mut &[u8]) -> Result<u32> {
    need(buf, 4)?;
    Ok(buf.get_u32())
}

pub(crate) fn get_i32(buf: &mut &[u8]) -> Result<i32> {
    need(buf, 4)?;
    Ok(buf.get_i32())
}

fn get_i64(buf: &mut &[u8]) -> Result<i64> {
    need(buf, 8)?;
    Ok(buf.get_i64())
}

fn get_f64(buf: &mut &[u8]) -> Result<f64> {
    need(buf, 8)?;
    Ok(buf.get_f64())
}

pub(crate) fn get_bool(buf: &mut &[u8]) -> Result<bool> {
    match get_u8(buf)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(SeqSetError::CorruptLayout(format!(
            "expected a boolean byte, found {}",
            other
        ))),
    }
}

pub(crate) fn get_timestamp(buf: &mut &[u8]) -> Result<TimestampTz> {
    Ok(TimestampTz::from_micros(get_i64(buf)?))
}

pub(crate) fn put_value(buf: &mut BytesMut, value: &Value) {
    match value {
        Value::Bool(b) => buf.put_u8(u8::from(*b)),
        Value::Int(i) => buf.put_i32(*i),
        Value::Float(f) => buf.put_f64(*f),
        Value::Text(s) => {
            buf.put_u32(s.len() as u32);
            buf.put(s.as_bytes());
        }
        Value::Point(p) => {
            let mut flags = 0;
            if p.has_z() {
                flags |= POINT_HAS_Z;
            }
            if p.geodetic {
                flags |= POINT_GEODETIC;
            }
            buf.put_u8(flags);
            buf.put_i32(p.srid);
            buf.put_f64(p.x());
            buf.put_f64(p.y());
            if let Some(z) = p.z {
                buf.put_f64(z);
            }
        }
        Value::Double2(a, b) => {
            buf.put_f64(*a);
            buf.put_f64(*b);
        }
    }
}

pub(crate) fn get_value(buf: &mut &[u8], kind: ValueKind) -> Result<Value> {
    let value = match kind {
        ValueKind::Bool => Value::Bool(get_bool(buf)?),
        ValueKind::Int => Value::Int(get_i32(buf)?),
        ValueKind::Float => Value::Float(get_f64(buf)?),
        ValueKind::Text => {
            let len = get_u32(buf)? as usize;
            need(buf, len)?;
            let text = std::str::from_utf8(&buf[..len])
                .map_err(|e| SeqSetError::CorruptLayout(format!("text value: {}", e)))?
                .to_string();
            buf.advance(len);
            Value::Text(text)
        }
        ValueKind::GeomPoint | ValueKind::GeogPoint => {
            let flags = get_u8(buf)?;
            let srid = get_i32(buf)?;
            let (x, y) = (get_f64(buf)?, get_f64(buf)?);
            let z = match flags & POINT_HAS_Z {
                0 => None,
                _ => Some(get_f64(buf)?),
            };
            let geodetic = flags & POINT_GEODETIC != 0;
            if geodetic != (kind == ValueKind::GeogPoint) {
                return Err(SeqSetError::CorruptLayout(format!(
                    "point flags {:#04x} do not match kind {}",
                    flags, kind
                )));
            }
            Value::Point(GeoPoint {
                point: Point::new(x, y),
                z,
                srid,
                geodetic,
            })
        }
        ValueKind::Double2 => Value::Double2(get_f64(buf)?, get_f64(buf)?),
    };
    Ok(value)
}

pub(crate) fn encoded_value_len(value: &Value) -> usize {
    match value {
        Value::Bool(_) => 1,
        Value::Int(_) => 4,
        Value::Float(_) => 8,
        Value::Text(s) => 4 + s.len(),
        Value::Point(p) => 1 + 4 + 16 + if p.has_z() { 8 } else { 0 },
        Value::Double2(..) => 16,
    }
}

fn put_period(buf: &mut BytesMut, p: &Period) {
    buf.put_i64(p.lower().micros());
    buf.put_i64(p.upper().micros());
    buf.put_u8(u8::from(p.lower_inc()));
    buf.put_u8(u8::from(p.upper_inc()));
}

fn get_period(buf: &mut &[u8]) -> Result<Period> {
    let lower = get_timestamp(buf)?;
    let upper = get_timestamp(buf)?;
    let lower_inc = get_bool(buf)?;
    let upper_inc = get_bool(buf)?;
    Ok(Period::new(lower, upper, lower_inc, upper_inc)?)
}

pub(crate) fn put_bbox(buf: &mut BytesMut, bbox: &BBox) {
    match bbox {
        BBox::Period(p) => put_period(buf, p),
        BBox::TBox(b) => {
            buf.put_f64(b.xmin);
            buf.put_f64(b.xmax);
            buf.put_i64(b.tmin.micros());
            buf.put_i64(b.tmax.micros());
        }
        BBox::STBox(b) => {
            for v in [b.xmin, b.xmax, b.ymin, b.ymax, b.zmin, b.zmax] {
                buf.put_f64(v);
            }
            buf.put_i64(b.tmin.micros());
            buf.put_i64(b.tmax.micros());
            buf.put_i32(b.srid);
            let mut flags = 0;
            if b.has_z {
                flags |= POINT_HAS_Z;
            }
            if b.geodetic {
                flags |= POINT_GEODETIC;
            }
            buf.put_u8(flags);
        }
    }
}

/// Decode the trailing box of a set of `kind` values; `None` for boxless kinds.
pub(crate) fn get_bbox(buf: &mut &[u8], kind: ValueKind) -> Result<Option<BBox>> {
    let bbox = match BBox::kind_tag(kind) {
        None => return Ok(None),
        Some(1) => BBox::Period(get_period(buf)?),
        Some(2) => BBox::TBox(TBox {
            xmin: get_f64(buf)?,
            xmax: get_f64(buf)?,
            tmin: get_timestamp(buf)?,
            tmax: get_timestamp(buf)?,
        }),
        Some(_) => {
            let mut coords = [0.0; 6];
            for c in coords.iter_mut() {
                *c = get_f64(buf)?;
            }
            let tmin = get_timestamp(buf)?;
            let tmax = get_timestamp(buf)?;
            let srid = get_i32(buf)?;
            let flags = get_u8(buf)?;
            BBox::STBox(STBox {
                xmin: coords[0],
                xmax: coords[1],
                ymin: coords[2],
                ymax: coords[3],
                zmin: coords[4],
                zmax: coords[5],
                has_z: flags & POINT_HAS_Z != 0,
                geodetic: flags & POINT_GEODETIC != 0,
                srid,
                tmin,
                tmax,
            })
        }
    };
    Ok(Some(bbox))
}

/// The fixed-size prefix of a packed sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PackedHeader {
    pub len: usize,
    pub count: usize,
    pub kind: ValueKind,
    pub interp: Interpolation,
    pub period: Period,
}

pub(crate) fn packed_len(seq: &Sequence) -> usize {
    PACKED_HEADER_SIZE
        + seq
            .instants()
            .iter()
            .map(|inst| 8 + encoded_value_len(inst.value()))
            .sum::<usize>()
}

/// Append the packed form of `seq` to `buf`.
pub(crate) fn put_packed(buf: &mut BytesMut, seq: &Sequence) {
    let period = seq.period();
    let mut flags = 0;
    if period.lower_inc() {
        flags |= SEQ_LOWER_INC;
    }
    if period.upper_inc() {
        flags |= SEQ_UPPER_INC;
    }
    if seq.is_linear() {
        flags |= SEQ_LINEAR;
    }
    buf.put_u32(packed_len(seq) as u32);
    buf.put_u32(seq.count() as u32);
    buf.put_u8(flags);
    buf.put_u8(seq.kind().tag());
    buf.put_bytes(0, 6);
    buf.put_i64(period.lower().micros());
    buf.put_i64(period.upper().micros());
    for inst in seq.instants() {
        buf.put_i64(inst.t().micros());
        put_value(buf, inst.value());
    }
}

pub(crate) fn read_packed_header(bytes: &[u8]) -> Result<PackedHeader> {
    let mut buf = bytes;
    need(buf, PACKED_HEADER_SIZE)?;
    let len = get_u32(&mut buf)? as usize;
    let count = get_u32(&mut buf)? as usize;
    let flags = get_u8(&mut buf)?;
    let kind = ValueKind::from_tag(get_u8(&mut buf)?)?;
    buf.advance(6);
    let lower = get_timestamp(&mut buf)?;
    let upper = get_timestamp(&mut buf)?;
    if len < PACKED_HEADER_SIZE || len > bytes.len() {
        return Err(SeqSetError::CorruptLayout(format!(
            "packed sequence length {} outside 32..={}",
            len,
            bytes.len()
        )));
    }
    if count == 0 {
        return Err(SeqSetError::CorruptLayout(
            "packed sequence without instants".to_string(),
        ));
    }
    let interp = if flags & SEQ_LINEAR != 0 {
        Interpolation::Linear
    } else {
        Interpolation::Stepwise
    };
    let period = Period::new(
        lower,
        upper,
        flags & SEQ_LOWER_INC != 0,
        flags & SEQ_UPPER_INC != 0,
    )?;
    Ok(PackedHeader {
        len,
        count,
        kind,
        interp,
        period,
    })
}

/// Decode a packed sequence.
///
/// With `validate`, the instants are re-checked against every sequence
/// invariant; otherwise only the period is checked against the instants.
pub(crate) fn get_packed(bytes: &[u8], validate: bool) -> Result<Sequence> {
    let header = read_packed_header(bytes)?;
    let mut buf = &bytes[PACKED_HEADER_SIZE..header.len];
    let mut instants = Vec::with_capacity(header.count);
    for _ in 0..header.count {
        let t = get_timestamp(&mut buf)?;
        let value = get_value(&mut buf, header.kind)?;
        instants.push(Instant::new(value, t));
    }
    if !buf.is_empty() {
        return Err(SeqSetError::CorruptLayout(format!(
            "{} trailing bytes after packed sequence",
            buf.len()
        )));
    }
    let period = header.period;
    let first = instants[0].t();
    let last = instants[instants.len() - 1].t();
    if first != period.lower() || last != period.upper() {
        return Err(SeqSetError::CorruptLayout(format!(
            "packed period {} does not match instants {}..{}",
            period, first, last
        )));
    }
    if validate {
        let seq = Sequence::new(
            instants,
            period.lower_inc(),
            period.upper_inc(),
            header.interp,
            false,
        )?;
        return Ok(seq);
    }
    Ok(Sequence::from_parts(instants, period, header.interp))
}
