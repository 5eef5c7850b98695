//! Byte-level representations of sequences and sequence sets.
//!
//! - `codec`: value, box and packed-sequence encodings shared by the others
//! - `layout`: the in-memory arena (header, offset table, packed data, box)
//! - `wire`: the compact stream form exchanged with other systems
//! - `snapshot`: bincode-wrapped arenas on disk (feature `snapshot`)

pub(crate) mod codec;
pub(crate) mod layout;
#[cfg(feature = "snapshot")]
pub mod snapshot;
pub mod wire;
