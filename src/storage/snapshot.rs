//! Bincode snapshots of sequence-set arenas.
//!
//! A snapshot wraps the raw arena with a format version. Loading always
//! re-validates the arena, so a snapshot from an untrusted source can never
//! produce a set that breaks its invariants.

use crate::error::{Result, SeqSetError};
use crate::seqset::SequenceSet;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    layout: Vec<u8>,
}

impl SequenceSet {
    pub fn to_snapshot(&self) -> Result<Vec<u8>> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            layout: self.as_bytes().to_vec(),
        };
        bincode::serialize(&snapshot).map_err(|e| {
            SeqSetError::SerializationError(format!("Failed to serialize snapshot: {}", e))
        })
    }

    pub fn from_snapshot(bytes: &[u8]) -> Result<Self> {
        let snapshot: Snapshot = bincode::deserialize(bytes).map_err(|e| {
            SeqSetError::SerializationError(format!("Failed to deserialize snapshot: {}", e))
        })?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SeqSetError::SerializationError(format!(
                "Unsupported snapshot version {} (expected {})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }
        SequenceSet::from_layout_bytes(Bytes::from(snapshot.layout))
    }

    /// Write a snapshot to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.to_snapshot()?;
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&data)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        log::debug!(
            "saved sequence set snapshot ({} bytes) to {}",
            data.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_snapshot(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{Instant, Interpolation, Sequence};
    use seqset_types::TimestampTz;
    use tempfile::NamedTempFile;

    fn sample() -> SequenceSet {
        let t = TimestampTz::from_micros;
        let seq = Sequence::new(
            vec![Instant::new(1, t(0)), Instant::new(3, t(10))],
            true,
            true,
            Interpolation::Stepwise,
            true,
        )
        .expect("sequence");
        SequenceSet::from_sequence(seq)
    }

    #[test]
    fn test_snapshot_round_trip() {
        let set = sample();
        let bytes = set.to_snapshot().expect("serialize");
        let back = SequenceSet::from_snapshot(&bytes).expect("deserialize");
        assert_eq!(back, set);
        assert_eq!(back.as_bytes(), set.as_bytes());
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let set = sample();
        let file = NamedTempFile::new().expect("temp file");
        set.save(file.path()).expect("save");
        let back = SequenceSet::load(file.path()).expect("load");
        assert_eq!(back.hash32(), set.hash32());
    }

    #[test]
    fn test_snapshot_rejects_other_versions() {
        let snapshot = Snapshot {
            version: 99,
            layout: sample().as_bytes().to_vec(),
        };
        let bytes = bincode::serialize(&snapshot).expect("serialize");
        assert!(matches!(
            SequenceSet::from_snapshot(&bytes),
            Err(SeqSetError::SerializationError(_))
        ));
    }

    #[test]
    fn test_snapshot_rejects_corrupt_layout() {
        let mut layout = sample().as_bytes().to_vec();
        // totalcount
        layout[7] = 9;
        let bytes = bincode::serialize(&Snapshot { version: 1, layout }).expect("serialize");
        assert!(SequenceSet::from_snapshot(&bytes).is_err());
    }
}
