use super::SequenceSet;
use crate::error::Result;
use crate::storage::codec;
use seqset_types::{BBox, Value};

impl SequenceSet {
    /// The summary box stored after the last sequence: a period for
    /// booleans and text, a value/time box for numbers and a
    /// spatiotemporal box for points. `None` for kinds without one.
    pub fn bbox(&self) -> Result<Option<BBox>> {
        let bytes = self.arena().bbox_bytes()?;
        codec::get_bbox(&mut &bytes[..], self.kind())
    }

    /// Whether `value` can occur at all; `false` only when the numeric box
    /// rules it out.
    pub(crate) fn may_contain(&self, value: &Value) -> Result<bool> {
        if !self.kind().is_numeric() {
            return Ok(true);
        }
        Ok(match self.bbox()? {
            Some(bbox) => bbox.may_contain(value),
            None => true,
        })
    }
}
