//! Builder for sequence sets
//!
//! Collects sequences and applies a [`Config`] (alignment, normalization)
//! when the set is assembled.

use crate::config::Config;
use crate::error::{Result, SeqSetError};
use crate::seqset::SequenceSet;
use crate::temporal::{Interpolation, Sequence};
use seqset_types::{PeriodSet, Value};

/// Builder for sequence sets with custom layout and normalization settings.
#[derive(Debug, Clone)]
pub struct SeqSetBuilder {
    config: Config,
    sequences: Vec<Sequence>,
}

impl SeqSetBuilder {
    /// Create a builder with the default configuration and no sequences.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            sequences: Vec::new(),
        }
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Byte boundary for packed sequences and the trailing box.
    pub fn alignment(mut self, alignment: usize) -> Self {
        self.config = self.config.with_alignment(alignment);
        self
    }

    pub fn normalize(mut self, normalize: bool) -> Self {
        self.config = self.config.with_normalize(normalize);
        self
    }

    pub fn push(mut self, seq: Sequence) -> Self {
        self.sequences.push(seq);
        self
    }

    pub fn extend<I: IntoIterator<Item = Sequence>>(mut self, seqs: I) -> Self {
        self.sequences.extend(seqs);
        self
    }

    fn checked_config(&self) -> Result<Config> {
        self.config
            .validate()
            .map_err(SeqSetError::InvalidConfig)?;
        Ok(self.config.clone())
    }

    /// Validate the configuration and the sequences, then pack the set.
    pub fn build(self) -> Result<SequenceSet> {
        let config = self.checked_config()?;
        SequenceSet::build(self.sequences, config.normalize, config.alignment)
    }

    /// A constant `value` over `periods`, laid out with this builder's
    /// alignment. Pushed sequences are ignored; discrete values are always
    /// stepwise.
    pub fn from_base(
        self,
        value: Value,
        periods: &PeriodSet,
        interp: Interpolation,
    ) -> Result<SequenceSet> {
        let config = self.checked_config()?;
        Ok(SequenceSet::from_base_aligned(
            value,
            periods,
            interp,
            config.alignment,
        ))
    }
}

impl Default for SeqSetBuilder {
    fn default() -> Self {
        Self::new()
    }
}
