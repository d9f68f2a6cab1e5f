//! Plausibility check on a decode before its timing is trusted.

use crate::error::ReconcileError;

use super::duration::TimeAlignment;

/// Most phone records a decode may have per word record.
pub const DEFAULT_MAX_PHONES_PER_WORD: usize = 10;

/// Rejects decodes whose phone count is implausible for their word count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeGate {
    pub max_phones_per_word: usize,
}

impl Default for DecodeGate {
    fn default() -> Self {
        Self {
            max_phones_per_word: DEFAULT_MAX_PHONES_PER_WORD,
        }
    }
}

impl DecodeGate {
    pub fn new(max_phones_per_word: usize) -> Self {
        Self { max_phones_per_word }
    }

    pub fn accept<W, P>(&self, word_ctm: &[W], phone_ctm: &[P]) -> bool {
        phone_ctm.len() <= self.max_phones_per_word.saturating_mul(word_ctm.len())
    }

    /// Accept both time alignments or say why not. A short extraction is
    /// rejected before the ratio is looked at.
    pub fn check(&self, words: &TimeAlignment, phones: &TimeAlignment) -> Result<(), ReconcileError> {
        for (name, ta) in [("phone", phones), ("word", words)] {
            if ta.is_short() {
                return Err(ReconcileError::rejected(format!(
                    "{} decode matched {} of {} units",
                    name,
                    ta.durations.len(),
                    ta.expected
                )));
            }
        }
        if !self.accept(&words.durations, &phones.durations) {
            return Err(ReconcileError::rejected(format!(
                "{} phones for {} words exceeds {} per word",
                phones.durations.len(),
                words.durations.len(),
                self.max_phones_per_word
            )));
        }
        Ok(())
    }
}

/// [`DecodeGate::accept`] with the default factor.
pub fn accept<W, P>(word_ctm: &[W], phone_ctm: &[P]) -> bool {
    DecodeGate::default().accept(word_ctm, phone_ctm)
}
