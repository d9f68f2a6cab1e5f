//! Lexical stress restoration for unstressed phone sequences.

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::types::{ReconciledAlignment, Side, SENTINEL};

use super::lexicon::{strip_stress, Lexicon};

/// What to do with a word missing from the stress lexicon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissPolicy {
    /// Leave the word's phones unstressed.
    #[default]
    KeepUnstressed,
    Fail,
}

/// Stress-restored flat phone sequences of both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StressedPhones {
    pub ref_phones: Vec<String>,
    pub hyp_phones: Vec<String>,
}

/// Re-applies stress digits from a stressed lexicon, word by word.
#[derive(Debug, Clone, Copy)]
pub struct StressRestorer<'a> {
    lexicon: &'a Lexicon,
    on_miss: MissPolicy,
}

impl<'a> StressRestorer<'a> {
    pub fn new(lexicon: &'a Lexicon, on_miss: MissPolicy) -> Self {
        Self { lexicon, on_miss }
    }

    /// Restore stress on one flat, sentinel-delimited phone sequence.
    ///
    /// Each run of phones between sentinels is paired with the next entry
    /// of `words`. Blank columns and sentinels pass through untouched, so
    /// the output has the same length as `phones`.
    pub fn restore(&self, phones: &[String], words: &[String]) -> Result<Vec<String>, ReconcileError> {
        let mut out = Vec::with_capacity(phones.len());
        let mut words = words.iter();
        let mut group: Vec<&String> = Vec::new();

        for phone in phones {
            if phone == SENTINEL {
                self.flush(&mut group, &mut words, &mut out)?;
                out.push(phone.clone());
            } else {
                group.push(phone);
            }
        }
        self.flush(&mut group, &mut words, &mut out)?;
        Ok(out)
    }

    fn flush<'w>(
        &self,
        group: &mut Vec<&String>,
        words: &mut impl Iterator<Item = &'w String>,
        out: &mut Vec<String>,
    ) -> Result<(), ReconcileError> {
        if group.iter().all(|p| p.is_empty()) {
            out.extend(group.drain(..).cloned());
            return Ok(());
        }
        let Some(word) = words.next() else {
            return Err(ReconcileError::shape("stress restoration word groups", 0, 0, group.len()));
        };
        match self.lexicon.lookup_word(word) {
            Some(stressed) => out.extend(apply_stress(group, stressed)),
            None => {
                if self.on_miss == MissPolicy::Fail {
                    return Err(ReconcileError::LexiconMiss { word: word.clone() });
                }
                log::warn!("'{}' not in stress lexicon, keeping unstressed phones", word);
                out.extend(group.iter().map(|p| p.to_string()));
            }
        }
        group.clear();
        Ok(())
    }

    /// Restore both sides of a reconciled alignment.
    pub fn restore_alignment(&self, alignment: &ReconciledAlignment) -> Result<StressedPhones, ReconcileError> {
        Ok(StressedPhones {
            ref_phones: self.restore(
                alignment.phones.phones(Side::Reference),
                alignment.words.tokens(Side::Reference),
            )?,
            hyp_phones: self.restore(
                alignment.phones.phones(Side::Hypothesis),
                alignment.words.tokens(Side::Hypothesis),
            )?,
        })
    }
}

/// Walk a word's unstressed phones and its stressed pronunciation in
/// lock-step. A phone that matches the stressed entry without its digits
/// gets those digits appended; blanks keep their place without consuming
/// an entry.
fn apply_stress(group: &[&String], stressed: &[String]) -> Vec<String> {
    let mut entries = stressed.iter();
    group
        .iter()
        .map(|phone| {
            if phone.is_empty() {
                return String::new();
            }
            match entries.next() {
                Some(entry) => {
                    let base = strip_stress(entry);
                    if base.eq_ignore_ascii_case(phone) {
                        format!("{}{}", phone, &entry[base.len()..])
                    } else {
                        phone.to_string()
                    }
                }
                None => phone.to_string(),
            }
        })
        .collect()
}
