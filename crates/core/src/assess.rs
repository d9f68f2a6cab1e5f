//! Per-utterance assessment: time the decodes, gate them, fall back to a
//! precomputed record when they cannot be trusted, then reconcile the
//! transcripts.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::align::{LevenshteinAligner, Reconciler};
use crate::asr::DecodeResult;
use crate::config::AssessConfig;
use crate::error::ReconcileError;
use crate::language::lexicon::{Lexicon, Pronouncer};
use crate::language::stress::{StressRestorer, StressedPhones};
use crate::timing::{self, DecodeGate};
use crate::types::{CtmEntry, ReconciledAlignment};

/// What the caller wants assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtteranceRequest {
    pub utt_id: String,
    /// Reference transcript the speaker was asked to read.
    pub prompt: String,
}

/// Precomputed timing and transcripts for one utterance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fallback {
    pub ctm: Vec<CtmEntry>,
    pub word_ctm: Vec<CtmEntry>,
    pub prompt: String,
    pub stt: String,
}

impl Fallback {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fallback: {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("Failed to parse fallback: {}", path.display()))
    }
}

/// Where the timing in an [`Assessment`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimingSource {
    Decoded,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub utt_id: String,
    pub source: TimingSource,
    /// Why the decoded timing was not used, when it was not.
    pub rejection: Option<String>,
    pub reference: String,
    pub hypothesis: String,
    pub phone_ctm: Vec<CtmEntry>,
    pub word_ctm: Vec<CtmEntry>,
    pub alignment: ReconciledAlignment,
    pub stressed: Option<StressedPhones>,
}

/// Uppercase, drop ASCII punctuation and collapse whitespace.
///
/// Apostrophes inside a word are kept so contractions still match their
/// lexicon entries.
pub fn normalize_transcript(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let word = word.trim_matches(|c: char| c.is_ascii_punctuation());
            word.chars()
                .filter(|&c| c == '\'' || !c.is_ascii_punctuation())
                .collect::<String>()
                .to_uppercase()
        })
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

struct Timing {
    phone_ctm: Vec<CtmEntry>,
    word_ctm: Vec<CtmEntry>,
    hypothesis: String,
}

fn decode_timing(
    config: &AssessConfig,
    utt_id: &str,
    phone: Result<DecodeResult, ReconcileError>,
    word: Result<DecodeResult, ReconcileError>,
) -> Result<Timing, ReconcileError> {
    let phone = phone?;
    let word = word?;
    let phones = timing::extract(&phone);
    let words = timing::extract(&word);
    DecodeGate::new(config.max_phones_per_word).check(&words, &phones)?;

    let phone_durations = timing::repair_final_boundary(phones.durations, Some(&words.durations))?;
    Ok(Timing {
        phone_ctm: timing::to_ctm(utt_id, &phone_durations, config.ctm_confidence),
        word_ctm: timing::to_ctm(utt_id, &words.durations, config.ctm_confidence),
        hypothesis: normalize_transcript(&words.text),
    })
}

/// Assess one utterance from its phone and word decodes.
///
/// A decode that is missing, too short, implausible or has an
/// unrepairable final boundary is replaced by `fallback`; without one the
/// decode error is returned.
pub fn assess(
    config: &AssessConfig,
    lexicon: &Lexicon,
    request: &UtteranceRequest,
    phone: Result<DecodeResult, ReconcileError>,
    word: Result<DecodeResult, ReconcileError>,
    fallback: Option<&Fallback>,
) -> Result<Assessment, ReconcileError> {
    let (source, rejection, reference, timing) = match decode_timing(config, &request.utt_id, phone, word) {
        Ok(timing) => (TimingSource::Decoded, None, normalize_transcript(&request.prompt), timing),
        Err(e) if e.is_recoverable() => {
            let Some(fb) = fallback else {
                return Err(e);
            };
            log::warn!("{}: {}; using precomputed alignment", request.utt_id, e);
            let timing = Timing {
                phone_ctm: fb.ctm.clone(),
                word_ctm: fb.word_ctm.clone(),
                hypothesis: normalize_transcript(&fb.stt),
            };
            (TimingSource::Fallback, Some(e.to_string()), normalize_transcript(&fb.prompt), timing)
        }
        Err(e) => return Err(e),
    };

    let pronouncer = Pronouncer::new(lexicon).with_oov_fallback(config.oov_fallback);
    let aligner = LevenshteinAligner::new(pronouncer, config.lowercase);
    let alignment = Reconciler::new(&aligner, pronouncer).reconcile(&reference, &timing.hypothesis)?;

    let stressed = if config.restore_stress {
        Some(StressRestorer::new(lexicon, config.stress_miss).restore_alignment(&alignment)?)
    } else {
        None
    };

    log::info!(
        "{}: {} words, {} phone columns ({:?} timing)",
        request.utt_id,
        alignment.words.columns(),
        alignment.phones.columns(),
        source
    );

    Ok(Assessment {
        utt_id: request.utt_id.clone(),
        source,
        rejection,
        reference,
        hypothesis: timing.hypothesis,
        phone_ctm: timing.phone_ctm,
        word_ctm: timing.word_ctm,
        alignment,
        stressed,
    })
}
