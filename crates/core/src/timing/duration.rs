//! Phoneme start/end times from ASR token timestamps.

use serde::{Deserialize, Serialize};

use crate::asr::DecodeResult;
use crate::error::ReconcileError;
use crate::types::PhonemeDuration;

/// Word-piece marker some tokenisers put in front of a token.
const PIECE_MARKER: char = '\u{2581}';

/// Timed units of one decode, with the number that were asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeAlignment {
    pub text: String,
    pub durations: Vec<PhonemeDuration>,
    pub expected: usize,
}

impl TimeAlignment {
    /// Tokens ran out before every unit was matched.
    pub fn is_short(&self) -> bool {
        self.durations.len() < self.expected
    }
}

fn token_text(token: &str) -> &str {
    token.trim_matches(|c: char| c.is_whitespace() || c == PIECE_MARKER)
}

/// Consume `prefix` from the front of `rest`, ignoring ASCII case.
fn eat_prefix<'r>(rest: &'r str, prefix: &str) -> Option<&'r str> {
    let head = rest.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        rest.get(prefix.len()..)
    } else {
        None
    }
}

/// Greedily match tokens against `phonemes`.
///
/// Tokens that do not continue the current phoneme are skipped. A phoneme
/// starts at its first matching token and ends halfway to the timestamp
/// after its last one, or at the last one's own timestamp when nothing
/// follows. The result is shorter than `phonemes` when tokens run out.
pub fn phoneme_durations<T, P>(timestamps: &[f64], tokens: &[T], phonemes: &[P]) -> Vec<PhonemeDuration>
where
    T: AsRef<str>,
    P: AsRef<str>,
{
    let mut durations = Vec::with_capacity(phonemes.len());
    let mut targets = phonemes.iter().map(AsRef::as_ref);
    let Some(mut target) = targets.next() else {
        return durations;
    };
    let mut rest = target;
    let mut start = None;

    for (i, (token, &time)) in tokens.iter().zip(timestamps).enumerate() {
        let piece = token_text(token.as_ref());
        if piece.is_empty() {
            continue;
        }
        let Some(remaining) = eat_prefix(rest, piece) else {
            continue;
        };
        let begin = *start.get_or_insert(time);
        rest = remaining;
        if !rest.is_empty() {
            continue;
        }

        let end = match timestamps.get(i + 1) {
            Some(next) => (time + next) / 2.0,
            None => time,
        };
        durations.push(PhonemeDuration::new(target, begin, end));
        start = None;
        match targets.next() {
            Some(next) => {
                target = next;
                rest = target;
            }
            None => break,
        }
    }
    durations
}

/// Time-align a decode against its own recognised text.
pub fn extract(decode: &DecodeResult) -> TimeAlignment {
    let units = decode.words();
    let durations = phoneme_durations(&decode.timestamps, &decode.tokens, &units);
    if durations.len() < units.len() {
        log::warn!(
            "Recovered {} of {} durations from '{}'",
            durations.len(),
            units.len(),
            decode.text.trim()
        );
    }
    TimeAlignment {
        text: decode.text.trim().to_string(),
        expected: units.len(),
        durations,
    }
}

/// Give a zero-length final phoneme the end time of the last word.
///
/// Fails when the last phoneme is degenerate and no usable word end time
/// exists.
pub fn repair_final_boundary(
    mut phones: Vec<PhonemeDuration>,
    words: Option<&[PhonemeDuration]>,
) -> Result<Vec<PhonemeDuration>, ReconcileError> {
    let Some(last) = phones.len().checked_sub(1) else {
        return Ok(phones);
    };
    if phones[last].end != phones[last].start {
        return Ok(phones);
    }
    match words.and_then(|w| w.last()) {
        Some(word) if word.end >= phones[last].start => {
            log::info!(
                "Final phoneme '{}' end moved from {:.3} to word end {:.3}",
                phones[last].phoneme,
                phones[last].end,
                word.end
            );
            phones[last].end = word.end;
            Ok(phones)
        }
        _ => Err(ReconcileError::DegenerateFinalBoundary {
            phoneme: phones[last].phoneme.clone(),
            time: phones[last].start,
        }),
    }
}
