//! Concatenates resolved segments into one utterance-level alignment.

use std::collections::BTreeMap;

use crate::error::ReconcileError;
use crate::types::{
    is_placeholder, PhoneAlignment, ReconciledAlignment, ResolvedSegment, Side, WordAlignment,
};

use super::boundary::{group_by_word, leading_blanks, strip_opening_sentinels, word_column_widths};
use super::phone::check_shape;

/// Merge segments in ascending key order.
///
/// Every segment after the first has its opening sentinels removed, since
/// the previous segment already closed on one. Maps are shifted by the
/// running column count at each level.
pub fn merge_segments(
    segments: &BTreeMap<usize, ResolvedSegment>,
) -> Result<ReconciledAlignment, ReconcileError> {
    let Some(first) = segments.values().next() else {
        return Err(ReconcileError::EmptyAlignment);
    };
    if segments.len() == 1 {
        check_shape(&first.phones, "single segment")?;
        return Ok(finish(first.words.clone(), first.phones.clone()));
    }

    let mut words = WordAlignment::default();
    let mut phones = PhoneAlignment::default();
    let mut word_offset = 0;
    let mut phone_offset = 0;

    for (pos, segment) in segments.values().enumerate() {
        let seg_phones = if pos == 0 {
            segment.phones.clone()
        } else {
            strip_opening_sentinels(&segment.phones)
        };
        check_shape(&seg_phones, "merged segment")?;

        phones.ref_map.extend(seg_phones.ref_map.iter().map(|i| i + phone_offset));
        phones.hyp_map.extend(seg_phones.hyp_map.iter().map(|i| i + phone_offset));
        phone_offset += seg_phones.columns();
        phones.ref_phones.extend(seg_phones.ref_phones);
        phones.hyp_phones.extend(seg_phones.hyp_phones);
        phones.tags.extend(seg_phones.tags);

        let w = &segment.words;
        words.ref_map.extend(w.ref_map.iter().map(|i| i + word_offset));
        words.hyp_map.extend(w.hyp_map.iter().map(|i| i + word_offset));
        word_offset += w.columns();
        words.ref_words.extend(w.ref_words.iter().cloned());
        words.hyp_words.extend(w.hyp_words.iter().cloned());
        words.word_ref.extend(w.word_ref.iter().cloned());
        words.word_hyp.extend(w.word_hyp.iter().cloned());
        words.tags.extend_from_slice(&w.tags);
    }
    log::debug!(
        "merged {} segments into {} word and {} phone columns",
        segments.len(),
        words.columns(),
        phones.columns()
    );

    Ok(finish(words, phones))
}

/// Flatten word tokens, group phones by word, measure each word's column
/// span and record leading blanks.
fn finish(mut words: WordAlignment, phones: PhoneAlignment) -> ReconciledAlignment {
    words.word_ref = flatten_words(&words.word_ref);
    words.word_hyp = flatten_words(&words.word_hyp);

    let ref_phones_by_word = group_by_word(&phones.ref_phones);
    let hyp_phones_by_word = group_by_word(&phones.hyp_phones);
    for (side, groups) in [
        (Side::Reference, &ref_phones_by_word),
        (Side::Hypothesis, &hyp_phones_by_word),
    ] {
        if groups.len() != words.tokens(side).len() {
            log::warn!(
                "{:?} has {} phone groups for {} words",
                side,
                groups.len(),
                words.tokens(side).len()
            );
        }
    }

    ReconciledAlignment {
        ref_words: strip_leading_placeholders(flatten_words(&words.ref_words)),
        hyp_words: strip_leading_placeholders(flatten_words(&words.hyp_words)),
        leading: leading_blanks(&phones),
        ref_word_columns: word_column_widths(&phones.ref_phones),
        hyp_word_columns: word_column_widths(&phones.hyp_phones),
        ref_phones_by_word,
        hyp_phones_by_word,
        words,
        phones,
    }
}

/// Split multi-word tokens on internal whitespace. Placeholders are kept
/// as single entries.
pub fn flatten_words(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.trim().is_empty() {
            out.push(token.clone());
        } else {
            out.extend(token.split_whitespace().map(str::to_string));
        }
    }
    out
}

/// Drop the run of blank and filler tokens at the start.
pub fn strip_leading_placeholders(mut words: Vec<String>) -> Vec<String> {
    let lead = words.iter().take_while(|w| is_placeholder(w)).count();
    words.drain(..lead);
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EditTag::{self, *};
    use crate::types::{SENTINEL, WORD_FILLER};

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn resolved(
        word_ref: &[&str],
        word_hyp: &[&str],
        word_tags: &[EditTag],
        ref_phones: &[&str],
        hyp_phones: &[&str],
        phone_tags: &[EditTag],
    ) -> ResolvedSegment {
        let dense = |tokens: &[&str], side: Side| {
            let mut it = tokens.iter();
            word_tags
                .iter()
                .map(|t| {
                    if t.consumes(side) {
                        it.next().map(|s| s.to_string()).unwrap_or_default()
                    } else {
                        WORD_FILLER.to_string()
                    }
                })
                .collect::<Vec<_>>()
        };
        let map = |side: Side| {
            word_tags
                .iter()
                .enumerate()
                .filter(|(_, t)| t.consumes(side))
                .map(|(i, _)| i)
                .collect::<Vec<_>>()
        };
        ResolvedSegment {
            words: WordAlignment {
                ref_words: dense(word_ref, Side::Reference),
                hyp_words: dense(word_hyp, Side::Hypothesis),
                word_ref: strs(word_ref),
                word_hyp: strs(word_hyp),
                ref_map: map(Side::Reference),
                hyp_map: map(Side::Hypothesis),
                tags: word_tags.to_vec(),
            },
            phones: PhoneAlignment::from_columns(strs(ref_phones), strs(hyp_phones), phone_tags.to_vec()),
        }
    }

    fn no_consecutive_sentinels(phones: &[String]) -> bool {
        let real: Vec<&String> = phones.iter().filter(|p| !p.is_empty()).collect();
        real.windows(2).all(|w| !(w[0] == SENTINEL && w[1] == SENTINEL))
    }

    fn cat_sat_down() -> BTreeMap<usize, ResolvedSegment> {
        let mut segments = BTreeMap::new();
        segments.insert(
            0,
            resolved(&["THE"], &["THE"], &[Correct], &["|", "DH", "AH", "|"], &["|", "DH", "AH", "|"], &[Correct; 4]),
        );
        segments.insert(
            1,
            resolved(
                &["CAT"],
                &["BAT"],
                &[Substitution],
                &["|", "K", "AE", "T", "|"],
                &["|", "B", "AE", "T", "|"],
                &[Correct, Substitution, Correct, Correct, Correct],
            ),
        );
        segments.insert(
            2,
            resolved(&["SAT"], &["SAT"], &[Correct], &["|", "S", "AE", "T", "|"], &["|", "S", "AE", "T", "|"], &[Correct; 5]),
        );
        segments.insert(
            3,
            resolved(
                &["DOWN"],
                &[],
                &[Deletion],
                &["|", "D", "AW", "N", "|"],
                &["", "", "", "", "|"],
                &[Deletion, Deletion, Deletion, Deletion, Correct],
            ),
        );
        segments
    }

    #[test]
    fn test_merge_empty_is_error() {
        assert!(matches!(
            merge_segments(&BTreeMap::new()),
            Err(ReconcileError::EmptyAlignment)
        ));
    }

    #[test]
    fn test_single_segment_passes_through() {
        let seg = resolved(
            &["THE", "CAT"],
            &["THE", "CAT"],
            &[Correct, Correct],
            &["|", "DH", "AH", "|", "K", "AE", "T", "|"],
            &["|", "DH", "AH", "|", "K", "AE", "T", "|"],
            &[Correct; 8],
        );
        let merged = merge_segments(&BTreeMap::from([(0, seg.clone())])).unwrap();
        assert_eq!(merged.phones, seg.phones);
        assert_eq!(merged.words, seg.words);
        assert_eq!(merged.ref_phones_by_word, vec![strs(&["DH", "AH"]), strs(&["K", "AE", "T"])]);
        assert_eq!(merged.ref_words, strs(&["THE", "CAT"]));
    }

    #[test]
    fn test_multi_segment_merge() {
        let merged = merge_segments(&cat_sat_down()).unwrap();
        assert_eq!(
            merged.phones.ref_phones,
            strs(&["|", "DH", "AH", "|", "K", "AE", "T", "|", "S", "AE", "T", "|", "D", "AW", "N", "|"])
        );
        assert_eq!(
            merged.phones.hyp_phones,
            strs(&["|", "DH", "AH", "|", "B", "AE", "T", "|", "S", "AE", "T", "|", "", "", "", ""])
        );
        assert_eq!(merged.phones.tags.len(), 16);
        assert_eq!(merged.phones.tags[15], Deletion);
        assert_eq!(merged.phones.ref_map, (0..16).collect::<Vec<_>>());
        assert_eq!(merged.phones.hyp_map, (0..12).collect::<Vec<_>>());
        assert_eq!(merged.words.tags, vec![Correct, Substitution, Correct, Deletion]);
        assert_eq!(merged.words.ref_map, vec![0, 1, 2, 3]);
        assert_eq!(merged.words.hyp_map, vec![0, 1, 2]);
        assert_eq!(merged.hyp_words, strs(&["THE", "BAT", "SAT", WORD_FILLER]));
    }

    #[test]
    fn test_merge_groups_match_word_counts() {
        let merged = merge_segments(&cat_sat_down()).unwrap();
        assert_eq!(merged.ref_phones_by_word.len(), merged.words.word_ref.len());
        assert_eq!(merged.hyp_phones_by_word.len(), merged.words.word_hyp.len());
        assert!(no_consecutive_sentinels(&merged.phones.ref_phones));
        assert!(no_consecutive_sentinels(&merged.phones.hyp_phones));
    }

    #[test]
    fn test_merge_strips_leading_placeholders_and_records_leading_blanks() {
        let mut segments = BTreeMap::new();
        segments.insert(
            0,
            resolved(
                &[],
                &["THE"],
                &[Insertion],
                &["", "", "", "|"],
                &["|", "DH", "AH", "|"],
                &[Insertion, Insertion, Insertion, Correct],
            ),
        );
        segments.insert(
            1,
            resolved(&["CAT"], &["CAT"], &[Correct], &["|", "K", "AE", "T", "|"], &["|", "K", "AE", "T", "|"], &[Correct; 5]),
        );
        let merged = merge_segments(&segments).unwrap();
        assert_eq!(merged.words.ref_words, strs(&[WORD_FILLER, "CAT"]));
        assert_eq!(merged.ref_words, strs(&["CAT"]));
        assert_eq!(merged.leading.ref_columns, 3);
        assert_eq!(merged.leading.hyp_words_to_skip, 1);
        assert_eq!(merged.ref_phones_by_word.len(), 1);
        assert_eq!(merged.hyp_phones_by_word.len(), 2);
    }

    #[test]
    fn test_merge_segment_order_follows_keys() {
        let mut segments = cat_sat_down();
        let last = segments.remove(&3).unwrap();
        segments.insert(10, last);
        let merged = merge_segments(&segments).unwrap();
        assert_eq!(merged.words.word_ref, strs(&["THE", "CAT", "SAT", "DOWN"]));
    }

    #[test]
    fn test_flatten_words() {
        assert_eq!(
            flatten_words(&strs(&["ice cream", "", "<eps>", "TO"])),
            strs(&["ice", "cream", "", "<eps>", "TO"])
        );
    }

    #[test]
    fn test_strip_leading_placeholders() {
        assert_eq!(strip_leading_placeholders(strs(&["", "<eps>", "A", ""])), strs(&["A", ""]));
        assert!(strip_leading_placeholders(strs(&["<eps>"])).is_empty());
    }

    #[test]
    fn test_merge_rejects_ragged_phones() {
        let mut seg = resolved(&["A"], &["A"], &[Correct], &["|", "AH", "|"], &["|", "AH", "|"], &[Correct; 3]);
        seg.phones.tags.pop();
        let result = merge_segments(&BTreeMap::from([(0, seg)]));
        assert!(matches!(result, Err(ReconcileError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_merge_word_columns_count_blanks() {
        let mut segments = BTreeMap::new();
        segments.insert(
            0,
            resolved(
                &[],
                &["THE"],
                &[Insertion],
                &["", "", "", "|"],
                &["|", "DH", "AH", "|"],
                &[Insertion, Insertion, Insertion, Correct],
            ),
        );
        segments.insert(
            1,
            resolved(
                &["CAT"],
                &["KT"],
                &[Substitution],
                &["|", "K", "AE", "T", "|"],
                &["|", "K", "", "T", "|"],
                &[Correct, Correct, Deletion, Correct, Correct],
            ),
        );
        let merged = merge_segments(&segments).unwrap();
        assert_eq!(merged.phones.ref_phones, strs(&["", "", "", "|", "K", "AE", "T", "|"]));
        assert_eq!(merged.phones.hyp_phones, strs(&["|", "DH", "AH", "|", "K", "", "T", "|"]));
        // leading blanks are outside any word, the inner blank is inside one
        assert_eq!(merged.ref_word_columns, vec![3]);
        assert_eq!(merged.hyp_word_columns, vec![2, 3]);
        assert_eq!(merged.hyp_phones_by_word[1], strs(&["K", "T"]));
        assert_eq!(merged.ref_word_columns.len(), merged.ref_phones_by_word.len());
        assert_eq!(merged.hyp_word_columns.len(), merged.hyp_phones_by_word.len());
    }

    #[test]
    fn test_merge_word_columns_ignore_trailing_blanks() {
        let merged = merge_segments(&cat_sat_down()).unwrap();
        assert_eq!(merged.ref_word_columns, vec![2, 3, 3, 3]);
        assert_eq!(merged.hyp_word_columns, vec![2, 3, 3]);
    }
}
