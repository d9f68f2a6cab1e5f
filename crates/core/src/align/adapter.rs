//! Normalises raw aligner segments into dense, column-indexed arrays.

use crate::types::{AlignmentSegment, Side, WordAlignment, WORD_FILLER};

/// Remove repeated map entries, keeping first-seen order.
pub fn collapse(map: &[usize]) -> Vec<usize> {
    let mut seen = std::collections::HashSet::with_capacity(map.len());
    map.iter().copied().filter(|i| seen.insert(*i)).collect()
}

/// Dense token array of one side: position `i` holds the token whose
/// collapsed map entry is `i`, every other position is empty. The array
/// ends at the last mapped column.
pub fn align_pair(segment: &AlignmentSegment, side: Side) -> Vec<String> {
    let positions = collapse(segment.map(side));
    let tokens = segment.tokens(side);
    if positions.len() != tokens.len() {
        log::debug!(
            "{:?} map has {} positions for {} tokens",
            side,
            positions.len(),
            tokens.len()
        );
    }
    let Some(&last) = positions.last() else {
        return Vec::new();
    };
    let len = positions.iter().copied().max().unwrap_or(last) + 1;
    let mut dense = vec![String::new(); len];
    for (pos, token) in positions.into_iter().zip(tokens) {
        dense[pos] = token.clone();
    }
    dense
}

/// Dense array stretched to the segment's column count.
pub fn dense_columns(segment: &AlignmentSegment, side: Side) -> Vec<String> {
    let mut dense = align_pair(segment, side);
    if dense.len() < segment.columns() {
        dense.resize(segment.columns(), String::new());
    }
    dense
}

/// Word-level view of a segment, with fillers in empty columns.
pub fn word_alignment(segment: &AlignmentSegment) -> WordAlignment {
    let fill = |side| {
        dense_columns(segment, side)
            .into_iter()
            .map(|w| if w.is_empty() { WORD_FILLER.to_string() } else { w })
            .collect::<Vec<_>>()
    };
    WordAlignment {
        ref_words: fill(Side::Reference),
        hyp_words: fill(Side::Hypothesis),
        word_ref: segment.ref_tokens.clone(),
        word_hyp: segment.hyp_tokens.clone(),
        ref_map: collapse(&segment.ref_map),
        hyp_map: collapse(&segment.hyp_map),
        tags: segment.tags.clone(),
    }
}
