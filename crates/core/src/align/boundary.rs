//! Repairs for segment edges: missing closing sentinels, index maps that
//! disagree with the edit tags, duplicated opening sentinels at segment
//! joins, and leading blank runs.

use crate::types::{
    EditTag, LeadingBlanks, PhoneAlignment, Side, BLANK, SENTINEL,
};

use super::adapter::collapse;

/// Columns holding a token on `side`, as implied by the edit tags.
///
/// Returns those columns and logs when the aligner's own map disagrees
/// (empty, shifted by one, or otherwise inconsistent).
pub fn repair_index_map(given: &[usize], tags: &[EditTag], side: Side) -> Vec<usize> {
    let derived: Vec<usize> = tags
        .iter()
        .enumerate()
        .filter(|(_, t)| t.consumes(side))
        .map(|(i, _)| i)
        .collect();
    if collapse(given) != derived {
        log::debug!(
            "{:?} index map {:?} rebuilt from edit tags as {:?}",
            side,
            given,
            derived
        );
    }
    derived
}

/// Whether the last non-blank token is a sentinel.
pub fn ends_on_sentinel(phones: &[String]) -> bool {
    phones
        .iter()
        .rev()
        .find(|p| !p.is_empty())
        .is_some_and(|p| p == SENTINEL)
}

/// Make both sides end on a sentinel.
///
/// A side that lacks one gets it in a new final column; the other side
/// is blank there unless it needs one too, in which case the column is
/// a Correct sentinel pair.
pub fn close_with_sentinel(mut phones: PhoneAlignment) -> PhoneAlignment {
    let (r, h, tag) = match (
        ends_on_sentinel(&phones.ref_phones),
        ends_on_sentinel(&phones.hyp_phones),
    ) {
        (true, true) => return phones,
        (false, false) => (SENTINEL, SENTINEL, EditTag::Correct),
        (true, false) => (BLANK, SENTINEL, EditTag::Insertion),
        (false, true) => (SENTINEL, BLANK, EditTag::Deletion),
    };
    let col = phones.columns();
    log::debug!("appending closing sentinel column {} ({:?})", col, tag);
    if !r.is_empty() {
        phones.ref_map.push(col);
    }
    if !h.is_empty() {
        phones.hyp_map.push(col);
    }
    phones.ref_phones.push(r.to_string());
    phones.hyp_phones.push(h.to_string());
    phones.tags.push(tag);
    phones
}

/// Position of a side's opening sentinel: its first non-blank token, if
/// that token is a sentinel.
fn opening_sentinel(phones: &[String]) -> Option<usize> {
    phones
        .iter()
        .position(|p| !p.is_empty())
        .filter(|&i| phones[i] == SENTINEL)
}

/// Remove each side's opening sentinel, for a segment that continues
/// after another segment already closed with one.
///
/// A column left blank on both sides is dropped, shifting later columns
/// down by one; a column that still holds a phone on the other side is
/// retagged as a one-sided edit.
pub fn strip_opening_sentinels(phones: &PhoneAlignment) -> PhoneAlignment {
    let ref_open = opening_sentinel(&phones.ref_phones);
    let hyp_open = opening_sentinel(&phones.hyp_phones);
    if ref_open.is_none() && hyp_open.is_none() {
        return phones.clone();
    }

    let mut ref_phones = Vec::with_capacity(phones.columns());
    let mut hyp_phones = Vec::with_capacity(phones.columns());
    let mut tags = Vec::with_capacity(phones.columns());

    for (col, &tag) in phones.tags.iter().enumerate() {
        let r = &phones.ref_phones[col];
        let h = &phones.hyp_phones[col];
        if ref_open != Some(col) && hyp_open != Some(col) {
            ref_phones.push(r.clone());
            hyp_phones.push(h.clone());
            tags.push(tag);
            continue;
        }
        let r = if ref_open == Some(col) { BLANK } else { r.as_str() };
        let h = if hyp_open == Some(col) { BLANK } else { h.as_str() };
        match (r.is_empty(), h.is_empty()) {
            (true, true) => {
                log::debug!("dropping boundary sentinel column {}", col);
                continue;
            }
            (true, false) => tags.push(EditTag::one_sided(Side::Hypothesis)),
            (false, true) => tags.push(EditTag::one_sided(Side::Reference)),
            (false, false) => tags.push(tag),
        }
        ref_phones.push(r.to_string());
        hyp_phones.push(h.to_string());
    }

    PhoneAlignment::from_columns(ref_phones, hyp_phones, tags)
}

/// Leading blank runs on each side and the words of the other side that
/// fall inside them.
pub fn leading_blanks(phones: &PhoneAlignment) -> LeadingBlanks {
    let ref_columns = phones.ref_map.first().copied().unwrap_or(phones.columns());
    let hyp_columns = phones.hyp_map.first().copied().unwrap_or(phones.columns());

    let sentinels_before = |side_phones: &[String], end: usize| {
        side_phones[..end.min(side_phones.len())]
            .iter()
            .filter(|p| *p == SENTINEL)
            .count()
    };

    let ref_words_to_skip = if hyp_columns > 0 && ref_columns == 0 {
        sentinels_before(&phones.ref_phones, hyp_columns)
    } else {
        0
    };
    let hyp_words_to_skip = if ref_columns > 0 && hyp_columns == 0 {
        sentinels_before(&phones.hyp_phones, ref_columns)
    } else {
        0
    };

    if ref_columns > 0 || hyp_columns > 0 {
        log::info!(
            "leading blanks: reference {} columns, hypothesis {} columns",
            ref_columns,
            hyp_columns
        );
    }

    LeadingBlanks {
        ref_columns,
        hyp_columns,
        ref_words_to_skip,
        hyp_words_to_skip,
    }
}

/// Split a flat phone sequence into per-word phone lists.
///
/// Words are the runs between sentinels; blanks are dropped and runs
/// with no phones are not words.
pub fn group_by_word(phones: &[String]) -> Vec<Vec<String>> {
    phones
        .split(|p| p == SENTINEL)
        .map(|run| run.iter().filter(|p| !p.is_empty()).cloned().collect::<Vec<_>>())
        .filter(|word| !word.is_empty())
        .collect()
}

/// Columns between each pair of consecutive sentinels, blanks included.
///
/// Columns before the first sentinel or after the last one belong to no
/// word and are not counted.
pub fn word_column_widths(phones: &[String]) -> Vec<usize> {
    let mut widths = Vec::new();
    let mut open = None;
    for (col, phone) in phones.iter().enumerate() {
        if phone == SENTINEL {
            if let Some(start) = open {
                widths.push(col - start - 1);
            }
            open = Some(col);
        }
    }
    widths
}
