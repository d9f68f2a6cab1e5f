//! Phone-level alignment of a word segment.
//!
//! A segment either arrives with a phone alignment from the aligner
//! (provided mode) or gets one by pronouncing its words and aligning the
//! phone strings (derived mode).

use crate::error::ReconcileError;
use crate::language::lexicon::Pronouncer;
use crate::types::{AlignmentSegment, PhoneAlignment, ResolvedSegment, Side, WordAlignment};

use super::adapter::{collapse, dense_columns, word_alignment};
use super::aligner::{AlignedRegion, WordAligner};
use super::boundary::{close_with_sentinel, repair_index_map};

/// Fail unless tags and both phone columns have the same length.
pub fn check_shape(phones: &PhoneAlignment, context: &'static str) -> Result<(), ReconcileError> {
    let (t, r, h) = (phones.tags.len(), phones.ref_phones.len(), phones.hyp_phones.len());
    if t == r && t == h {
        Ok(())
    } else {
        Err(ReconcileError::shape(context, t, r, h))
    }
}

/// Rebuild dense columns from a provided phone segment.
///
/// Each tag consumes one token from every side it covers; other sides get
/// a blank. Both sides are then closed with a sentinel.
pub fn provided_phone_alignment(segment: &AlignmentSegment) -> Result<PhoneAlignment, ReconcileError> {
    let shape_err = || {
        ReconcileError::shape(
            "provided phone alignment",
            segment.tags.len(),
            segment.ref_tokens.len(),
            segment.hyp_tokens.len(),
        )
    };

    let mut ref_tokens = segment.ref_tokens.iter();
    let mut hyp_tokens = segment.hyp_tokens.iter();
    let mut ref_phones = Vec::with_capacity(segment.columns());
    let mut hyp_phones = Vec::with_capacity(segment.columns());

    for &tag in &segment.tags {
        for (side, tokens, out) in [
            (Side::Reference, &mut ref_tokens, &mut ref_phones),
            (Side::Hypothesis, &mut hyp_tokens, &mut hyp_phones),
        ] {
            if tag.consumes(side) {
                out.push(tokens.next().ok_or_else(shape_err)?.clone());
            } else {
                out.push(String::new());
            }
        }
    }
    if ref_tokens.next().is_some() || hyp_tokens.next().is_some() {
        return Err(shape_err());
    }

    let phones = PhoneAlignment {
        ref_map: repair_index_map(&segment.ref_map, &segment.tags, Side::Reference),
        hyp_map: repair_index_map(&segment.hyp_map, &segment.tags, Side::Hypothesis),
        ref_phones,
        hyp_phones,
        tags: segment.tags.clone(),
    };
    let phones = close_with_sentinel(phones);
    check_shape(&phones, "provided phone alignment")?;
    Ok(phones)
}

/// Pronounce both word sides and align the phone strings.
///
/// Sub-segments are laid out column for column: a side that starts with
/// gap columns gets leading blanks from the dense reconstruction, and a
/// side whose tokens end early is blank-filled to the sub-segment's
/// column count. Maps are shifted by the running column offset.
pub fn derived_phone_alignment(
    words: &WordAlignment,
    aligner: &dyn WordAligner,
    pronouncer: &Pronouncer<'_>,
) -> Result<PhoneAlignment, ReconcileError> {
    let ref_phones = pronouncer.pronounce(&words.word_ref)?;
    let hyp_phones = pronouncer.pronounce(&words.word_hyp)?;
    let sub_segments = aligner.split_regions(&ref_phones.join(" "), &hyp_phones.join(" "))?;

    let mut phones = PhoneAlignment::default();
    let mut offset = 0;
    for sub in &sub_segments {
        let r = dense_columns(sub, Side::Reference);
        let h = dense_columns(sub, Side::Hypothesis);
        if r.len() != sub.columns() || h.len() != sub.columns() {
            return Err(ReconcileError::shape("derived phone sub-segment", sub.columns(), r.len(), h.len()));
        }
        phones.ref_map.extend(collapse(&sub.ref_map).into_iter().map(|i| i + offset));
        phones.hyp_map.extend(collapse(&sub.hyp_map).into_iter().map(|i| i + offset));
        phones.ref_phones.extend(r);
        phones.hyp_phones.extend(h);
        phones.tags.extend_from_slice(&sub.tags);
        offset += sub.columns();
    }

    check_shape(&phones, "derived phone alignment")?;
    Ok(phones)
}

/// Resolve one aligner region into word and phone alignments.
pub fn resolve_region(
    region: &AlignedRegion,
    aligner: &dyn WordAligner,
    pronouncer: &Pronouncer<'_>,
) -> Result<ResolvedSegment, ReconcileError> {
    let words = word_alignment(&region.words);
    let phones = match &region.phones {
        Some(provided) => provided_phone_alignment(provided)?,
        None => derived_phone_alignment(&words, aligner, pronouncer)?,
    };
    Ok(ResolvedSegment { words, phones })
}
