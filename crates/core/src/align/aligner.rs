//! Word aligner interface and the built-in edit-distance backend.
//!
//! An aligner partitions a reference/hypothesis pair into segments and,
//! for segments containing errors, may also supply a phone-level
//! alignment. Segments without one are resolved later by pronouncing
//! their words (see [`super::phone`]).

use std::collections::BTreeMap;

use crate::error::ReconcileError;
use crate::language::lexicon::Pronouncer;
use crate::types::{AlignmentSegment, EditTag, Side};

/// One aligner segment plus its phone-level alignment, when computed.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedRegion {
    pub words: AlignmentSegment,
    pub phones: Option<AlignmentSegment>,
}

/// Alignment backend trait.
pub trait WordAligner {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Partition whitespace-tokenised strings into segments, without
    /// phone-level detail.
    fn split_regions(&self, reference: &str, hypothesis: &str) -> Result<Vec<AlignmentSegment>, ReconcileError>;

    /// Segments keyed by index, each with an optional phone alignment.
    fn align(&self, reference: &str, hypothesis: &str) -> Result<BTreeMap<usize, AlignedRegion>, ReconcileError>;
}

/// Minimum-edit-distance aligner.
///
/// Splits the alignment into maximal runs of correct and erroneous
/// columns. Erroneous runs get a phone alignment computed by pronouncing
/// both sides and aligning the phone strings.
pub struct LevenshteinAligner<'a> {
    pronouncer: Pronouncer<'a>,
    lowercase: bool,
}

impl<'a> LevenshteinAligner<'a> {
    pub fn new(pronouncer: Pronouncer<'a>, lowercase: bool) -> Self {
        Self {
            pronouncer,
            lowercase,
        }
    }

    fn same(&self, a: &str, b: &str) -> bool {
        if self.lowercase {
            a.to_lowercase() == b.to_lowercase()
        } else {
            a == b
        }
    }

    /// Edit script turning `reference` into `hypothesis`.
    ///
    /// Backtrace prefers the diagonal, then deletion, then insertion, so
    /// equal-cost alternatives always resolve the same way.
    pub fn edit_script(&self, reference: &[&str], hypothesis: &[&str]) -> Vec<EditTag> {
        let n = reference.len();
        let m = hypothesis.len();

        let mut d = vec![vec![0usize; m + 1]; n + 1];
        for (i, row) in d.iter_mut().enumerate() {
            row[0] = i;
        }
        for j in 0..=m {
            d[0][j] = j;
        }
        for i in 1..=n {
            for j in 1..=m {
                let cost = usize::from(!self.same(reference[i - 1], hypothesis[j - 1]));
                d[i][j] = (d[i - 1][j - 1] + cost)
                    .min(d[i - 1][j] + 1)
                    .min(d[i][j - 1] + 1);
            }
        }

        let mut tags = Vec::with_capacity(n.max(m));
        let (mut i, mut j) = (n, m);
        while i > 0 || j > 0 {
            if i > 0 && j > 0 {
                let same = self.same(reference[i - 1], hypothesis[j - 1]);
                if d[i][j] == d[i - 1][j - 1] + usize::from(!same) {
                    tags.push(if same { EditTag::Correct } else { EditTag::Substitution });
                    i -= 1;
                    j -= 1;
                    continue;
                }
            }
            if i > 0 && d[i][j] == d[i - 1][j] + 1 {
                tags.push(EditTag::Deletion);
                i -= 1;
            } else {
                tags.push(EditTag::Insertion);
                j -= 1;
            }
        }
        tags.reverse();
        tags
    }

    /// Align two token strings as a single segment.
    fn align_tokens(&self, reference: &[&str], hypothesis: &[&str]) -> AlignmentSegment {
        let tags = self.edit_script(reference, hypothesis);
        let mut regions = segments_from_script(reference, hypothesis, &tags, false);
        regions.pop().unwrap_or_default()
    }
}

/// Cut an edit script into segments. With `split`, every change between
/// correct and erroneous columns starts a new segment; maps are
/// zero-based per segment.
fn segments_from_script(reference: &[&str], hypothesis: &[&str], tags: &[EditTag], split: bool) -> Vec<AlignmentSegment> {
    let mut segments: Vec<AlignmentSegment> = Vec::new();
    let mut current = AlignmentSegment::default();
    let (mut i, mut j) = (0, 0);

    for &tag in tags {
        if split {
            if let Some(&prev) = current.tags.last() {
                if prev.is_correct() != tag.is_correct() {
                    segments.push(std::mem::take(&mut current));
                }
            }
        }
        let col = current.tags.len();
        if tag.consumes(Side::Reference) {
            current.ref_tokens.push(reference[i].to_string());
            current.ref_map.push(col);
            i += 1;
        }
        if tag.consumes(Side::Hypothesis) {
            current.hyp_tokens.push(hypothesis[j].to_string());
            current.hyp_map.push(col);
            j += 1;
        }
        current.tags.push(tag);
    }
    if !current.tags.is_empty() || segments.is_empty() {
        segments.push(current);
    }
    segments
}

impl WordAligner for LevenshteinAligner<'_> {
    fn name(&self) -> &str {
        "levenshtein"
    }

    fn split_regions(&self, reference: &str, hypothesis: &str) -> Result<Vec<AlignmentSegment>, ReconcileError> {
        let r: Vec<&str> = reference.split_whitespace().collect();
        let h: Vec<&str> = hypothesis.split_whitespace().collect();
        if r.is_empty() && h.is_empty() {
            return Ok(Vec::new());
        }
        let tags = self.edit_script(&r, &h);
        Ok(segments_from_script(&r, &h, &tags, true))
    }

    fn align(&self, reference: &str, hypothesis: &str) -> Result<BTreeMap<usize, AlignedRegion>, ReconcileError> {
        let mut regions = BTreeMap::new();
        for (index, words) in self.split_regions(reference, hypothesis)?.into_iter().enumerate() {
            let phones = if words.tags.iter().all(|t| t.is_correct()) {
                None
            } else {
                let ref_phones = self.pronouncer.pronounce(&words.ref_tokens)?;
                let hyp_phones = self.pronouncer.pronounce(&words.hyp_tokens)?;
                let r: Vec<&str> = ref_phones.iter().map(String::as_str).collect();
                let h: Vec<&str> = hyp_phones.iter().map(String::as_str).collect();
                Some(self.align_tokens(&r, &h))
            };
            regions.insert(index, AlignedRegion { words, phones });
        }
        log::debug!("{} aligner produced {} segments", self.name(), regions.len());
        Ok(regions)
    }
}
