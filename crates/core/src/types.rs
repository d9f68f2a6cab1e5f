use serde::{Deserialize, Serialize};

/// Word-boundary marker inside a flat phone sequence.
pub const SENTINEL: &str = "|";

/// Empty alignment column on one side of a phone alignment.
pub const BLANK: &str = "";

/// Stand-in for an empty word column, so lexicon lookups never see "".
pub const WORD_FILLER: &str = "<eps>";

/// True for blank columns and word fillers.
pub fn is_placeholder(token: &str) -> bool {
    token.is_empty() || token == WORD_FILLER
}

/// Classification of one aligned column relative to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditTag {
    #[serde(rename = "C")]
    Correct,
    #[serde(rename = "S")]
    Substitution,
    /// Hypothesis token with no reference counterpart.
    #[serde(rename = "I")]
    Insertion,
    /// Reference token with no hypothesis counterpart.
    #[serde(rename = "D")]
    Deletion,
}

impl EditTag {
    /// Whether a column with this tag holds a token on `side`.
    pub fn consumes(self, side: Side) -> bool {
        match (self, side) {
            (EditTag::Correct | EditTag::Substitution, _) => true,
            (EditTag::Deletion, Side::Reference) => true,
            (EditTag::Insertion, Side::Hypothesis) => true,
            _ => false,
        }
    }

    pub fn is_correct(self) -> bool {
        self == EditTag::Correct
    }

    /// Tag for a column where only `side` holds a token.
    pub fn one_sided(side: Side) -> Self {
        match side {
            Side::Reference => EditTag::Deletion,
            Side::Hypothesis => EditTag::Insertion,
        }
    }
}

/// One side of an alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Reference,
    Hypothesis,
}

/// One contiguous region as produced by a word aligner.
///
/// `ref_map[k]` is the column of the k-th reference token (likewise for
/// the hypothesis). Maps may repeat an entry when one token spans several
/// columns; they are collapsed before use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlignmentSegment {
    pub ref_tokens: Vec<String>,
    pub hyp_tokens: Vec<String>,
    pub ref_map: Vec<usize>,
    pub hyp_map: Vec<usize>,
    pub tags: Vec<EditTag>,
}

impl AlignmentSegment {
    pub fn tokens(&self, side: Side) -> &[String] {
        match side {
            Side::Reference => &self.ref_tokens,
            Side::Hypothesis => &self.hyp_tokens,
        }
    }

    pub fn map(&self, side: Side) -> &[usize] {
        match side {
            Side::Reference => &self.ref_map,
            Side::Hypothesis => &self.hyp_map,
        }
    }

    /// Number of aligned columns.
    pub fn columns(&self) -> usize {
        self.tags.len()
    }
}

/// Column-aligned phones of both sides.
///
/// `ref_phones`, `hyp_phones` and `tags` always have the same length; a
/// side without a phone in a column holds [`BLANK`]. The maps list the
/// columns holding a real token on each side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhoneAlignment {
    pub ref_phones: Vec<String>,
    pub hyp_phones: Vec<String>,
    pub ref_map: Vec<usize>,
    pub hyp_map: Vec<usize>,
    pub tags: Vec<EditTag>,
}

impl PhoneAlignment {
    /// Build from dense columns, deriving both maps from the non-blank
    /// positions.
    pub fn from_columns(ref_phones: Vec<String>, hyp_phones: Vec<String>, tags: Vec<EditTag>) -> Self {
        let ref_map = occupied_columns(&ref_phones);
        let hyp_map = occupied_columns(&hyp_phones);
        Self {
            ref_phones,
            hyp_phones,
            ref_map,
            hyp_map,
            tags,
        }
    }

    pub fn phones(&self, side: Side) -> &[String] {
        match side {
            Side::Reference => &self.ref_phones,
            Side::Hypothesis => &self.hyp_phones,
        }
    }

    pub fn map(&self, side: Side) -> &[usize] {
        match side {
            Side::Reference => &self.ref_map,
            Side::Hypothesis => &self.hyp_map,
        }
    }

    pub fn columns(&self) -> usize {
        self.tags.len()
    }
}

/// Word-level view of a segment.
///
/// `ref_words`/`hyp_words` are dense per column (one entry per tag) with
/// [`WORD_FILLER`] in empty columns; `word_ref`/`word_hyp` hold only the
/// real tokens in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WordAlignment {
    pub ref_words: Vec<String>,
    pub hyp_words: Vec<String>,
    pub word_ref: Vec<String>,
    pub word_hyp: Vec<String>,
    pub ref_map: Vec<usize>,
    pub hyp_map: Vec<usize>,
    pub tags: Vec<EditTag>,
}

impl WordAlignment {
    pub fn tokens(&self, side: Side) -> &[String] {
        match side {
            Side::Reference => &self.word_ref,
            Side::Hypothesis => &self.word_hyp,
        }
    }

    pub fn columns(&self) -> usize {
        self.tags.len()
    }
}

/// A segment after word and phone alignment are both resolved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSegment {
    pub words: WordAlignment,
    pub phones: PhoneAlignment,
}

/// Leading-silence diagnostics of a reconciled alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadingBlanks {
    /// Phone columns before the first reference token.
    pub ref_columns: usize,
    /// Phone columns before the first hypothesis token.
    pub hyp_columns: usize,
    /// Reference words lying inside the hypothesis' leading blank run.
    pub ref_words_to_skip: usize,
    /// Hypothesis words lying inside the reference's leading blank run.
    pub hyp_words_to_skip: usize,
}

/// Final per-utterance alignment at word and phone granularity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciledAlignment {
    pub words: WordAlignment,
    pub phones: PhoneAlignment,
    /// Flattened reference words with leading placeholders removed.
    pub ref_words: Vec<String>,
    pub hyp_words: Vec<String>,
    pub ref_phones_by_word: Vec<Vec<String>>,
    pub hyp_phones_by_word: Vec<Vec<String>>,
    /// Phone columns each reference word spans, blanks included.
    pub ref_word_columns: Vec<usize>,
    pub hyp_word_columns: Vec<usize>,
    pub leading: LeadingBlanks,
}

/// A phoneme (or word) with start and end time in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhonemeDuration {
    pub phoneme: String,
    pub start: f64,
    pub end: f64,
}

impl PhonemeDuration {
    pub fn new(phoneme: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            phoneme: phoneme.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// One CTM record: (utterance id, confidence, start, duration, token).
///
/// Serialised as a 5-element array, the usual on-disk shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "CtmRow", into = "CtmRow")]
pub struct CtmEntry {
    pub utt_id: String,
    pub confidence: f64,
    pub start: f64,
    pub duration: f64,
    pub token: String,
}

type CtmRow = (String, f64, f64, f64, String);

impl From<CtmRow> for CtmEntry {
    fn from((utt_id, confidence, start, duration, token): CtmRow) -> Self {
        Self {
            utt_id,
            confidence,
            start,
            duration,
            token,
        }
    }
}

impl From<CtmEntry> for CtmRow {
    fn from(e: CtmEntry) -> Self {
        (e.utt_id, e.confidence, e.start, e.duration, e.token)
    }
}

impl CtmEntry {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

impl std::fmt::Display for CtmEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} {:.3} {:.3} {}",
            self.utt_id, self.confidence, self.start, self.duration, self.token
        )
    }
}

/// Positions of non-blank entries.
pub fn occupied_columns(column_tokens: &[String]) -> Vec<usize> {
    column_tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.is_empty())
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_edit_tag_consumes() {
        assert!(EditTag::Correct.consumes(Side::Reference));
        assert!(EditTag::Substitution.consumes(Side::Hypothesis));
        assert!(EditTag::Deletion.consumes(Side::Reference));
        assert!(!EditTag::Deletion.consumes(Side::Hypothesis));
        assert!(EditTag::Insertion.consumes(Side::Hypothesis));
        assert!(!EditTag::Insertion.consumes(Side::Reference));
    }

    #[test]
    fn test_one_sided_tag() {
        assert_eq!(EditTag::one_sided(Side::Reference), EditTag::Deletion);
        assert_eq!(EditTag::one_sided(Side::Hypothesis), EditTag::Insertion);
    }

    #[test]
    fn test_edit_tag_serde_letters() {
        let json = serde_json::to_string(&vec![EditTag::Correct, EditTag::Insertion]).unwrap();
        assert_eq!(json, r#"["C","I"]"#);
        let back: Vec<EditTag> = serde_json::from_str(r#"["S","D"]"#).unwrap();
        assert_eq!(back, vec![EditTag::Substitution, EditTag::Deletion]);
    }

    #[test]
    fn test_phone_alignment_from_columns() {
        let p = PhoneAlignment::from_columns(
            strs(&["|", "K", "", "|"]),
            strs(&["|", "", "B", "|"]),
            vec![EditTag::Correct, EditTag::Deletion, EditTag::Insertion, EditTag::Correct],
        );
        assert_eq!(p.ref_map, vec![0, 1, 3]);
        assert_eq!(p.hyp_map, vec![0, 2, 3]);
        assert_eq!(p.columns(), 4);
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder(""));
        assert!(is_placeholder(WORD_FILLER));
        assert!(!is_placeholder("CAT"));
    }

    #[test]
    fn test_ctm_entry_serializes_as_row() {
        let e = CtmEntry {
            utt_id: "utt1".into(),
            confidence: 1.0,
            start: 0.5,
            duration: 0.25,
            token: "AH".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        assert_eq!(json, r#"["utt1",1.0,0.5,0.25,"AH"]"#);
        let back: CtmEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, e);
        assert!((e.end() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ctm_entry_display() {
        let e = CtmEntry {
            utt_id: "u".into(),
            confidence: 1.0,
            start: 0.1,
            duration: 0.2,
            token: "HH".into(),
        };
        assert_eq!(e.to_string(), "u 1 0.100 0.200 HH");
    }
}
