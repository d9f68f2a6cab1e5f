use thiserror::Error;

/// Failures of the reconciliation engine and its decode inputs.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Edit tags and token lists disagree in length. Fatal for the segment.
    #[error("shape mismatch in {context}: {tags} tags, {reference} reference, {hypothesis} hypothesis")]
    ShapeMismatch {
        context: &'static str,
        tags: usize,
        reference: usize,
        hypothesis: usize,
    },

    #[error("word not in lexicon: '{word}'")]
    LexiconMiss { word: String },

    /// Final phoneme has zero length and no word-level end to borrow.
    #[error("final phoneme '{phoneme}' collapses at {time:.3}s and no word-level end time is available")]
    DegenerateFinalBoundary { phoneme: String, time: f64 },

    #[error("decode rejected: {reason}")]
    DecodeRejected { reason: String },

    /// The decode collaborator could not be reached or read.
    #[error("decode unavailable from {source_name}: {message}")]
    DecodeUnavailable { source_name: String, message: String },

    #[error("nothing to align: reference and hypothesis are both empty")]
    EmptyAlignment,
}

impl ReconcileError {
    pub(crate) fn shape(context: &'static str, tags: usize, reference: usize, hypothesis: usize) -> Self {
        Self::ShapeMismatch {
            context,
            tags,
            reference,
            hypothesis,
        }
    }

    pub(crate) fn rejected(reason: impl Into<String>) -> Self {
        Self::DecodeRejected {
            reason: reason.into(),
        }
    }

    pub fn unavailable(source_name: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::DecodeUnavailable {
            source_name: source_name.into(),
            message: err.to_string(),
        }
    }

    /// Data-dependent failures that have a defined fallback path.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::ShapeMismatch { .. })
    }
}
