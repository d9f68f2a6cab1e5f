//! Word and phone alignment reconciliation.

pub mod adapter;
pub mod aligner;
pub mod boundary;
pub mod merge;
pub mod phone;

use std::collections::BTreeMap;

use crate::error::ReconcileError;
use crate::language::lexicon::Pronouncer;
use crate::types::ReconciledAlignment;

pub use aligner::{AlignedRegion, LevenshteinAligner, WordAligner};

/// Runs a word aligner over a reference/hypothesis pair and reconciles
/// its segments into a single alignment.
pub struct Reconciler<'a> {
    aligner: &'a dyn WordAligner,
    pronouncer: Pronouncer<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(aligner: &'a dyn WordAligner, pronouncer: Pronouncer<'a>) -> Self {
        Self { aligner, pronouncer }
    }

    pub fn reconcile(&self, reference: &str, hypothesis: &str) -> Result<ReconciledAlignment, ReconcileError> {
        let regions = self.aligner.align(reference, hypothesis)?;
        log::info!(
            "Reconciling {} segments from {} aligner",
            regions.len(),
            self.aligner.name()
        );
        let mut resolved = BTreeMap::new();
        for (index, region) in &regions {
            resolved.insert(
                *index,
                phone::resolve_region(region, self.aligner, &self.pronouncer)?,
            );
        }
        merge::merge_segments(&resolved)
    }
}
