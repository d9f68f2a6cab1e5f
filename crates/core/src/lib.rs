//! Word and phone alignment reconciliation for pronunciation assessment.
//!
//! Reconciles a reference transcript with an ASR hypothesis at word and
//! phone granularity, and turns decoder token timestamps into timed
//! phoneme records.

pub mod align;
pub mod asr;
pub mod assess;
pub mod config;
pub mod error;
pub mod language;
pub mod timing;
pub mod types;

pub use error::ReconcileError;
