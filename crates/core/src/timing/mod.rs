//! Decode timing: per-phoneme durations, CTM records and the decode gate.

pub mod ctm;
pub mod duration;
pub mod gate;

pub use ctm::{to_ctm, DEFAULT_CONFIDENCE};
pub use duration::{extract, phoneme_durations, repair_final_boundary, TimeAlignment};
pub use gate::{DecodeGate, DEFAULT_MAX_PHONES_PER_WORD};
