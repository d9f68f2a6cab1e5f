//! Lexicon lookup and stress handling.

pub mod lexicon;
pub mod stress;
