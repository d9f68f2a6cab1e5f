//! Decode results handed over by the ASR backend.
//!
//! Transport is not handled here; a decode arrives already materialised,
//! either in memory or as a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;

/// One utterance decode: recognised text plus per-token timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DecodeResult {
    pub text: String,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub timestamps: Vec<f64>,
}

/// Buffered decoders reply with a one-element list, streaming ones with
/// a bare object.
#[derive(Deserialize)]
#[serde(untagged)]
enum DecodeFile {
    Batch(Vec<DecodeResult>),
    Single(DecodeResult),
}

impl DecodeResult {
    pub fn from_json_str(data: &str) -> Result<Self> {
        match serde_json::from_str(data).context("Failed to parse decode JSON")? {
            DecodeFile::Single(result) => Ok(result),
            DecodeFile::Batch(results) => results
                .into_iter()
                .next()
                .context("Decode JSON holds an empty result list"),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read decode: {}", path.display()))?;
        Self::from_json_str(&data).with_context(|| format!("Invalid decode file: {}", path.display()))
    }

    /// Whitespace-split recognised text.
    pub fn words(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// Load a decode, reporting any failure as the decode being unavailable
/// from `source_name`.
pub fn load_decode(source_name: &str, path: &Path) -> Result<DecodeResult, ReconcileError> {
    DecodeResult::load(path).map_err(|e| ReconcileError::unavailable(source_name, format!("{:#}", e)))
}

/// Use the primary decode, or fall back to the secondary source when the
/// primary failed.
pub fn first_available<F>(
    primary: Result<DecodeResult, ReconcileError>,
    secondary: F,
) -> Result<DecodeResult, ReconcileError>
where
    F: FnOnce() -> Result<DecodeResult, ReconcileError>,
{
    match primary {
        Ok(result) => Ok(result),
        Err(e) => {
            log::warn!("{}; retrying with secondary decode", e);
            secondary()
        }
    }
}
