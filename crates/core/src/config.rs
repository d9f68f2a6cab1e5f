use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::language::stress::MissPolicy;
use crate::timing::{DEFAULT_CONFIDENCE, DEFAULT_MAX_PHONES_PER_WORD};

/// Per-request assessment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessConfig {
    /// Compare words case-insensitively when aligning.
    pub lowercase: bool,
    /// Guess pronunciations of words missing from the lexicon.
    pub oov_fallback: bool,
    pub restore_stress: bool,
    pub stress_miss: MissPolicy,
    /// Decode gate factor.
    pub max_phones_per_word: usize,
    pub ctm_confidence: f64,
}

impl Default for AssessConfig {
    fn default() -> Self {
        Self {
            lowercase: true,
            oov_fallback: false,
            restore_stress: false,
            stress_miss: MissPolicy::default(),
            max_phones_per_word: DEFAULT_MAX_PHONES_PER_WORD,
            ctm_confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl AssessConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&data)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
