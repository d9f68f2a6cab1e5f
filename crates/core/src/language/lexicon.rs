//! Pronunciation lexicon and word-to-phone conversion.
//!
//! Lexicons are read from CMU Pronouncing Dictionary text or from a JSON
//! object of `word -> "PH1 PH2 ..."`. Keys are stored lowercase; the first
//! pronunciation variant of a word wins.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::ReconcileError;
use crate::types::{is_placeholder, SENTINEL};

/// Word to phoneme-list dictionary.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: HashMap<String, Vec<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPronunciation {
    One(String),
    Many(Vec<String>),
}

impl Lexicon {
    /// Parse CMU dict text: `WORD  PH1 PH2 ...`, `WORD(2) ...` variants,
    /// `;;;` comment lines.
    pub fn from_cmudict_str(data: &str) -> Self {
        let mut lexicon = Self::default();
        for line in data.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let Some((word_raw, phones)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            // WORD(2) -> WORD
            let word = word_raw.split('(').next().unwrap_or(word_raw);
            lexicon.insert_if_absent(word, phones);
        }
        lexicon
    }

    /// Parse a JSON object mapping words to a phone string or a list of
    /// phone strings.
    pub fn from_json_str(data: &str) -> Result<Self> {
        let raw: HashMap<String, JsonPronunciation> =
            serde_json::from_str(data).context("Failed to parse lexicon JSON")?;
        let mut lexicon = Self::default();
        // Sort so duplicate keys differing only in case resolve the same way every run.
        let mut words: Vec<_> = raw.into_iter().collect();
        words.sort_by(|a, b| a.0.cmp(&b.0));
        for (word, pron) in words {
            let first = match pron {
                JsonPronunciation::One(p) => Some(p),
                JsonPronunciation::Many(ps) => ps.into_iter().next(),
            };
            if let Some(phones) = first {
                lexicon.insert_if_absent(&word, &phones);
            }
        }
        Ok(lexicon)
    }

    /// Load a lexicon file; `.json` files are read as JSON, anything else
    /// as CMU dict text.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read lexicon: {}", path.display()))?;
        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let lexicon = if is_json {
            Self::from_json_str(&data)?
        } else {
            Self::from_cmudict_str(&data)
        };
        log::info!("Loaded {} lexicon entries from {}", lexicon.len(), path.display());
        Ok(lexicon)
    }

    /// Add or replace a pronunciation.
    pub fn insert(&mut self, word: &str, phones: &str) {
        let phones: Vec<String> = phones.split_whitespace().map(str::to_string).collect();
        if !phones.is_empty() {
            self.entries.insert(word.to_lowercase(), phones);
        }
    }

    fn insert_if_absent(&mut self, word: &str, phones: &str) {
        if !self.contains(word) {
            self.insert(word, phones);
        }
    }

    /// Case-insensitive lookup.
    pub fn lookup(&self, word: &str) -> Option<&[String]> {
        self.entries.get(&word.to_lowercase()).map(Vec::as_slice)
    }

    /// Lookup that retries with edge punctuation removed.
    pub fn lookup_word(&self, word: &str) -> Option<&[String]> {
        self.lookup(word).or_else(|| self.lookup(strip_punct(word)))
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strip trailing stress marker (0, 1, 2) from an ARPABET phoneme.
pub fn strip_stress(phoneme: &str) -> &str {
    phoneme.trim_end_matches(|c: char| c.is_ascii_digit())
}

/// Strip punctuation from the edges of a word.
fn strip_punct(word: &str) -> &str {
    word.trim_matches(|c: char| ".,!?;:\"()-".contains(c))
}

/// Turns word sequences into flat, sentinel-delimited, unstressed phone
/// sequences.
#[derive(Debug, Clone, Copy)]
pub struct Pronouncer<'a> {
    lexicon: &'a Lexicon,
    oov_fallback: bool,
}

impl<'a> Pronouncer<'a> {
    pub fn new(lexicon: &'a Lexicon) -> Self {
        Self {
            lexicon,
            oov_fallback: false,
        }
    }

    /// Guess pronunciations for words missing from the lexicon instead of
    /// failing.
    pub fn with_oov_fallback(mut self, enabled: bool) -> Self {
        self.oov_fallback = enabled;
        self
    }

    /// Unstressed phones of one word.
    pub fn pronounce_word(&self, word: &str) -> Result<Vec<String>, ReconcileError> {
        if let Some(phones) = self.lexicon.lookup_word(word) {
            return Ok(phones.iter().map(|p| strip_stress(p).to_string()).collect());
        }
        if self.oov_fallback {
            log::warn!("'{}' not in lexicon, using rule-based pronunciation", word);
            return Ok(guess_pronunciation(strip_punct(word))
                .iter()
                .map(|p| strip_stress(p).to_string())
                .collect());
        }
        Err(ReconcileError::LexiconMiss {
            word: word.to_string(),
        })
    }

    /// Opening sentinel, then each word's phones closed by a sentinel.
    ///
    /// Multi-word tokens are split on whitespace; placeholders produce
    /// nothing.
    pub fn pronounce<S: AsRef<str>>(&self, words: &[S]) -> Result<Vec<String>, ReconcileError> {
        let mut phones = vec![SENTINEL.to_string()];
        for token in words {
            let token = token.as_ref();
            if is_placeholder(token) {
                continue;
            }
            for word in token.split_whitespace() {
                phones.extend(self.pronounce_word(word)?);
                phones.push(SENTINEL.to_string());
            }
        }
        Ok(phones)
    }
}

lazy_static::lazy_static! {
    /// Two-letter spellings with a single ARPABET reading.
    static ref DIGRAPHS: HashMap<&'static str, &'static str> = [
        ("th", "TH"), ("sh", "SH"), ("ch", "CH"), ("ng", "NG"),
        ("ph", "F"), ("wh", "W"), ("ck", "K"),
        ("ee", "IY1"), ("ea", "IY1"), ("oo", "UW1"), ("ou", "AW1"),
        ("ow", "OW1"), ("ai", "EY1"), ("ay", "EY1"), ("oi", "OY1"), ("oy", "OY1"),
    ]
    .into_iter()
    .collect();
}

/// Rule-based spelling-to-ARPABET guess for out-of-vocabulary words.
///
/// Best effort only; never returns an empty pronunciation.
pub fn guess_pronunciation(word: &str) -> Vec<String> {
    let chars: Vec<char> = word.to_lowercase().chars().collect();
    let mut phonemes: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            if let Some(p) = DIGRAPHS.get(pair.as_str()) {
                phonemes.push(p.to_string());
                i += 2;
                continue;
            }
        }

        let next = chars.get(i + 1).copied();
        let single: &[&str] = match chars[i] {
            'a' => &["AE1"],
            'b' => &["B"],
            // c before e/i/y is soft
            'c' if matches!(next, Some('e' | 'i' | 'y')) => &["S"],
            'c' | 'k' | 'q' => &["K"],
            'd' => &["D"],
            // silent final e
            'e' if i == chars.len() - 1 && !phonemes.is_empty() => &[],
            'e' => &["EH1"],
            'f' => &["F"],
            'g' => &["G"],
            'h' => &["HH"],
            'i' => &["IH1"],
            'j' => &["JH"],
            'l' => &["L"],
            'm' => &["M"],
            'n' => &["N"],
            'o' => &["AA1"],
            'p' => &["P"],
            'r' => &["R"],
            's' => &["S"],
            't' => &["T"],
            'u' => &["AH1"],
            'v' => &["V"],
            'w' => &["W"],
            'x' => &["K", "S"],
            'y' if phonemes.is_empty() => &["Y"],
            'y' => &["IY1"],
            'z' => &["Z"],
            _ => &[],
        };
        phonemes.extend(single.iter().map(|p| p.to_string()));
        i += 1;
    }

    if phonemes.is_empty() {
        phonemes.push("AH0".to_string());
    }
    phonemes
}
