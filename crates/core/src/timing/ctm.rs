//! CTM records from timed units.

use std::io::Write;

use crate::types::{CtmEntry, PhonemeDuration};

/// Confidence written for every record; the decoder reports none.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// One record per timed unit, in input order.
pub fn to_ctm(utt_id: &str, durations: &[PhonemeDuration], confidence: f64) -> Vec<CtmEntry> {
    durations
        .iter()
        .map(|d| CtmEntry {
            utt_id: utt_id.to_string(),
            confidence,
            start: d.start,
            duration: d.duration(),
            token: d.phoneme.clone(),
        })
        .collect()
}

/// Write records as space-separated lines.
pub fn write_ctm<W: Write>(out: &mut W, entries: &[CtmEntry]) -> std::io::Result<()> {
    for entry in entries {
        writeln!(out, "{}", entry)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_ctm() {
        let durations = vec![PhonemeDuration::new("HH", 0.5, 0.75), PhonemeDuration::new("AH", 0.75, 1.0)];
        let ctm = to_ctm("utt7", &durations, DEFAULT_CONFIDENCE);
        assert_eq!(ctm.len(), 2);
        assert_eq!(ctm[0].utt_id, "utt7");
        assert_eq!(ctm[0].confidence, 1.0);
        assert!((ctm[0].duration - 0.25).abs() < 1e-9);
        assert_eq!(ctm[1].token, "AH");
    }

    #[test]
    fn test_to_ctm_keeps_order_and_empty() {
        assert!(to_ctm("u", &[], DEFAULT_CONFIDENCE).is_empty());
        let durations = vec![PhonemeDuration::new("B", 2.0, 2.1), PhonemeDuration::new("A", 1.0, 1.1)];
        let tokens: Vec<String> = to_ctm("u", &durations, 0.5).into_iter().map(|e| e.token).collect();
        assert_eq!(tokens, vec!["B", "A"]);
    }

    #[test]
    fn test_write_ctm() {
        let ctm = to_ctm("u1", &[PhonemeDuration::new("K", 0.0, 0.125)], DEFAULT_CONFIDENCE);
        let mut buf = Vec::new();
        write_ctm(&mut buf, &ctm).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "u1 1 0.000 0.125 K\n");
    }
}
