use std::path::PathBuf;

use phonalign_core::align::{LevenshteinAligner, Reconciler};
use phonalign_core::asr::DecodeResult;
use phonalign_core::assess::{assess, TimingSource, UtteranceRequest};
use phonalign_core::config::AssessConfig;
use phonalign_core::language::lexicon::{strip_stress, Lexicon, Pronouncer};
use phonalign_core::language::stress::{MissPolicy, StressRestorer};
use phonalign_core::types::{EditTag, ReconciledAlignment, SENTINEL};

const SENTENCE: &str = "HOWEVER SOME WRITE INTERESTING STORIES THAT APPEAL TO CHILDREN";

fn lexicon() -> Lexicon {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/lexicon.dict");
    Lexicon::load(&path).unwrap()
}

fn reconcile(lex: &Lexicon, reference: &str, hypothesis: &str) -> ReconciledAlignment {
    let pronouncer = Pronouncer::new(lex);
    let aligner = LevenshteinAligner::new(pronouncer, true);
    Reconciler::new(&aligner, pronouncer)
        .reconcile(reference, hypothesis)
        .unwrap()
}

fn without_sentinels(phones: &[String]) -> Vec<String> {
    phones
        .iter()
        .filter(|p| !p.is_empty() && *p != SENTINEL)
        .cloned()
        .collect()
}

#[test]
fn test_identical_sentence_is_all_correct() {
    let lex = lexicon();
    let out = reconcile(&lex, SENTENCE, SENTENCE);

    assert_eq!(out.words.tags.len(), 9);
    assert!(out.words.tags.iter().all(|t| *t == EditTag::Correct));
    assert!(out.phones.tags.iter().all(|t| *t == EditTag::Correct));

    let expected: Vec<String> = SENTENCE
        .split_whitespace()
        .flat_map(|w| lex.lookup(w).unwrap().iter().map(|p| strip_stress(p).to_string()))
        .collect();
    assert_eq!(without_sentinels(&out.phones.ref_phones), expected);
    assert_eq!(out.phones.ref_phones, out.phones.hyp_phones);
    assert_eq!(out.ref_phones_by_word.len(), 9);
    assert_eq!(out.ref_words, out.words.word_ref);
    assert_eq!(out.leading.ref_columns, 0);
    assert_eq!(out.leading.hyp_columns, 0);
}

#[test]
fn test_errors_keep_invariants() {
    let lex = lexicon();
    let hyp = "HOWEVER SOME RIGHT INTERESTING STORY THAT TO THE CHILDREN";
    let out = reconcile(&lex, SENTENCE, hyp);

    let len = out.phones.tags.len();
    assert_eq!(out.phones.ref_phones.len(), len);
    assert_eq!(out.phones.hyp_phones.len(), len);
    assert_eq!(out.ref_phones_by_word.len(), out.words.word_ref.len());
    assert_eq!(out.hyp_phones_by_word.len(), out.words.word_hyp.len());
    assert!(out.words.tags.contains(&EditTag::Substitution));
    assert_eq!(out.words.word_hyp.len(), 9);

    // every side still reads as its own pronunciation
    let hyp_expected: Vec<String> = hyp
        .split_whitespace()
        .flat_map(|w| lex.lookup(w).unwrap().iter().map(|p| strip_stress(p).to_string()))
        .collect();
    assert_eq!(without_sentinels(&out.phones.hyp_phones), hyp_expected);
}

#[test]
fn test_stress_round_trip() {
    let lex = lexicon();
    let out = reconcile(&lex, SENTENCE, "HOWEVER SOME WRITE STORIES TO CHILDREN");
    let restorer = StressRestorer::new(&lex, MissPolicy::Fail);
    let stressed = restorer.restore_alignment(&out).unwrap();

    let strip = |v: &[String]| v.iter().map(|p| strip_stress(p).to_string()).collect::<Vec<_>>();
    assert_eq!(strip(&stressed.ref_phones), out.phones.ref_phones);
    assert_eq!(strip(&stressed.hyp_phones), out.phones.hyp_phones);
    assert!(stressed.ref_phones.iter().any(|p| p == "AW2"));
    assert!(stressed.hyp_phones.iter().any(|p| p == "UW1"));
}

#[test]
fn test_assess_with_config_file() {
    let lex = lexicon();
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("assess.json");
    std::fs::write(&config_path, r#"{"restore_stress": true, "max_phones_per_word": 4}"#).unwrap();
    let config = AssessConfig::load(&config_path).unwrap();

    let decode_path = dir.path().join("word.json");
    std::fs::write(
        &decode_path,
        r#"[{"text": "THAT APPEAL", "tokens": ["THAT", "APPEAL"], "timestamps": [0.0, 0.6]}]"#,
    )
    .unwrap();
    let word = DecodeResult::load(&decode_path).unwrap();
    let phone = DecodeResult {
        text: "DH AE T AH P IY L".into(),
        tokens: ["DH", "AE", "T", "AH", "P", "IY", "L"].iter().map(|s| s.to_string()).collect(),
        timestamps: vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.55],
    };

    let request = UtteranceRequest {
        utt_id: "u42".into(),
        prompt: "That appeal.".into(),
    };
    let a = assess(&config, &lex, &request, Ok(phone), Ok(word), None).unwrap();
    assert_eq!(a.source, TimingSource::Decoded);
    assert_eq!(a.phone_ctm.len(), 7);
    assert!((a.phone_ctm[6].end() - 0.6).abs() < 1e-9);
    assert!(a.alignment.words.tags.iter().all(|t| *t == EditTag::Correct));
    let stressed = a.stressed.unwrap();
    assert_eq!(stressed.ref_phones[2], "AE1");
}
