//! phonalign CLI: reconcile transcripts, time decodes, assess utterances.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use phonalign_core::align::{LevenshteinAligner, Reconciler};
use phonalign_core::asr::{first_available, load_decode, DecodeResult};
use phonalign_core::assess::{assess, Fallback, UtteranceRequest};
use phonalign_core::config::AssessConfig;
use phonalign_core::language::lexicon::{Lexicon, Pronouncer};
use phonalign_core::language::stress::{MissPolicy, StressRestorer};
use phonalign_core::timing::{self, ctm::write_ctm};

// ─── Top-level CLI ───────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "phonalign",
    about = "Word and phone alignment reconciliation for pronunciation assessment",
    version,
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reconcile a reference transcript with a hypothesis
    Align(AlignArgs),
    /// Time-align a decode and print CTM records
    Durations(DurationsArgs),
    /// Full per-utterance assessment from phone and word decodes
    Assess(AssessArgs),
}

// ─── Shared arguments (embedded in each subcommand) ──────────────

#[derive(Parser, Debug)]
struct SharedArgs {
    /// JSON settings file; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Guess pronunciations of words missing from the lexicon
    #[arg(long, default_value_t = false)]
    oov_fallback: bool,

    /// Re-apply lexical stress to the aligned phones
    #[arg(long, default_value_t = false)]
    restore_stress: bool,

    /// Fail instead of keeping unstressed phones when a word is missing
    /// from the stress lexicon
    #[arg(long, default_value_t = false)]
    strict_stress: bool,

    /// Compare words case-sensitively
    #[arg(long, default_value_t = false)]
    case_sensitive: bool,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl SharedArgs {
    fn load_config(&self) -> Result<AssessConfig> {
        let mut config = match &self.config {
            Some(path) => AssessConfig::load(path)?,
            None => AssessConfig::default(),
        };
        config.oov_fallback |= self.oov_fallback;
        config.restore_stress |= self.restore_stress;
        if self.strict_stress {
            config.stress_miss = MissPolicy::Fail;
        }
        if self.case_sensitive {
            config.lowercase = false;
        }
        Ok(config)
    }
}

// ─── Align ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Reconcile a reference transcript with a hypothesis")]
struct AlignArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Pronunciation lexicon (CMU dict text or JSON)
    #[arg(long)]
    lexicon: PathBuf,

    /// Reference transcript
    #[arg(long)]
    reference: String,

    /// Recognised transcript
    #[arg(long)]
    hypothesis: String,
}

// ─── Durations ───────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Time-align a decode and print CTM records")]
struct DurationsArgs {
    /// Decode JSON ({text, tokens, timestamps})
    decode: PathBuf,

    /// Word-level decode used to repair a zero-length final unit
    #[arg(long)]
    word_decode: Option<PathBuf>,

    /// Utterance id written in each record
    #[arg(long, default_value = "utt")]
    utt_id: String,

    /// Confidence written in each record
    #[arg(long, default_value_t = timing::DEFAULT_CONFIDENCE)]
    confidence: f64,

    /// Show verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

// ─── Assess ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(about = "Assess one utterance from its phone and word decodes")]
struct AssessArgs {
    #[command(flatten)]
    shared: SharedArgs,

    /// Pronunciation lexicon (CMU dict text or JSON)
    #[arg(long)]
    lexicon: PathBuf,

    /// Utterance id
    #[arg(long)]
    utt_id: String,

    /// Reference transcript the speaker read
    #[arg(long)]
    prompt: String,

    /// Phone-level decode JSON
    #[arg(long)]
    phone_decode: PathBuf,

    /// Phone-level decode to use when the first one cannot be read
    #[arg(long)]
    phone_decode_secondary: Option<PathBuf>,

    /// Word-level decode JSON
    #[arg(long)]
    word_decode: PathBuf,

    /// Precomputed record ({ctm, word_ctm, prompt, stt}) used when the
    /// decodes are rejected
    #[arg(long)]
    fallback: Option<PathBuf>,
}

// ─── Main ────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    // Init logging
    let log_level = match &cli.command {
        Command::Align(a) if a.shared.verbose => "debug",
        Command::Durations(a) if a.verbose => "debug",
        Command::Assess(a) if a.shared.verbose => "debug",
        _ => "info",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let result = match cli.command {
        Command::Align(args) => run_align(args),
        Command::Durations(args) => run_durations(args),
        Command::Assess(args) => run_assess(args),
    };

    if let Err(e) = result {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

fn load_lexicon(path: &Path) -> Result<Lexicon> {
    if !path.exists() {
        bail!("Lexicon not found: {}", path.display());
    }
    let lexicon = Lexicon::load(path)?;
    if lexicon.is_empty() {
        bail!("Lexicon has no entries: {}", path.display());
    }
    Ok(lexicon)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

// ─── Subcommand runners ──────────────────────────────────────────

fn run_align(args: AlignArgs) -> Result<()> {
    let config = args.shared.load_config()?;
    let lexicon = load_lexicon(&args.lexicon)?;

    let pronouncer = Pronouncer::new(&lexicon).with_oov_fallback(config.oov_fallback);
    let aligner = LevenshteinAligner::new(pronouncer, config.lowercase);
    let alignment = Reconciler::new(&aligner, pronouncer)
        .reconcile(&args.reference, &args.hypothesis)
        .context("Alignment failed")?;

    let stressed = if config.restore_stress {
        Some(
            StressRestorer::new(&lexicon, config.stress_miss)
                .restore_alignment(&alignment)
                .context("Stress restoration failed")?,
        )
    } else {
        None
    };

    print_json(&serde_json::json!({
        "alignment": alignment,
        "stressed": stressed,
    }))
}

fn run_durations(args: DurationsArgs) -> Result<()> {
    let decode = DecodeResult::load(&args.decode)?;
    let aligned = timing::extract(&decode);
    if aligned.is_short() {
        log::warn!(
            "Only {} of {} units were matched",
            aligned.durations.len(),
            aligned.expected
        );
    }

    let durations = match &args.word_decode {
        Some(path) => {
            let words = timing::extract(&DecodeResult::load(path)?);
            timing::repair_final_boundary(aligned.durations, Some(&words.durations))?
        }
        None => aligned.durations,
    };

    let ctm = timing::to_ctm(&args.utt_id, &durations, args.confidence);
    let stdout = std::io::stdout();
    write_ctm(&mut stdout.lock(), &ctm).context("Failed to write CTM")?;
    Ok(())
}

fn run_assess(args: AssessArgs) -> Result<()> {
    let config = args.shared.load_config()?;
    let lexicon = load_lexicon(&args.lexicon)?;

    let primary = load_decode("phone decode", &args.phone_decode);
    let phone = match &args.phone_decode_secondary {
        Some(path) => first_available(primary, || load_decode("secondary phone decode", path)),
        None => primary,
    };
    let word = load_decode("word decode", &args.word_decode);
    let fallback = args.fallback.as_deref().map(Fallback::load).transpose()?;

    let request = UtteranceRequest {
        utt_id: args.utt_id,
        prompt: args.prompt,
    };
    let assessment = assess(&config, &lexicon, &request, phone, word, fallback.as_ref())
        .with_context(|| format!("Assessment of {} failed", request.utt_id))?;
    print_json(&assessment)
}
