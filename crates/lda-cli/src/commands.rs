//! Command implementations for lda-notebook.
//!
//! Handles:
//! - prepare: Load documents, tokenize, filter, write the matrix
//! - score: Score an externally fitted word-topic table
//! - seeds: Print per-k seeds
//! - config: Print effective settings

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use lda_corpus::{load_documents, prepare_corpus, PreparedCorpus};
use lda_sweep::{
    read_word_topic_file, score_word_topic_table, seeds_for, topic_coherence_rows,
    topic_term_rows, write_table_file, TopicCoherence, UMassCoherence,
};
use lda_types::{PipelineError, Settings};

use crate::cli::CorpusArgs;

/// Load settings and apply the global log-level flag.
pub fn load_settings(config_path: Option<&str>, log_level: Option<&str>) -> Result<Settings> {
    let mut settings = Settings::load(config_path).context("Failed to load configuration")?;
    if let Some(level) = log_level {
        settings.log_level = level.to_string();
    }
    Ok(settings)
}

/// Process exit status for an error: 2 for unusable input, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    let input_shape = err
        .chain()
        .filter_map(|cause| cause.downcast_ref::<PipelineError>())
        .any(PipelineError::is_input_shape);
    if input_shape {
        2
    } else {
        1
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Apply corpus flags on top of loaded settings.
pub fn apply_corpus_args(settings: &mut Settings, args: &CorpusArgs) -> Result<()> {
    if let Some(input) = &args.input {
        settings.input.path = Some(input.clone());
    }
    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.clone();
    }
    if let Some(fraction) = args.common_fraction {
        settings.filter.common_fraction_threshold = fraction;
    }
    if let Some(threshold) = args.singleton_threshold {
        settings.filter.singleton_threshold = threshold;
    }
    settings
        .tokenizer
        .stop_words
        .extend(args.stop_words.iter().cloned());
    settings.validate().context("Invalid settings")?;
    Ok(())
}

/// Run the corpus pipeline on the configured input file.
fn load_and_prepare(settings: &Settings) -> Result<PreparedCorpus> {
    let Some(path) = settings.input.path.as_deref() else {
        bail!("No input file: pass --input or set input.path");
    };
    let documents = load_documents(path, &settings.input)
        .with_context(|| format!("Failed to read documents from {}", path))?;
    let prepared = prepare_corpus(&documents, &settings.tokenizer, &settings.filter)
        .context("Failed to prepare corpus")?;
    Ok(prepared)
}

fn ensure_output_dir(settings: &Settings) -> Result<PathBuf> {
    let dir = settings.expanded_output_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory {:?}", dir))?;
    Ok(dir)
}

/// Prepare the corpus and write `dtm.csv`, `vocabulary.csv` and
/// `filter_report.json`.
pub fn run_prepare(settings: &Settings) -> Result<PreparedCorpus> {
    let prepared = load_and_prepare(settings)?;
    let dir = ensure_output_dir(settings)?;

    write_table_file(dir.join("dtm.csv"), &prepared.matrix.to_occurrences())
        .context("Failed to write dtm.csv")?;
    write_table_file(dir.join("vocabulary.csv"), &prepared.filtered.vocabulary())
        .context("Failed to write vocabulary.csv")?;
    let report = serde_json::to_string_pretty(&prepared.filter_report)?;
    fs::write(dir.join("filter_report.json"), report)
        .context("Failed to write filter_report.json")?;

    let report = &prepared.filter_report;
    println!("Documents:        {}", prepared.matrix.n_rows());
    println!(
        "Vocabulary:       {} -> {} words",
        report.vocabulary_before, report.vocabulary_after
    );
    println!(
        "Removed:          {} singleton, {} over-common, {} junk, {} numeric",
        report.removed_singleton,
        report.removed_over_common,
        report.removed_junk,
        report.removed_numeric
    );
    println!(
        "Empty documents:  {} ({} emptied by filtering)",
        prepared.matrix.empty_rows().len(),
        report.emptied_documents.len()
    );
    println!("Sparsity:         {:.4}", prepared.matrix.sparsity());
    println!("Output:           {}", dir.display());

    info!(output = %dir.display(), "Prepare complete");
    Ok(prepared)
}

/// Score a `k`-topic word-topic table against the prepared corpus and write
/// `coherence_k<k>.csv` and `top_terms_k<k>.csv`.
pub fn run_score(
    settings: &Settings,
    k: usize,
    beta_path: &Path,
    top_n: Option<usize>,
) -> Result<Vec<TopicCoherence>> {
    if k == 0 {
        bail!("Topic count must be at least 1");
    }
    let prepared = load_and_prepare(settings)?;
    prepared
        .filter_report
        .ensure_vocabulary()
        .context("Nothing to score")?;

    let rows = read_word_topic_file(beta_path)
        .with_context(|| format!("Failed to read word-topic table {}", beta_path.display()))?;
    let topics: BTreeSet<usize> = rows.iter().map(|r| r.topic).collect();
    if topics != (1..=k).collect::<BTreeSet<usize>>() {
        bail!(
            "Word-topic table has topics {:?}, expected 1..={}",
            topics,
            k
        );
    }

    let top_n = top_n.unwrap_or(settings.sweep.top_n_terms);
    let scorer = UMassCoherence::new();
    let scored = score_word_topic_table(&prepared.matrix, &scorer, &rows, top_n)
        .context("Failed to score word-topic table")?;

    let dir = ensure_output_dir(settings)?;
    write_table_file(
        dir.join(format!("coherence_k{}.csv", k)),
        &topic_coherence_rows(k, &scored),
    )
    .context("Failed to write coherence table")?;
    write_table_file(
        dir.join(format!("top_terms_k{}.csv", k)),
        &topic_term_rows(k, &scored),
    )
    .context("Failed to write top terms table")?;

    for topic in &scored {
        println!(
            "Topic {:>3}  {:>10.4}  {}",
            topic.topic,
            topic.coherence,
            topic.terms.join(" ")
        );
    }
    let mean = scored.iter().map(|t| t.coherence).sum::<f64>() / scored.len() as f64;
    println!("k={} mean coherence: {:.4}", k, mean);

    info!(k, mean_coherence = mean, "Score complete");
    Ok(scored)
}

/// Seeds each topic count would be fitted with.
pub fn show_seeds(
    settings: &Settings,
    topic_counts: Option<Vec<usize>>,
    seed: Option<u64>,
) -> Result<Vec<(usize, u64)>> {
    let mut sweep = settings.sweep.clone();
    if let Some(ks) = topic_counts {
        sweep.topic_counts = ks;
    }
    if let Some(seed) = seed {
        sweep.seed = seed;
    }
    sweep.validate().context("Invalid sweep settings")?;

    let pairs = seeds_for(sweep.seed, &sweep.topic_counts);
    println!("Seed: {}", sweep.seed);
    for (k, derived) in &pairs {
        println!("k={:<4} seed={}", k, derived);
    }
    Ok(pairs)
}

/// Effective settings rendered as TOML.
pub fn show_config(settings: &Settings) -> Result<String> {
    let text = toml::to_string_pretty(settings).context("Failed to render configuration")?;
    println!("{}", text);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_corpus(dir: &Path) -> PathBuf {
        let path = dir.join("records.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "document_id,full_text").unwrap();
        writeln!(file, "r1,Salmon farms affect water quality").unwrap();
        writeln!(file, "r2,Salmon lice spread between farms").unwrap();
        writeln!(file, "r3,Kelp forests shelter juvenile fish").unwrap();
        writeln!(file, "r4,Kelp restoration helps juvenile fish").unwrap();
        writeln!(file, "r5,Published 2019 by Elsevier").unwrap();
        path
    }

    fn settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.input.path = Some(write_corpus(dir).to_string_lossy().to_string());
        settings.output_dir = dir.join("out").to_string_lossy().to_string();
        settings
    }

    #[test]
    fn test_apply_corpus_args() {
        let mut settings = Settings::default();
        let args = CorpusArgs {
            input: Some("a.csv".to_string()),
            common_fraction: Some(0.3),
            stop_words: vec!["salmon".to_string()],
            ..Default::default()
        };
        apply_corpus_args(&mut settings, &args).unwrap();
        assert_eq!(settings.input.path.as_deref(), Some("a.csv"));
        assert!((settings.filter.common_fraction_threshold - 0.3).abs() < f64::EPSILON);
        assert!(settings.tokenizer.stop_words.contains(&"salmon".to_string()));
    }

    #[test]
    fn test_apply_corpus_args_rejects_bad_threshold() {
        let mut settings = Settings::default();
        let args = CorpusArgs {
            common_fraction: Some(-1.0),
            ..Default::default()
        };
        assert!(apply_corpus_args(&mut settings, &args).is_err());
    }

    #[test]
    fn test_run_prepare_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let prepared = run_prepare(&settings).unwrap();

        assert_eq!(prepared.matrix.n_rows(), 5);
        assert_eq!(prepared.matrix.terms(), &["farms", "fish", "juvenile", "kelp", "salmon"]);
        let out = dir.path().join("out");
        assert!(out.join("dtm.csv").exists());
        assert!(out.join("filter_report.json").exists());
        let vocabulary = fs::read_to_string(out.join("vocabulary.csv")).unwrap();
        assert!(vocabulary.starts_with("word,n_documents\nfarms,2\n"));
    }

    #[test]
    fn test_run_prepare_without_input() {
        let settings = Settings::default();
        let err = run_prepare(&settings).unwrap_err();
        assert!(err.to_string().contains("No input file"));
    }

    #[test]
    fn test_run_score() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let beta = dir.path().join("beta.csv");
        fs::write(
            &beta,
            "topic,word,beta\n1,salmon,0.5\n1,farms,0.4\n1,kelp,0.1\n2,kelp,0.6\n2,fish,0.3\n2,salmon,0.1\n",
        )
        .unwrap();

        let scored = run_score(&settings, 2, &beta, Some(2)).unwrap();
        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].terms, vec!["salmon", "farms"]);
        // farms|salmon co-occur in both salmon documents: ln((2 + 1) / 2)
        assert!((scored[0].coherence - 1.5f64.ln()).abs() < 1e-12);
        assert!(dir.path().join("out/coherence_k2.csv").exists());
        assert!(dir.path().join("out/top_terms_k2.csv").exists());
    }

    #[test]
    fn test_run_score_topic_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let beta = dir.path().join("beta.csv");
        fs::write(&beta, "topic,word,beta\n1,salmon,1.0\n").unwrap();
        assert!(run_score(&settings, 3, &beta, None).is_err());
    }

    #[test]
    fn test_run_score_rejects_zero_topics() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let beta = dir.path().join("beta.csv");
        fs::write(&beta, "topic,word,beta\n").unwrap();
        let err = run_score(&settings, 0, &beta, None).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
        assert!(!dir.path().join("out/coherence_k0.csv").exists());
    }

    #[test]
    fn test_run_score_requires_consecutive_topic_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let beta = dir.path().join("beta.csv");
        fs::write(
            &beta,
            "topic,word,beta\n1,salmon,0.6\n1,kelp,0.4\n3,fish,0.5\n3,farms,0.5\n",
        )
        .unwrap();
        let err = run_score(&settings, 2, &beta, None).unwrap_err();
        assert!(err.to_string().contains("expected 1..=2"));
    }

    #[test]
    fn test_run_score_rejects_foreign_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let beta = dir.path().join("beta.csv");
        fs::write(&beta, "topic,word,beta\n1,whale,0.5\n1,squid,0.5\n").unwrap();
        let err = run_score(&settings, 1, &beta, None).unwrap_err();
        assert!(format!("{:#}", err).contains("not in the corpus vocabulary"));
    }

    #[test]
    fn test_exit_code_for_input_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        let path = dir.path().join("empty.csv");
        fs::write(&path, "document_id,full_text\n").unwrap();
        settings.input.path = Some(path.to_string_lossy().to_string());

        let err = run_prepare(&settings).unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn test_show_seeds_override() {
        let pairs = show_seeds(&Settings::default(), Some(vec![2, 5]), Some(7)).unwrap();
        assert_eq!(pairs, seeds_for(7, &[2, 5]));
    }

    #[test]
    fn test_show_config_is_toml() {
        let text = show_config(&Settings::default()).unwrap();
        assert!(text.contains("log_level = \"info\""));
        assert!(text.contains("[sweep]"));
    }
}
