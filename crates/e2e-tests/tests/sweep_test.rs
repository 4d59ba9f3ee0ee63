//! Coherence sweep E2E tests.
//!
//! Runs the sweep with the mock fitter over the sample corpus and checks
//! ordering, failure isolation, reproducibility and that a chosen k can be
//! refitted and rescored from exported tables.

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;

use e2e_tests::{sample_documents, TestHarness};
use lda_corpus::{prepare_corpus, DocumentTermMatrix};
use lda_sweep::{
    derive_seeds, fit_model, score_topics, write_table_file, MockFitter, ModelSweep,
    SweepOutcome, SweepReport, UMassCoherence,
};
use lda_types::{FilterConfig, PipelineError, SweepConfig, TokenizerConfig};

fn sample_matrix() -> Arc<DocumentTermMatrix> {
    let prepared = prepare_corpus(
        &sample_documents(),
        &TokenizerConfig::default(),
        &FilterConfig::default(),
    )
    .unwrap();
    Arc::new(prepared.matrix)
}

async fn run_sweep(config: SweepConfig) -> SweepReport {
    ModelSweep::with_umass(Arc::new(MockFitter::new()), config)
        .unwrap()
        .run(sample_matrix())
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_default_sweep_scores_every_k() {
    let report = run_sweep(SweepConfig::default()).await;

    let curve = report.coherence_curve();
    let ks: Vec<usize> = curve.iter().map(|p| p.k).collect();
    assert_eq!(ks, vec![2, 3, 4, 5, 6, 7, 8, 9, 10]);
    for point in &curve {
        let mean = point.mean_coherence.expect("every k below 12 should fit");
        assert!(mean.is_finite());
        // UMass is a sum of log ratios bounded above by ln(2) per pair
        assert!(mean <= 45.0 * 2.0f64.ln());
    }
    for entry in &report.entries {
        assert_eq!(entry.topics().len(), entry.k);
        assert!(entry.topics().iter().all(|t| t.terms.len() == 10));
    }
}

#[tokio::test]
async fn test_k_at_or_above_document_count_is_unavailable() {
    let config = SweepConfig {
        topic_counts: vec![2, 12, 15, 3],
        ..Default::default()
    };
    let report = run_sweep(config).await;

    let curve: Vec<(usize, bool)> = report
        .coherence_curve()
        .into_iter()
        .map(|p| (p.k, p.mean_coherence.is_some()))
        .collect();
    assert_eq!(curve, vec![(2, true), (12, false), (15, false), (3, true)]);
}

#[tokio::test]
async fn test_same_seed_reproduces_sweep() {
    let config = SweepConfig {
        topic_counts: vec![2, 4, 6],
        seed: 42,
        ..Default::default()
    };
    let first = run_sweep(config.clone()).await;
    let second = run_sweep(config).await;

    assert_eq!(first.coherence_curve(), second.coherence_curve());
    for (a, b) in first.entries.iter().zip(second.entries.iter()) {
        assert_eq!(a.seed, b.seed);
        assert_eq!(a.topics(), b.topics());
    }
    assert_eq!(first.seed_for(4), Some(derive_seeds(42, 3)[1]));
}

#[tokio::test]
async fn test_different_seed_changes_fits() {
    let base = SweepConfig {
        topic_counts: vec![3],
        ..Default::default()
    };
    let a = run_sweep(SweepConfig { seed: 1, ..base.clone() }).await;
    let b = run_sweep(SweepConfig { seed: 2, ..base }).await;
    assert!(a.seed_for(3) != b.seed_for(3));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failures_are_isolated() {
    let fitter = MockFitter::new()
        .with_failures(vec![3])
        .with_delay(vec![5], Duration::from_millis(400));
    let config = SweepConfig {
        topic_counts: vec![2, 3, 4, 5, 6],
        fit_timeout_ms: Some(100),
        max_parallel_fits: 2,
        ..Default::default()
    };
    let report = ModelSweep::with_umass(Arc::new(fitter), config)
        .unwrap()
        .run(sample_matrix())
        .await
        .unwrap();

    let failed: Vec<usize> = report.failed().map(|e| e.k).collect();
    assert_eq!(failed, vec![3, 5]);
    match &report.entry(5).unwrap().outcome {
        SweepOutcome::Failed { reason } => assert!(reason.contains("timed out"), "{}", reason),
        other => panic!("Expected timeout, got {:?}", other),
    }
    assert_eq!(report.scored_count(), 3);
}

#[tokio::test]
async fn test_sweep_rejects_matrix_without_columns() {
    let prepared = prepare_corpus(
        &sample_documents(),
        &TokenizerConfig::default(),
        &FilterConfig {
            junk_words: e2e_tests::sample_vocabulary()
                .into_iter()
                .map(String::from)
                .collect(),
            ..Default::default()
        },
    )
    .unwrap();
    let fitter = Arc::new(MockFitter::new());
    let sweep = ModelSweep::with_umass(fitter.clone(), SweepConfig::default()).unwrap();

    let result = sweep.run(Arc::new(prepared.matrix)).await;
    assert!(matches!(result, Err(PipelineError::AllWordsFiltered(_))));
    assert!(fitter.calls().is_empty());
}

#[tokio::test]
async fn test_refit_chosen_k_matches_sweep() {
    let dtm = sample_matrix();
    let config = SweepConfig {
        topic_counts: vec![2, 3, 4],
        ..Default::default()
    };
    let top_n = config.top_n_terms;
    let report = run_sweep(config).await;

    let seed = report.seed_for(3).unwrap();
    let model = fit_model(&MockFitter::new(), &dtm, 3, seed).unwrap();
    let rescored = score_topics(&dtm, &UMassCoherence::new(), &model.top_terms(&dtm, top_n));
    assert_eq!(rescored.as_slice(), report.entry(3).unwrap().topics());

    assert_eq!(model.word_topic_table(&dtm).len(), 3 * dtm.n_cols());
    assert_eq!(model.document_topic_table(&dtm).len(), 3 * dtm.n_rows());
}

#[tokio::test]
async fn test_score_command_on_exported_model() {
    let harness = TestHarness::new();
    let settings = harness.settings();
    let dtm = sample_matrix();

    let report = run_sweep(SweepConfig {
        topic_counts: vec![4],
        ..Default::default()
    })
    .await;
    let seed = report.seed_for(4).unwrap();
    let model = fit_model(&MockFitter::new(), &dtm, 4, seed).unwrap();

    std::fs::create_dir_all(&harness.output_dir).unwrap();
    let beta_path = harness.output_dir.join("beta_k4.csv");
    write_table_file(&beta_path, &model.word_topic_table(&dtm)).unwrap();

    let scored = lda_cli::run_score(&settings, 4, &beta_path, None).unwrap();
    let expected = report.entry(4).unwrap().topics();
    assert_eq!(scored.len(), expected.len());
    for (got, want) in scored.iter().zip(expected.iter()) {
        assert_eq!(got.terms, want.terms);
        assert!((got.coherence - want.coherence).abs() < 1e-9);
    }
    assert!(harness.output_dir.join("coherence_k4.csv").exists());
}
