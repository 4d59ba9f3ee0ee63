//! Coherence sweep over candidate topic counts.
//!
//! One model is fitted per candidate `k`, on a shared read-only matrix, each
//! with its own derived seed. Fits run on blocking worker threads, at most
//! `max_parallel_fits` at a time. A fit that fails, panics, times out or
//! returns an invalid model is recorded against its `k` and the sweep moves
//! on. Results are reported in candidate order regardless of completion
//! order.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{info, instrument, warn};

use lda_corpus::DocumentTermMatrix;
use lda_types::{PipelineError, SweepConfig};

use crate::coherence::{score_topics, CoherenceScorer, TopicCoherence, UMassCoherence};
use crate::error::FitError;
use crate::fitter::TopicModelFitter;
use crate::seed::derive_seeds;

/// Result of evaluating one topic count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SweepOutcome {
    /// Model fitted and scored
    Scored {
        /// Mean of the per-topic coherence scores
        mean_coherence: f64,
        topics: Vec<TopicCoherence>,
    },
    /// Fit or scoring failed
    Failed { reason: String },
}

/// One candidate topic count and what happened to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepEntry {
    pub k: usize,
    /// Seed handed to the fitter
    pub seed: u64,
    pub outcome: SweepOutcome,
    /// Wall time spent on the fit and scoring
    pub elapsed_ms: u64,
}

impl SweepEntry {
    fn from_result(
        k: usize,
        seed: u64,
        result: Result<(f64, Vec<TopicCoherence>), FitError>,
        elapsed: Duration,
    ) -> Self {
        let outcome = match result {
            Ok((mean_coherence, topics)) => SweepOutcome::Scored {
                mean_coherence,
                topics,
            },
            Err(e) => SweepOutcome::Failed {
                reason: e.to_string(),
            },
        };
        Self {
            k,
            seed,
            outcome,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    /// Mean coherence, if the fit succeeded.
    pub fn mean_coherence(&self) -> Option<f64> {
        match &self.outcome {
            SweepOutcome::Scored { mean_coherence, .. } => Some(*mean_coherence),
            SweepOutcome::Failed { .. } => None,
        }
    }

    /// Per-topic scores, empty if the fit failed.
    pub fn topics(&self) -> &[TopicCoherence] {
        match &self.outcome {
            SweepOutcome::Scored { topics, .. } => topics,
            SweepOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SweepOutcome::Failed { .. })
    }
}

/// One point of the coherence-per-k curve. Failed fits have no score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoherencePoint {
    pub k: usize,
    pub mean_coherence: Option<f64>,
}

/// Complete sweep result, one entry per candidate in candidate order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Top-level seed the per-k seeds were derived from
    pub seed: u64,
    /// Name of the coherence metric
    pub metric: String,
    pub entries: Vec<SweepEntry>,
}

impl SweepReport {
    /// Mean coherence per candidate `k`.
    pub fn coherence_curve(&self) -> Vec<CoherencePoint> {
        self.entries
            .iter()
            .map(|e| CoherencePoint {
                k: e.k,
                mean_coherence: e.mean_coherence(),
            })
            .collect()
    }

    /// Seed used for a topic count.
    pub fn seed_for(&self, k: usize) -> Option<u64> {
        self.entry(k).map(|e| e.seed)
    }

    pub fn entry(&self, k: usize) -> Option<&SweepEntry> {
        self.entries.iter().find(|e| e.k == k)
    }

    pub fn failed(&self) -> impl Iterator<Item = &SweepEntry> {
        self.entries.iter().filter(|e| e.is_failed())
    }

    pub fn scored_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_failed()).count()
    }
}

/// Runs a fitter and a coherence scorer across candidate topic counts.
pub struct ModelSweep {
    fitter: Arc<dyn TopicModelFitter>,
    scorer: Arc<dyn CoherenceScorer>,
    config: SweepConfig,
}

impl ModelSweep {
    /// Create a sweep.
    ///
    /// # Errors
    /// `Config` if the sweep settings are invalid.
    pub fn new(
        fitter: Arc<dyn TopicModelFitter>,
        scorer: Arc<dyn CoherenceScorer>,
        config: SweepConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            fitter,
            scorer,
            config,
        })
    }

    /// Create a sweep scored with UMass coherence.
    pub fn with_umass(
        fitter: Arc<dyn TopicModelFitter>,
        config: SweepConfig,
    ) -> Result<Self, PipelineError> {
        Self::new(fitter, Arc::new(UMassCoherence::new()), config)
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    /// Fit and score every candidate topic count.
    ///
    /// Individual fit failures are recorded in the report and never abort
    /// the sweep. A fit that exceeds the timeout is reported as failed; its
    /// worker thread runs to completion in the background and the result is
    /// discarded.
    ///
    /// # Errors
    /// - `EmptyInput` if the matrix has no rows
    /// - `AllWordsFiltered` if the matrix has no columns
    #[instrument(skip_all, fields(
        candidates = self.config.topic_counts.len(),
        fitter = self.fitter.name(),
        metric = self.scorer.name(),
    ))]
    pub async fn run(&self, dtm: Arc<DocumentTermMatrix>) -> Result<SweepReport, PipelineError> {
        if dtm.n_rows() == 0 {
            return Err(PipelineError::EmptyInput);
        }
        if dtm.n_cols() == 0 {
            return Err(PipelineError::AllWordsFiltered(
                "document-term matrix has no columns".to_string(),
            ));
        }

        let ks = self.config.topic_counts.clone();
        let seeds = derive_seeds(self.config.seed, ks.len());
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel_fits));
        let top_n = self.config.top_n_terms;
        let timeout_ms = self.config.fit_timeout_ms;

        info!(
            topic_counts = ?ks,
            seed = self.config.seed,
            max_parallel_fits = self.config.max_parallel_fits,
            "Starting coherence sweep"
        );

        let mut tasks = JoinSet::new();
        for (index, (&k, &seed)) in ks.iter().zip(seeds.iter()).enumerate() {
            let semaphore = semaphore.clone();
            let fitter = self.fitter.clone();
            let scorer = self.scorer.clone();
            let dtm = dtm.clone();

            tasks.spawn(async move {
                let start = Instant::now();
                let permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let result = Err(FitError::Failed("fit slots closed".to_string()));
                        return (index, SweepEntry::from_result(k, seed, result, start.elapsed()));
                    }
                };

                // A timed-out fit keeps running on its blocking thread, so the
                // slot is released only when the fit itself returns.
                let work = tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    evaluate(fitter.as_ref(), scorer.as_ref(), &dtm, k, seed, top_n)
                });
                let result = match timeout_ms {
                    Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), work).await {
                        Ok(joined) => flatten(joined),
                        Err(_) => Err(FitError::Timeout(ms)),
                    },
                    None => flatten(work.await),
                };

                (index, SweepEntry::from_result(k, seed, result, start.elapsed()))
            });
        }

        let mut slots: Vec<Option<SweepEntry>> = (0..ks.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, entry)) => {
                    match &entry.outcome {
                        SweepOutcome::Scored { mean_coherence, .. } => info!(
                            k = entry.k,
                            mean_coherence,
                            elapsed_ms = entry.elapsed_ms,
                            "Topic count scored"
                        ),
                        SweepOutcome::Failed { reason } => {
                            warn!(k = entry.k, %reason, "Topic count failed, continuing sweep")
                        }
                    }
                    slots[index] = Some(entry);
                }
                Err(e) => warn!(error = %e, "Sweep task ended abnormally"),
            }
        }

        let entries: Vec<SweepEntry> = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| SweepEntry {
                    k: ks[index],
                    seed: seeds[index],
                    outcome: SweepOutcome::Failed {
                        reason: "sweep task ended without a result".to_string(),
                    },
                    elapsed_ms: 0,
                })
            })
            .collect();

        let report = SweepReport {
            seed: self.config.seed,
            metric: self.scorer.name().to_string(),
            entries,
        };
        info!(
            scored = report.scored_count(),
            failed = report.entries.len() - report.scored_count(),
            "Coherence sweep complete"
        );
        Ok(report)
    }
}

/// Fit, validate and score one topic count.
fn evaluate(
    fitter: &dyn TopicModelFitter,
    scorer: &dyn CoherenceScorer,
    dtm: &DocumentTermMatrix,
    k: usize,
    seed: u64,
    top_n: usize,
) -> Result<(f64, Vec<TopicCoherence>), FitError> {
    let model = fitter.fit(dtm, k, seed)?;
    model.validate(dtm, k)?;

    let topics = score_topics(dtm, scorer, &model.top_terms(dtm, top_n));
    if topics.is_empty() {
        return Err(FitError::InvalidModel("model has no topics".to_string()));
    }
    let mean = topics.iter().map(|t| t.coherence).sum::<f64>() / topics.len() as f64;
    if !mean.is_finite() {
        return Err(FitError::Failed(format!("coherence is {}", mean)));
    }
    Ok((mean, topics))
}

fn flatten<T>(joined: Result<Result<T, FitError>, JoinError>) -> Result<T, FitError> {
    match joined {
        Ok(result) => result,
        Err(e) if e.is_panic() => Err(FitError::Panicked(panic_message(e))),
        Err(e) => Err(FitError::Failed(format!("fit worker cancelled: {}", e))),
    }
}

fn panic_message(e: JoinError) -> String {
    let payload = e.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
