//! Mock fitter for testing.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use lda_corpus::DocumentTermMatrix;

use crate::error::FitError;
use crate::fitter::TopicModelFitter;
use crate::model::FittedModel;

/// Mock fitter that builds deterministic pseudo-models.
///
/// Weights are a pure function of the matrix, `k` and the seed, so repeated
/// fits agree exactly. Like most LDA implementations it rejects `k` greater
/// than or equal to the number of documents. Specific topic counts can be
/// set to fail, stall, panic or return malformed output.
///
/// Useful for testing without a real inference engine.
#[derive(Default)]
pub struct MockFitter {
    failing: Vec<usize>,
    malformed: Vec<usize>,
    panicking: Vec<usize>,
    slow: Vec<usize>,
    delay: Duration,
    calls: Mutex<Vec<(usize, u64)>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// Counts a fit as running until dropped.
struct Running<'a>(&'a AtomicUsize);

impl Drop for Running<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockFitter {
    /// Create a new mock fitter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `FitError::Failed` for these topic counts.
    pub fn with_failures(mut self, ks: Vec<usize>) -> Self {
        self.failing = ks;
        self
    }

    /// Return a model whose rows do not sum to 1 for these topic counts.
    pub fn with_malformed(mut self, ks: Vec<usize>) -> Self {
        self.malformed = ks;
        self
    }

    /// Panic for these topic counts.
    pub fn with_panics(mut self, ks: Vec<usize>) -> Self {
        self.panicking = ks;
        self
    }

    /// Block the calling thread for `delay` before fitting these counts.
    pub fn with_delay(mut self, ks: Vec<usize>, delay: Duration) -> Self {
        self.slow = ks;
        self.delay = delay;
        self
    }

    /// `(k, seed)` of every fit attempted so far, sorted by `k`.
    pub fn calls(&self) -> Vec<(usize, u64)> {
        let mut calls = match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        calls.sort();
        calls
    }

    /// Largest number of fits that were in progress at the same time.
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

impl TopicModelFitter for MockFitter {
    fn fit(&self, dtm: &DocumentTermMatrix, k: usize, seed: u64) -> Result<FittedModel, FitError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((k, seed));
        }
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _running = Running(&self.running);

        if self.slow.contains(&k) {
            std::thread::sleep(self.delay);
        }
        if self.panicking.contains(&k) {
            panic!("mock fitter panic for k={}", k);
        }
        if self.failing.contains(&k) {
            return Err(FitError::Failed(format!("mock failure for k={}", k)));
        }
        if k >= dtm.n_rows() {
            return Err(FitError::Rejected(format!(
                "k={} must be less than the number of documents ({})",
                k,
                dtm.n_rows()
            )));
        }

        let beta = (0..k)
            .map(|topic| {
                let weights = (0..dtm.n_cols()).map(|col| {
                    let df = dtm.document_frequency(col) as f64;
                    (1.0 + df) * (1 + mix(seed, topic, col) % 10) as f64
                });
                normalize(weights.collect())
            })
            .collect();

        let mut gamma: Vec<Vec<f64>> = (0..dtm.n_rows())
            .map(|row| {
                let weights = (0..k).map(|topic| (1 + mix(!seed, row, topic) % 10) as f64);
                normalize(weights.collect())
            })
            .collect();

        if self.malformed.contains(&k) {
            if let Some(first) = gamma.first_mut() {
                first.iter_mut().for_each(|w| *w *= 2.0);
            }
        }

        Ok(FittedModel::new(beta, gamma))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// SplitMix64 finalizer over the seed and two indices.
fn mix(seed: u64, a: usize, b: usize) -> u64 {
    let mut z = seed
        .wrapping_add((a as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add((b as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn normalize(weights: Vec<f64>) -> Vec<f64> {
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return weights;
    }
    weights.into_iter().map(|w| w / total).collect()
}
