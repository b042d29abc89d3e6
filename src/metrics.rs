//! Scoring statistics for batch runs.

use crate::types::score::{Label, RiskTier, ScoreResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

const MAX_LATENCY_SAMPLES: usize = 10_000;

/// Metrics collector shared across scoring tasks
pub struct ScoringMetrics {
    /// Transactions that produced a score
    pub transactions_scored: AtomicU64,
    /// Transactions rejected before or during scoring
    pub transactions_rejected: AtomicU64,
    fraudulent_labels: AtomicU64,
    tier_counts: [AtomicU64; 3],
    /// Scoring latency in microseconds, most recent window
    processing_times: RwLock<Vec<u64>>,
    probability_buckets: RwLock<[u64; 10]>,
    start_time: Instant,
}

impl ScoringMetrics {
    pub fn new() -> Self {
        Self {
            transactions_scored: AtomicU64::new(0),
            transactions_rejected: AtomicU64::new(0),
            fraudulent_labels: AtomicU64::new(0),
            tier_counts: [AtomicU64::new(0), AtomicU64::new(0), AtomicU64::new(0)],
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            probability_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a successfully scored transaction
    pub fn record_score(&self, processing_time: Duration, result: &ScoreResult) {
        self.transactions_scored.fetch_add(1, Ordering::Relaxed);
        self.tier_counts[result.risk_tier().index()].fetch_add(1, Ordering::Relaxed);
        if result.label() == Label::Fraudulent {
            self.fraudulent_labels.fetch_add(1, Ordering::Relaxed);
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            if times.len() > MAX_LATENCY_SAMPLES {
                times.drain(0..MAX_LATENCY_SAMPLES / 2);
            }
        }

        let bucket = ((result.fraud_probability() * 10.0) as usize).min(9);
        if let Ok(mut buckets) = self.probability_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a rejected transaction
    pub fn record_rejection(&self) {
        self.transactions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn scored(&self) -> u64 {
        self.transactions_scored.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.transactions_rejected.load(Ordering::Relaxed)
    }

    pub fn tier_count(&self, tier: RiskTier) -> u64 {
        self.tier_counts[tier.index()].load(Ordering::Relaxed)
    }

    pub fn label_count(&self, label: Label) -> u64 {
        let fraudulent = self.fraudulent_labels.load(Ordering::Relaxed);
        match label {
            Label::Fraudulent => fraudulent,
            Label::Legitimate => self.scored().saturating_sub(fraudulent),
        }
    }

    pub fn get_processing_stats(&self) -> ProcessingStats {
        let mut sorted = match self.processing_times.read() {
            Ok(times) if !times.is_empty() => times.clone(),
            _ => return ProcessingStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |q: f64| sorted[((count as f64 * q) as usize).min(count - 1)];

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: at(0.50),
            p95_us: at(0.95),
            p99_us: at(0.99),
            max_us: sorted[count - 1],
        }
    }

    /// Transactions scored per second since creation
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.scored() as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn get_probability_distribution(&self) -> [u64; 10] {
        self.probability_buckets
            .read()
            .map(|b| *b)
            .unwrap_or_default()
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let scored = self.scored();
        let rejected = self.rejected();
        let processing = self.get_processing_stats();

        info!(
            scored,
            rejected,
            fraudulent = self.label_count(Label::Fraudulent),
            legitimate = self.label_count(Label::Legitimate),
            throughput = format!("{:.1} tx/s", self.get_throughput()),
            "Scoring summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            max_us = processing.max_us,
            "Scoring latency"
        );
        for tier in RiskTier::ALL {
            let count = self.tier_count(tier);
            let pct = if scored > 0 {
                count as f64 / scored as f64 * 100.0
            } else {
                0.0
            };
            info!(tier = %tier, count, share = format!("{pct:.1}%"), "Risk tier");
        }

        let distribution = self.get_probability_distribution();
        for (i, &count) in distribution.iter().enumerate() {
            if count > 0 {
                info!(
                    bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                    count,
                    "Probability distribution"
                );
            }
        }
    }
}

impl Default for ScoringMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Periodically logs a metrics summary while a long batch runs
pub struct MetricsReporter {
    metrics: Arc<ScoringMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<ScoringMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Run until the task is aborted
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
