//! Concurrent batch scoring over JSON-lines input

use crate::error::{Result as ScoringResult, ScoringError};
use crate::metrics::ScoringMetrics;
use crate::scorer::RiskScorer;
use crate::types::score::ScoreReport;
use crate::types::transaction::RawTransaction;
use anyhow::{Context, Result};
use std::io::BufRead;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Read one `RawTransaction` per non-blank line.
///
/// Malformed lines are logged with their line number and counted as
/// rejections; I/O errors abort the read.
pub fn read_transactions<R: BufRead>(
    reader: R,
    metrics: &ScoringMetrics,
) -> Result<Vec<RawTransaction>> {
    let mut transactions = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read input line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<RawTransaction>(trimmed) {
            Ok(tx) => transactions.push(tx),
            Err(e) => {
                metrics.record_rejection();
                warn!(line = index + 1, error = %e, "Failed to deserialize transaction");
            }
        }
    }

    Ok(transactions)
}

/// Scores transactions on a bounded number of concurrent tokio tasks.
pub struct BatchRunner {
    scorer: Arc<RiskScorer>,
    metrics: Arc<ScoringMetrics>,
    workers: usize,
}

impl BatchRunner {
    pub fn new(scorer: Arc<RiskScorer>, metrics: Arc<ScoringMetrics>, workers: usize) -> Self {
        Self {
            scorer,
            metrics,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Score every transaction, returning outcomes in input order.
    ///
    /// A rejected transaction never affects the others. The outer error is
    /// reserved for task failures (a panicked scoring task).
    pub async fn run(
        &self,
        transactions: Vec<RawTransaction>,
    ) -> Result<Vec<ScoringResult<ScoreReport>>> {
        info!(
            transactions = transactions.len(),
            workers = self.workers,
            "Starting batch scoring"
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let mut handles = Vec::with_capacity(transactions.len());

        for (index, raw) in transactions.into_iter().enumerate() {
            // Acquire permit (limits concurrent tasks)
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Worker semaphore closed")?;

            let scorer = self.scorer.clone();
            let metrics = self.metrics.clone();

            handles.push(tokio::spawn(async move {
                let start_time = Instant::now();
                let outcome = score_one(&scorer, raw);

                match &outcome {
                    Ok(report) => {
                        metrics.record_score(start_time.elapsed(), &report.result);
                        debug!(
                            record = index + 1,
                            transaction_id = ?report.transaction_id,
                            risk_tier = %report.result.risk_tier(),
                            "Transaction scored"
                        );
                    }
                    Err(e) if e.is_invalid_input() => {
                        metrics.record_rejection();
                        warn!(record = index + 1, error = %e, "Transaction rejected");
                    }
                    Err(e) => {
                        metrics.record_rejection();
                        error!(record = index + 1, error = %e, "Scoring failed");
                    }
                }

                drop(permit);
                outcome
            }));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            outcomes.push(handle.await.context("Scoring task panicked")?);
        }

        Ok(outcomes)
    }
}

fn score_one(scorer: &RiskScorer, raw: RawTransaction) -> ScoringResult<ScoreReport> {
    let features = raw.validate()?;
    let result = scorer.score(&features)?;
    Ok(ScoreReport::new(raw.transaction_id, &features, result))
}

/// First fatal error among batch outcomes, if any
pub fn first_fatal(outcomes: &[ScoringResult<ScoreReport>]) -> Option<&ScoringError> {
    outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .find(|e| e.is_fatal())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gateway::ModelGateway;
    use crate::models::logistic::LogisticRegression;
    use crate::types::score::RiskTier;
    use std::io::Cursor;

    fn scorer() -> Arc<RiskScorer> {
        let model = LogisticRegression::new(
            vec!["time".into(), "amount".into()],
            vec![-2.0e-5, 1.5e-3],
            -2.0,
        );
        Arc::new(RiskScorer::new(ModelGateway::from_classifier(Arc::new(model))))
    }

    #[test]
    fn test_read_transactions_skips_blank_and_malformed_lines() {
        let metrics = ScoringMetrics::new();
        let input = "{\"time\": 1.0, \"amount\": 2.0}\n\n not json\n{\"Time\": 3.0, \"Amount\": 4.0}\n";

        let transactions = read_transactions(Cursor::new(input), &metrics).unwrap();

        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[1].time, Some(3.0));
        assert_eq!(metrics.rejected(), 1);
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_rejections() {
        let metrics = Arc::new(ScoringMetrics::new());
        let runner = BatchRunner::new(scorer(), metrics.clone(), 3);

        let transactions: Vec<RawTransaction> = (0..20)
            .map(|i| {
                let amount = if i == 7 { -1.0 } else { i as f64 * 250.0 };
                RawTransaction::new(i as f64 * 3_600.0, amount).with_id(format!("tx_{i}"))
            })
            .collect();

        let outcomes = runner.run(transactions).await.unwrap();

        assert_eq!(outcomes.len(), 20);
        for (i, outcome) in outcomes.iter().enumerate() {
            if i == 7 {
                assert!(matches!(outcome, Err(ScoringError::InvalidInput { .. })));
            } else {
                let report = outcome.as_ref().unwrap();
                assert_eq!(report.transaction_id.as_deref(), Some(format!("tx_{i}").as_str()));
            }
        }
        assert_eq!(metrics.scored(), 19);
        assert_eq!(metrics.rejected(), 1);
        assert!(first_fatal(&outcomes).is_none());
    }

    #[tokio::test]
    async fn test_concurrent_batch_matches_sequential_scoring() {
        let scorer = scorer();
        let runner = BatchRunner::new(scorer.clone(), Arc::new(ScoringMetrics::new()), 8);

        let transactions: Vec<RawTransaction> = (0..100)
            .map(|i| RawTransaction::new(i as f64 * 1_234.0, (i * i) as f64 * 1.5))
            .collect();
        let sequential = scorer.score_batch(&transactions);

        let outcomes = runner.run(transactions).await.unwrap();

        for (concurrent, sequential) in outcomes.iter().zip(&sequential) {
            assert_eq!(
                concurrent.as_ref().unwrap().result,
                *sequential.as_ref().unwrap()
            );
        }
        assert!(outcomes
            .iter()
            .any(|o| o.as_ref().unwrap().result.risk_tier() == RiskTier::High));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let runner = BatchRunner::new(scorer(), Arc::new(ScoringMetrics::new()), 0);
        assert_eq!(runner.workers(), 1);
        assert!(runner.run(Vec::new()).await.unwrap().is_empty());
    }
}
