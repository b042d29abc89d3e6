//! Test Transaction Generator
//!
//! Writes random JSON-lines transactions for exercising batch scoring.

use anyhow::{bail, Result};
use clap::Parser;
use fraud_risk_scorer::RawTransaction;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::{self, BufWriter, Write};
use tracing::info;

/// Seconds covered by the generated time axis (two days)
const TIME_SPAN_SECS: f64 = 172_800.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Debug, Parser)]
#[command(name = "generate_transactions", about = "Generate test transactions as JSON lines")]
struct Args {
    /// Number of transactions to generate
    #[arg(long, default_value_t = 1000)]
    count: u64,
    /// Fraction of suspicious transactions
    #[arg(long, default_value_t = 0.05)]
    fraud_ratio: f64,
    /// Fraction of records with a missing or negative field
    #[arg(long, default_value_t = 0.0)]
    invalid_ratio: f64,
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Transaction generator for testing
struct TransactionGenerator {
    rng: StdRng,
    transaction_counter: u64,
}

impl TransactionGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            transaction_counter: 0,
        }
    }

    fn next_id(&mut self) -> String {
        self.transaction_counter += 1;
        format!("tx_{:012}", self.transaction_counter)
    }

    /// Daytime purchase with an everyday amount
    fn generate_legitimate(&mut self) -> RawTransaction {
        let day = self.rng.gen_range(0..2) as f64 * SECONDS_PER_DAY;
        let time = day + self.rng.gen_range(25_200.0..82_800.0);
        let amount = (self.rng.gen_range(1.0_f64..250.0) * 100.0).round() / 100.0;
        RawTransaction::new(time, amount).with_id(self.next_id())
    }

    /// Late-night purchase with an unusually large amount
    fn generate_suspicious(&mut self) -> RawTransaction {
        let day = self.rng.gen_range(0..2) as f64 * SECONDS_PER_DAY;
        let time = day + self.rng.gen_range(0.0..21_600.0);
        let amount = (self.rng.gen_range(500.0_f64..25_000.0) * 100.0).round() / 100.0;
        RawTransaction::new(time, amount).with_id(self.next_id())
    }

    /// Record that scoring must reject
    fn generate_invalid(&mut self) -> RawTransaction {
        let id = self.next_id();
        let mut tx = RawTransaction::new(
            self.rng.gen_range(0.0..TIME_SPAN_SECS),
            self.rng.gen_range(1.0..250.0),
        )
        .with_id(id);
        match self.rng.gen_range(0..3) {
            0 => tx.time = None,
            1 => tx.amount = None,
            _ => tx.amount = Some(-self.rng.gen_range(0.01_f64..100.0)),
        }
        tx
    }

    fn generate(&mut self, fraud_ratio: f64, invalid_ratio: f64) -> RawTransaction {
        let roll: f64 = self.rng.gen();
        if roll < invalid_ratio {
            self.generate_invalid()
        } else if roll < invalid_ratio + fraud_ratio {
            self.generate_suspicious()
        } else {
            self.generate_legitimate()
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    for (name, ratio) in [("fraud_ratio", args.fraud_ratio), ("invalid_ratio", args.invalid_ratio)] {
        if !(0.0..=1.0).contains(&ratio) {
            bail!("{name} must be within [0, 1], got {ratio}");
        }
    }
    if args.fraud_ratio + args.invalid_ratio > 1.0 {
        bail!("fraud_ratio + invalid_ratio must not exceed 1");
    }

    let mut generator = TransactionGenerator::new(args.seed);
    let mut out = BufWriter::new(io::stdout().lock());
    for _ in 0..args.count {
        let tx = generator.generate(args.fraud_ratio, args.invalid_ratio);
        serde_json::to_writer(&mut out, &tx)?;
        writeln!(out)?;
    }
    out.flush()?;

    info!(
        count = args.count,
        fraud_ratio = args.fraud_ratio,
        invalid_ratio = args.invalid_ratio,
        "Generated transactions"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let mut a = TransactionGenerator::new(Some(42));
        let mut b = TransactionGenerator::new(Some(42));
        for _ in 0..50 {
            assert_eq!(a.generate(0.2, 0.1), b.generate(0.2, 0.1));
        }
    }

    #[test]
    fn test_generated_records_match_their_kind() {
        let mut generator = TransactionGenerator::new(Some(7));
        for _ in 0..100 {
            assert!(generator.generate_legitimate().validate().is_ok());
            let suspicious = generator.generate_suspicious();
            assert!(suspicious.validate().is_ok());
            assert!(suspicious.amount.unwrap() >= 500.0);
            assert!(generator.generate_invalid().validate().is_err());
        }
    }
}
