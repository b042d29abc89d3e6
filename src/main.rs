//! Fraud Risk Scorer - Main Entry Point
//!
//! Loads the classifier once at startup, then scores a single transaction or
//! a JSON-lines batch.

use anyhow::{bail, Context, Result};
use clap::Parser;
use fraud_risk_scorer::{
    batch::{first_fatal, read_transactions, BatchRunner},
    cli::{Args, Command, OutputFormat},
    config::{AppConfig, LogFormat, LoggingConfig},
    metrics::{MetricsReporter, ScoringMetrics},
    models::{ModelGateway, ModelLoader},
    RiskScorer, ScoreReport, TransactionFeatures,
};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    args.apply_overrides(&mut config);
    config.validate()?;

    init_tracing(&config.logging)?;
    info!("Starting Fraud Risk Scorer");

    // Load the classifier once; the process does not accept work without it
    let loader = ModelLoader::with_threads(config.model.onnx_threads);
    let gateway = ModelGateway::load_with(&loader, &config.model.path)
        .with_context(|| format!("Failed to initialize model from {}", config.model.path))?;
    let scorer = Arc::new(RiskScorer::new(gateway));
    info!(
        model = %config.model.path,
        classifier = %scorer.gateway().classifier_name(),
        "Risk scorer initialized"
    );

    match args.command {
        Command::Score {
            time,
            amount,
            format,
        } => score_once(&scorer, time, amount, format),
        Command::Batch { input, .. } => run_batch(scorer, &config, &input).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("fraud_risk_scorer={}", logging.level).parse()?);

    // Logs go to stderr so stdout carries only results
    match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .json()
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init(),
    }
    Ok(())
}

fn score_once(scorer: &RiskScorer, time: f64, amount: f64, format: OutputFormat) -> Result<()> {
    let features = match TransactionFeatures::new(time, amount) {
        Ok(features) => features,
        Err(e) => {
            warn!(error = %e, "Transaction rejected");
            bail!("Transaction rejected: {e}");
        }
    };

    let result = scorer.score(&features).context("Scoring failed")?;

    let mut stdout = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let report = ScoreReport::new(None, &features, result);
            serde_json::to_writer_pretty(&mut stdout, &report)?;
            writeln!(stdout)?;
        }
        OutputFormat::Text => {
            writeln!(stdout, "{}", result.label().verdict())?;
            writeln!(stdout, "Risk Level: {}", result.risk_tier().display_name())?;
            writeln!(stdout, "Fraud Probability: {:.1}%", result.probability_percent())?;
            writeln!(stdout, "Transaction Time: {:.0}", features.time())?;
            writeln!(stdout, "Transaction Amount: {:.2}", features.amount())?;
            writeln!(stdout, "Analysis Summary: {}", result.label().summary())?;
        }
    }

    Ok(())
}

async fn run_batch(scorer: Arc<RiskScorer>, config: &AppConfig, input: &Path) -> Result<()> {
    let metrics = Arc::new(ScoringMetrics::new());

    let transactions = if input == Path::new("-") {
        read_transactions(io::stdin().lock(), &metrics)?
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open input {}", input.display()))?;
        read_transactions(BufReader::new(file), &metrics)?
    };

    let reporter = tokio::spawn(
        MetricsReporter::new(metrics.clone(), config.pipeline.metrics_interval_secs).start(),
    );

    let runner = BatchRunner::new(scorer, metrics.clone(), config.pipeline.workers);
    let outcomes = runner.run(transactions).await;
    reporter.abort();
    let outcomes = outcomes?;

    if let Some(fatal) = first_fatal(&outcomes) {
        error!(error = %fatal, "Fatal scoring error, aborting batch");
        bail!("Fatal scoring error: {fatal}");
    }

    let mut out = BufWriter::new(io::stdout().lock());
    for report in outcomes.iter().filter_map(|o| o.as_ref().ok()) {
        serde_json::to_writer(&mut out, report)?;
        writeln!(out)?;
    }
    out.flush()?;

    metrics.print_summary();
    Ok(())
}
