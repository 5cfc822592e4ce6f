//! End-to-end pipeline: schema init → (optional) crawl → load → transform → train.
//!
//! Stages run linearly with no branching back. Per-item failures inside the
//! crawl stage (a day, a target, a bulk load) are logged and skipped; the
//! single fatal condition is an empty article store at the load stage.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use storypulse_crawler::{CrawlScheduler, Fetcher};
use storypulse_shared::{AppConfig, CrawlTarget, FetchPolicy, Result, StorypulseError};
use storypulse_storage::Storage;

use crate::train::{Metrics, ModelTrainer};
use crate::transform::FeatureTransformer;

/// Result of one pipeline invocation.
#[derive(Debug)]
pub struct PipelineReport {
    /// Rows loaded from the store before transform.
    pub articles_loaded: usize,
    /// Modeling-ready table written by the transform stage.
    pub processed_path: PathBuf,
    /// Serialized classifier written by the train stage.
    pub model_path: PathBuf,
    /// Held-out evaluation metrics.
    pub metrics: Metrics,
    /// Total elapsed time.
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline stages.
pub trait StageReporter: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, name: &str);
}

/// No-op reporter for headless/test usage.
pub struct SilentStages;

impl StageReporter for SilentStages {
    fn stage(&self, _name: &str) {}
}

/// Run the full pipeline.
///
/// 1. Initialize — idempotent schema creation; failure is logged, not fatal
/// 2. Crawl (iff `run_crawl`) — every configured (tag, year) target,
///    bulk-loading each target's raw file, cooling down between targets
/// 3. Load — the full article store; zero rows aborts the run
/// 4. Transform — via the injected [`FeatureTransformer`]
/// 5. Train — via the injected [`ModelTrainer`]
#[instrument(skip_all, fields(run_crawl = run_crawl))]
pub async fn run_pipeline(
    config: &AppConfig,
    run_crawl: bool,
    transformer: &dyn FeatureTransformer,
    trainer: &dyn ModelTrainer,
    reporter: &dyn StageReporter,
) -> Result<PipelineReport> {
    let start = Instant::now();
    info!(run_crawl, "starting pipeline");

    // --- Stage 1: Initialize ---
    reporter.stage("Initializing store");
    let db_path = PathBuf::from(&config.paths.db_path);
    let storage = Storage::connect(&db_path).await?;
    if let Err(e) = storage.init_schema().await {
        // The schema may already exist from an earlier run; the load
        // stage will surface a genuinely unusable store.
        warn!(error = %e, "schema initialization failed, continuing");
    }

    // --- Stage 2: Crawl (optional) ---
    if run_crawl {
        reporter.stage("Crawling targets");
        crawl_all_targets(config, &storage).await?;
    }

    // --- Stage 3: Load ---
    reporter.stage("Loading articles");
    let articles = storage.load_articles().await?;
    if articles.is_empty() {
        return Err(StorypulseError::Precondition(
            "article store is empty; nothing to transform or train on".into(),
        ));
    }
    info!(rows = articles.len(), "loaded article store");

    // --- Stage 4: Transform ---
    reporter.stage("Transforming");
    let transformed = transformer.transform(&articles)?;

    // --- Stage 5: Train ---
    reporter.stage("Training");
    let trained = trainer.train(&transformed.path)?;

    let report = PipelineReport {
        articles_loaded: articles.len(),
        processed_path: transformed.path,
        model_path: trained.model_path,
        metrics: trained.metrics,
        elapsed: start.elapsed(),
    };

    info!(
        articles = report.articles_loaded,
        accuracy = report.metrics.accuracy,
        elapsed_ms = report.elapsed.as_millis(),
        "pipeline complete"
    );

    Ok(report)
}

/// Crawl every configured (tag, year) target sequentially, bulk-loading
/// each raw file as its target completes. Per-target failures are logged
/// and never abort the loop; a cooldown larger than the per-page delay
/// separates targets.
async fn crawl_all_targets(config: &AppConfig, storage: &Storage) -> Result<()> {
    let policy = FetchPolicy::from(config);
    let scheduler = CrawlScheduler::new(
        Fetcher::new(policy)?,
        &config.scrape.base_url,
        config.scrape.max_stories_per_day,
        Path::new(&config.paths.raw_data_dir),
    );

    let targets = CrawlTarget::enumerate(&config.scrape.tags, &config.scrape.years);
    let cooldown = Duration::from_secs(config.scrape.target_cooldown_secs);

    info!(targets = targets.len(), "crawl stage starting");

    for target in &targets {
        match scheduler.run(target).await {
            Ok(outcome) => {
                if let Err(e) = storage.bulk_load_csv(&outcome.csv_path, &target.tag).await {
                    warn!(%target, error = %e, "bulk load failed for target");
                }
            }
            Err(e) => {
                warn!(%target, error = %e, "target crawl failed");
            }
        }

        tokio::time::sleep(cooldown).await;
    }

    Ok(())
}
