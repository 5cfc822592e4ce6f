//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use storypulse_core::{
    EngagementTransformer, StageReporter, TitleClassifierTrainer, run_pipeline,
};
use storypulse_shared::{config_file_path, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// storypulse — crawl article engagement data and train a classifier.
#[derive(Parser)]
#[command(
    name = "storypulse",
    version,
    about = "Acquire article engagement metadata and train a binary engagement classifier.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the pipeline: load → transform → train, optionally crawling first.
    Run {
        /// Run the crawl stage over every configured (tag, year) target
        /// before loading. Off by default; the pipeline then runs against
        /// whatever is already in the article store.
        #[arg(long)]
        crawl: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "storypulse=info",
        1 => "storypulse=debug",
        _ => "storypulse=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run { crawl } => cmd_run(crawl).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(crawl: bool) -> Result<()> {
    let config = load_config()?;

    let transformer = EngagementTransformer::new(&config.paths.processed_data_dir);
    let trainer = TitleClassifierTrainer::new(
        &config.paths.models_dir,
        config.model.clap_threshold,
        config.model.test_fraction,
        config.model.seed,
    );

    info!(
        crawl,
        tags = config.scrape.tags.len(),
        years = config.scrape.years.len(),
        "starting pipeline run"
    );

    let reporter = CliStages::new();
    let report = run_pipeline(&config, crawl, &transformer, &trainer, &reporter).await?;
    reporter.finish();

    println!();
    println!("  Pipeline completed successfully!");
    println!("  Articles:  {}", report.articles_loaded);
    println!("  Processed: {}", report.processed_path.display());
    println!("  Model:     {}", report.model_path.display());
    println!(
        "  Metrics:   acc {:.4}  prec {:.4}  rec {:.4}  f1 {:.4}",
        report.metrics.accuracy, report.metrics.precision, report.metrics.recall, report.metrics.f1
    );
    println!("  Time:      {:.1}s", report.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Created config file: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let path = config_file_path()?;
    println!("# resolved config ({})", path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI stage reporter
// ---------------------------------------------------------------------------

/// Stage reporter using an indicatif spinner.
struct CliStages {
    spinner: ProgressBar,
}

impl CliStages {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { spinner }
    }

    fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

impl StageReporter for CliStages {
    fn stage(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }
}
