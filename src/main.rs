//! Synthetic price path generator CLI.
//!
//! # Usage
//!
//! ```bash
//! # Simulate two years of SPY from data/prices/SPY.csv
//! mahler-synth simulate --ticker SPY --years 2 --output spy_synth.csv
//!
//! # Use a config file, overriding the seed
//! mahler-synth simulate --ticker SPY --config config/default.toml --seed 7 --output out.csv
//!
//! # Inspect the fitted regimes
//! mahler-synth regimes --ticker SPY --regimes 4
//!
//! # 100 independent paths in parallel
//! mahler-synth batch --ticker SPY --runs 100 --output-dir results/spy
//!
//! # Check the input history
//! mahler-synth validate --ticker SPY
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mahler_synth::data::{write_bars_csv, DataLoader, PriceSeries, PriceSource};
use mahler_synth::metrics::MetricsCalculator;
use mahler_synth::simulation::{RegimeModel, SimulationConfig, SyntheticMarketGenerator};
use mahler_synth::validation::SeriesValidator;

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "mahler-synth")]
#[command(about = "Regime-switching block-bootstrap price path generator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding {TICKER}.csv / {TICKER}.parquet price files
    #[arg(long, default_value = "data/prices", global = true)]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one synthetic path and write it as CSV
    Simulate {
        #[command(flatten)]
        sim: SimArgs,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Fit the regime model and print its statistics
    Regimes {
        #[command(flatten)]
        sim: SimArgs,

        /// Print the fitted model summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Simulate many seeds in parallel, one CSV per run
    Batch {
        #[command(flatten)]
        sim: SimArgs,

        /// Number of runs (seeds seed..seed+runs)
        #[arg(long, default_value_t = 10)]
        runs: u64,

        /// Output directory
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },

    /// Validate the historical close series
    Validate {
        /// Ticker to check
        #[arg(long)]
        ticker: String,

        /// Earliest date to load (YYYY-MM-DD)
        #[arg(long, default_value = "2000-01-01")]
        history_start: NaiveDate,
    },
}

/// Simulation parameters; flags override the config file.
#[derive(Args)]
struct SimArgs {
    /// Ticker to load
    #[arg(long)]
    ticker: String,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Horizon in years (252 trading days each)
    #[arg(long)]
    years: Option<u32>,

    /// Master seed
    #[arg(long)]
    seed: Option<u64>,

    /// Rolling volatility window (days)
    #[arg(long)]
    vol_window: Option<usize>,

    /// Number of volatility regimes
    #[arg(long = "regimes")]
    n_regimes: Option<usize>,

    /// Bootstrap block length (days)
    #[arg(long)]
    block_size: Option<usize>,

    /// Earliest historical date (YYYY-MM-DD)
    #[arg(long)]
    history_start: Option<NaiveDate>,

    /// First synthetic date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Wick size as a multiple of the bar body
    #[arg(long)]
    wick_factor: Option<f64>,
}

impl SimArgs {
    fn resolve(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SimulationConfig::default(),
        };

        if let Some(v) = self.years {
            config.years = v;
        }
        if let Some(v) = self.seed {
            config.seed = v;
        }
        if let Some(v) = self.vol_window {
            config.vol_window = v;
        }
        if let Some(v) = self.n_regimes {
            config.n_regimes = v;
        }
        if let Some(v) = self.block_size {
            config.block_size = v;
        }
        if let Some(v) = self.history_start {
            config.history_start = v;
        }
        if let Some(v) = self.start_date {
            config.start_date = v;
        }
        if let Some(v) = self.wick_factor {
            config.wick_factor = v;
        }

        config.validate().context("Invalid simulation parameters")?;
        Ok(config)
    }
}

fn load_history(loader: &DataLoader, ticker: &str, start: NaiveDate) -> Result<PriceSeries> {
    let history = loader.load_closes(ticker, start).with_context(|| {
        let available = loader.available_tickers().unwrap_or_default();
        format!(
            "Failed to load price history for {} (available: {})",
            ticker,
            if available.is_empty() { "none".to_string() } else { available.join(", ") }
        )
    })?;
    info!("Loaded {} closes for {} since {}", history.len(), ticker, start);
    Ok(history)
}

fn fit(loader: &DataLoader, sim: &SimArgs) -> Result<(SyntheticMarketGenerator, PriceSeries, RegimeModel)> {
    let config = sim.resolve()?;
    let history = load_history(loader, &sim.ticker, config.history_start)?;
    let generator = SyntheticMarketGenerator::new(config)?;
    let model = generator
        .fit(&history)
        .with_context(|| format!("Failed to fit regime model for {}", sim.ticker))?;
    Ok((generator, history, model))
}

fn print_regimes(model: &RegimeModel) {
    println!("\n{}", SEPARATOR);
    println!(
        "{}: {} regimes, current regime {}, anchor {:.2} on {}",
        model.ticker,
        model.n_regimes(),
        model.start_regime,
        model.anchor_price,
        model.last_date
    );
    println!("{}", SEPARATOR);
    println!("Volatility thresholds: {:?}", model.classification.thresholds);
    for s in model.stats() {
        println!(
            "  Regime {}: {:>5} days ({:>5.1}%), avg vol {:.5}, avg ret {:+.5}",
            s.regime, s.days, s.pct_of_total, s.avg_volatility, s.avg_return
        );
    }
    println!("Transition matrix:");
    let n = model.n_regimes();
    for from in 0..n {
        let cells: Vec<String> = (0..n)
            .map(|to| format!("{:.3}", model.transitions.probability(from, to)))
            .collect();
        println!("  {} -> [{}]", from, cells.join(", "));
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let loader = DataLoader::new(&cli.data_dir.to_string_lossy());

    match cli.command {
        Commands::Simulate { sim, output } => {
            let (generator, history, model) = fit(&loader, &sim)?;
            let run = generator.generate(&model)?;
            write_bars_csv(&output, &run.bars)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            println!("\n{}", SEPARATOR);
            println!("Historical ({})", history.ticker);
            println!("{}", SEPARATOR);
            println!("{}", MetricsCalculator::from_series(&history).summary());
            println!("\n{}", SEPARATOR);
            println!("Synthetic (seed {})", run.seed);
            println!("{}", SEPARATOR);
            println!("{}", MetricsCalculator::from_bars(&run.bars).summary());
            if let Some(date) = MetricsCalculator::max_drawdown_date(&run.bars) {
                println!("Deepest trough on {}", date);
            }
            println!("\nWrote {} bars to {}", run.bars.len(), output.display());
        }

        Commands::Regimes { sim, json } => {
            let (_, _, model) = fit(&loader, &sim)?;
            if json {
                let summary = serde_json::json!({
                    "ticker": model.ticker,
                    "anchor_price": model.anchor_price,
                    "last_date": model.last_date,
                    "start_regime": model.start_regime,
                    "thresholds": model.classification.thresholds,
                    "stats": model.stats(),
                    "transitions": model.transitions.rows(),
                    "pool_sizes": model.pools.sizes(),
                });
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_regimes(&model);
            }
        }

        Commands::Batch {
            sim,
            runs,
            output_dir,
        } => {
            let (generator, _, model) = fit(&loader, &sim)?;
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;

            let base = generator.config().seed;
            let seeds: Vec<u64> = (0..runs).map(|i| base.wrapping_add(i)).collect();

            let pb = ProgressBar::new(seeds.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"),
            );
            let outputs = generator.simulate_batch_with_progress(&model, &seeds, |_| pb.inc(1))?;
            pb.finish_with_message("simulated");

            let mut final_returns = Vec::with_capacity(outputs.len());
            for run in &outputs {
                let path = output_dir.join(format!("{}_seed{}.csv", model.ticker, run.seed));
                write_bars_csv(&path, &run.bars)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                final_returns.push(MetricsCalculator::from_bars(&run.bars).total_return_pct);
            }

            final_returns.sort_by(f64::total_cmp);
            if let (Some(lo), Some(hi)) = (final_returns.first(), final_returns.last()) {
                let median = final_returns[final_returns.len() / 2];
                println!(
                    "\n{} runs: total return min {:.2}%, median {:.2}%, max {:.2}%",
                    final_returns.len(),
                    lo,
                    median,
                    hi
                );
            }
            println!("Wrote {} files to {}", outputs.len(), output_dir.display());
        }

        Commands::Validate {
            ticker,
            history_start,
        } => {
            let history = load_history(&loader, &ticker, history_start)?;
            let report = SeriesValidator::default().validate(&history);

            println!("\n{}", SEPARATOR);
            println!("{}", report.summary());
            println!("{}", SEPARATOR);
            for check in &report.checks {
                let mark = if check.passed { "PASS" } else { "FAIL" };
                println!("  [{}] {}: {}", mark, check.name, check.message);
                if let Some(details) = &check.details {
                    println!("         {}", details);
                }
            }

            if !report.all_passed() {
                anyhow::bail!("{} failed validation", ticker);
            }
        }
    }

    Ok(())
}
