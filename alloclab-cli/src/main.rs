//! AllocLab CLI: inspect strategies, make one decision, or replay a range.
//!
//! Commands:
//! - `info`: show a strategy's interval, assets and data descriptors
//! - `decide`: run one decision on a fresh strategy against a JSON window
//! - `run`: replay a strategy over CSV (or synthetic) bars and save artifacts
//! - `report`: print the summary of a saved artifact directory

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::io::Read;
use std::path::{Path, PathBuf};

use alloclab_core::domain::PriceWindow;
use alloclab_core::strategy::{build_strategy, Strategy, StrategyPreset};
use alloclab_core::StrategyConfig;
use alloclab_runner::{
    generate_report, load_artifacts, run_single_replay, save_artifacts, ErrorPolicy, ReplayConfig,
};

#[derive(Parser)]
#[command(
    name = "alloclab",
    about = "AllocLab CLI: rule-based daily allocation strategies"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Strategy selection shared by `info` and `decide`.
#[derive(clap::Args)]
struct StrategyArgs {
    /// Named preset: momentum_rotation, volatility_gate.
    #[arg(long)]
    preset: Option<String>,

    /// Path to a strategy TOML file (`type = "..."` plus parameters).
    #[arg(long)]
    strategy_config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OnError {
    Halt,
    Skip,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Halt => ErrorPolicy::Halt,
            OnError::Skip => ErrorPolicy::Skip,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show a strategy's interval, assets and data descriptors.
    Info {
        #[command(flatten)]
        strategy: StrategyArgs,
    },
    /// Run one decision on a fresh strategy and print the allocation as JSON.
    Decide {
        #[command(flatten)]
        strategy: StrategyArgs,

        /// JSON price window (`{"ohlcv": [...]}`); `-` reads stdin.
        #[arg(long)]
        window: PathBuf,
    },
    /// Replay a strategy over a date range.
    Run {
        /// Path to a replay TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset (alternative to --config).
        #[arg(long)]
        preset: Option<String>,

        /// Start date (YYYY-MM-DD). Defaults to one year before --end.
        #[arg(long)]
        start: Option<String>,

        /// End date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        end: Option<String>,

        /// Directory holding <TICKER>.csv files.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Use synthetic data instead of CSV files.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Trailing records per decision (0 = full history).
        #[arg(long)]
        window_size: Option<usize>,

        /// What to do when a decision fails.
        #[arg(long, value_enum)]
        on_error: Option<OnError>,

        /// History bars loaded before --start. Defaults to the strategy's need.
        #[arg(long)]
        warmup_bars: Option<usize>,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Print the report for a saved run directory.
    Report {
        /// Artifact directory written by `run` (holds manifest.json).
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Info { strategy } => run_info(&strategy),
        Commands::Decide { strategy, window } => run_decide(&strategy, &window),
        Commands::Run {
            config,
            preset,
            start,
            end,
            data_dir,
            synthetic,
            window_size,
            on_error,
            warmup_bars,
            output_dir,
        } => {
            let replay_config = build_replay_config(
                config.as_deref(),
                preset.as_deref(),
                start.as_deref(),
                end.as_deref(),
            )?;
            let overrides = RunOverrides {
                data_dir,
                synthetic,
                window_size,
                on_error,
                warmup_bars,
            };
            run_replay_cmd(replay_config, overrides, &output_dir)
        }
        Commands::Report { dir } => {
            let result = load_artifacts(&dir)?;
            print!("{}", generate_report(&result));
            Ok(())
        }
    }
}

fn resolve_strategy_config(args: &StrategyArgs) -> Result<StrategyConfig> {
    match (&args.preset, &args.strategy_config) {
        (Some(_), Some(_)) => bail!("--preset and --strategy-config are mutually exclusive"),
        (None, None) => bail!("one of --preset or --strategy-config is required"),
        (Some(name), None) => Ok(name.parse::<StrategyPreset>()?.to_config()),
        (None, Some(path)) => Ok(StrategyConfig::from_file(path)?),
    }
}

fn run_info(args: &StrategyArgs) -> Result<()> {
    let strategy = build_strategy(&resolve_strategy_config(args)?)?;
    println!("strategy: {}", strategy.name());
    println!("interval: {}", strategy.interval());
    println!("assets:   {}", strategy.assets().join(", "));
    let data = strategy.data();
    if !data.is_empty() {
        let names: Vec<String> = data.iter().map(|a| a.to_string()).collect();
        println!("data:     {}", names.join(", "));
    }
    Ok(())
}

fn read_window(path: &Path) -> Result<PriceWindow> {
    let json = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read window from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?
    };
    PriceWindow::from_json(&json).context("window is not a valid {\"ohlcv\": [...]} document")
}

fn run_decide(args: &StrategyArgs, window_path: &Path) -> Result<()> {
    let mut strategy: Box<dyn Strategy> = build_strategy(&resolve_strategy_config(args)?)?;
    let window = read_window(window_path)?;
    let allocation = strategy.run(&window)?;
    println!("{}", serde_json::to_string(&allocation)?);
    Ok(())
}

fn parse_date_arg(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{value}', expected YYYY-MM-DD"))
}

fn build_replay_config(
    config_path: Option<&Path>,
    preset_name: Option<&str>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<ReplayConfig> {
    if config_path.is_some() && preset_name.is_some() {
        bail!("--config and --preset are mutually exclusive");
    }

    let mut config = match (config_path, preset_name) {
        (Some(path), _) => ReplayConfig::from_file(path)?,
        (None, Some(name)) => {
            let end_date = end
                .map(parse_date_arg)
                .transpose()?
                .unwrap_or_else(|| chrono::Local::now().date_naive());
            let start_date = start
                .map(parse_date_arg)
                .transpose()?
                .unwrap_or(end_date - chrono::Duration::days(365));
            ReplayConfig::new(name.parse::<StrategyPreset>()?.to_config(), start_date, end_date)
        }
        (None, None) => bail!("one of --config or --preset is required"),
    };

    // Explicit dates override the file
    if config_path.is_some() {
        if let Some(s) = start {
            config.replay.start_date = parse_date_arg(s)?;
        }
        if let Some(e) = end {
            config.replay.end_date = parse_date_arg(e)?;
        }
    }
    Ok(config)
}

/// Command-line settings that override the replay config file.
struct RunOverrides {
    data_dir: Option<PathBuf>,
    synthetic: bool,
    window_size: Option<usize>,
    on_error: Option<OnError>,
    warmup_bars: Option<usize>,
}

fn run_replay_cmd(
    mut config: ReplayConfig,
    overrides: RunOverrides,
    output_dir: &Path,
) -> Result<()> {
    if let Some(dir) = overrides.data_dir {
        config.replay.data_dir = dir;
    }
    if overrides.synthetic {
        config.replay.synthetic = true;
    }
    if let Some(n) = overrides.window_size {
        config.replay.window_size = n;
    }
    if let Some(policy) = overrides.on_error {
        config.replay.on_error = policy.into();
    }
    if overrides.warmup_bars.is_some() {
        config.replay.warmup_bars = overrides.warmup_bars;
    }
    config.validate()?;

    let result = run_single_replay(&config)?;
    print!("{}", generate_report(&result));

    let run_dir = save_artifacts(&result, output_dir)?;
    info!("artifacts saved to {}", run_dir.display());
    Ok(())
}
