//! Simulated exchange backtester - main entry point
//!
//! This binary provides two subcommands:
//! - backtest: Replay a strategy against historical bars
//! - optimize: Grid-search strategy parameters in parallel

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "exchange-sim")]
#[command(about = "Backtest margin-contract strategies against a simulated exchange", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run strategy backtest
    Backtest {
        /// Path to configuration file
        #[arg(short, long, default_value = "configs/xbtusd_channel_breakout_1h.json")]
        config: String,

        /// CSV bar file (overrides config file)
        #[arg(short, long)]
        data: Option<String>,

        /// Strategy name (overrides config file)
        #[arg(short, long)]
        strategy: Option<String>,

        /// Bin size the strategy subscribes to, e.g. "5m", "1h"
        #[arg(short, long)]
        bin_size: Option<String>,

        /// Log every position open/close
        #[arg(long)]
        trade_log: bool,

        /// Save the result as JSON under the results directory
        #[arg(long)]
        save: bool,
    },

    /// Optimize strategy parameters
    Optimize {
        /// Path to base configuration file
        #[arg(short, long, default_value = "configs/xbtusd_channel_breakout_1h.json")]
        config: String,

        /// Optimization mode (quick, full, or custom to use the config's grid)
        #[arg(short, long, default_value = "quick")]
        mode: String,

        /// Sort results by metric (return, win_rate, profit_factor, drawdown)
        #[arg(long, default_value = "return")]
        sort_by: String,

        /// Number of top results to show
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Run sequentially instead of parallel
        #[arg(long)]
        sequential: bool,
    },
}

fn setup_logging(verbose: bool, command_name: &str, file_only: bool) -> Result<()> {
    std::fs::create_dir_all("logs")?;

    // {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    if file_only {
        // Optimizer: keep the console clean for the progress bar
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    } else {
        let console_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(true);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file_appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true)
            .with_ansi(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(console_layer)
            .with(file_layer)
            .init();

        info!("Logging initialized");
        info!("Log file: {}", log_path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let (command_name, file_only) = match &cli.command {
        Commands::Backtest { .. } => ("backtest", false),
        Commands::Optimize { .. } => ("optimize", true),
    };

    setup_logging(cli.verbose, command_name, file_only)?;

    match cli.command {
        Commands::Backtest {
            config,
            data,
            strategy,
            bin_size,
            trade_log,
            save,
        } => commands::backtest::run(commands::backtest::BacktestArgs {
            config_path: config,
            data_override: data,
            strategy_override: strategy,
            bin_size_override: bin_size,
            trade_log,
            save,
        }),

        Commands::Optimize {
            config,
            mode,
            sort_by,
            top,
            sequential,
        } => commands::optimize::run(config, mode, sort_by, top, sequential),
    }
}
