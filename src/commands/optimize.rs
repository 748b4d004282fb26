//! Optimize command implementation with progress tracking

use anyhow::{Context, Result};
use exchange_sim::optimizer::{self, Optimizer, SortMetric};
use exchange_sim::{data, strategies, Config};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::info;

pub fn run(
    config_path: String,
    mode: String,
    sort_by: String,
    top: usize,
    sequential: bool,
) -> Result<()> {
    info!("Starting optimization");

    let config = Config::from_file(&config_path)?;
    info!("Loaded configuration from: {}", config_path);

    let metric: SortMetric = sort_by.parse()?;

    let configs = match mode.as_str() {
        "custom" => {
            let grid = config
                .grid
                .as_ref()
                .context("Mode 'custom' needs a 'grid' section in the config")?;
            optimizer::configs_from_grid(&config, grid)
        }
        "full" => strategies::default_grid(&config, true)?,
        "quick" => strategies::default_grid(&config, false)?,
        other => anyhow::bail!("Unknown mode: {}. Use quick, full or custom", other),
    };

    let candles = data::load_csv(&config.backtest.data_file)?;
    if candles.is_empty() {
        anyhow::bail!("No bars loaded from {}", config.backtest.data_file);
    }

    let total_runs = configs.len();
    info!("Optimization mode: {}", mode);
    info!("Parameter combinations: {}", total_runs);

    println!("\n{}", "=".repeat(70));
    println!("OPTIMIZATION SUMMARY");
    println!("{}", "=".repeat(70));
    println!("  Strategy:      {}", config.strategy_name().unwrap_or("?"));
    println!("  Bin size:      {}", config.backtest.bin_size);
    println!("  Bars:          {}", candles.len());
    println!("  Parameters:    {} combinations", total_runs);
    println!("  Mode:          {}", if sequential { "sequential" } else { "parallel" });
    println!("{}\n", "=".repeat(70));

    let pb = ProgressBar::new(total_runs as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("⚡ {percent:>3}%|{bar:40}| {pos}/{len} [{elapsed}<{eta}, {per_sec:.2}]")
            .context("Invalid progress bar template")?
            .progress_chars("█░ "),
    );

    let mut results = Optimizer::new()
        .sequential(sequential)
        .optimize(&candles, configs, Some(pb.clone()));
    pb.finish();
    println!();

    if results.is_empty() {
        info!("No valid results found.");
        return Ok(());
    }

    Optimizer::sort_results(&mut results, metric);
    info!("Total results: {}, sorted by: {}", results.len(), sort_by);

    let display_count = top.min(results.len());
    println!("\n{}", "=".repeat(100));
    println!("TOP {} OPTIMIZATION RESULTS (sorted by {})", display_count, sort_by);
    println!("{}", "=".repeat(100));
    println!(
        "{:<4} {:>9} {:>8} {:>8} {:>8} {:>7} | Parameters",
        "Rank", "Return%", "MaxDD%", "WinR%", "PF", "Orders"
    );
    println!("{}", "-".repeat(100));

    for (i, result) in results.iter().take(top).enumerate() {
        let params_str = result
            .params
            .iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .map(|(k, v)| format!("{}:{}", k, v))
            .join(" ");

        println!(
            "{:<4} {:>9.2} {:>8.2} {:>8.2} {:>8.2} {:>7} | {}",
            i + 1,
            result.total_return,
            result.max_draw_down,
            result.win_rate,
            result.profit_factor,
            result.order_count,
            params_str
        );
    }
    println!("{}", "=".repeat(100));

    info!("Optimization completed successfully");

    Ok(())
}
