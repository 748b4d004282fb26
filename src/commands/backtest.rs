//! Backtest command implementation

use anyhow::Result;
use exchange_sim::{data, Backtester, BinSize, Config};
use tracing::info;

pub struct BacktestArgs {
    pub config_path: String,
    pub data_override: Option<String>,
    pub strategy_override: Option<String>,
    pub bin_size_override: Option<String>,
    pub trade_log: bool,
    pub save: bool,
}

pub fn run(args: BacktestArgs) -> Result<()> {
    info!("Starting backtest");

    let mut config = Config::from_file(&args.config_path)?;
    info!("Loaded configuration from: {}", args.config_path);

    if let Some(data_file) = args.data_override {
        info!("Overriding data file to: {}", data_file);
        config.backtest.data_file = data_file;
    }

    if let Some(strategy) = args.strategy_override {
        info!("Overriding strategy to: {}", strategy);
        config.set_strategy_param("name", serde_json::Value::String(strategy));
    }

    if let Some(bin_size) = args.bin_size_override {
        let bin_size: BinSize = bin_size.parse()?;
        info!("Overriding bin size to: {}", bin_size);
        config.backtest.bin_size = bin_size;
    }

    if args.trade_log {
        config.backtest.enable_trade_log = true;
    }

    let candles = data::load_csv(&config.backtest.data_file)?;
    if candles.is_empty() {
        anyhow::bail!("No bars loaded from {}", config.backtest.data_file);
    }

    let mut backtester = Backtester::from_config(config.clone())?;

    info!("Running backtest...");
    let result = backtester.run(&candles)?;

    println!("\n{}", "=".repeat(60));
    println!("BACKTEST RESULTS ({} @ {})", result.strategy, result.bin_size);
    println!("{}", "=".repeat(60));
    if let (Some(start), Some(end)) = (result.start, result.end) {
        println!("Period:             {} .. {}", start, end);
    }
    println!("Bars:               {}", result.bars);
    println!("Initial Balance:    {:.0}", result.initial_balance);
    println!("Final Balance:      {:.0}", result.final_balance);
    println!("Total Return:       {:.2}%", result.total_return);
    println!("Max Drawdown:       {:.2}%", result.max_draw_down);
    println!("Win Rate:           {:.2}%", result.win_rate);
    println!("Profit Factor:      {:.2}", result.profit_factor);
    println!("Orders:             {}", result.stats.order_count);
    println!("Winning Closes:     {}", result.stats.win_count);
    println!("Losing Closes:      {}", result.stats.lose_count);
    println!("Gross Profit:       {:.0}", result.stats.win_profit_sum);
    println!("Gross Loss:         {:.0}", result.stats.lose_loss_sum);
    println!(
        "Final Position:     {} @ {:.2}",
        result.final_position.size, result.final_position.avg_price
    );
    println!("Open Orders:        {}", result.open_orders);
    println!("{}", "=".repeat(60));

    if args.save {
        let path = result.save_json(&config.backtest.results_dir)?;
        println!("Saved result to {}", path.display());
    }

    info!("Backtest completed successfully");

    Ok(())
}
