use clap::Parser;
use simbot::feed::PriceFeed;
use simbot::models::Balance;
use simbot::settings::{SettingsUpdate, TradingSettings};
use simbot::TradingSimulator;
use std::time::Duration;

/// Headless accelerated session: drives the engine tick by tick instead of
/// waiting on wall-clock timers, then prints the session report.
#[derive(Parser, Debug)]
#[command(name = "fast_forward", about = "Run an accelerated simulated session")]
struct Args {
    /// Number of price ticks to simulate
    #[arg(long, default_value_t = 2000)]
    ticks: usize,

    /// Feed seed for a reproducible session
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Trading pair to simulate
    #[arg(long, default_value = "BTCUSDT")]
    pair: String,

    /// Percent distance between consecutive fills
    #[arg(long, default_value_t = 1.5)]
    rate: f64,

    /// Amount of the base asset per order
    #[arg(long, default_value_t = 0.01)]
    amount: f64,

    /// Print executed trades as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "simbot=warn".to_string()))
        .init();

    let args = Args::parse();

    println!("\n╔═══════════════════════════════════════════════╗");
    println!("║          SIMBOT FAST-FORWARD SESSION          ║");
    println!("╚═══════════════════════════════════════════════╝");
    println!(
        "\n  {} @ {}% rate, {} per order, {} ticks (seed {})\n",
        args.pair, args.rate, args.amount, args.ticks, args.seed
    );

    let settings = TradingSettings {
        pair: args.pair.clone(),
        ..Default::default()
    };
    let mut sim = TradingSimulator::new(
        settings,
        Balance {
            base: 1.0,
            quote: 20_000.0,
        },
    )
    .with_feed(PriceFeed::with_seed(args.seed))
    .with_cooldown(Duration::ZERO);

    sim.seed_feed();
    sim.update_settings(SettingsUpdate {
        rate_percentage: Some(args.rate),
        amount: Some(args.amount),
        ..Default::default()
    })?;
    sim.start_trading()?;

    for _ in 0..args.ticks {
        if let Some(ticket) = sim.on_price_tick() {
            // Skip the wait: in fast-forward the cooldown elapses immediately
            sim.cooldown_elapsed(ticket.generation);
        }
    }
    sim.stop_trading();

    if args.json {
        for trade in sim.trades() {
            println!("{}", serde_json::to_string(&trade)?);
        }
    }

    sim.metrics().print_report(sim.balance());
    Ok(())
}
