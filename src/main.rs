use clap::Parser;
use simbot::engine::SimulationClock;
use simbot::events::EngineEvent;
use simbot::feed::PriceFeed;
use simbot::models::{Balance, TradingMode};
use simbot::settings::{SettingsUpdate, TradingSettings};
use simbot::TradingSimulator;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tokio::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "simbot", about = "Buy-low/sell-high trading simulator")]
struct Args {
    /// Trading pair to simulate
    #[arg(long, default_value = "BTCUSDT")]
    pair: String,

    /// Percent distance between consecutive fills
    #[arg(long, default_value_t = 1.5)]
    rate: f64,

    /// Amount of the base asset per order
    #[arg(long, default_value_t = 0.01)]
    amount: f64,

    /// Stop after this many seconds (runs until Ctrl+C when omitted)
    #[arg(long)]
    run_secs: Option<u64>,

    /// Seed the synthetic feed for a reproducible session
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    setup_logging();

    let args = Args::parse();
    tracing::info!(
        "🚀 simbot starting - {} @ {}% rate, {} per order",
        args.pair,
        args.rate,
        args.amount
    );

    let settings = TradingSettings {
        pair: args.pair.clone(),
        ..Default::default()
    };
    let feed = match args.seed {
        Some(seed) => PriceFeed::with_seed(seed),
        None => PriceFeed::new(),
    };

    let mut sim =
        TradingSimulator::new(settings, initial_balance_from_env()).with_feed(feed);
    sim.seed_feed();
    sim.update_settings(SettingsUpdate {
        rate_percentage: Some(args.rate),
        amount: Some(args.amount),
        ..Default::default()
    })?;

    let events = sim.subscribe();
    let sim = Arc::new(Mutex::new(sim));

    // The notifier is the only place that decides how engine events look;
    // the engine itself just publishes them.
    let notifier = {
        let sim = sim.clone();
        tokio::spawn(async move {
            notifier_loop(events, sim).await;
        })
    };

    let mut clock = SimulationClock::new();
    clock.start(sim.clone());

    sim.lock().unwrap().start_trading()?;

    match args.run_secs {
        Some(secs) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("⚠️  Received Ctrl+C, shutting down...");
                }
                _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                    tracing::info!("⏱️  Run time elapsed, shutting down...");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c().await?;
            tracing::info!("⚠️  Received Ctrl+C, shutting down...");
        }
    }

    let (metrics, balance) = {
        let mut s = sim.lock().unwrap();
        s.stop_trading();
        (s.metrics(), s.balance())
    };
    clock.stop();
    notifier.abort();

    tracing::info!("\n📊 Session summary:");
    tracing::info!(
        "  Trades: {} (win rate {:.1}%)",
        metrics.total_trades,
        metrics.win_rate
    );
    tracing::info!(
        "  Profit: ${:.2} (ROI {:.2}%)",
        metrics.total_profit,
        metrics.roi
    );
    tracing::info!(
        "  Balance: {:.6} base / ${:.2} quote",
        balance.base,
        balance.quote
    );
    tracing::info!("👋 simbot stopped");
    Ok(())
}

fn setup_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "simbot=info".to_string()),
        )
        .init();
}

fn initial_balance_from_env() -> Balance {
    let base = std::env::var("SIMBOT_BASE_BALANCE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(1.0);
    let quote = std::env::var("SIMBOT_QUOTE_BALANCE")
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(20_000.0);
    Balance { base, quote }
}

async fn notifier_loop(
    mut events: broadcast::Receiver<EngineEvent>,
    sim: Arc<Mutex<TradingSimulator>>,
) {
    loop {
        match events.recv().await {
            Ok(event) => render_event(event, &sim),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!("notifier lagged, {} events dropped", missed);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn render_event(event: EngineEvent, sim: &Arc<Mutex<TradingSimulator>>) {
    match event {
        EngineEvent::PriceUpdated(tick) => {
            // Percent-to-target is a display concern, computed here from
            // engine snapshots rather than inside the engine
            let pending = sim.lock().unwrap().pending_order();
            match pending {
                Some(order) => {
                    let distance = (order.target_price - tick.price) / tick.price * 100.0;
                    tracing::debug!(
                        "💹 ${:.2} ({:+.2}% to {} target)",
                        tick.price,
                        distance,
                        order.action
                    );
                }
                None => tracing::debug!("💹 ${:.2}", tick.price),
            }
        }
        EngineEvent::OrderPlaced(order) => {
            tracing::info!(
                "📌 {} order placed at target ${:.2}",
                order.action.to_string().to_uppercase(),
                order.target_price
            );
        }
        EngineEvent::OrderExecuted(trade) => {
            tracing::info!(
                "✅ {} executed @ ${:.2} (total ${:.2})",
                trade.action.to_string().to_uppercase(),
                trade.price,
                trade.total
            );
        }
        EngineEvent::OrderCancelled(order) => {
            tracing::info!(
                "🛑 Pending {} order cancelled",
                order.action.to_string().to_uppercase()
            );
        }
        EngineEvent::TradingStarted => tracing::info!("▶️  Trading started"),
        EngineEvent::TradingStopped => tracing::info!("⏹️  Trading stopped"),
        EngineEvent::ModeChanged(mode) => {
            tracing::info!("🔀 Switched to {} mode", mode);
            if mode == TradingMode::Live {
                tracing::info!("ℹ️  Live mode is simulated for this demo");
            }
        }
        EngineEvent::SettingsUpdated => tracing::info!("⚙️  Settings updated"),
        EngineEvent::ValidationFailed { reason } => tracing::warn!("❌ {}", reason),
    }
}
