// Synthetic price feed
use crate::models::PriceTick;
use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Price movement per tick (0.5%).
const TICK_VOLATILITY: f64 = 0.005;

/// Jitter applied around the base price when seeding history (±10%).
const SEED_JITTER: f64 = 0.10;

/// Points generated by `seed`, spaced one minute apart ending now.
const SEED_POINTS: usize = 20;

/// Retained history window; the oldest tick is evicted first on overflow.
pub const HISTORY_CAPACITY: usize = 100;

/// Reference price for a pair; unknown pairs fall back to the BTC level.
fn base_price(pair: &str) -> f64 {
    match pair {
        "BTCUSDT" => 20_000.0,
        "ETHUSDT" => 1_500.0,
        "BNBUSDT" => 300.0,
        "XRPUSDT" => 0.5,
        "ADAUSDT" => 0.35,
        _ => 20_000.0,
    }
}

/// Generates the synthetic price series and retains a bounded window of it.
pub struct PriceFeed {
    rng: StdRng,
    history: VecDeque<PriceTick>,
    current: Option<f64>,
}

impl PriceFeed {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            history: VecDeque::new(),
            current: None,
        }
    }

    /// Seeded variant for reproducible runs and tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            history: VecDeque::new(),
            current: None,
        }
    }

    /// Regenerate the initial history window for `pair`: jittered points
    /// around the pair's base price. Replaces any prior history and resets
    /// the current price to the newest point.
    pub fn seed(&mut self, pair: &str) -> Vec<PriceTick> {
        let base = base_price(pair);
        let now = Utc::now();

        self.history.clear();
        for i in 0..SEED_POINTS {
            let jitter = self.rng.gen_range(-SEED_JITTER..SEED_JITTER);
            self.history.push_back(PriceTick {
                timestamp: now - Duration::minutes((SEED_POINTS - 1 - i) as i64),
                price: base * (1.0 + jitter),
            });
        }
        self.current = self.history.back().map(|t| t.price);

        self.history.iter().cloned().collect()
    }

    /// Produce the next tick as a bounded random walk from the current
    /// price. No-op while the feed is unseeded.
    pub fn tick(&mut self) -> Option<PriceTick> {
        let prev = self.current?;
        let change = self.rng.gen_range(-TICK_VOLATILITY..TICK_VOLATILITY);
        let tick = PriceTick {
            timestamp: Utc::now(),
            price: prev * (1.0 + change),
        };

        self.history.push_back(tick.clone());
        if self.history.len() > HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.current = Some(tick.price);

        Some(tick)
    }

    pub fn current_price(&self) -> Option<f64> {
        self.current
    }

    pub fn history(&self) -> &VecDeque<PriceTick> {
        &self.history
    }

    /// Drop the retained window but keep the current price; the window
    /// refills from subsequent ticks. Used on mode switches.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}
