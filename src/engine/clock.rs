// Timer ownership for the simulation
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

use super::orders::CooldownTicket;
use super::simulator::TradingSimulator;

/// Interval between synthetic price ticks.
pub const PRICE_TICK_INTERVAL: Duration = Duration::from_secs(3);

/// Interval between periodic order-condition checks.
pub const ORDER_CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// Owns every timer the simulation uses: the periodic price-tick and
/// order-check tasks plus the one-shot cooldown timers spawned when an
/// execution reports a ticket. The periodic tasks run for the process
/// lifetime of the simulation regardless of the trading flag (the price
/// keeps moving while trading is stopped); the engine itself ignores order
/// work while inactive.
pub struct SimulationClock {
    price_interval: Duration,
    check_interval: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl SimulationClock {
    pub fn new() -> Self {
        Self::with_intervals(PRICE_TICK_INTERVAL, ORDER_CHECK_INTERVAL)
    }

    /// Custom intervals; tests run at millisecond scale.
    pub fn with_intervals(price_interval: Duration, check_interval: Duration) -> Self {
        Self {
            price_interval,
            check_interval,
            tasks: Vec::new(),
        }
    }

    /// Spawn the periodic tasks against a shared simulator.
    pub fn start(&mut self, sim: Arc<Mutex<TradingSimulator>>) {
        tracing::info!(
            price_interval = ?self.price_interval,
            check_interval = ?self.check_interval,
            "simulation clock starting"
        );

        let price_task = {
            let sim = sim.clone();
            let interval = self.price_interval;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let ticket = sim.lock().unwrap().on_price_tick();
                    if let Some(ticket) = ticket {
                        schedule_cooldown(sim.clone(), ticket);
                    }
                }
            })
        };

        let check_task = {
            let sim = sim.clone();
            let interval = self.check_interval;
            tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                loop {
                    ticker.tick().await;
                    let ticket = sim.lock().unwrap().on_check_tick();
                    if let Some(ticket) = ticket {
                        schedule_cooldown(sim.clone(), ticket);
                    }
                }
            })
        };

        self.tasks.push(price_task);
        self.tasks.push(check_task);
    }

    /// Tear all timers down.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SimulationClock {
    fn drop(&mut self) {
        self.stop();
    }
}

/// One-shot cooldown timer. The engine re-checks the active flag and the
/// generation at fire time, so a stop that lands in between makes the
/// callback a no-op; the timer itself never needs explicit cancellation.
fn schedule_cooldown(sim: Arc<Mutex<TradingSimulator>>, ticket: CooldownTicket) {
    tokio::spawn(async move {
        sleep(ticket.delay).await;
        sim.lock().unwrap().cooldown_elapsed(ticket.generation);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::PriceFeed;
    use crate::models::Balance;
    use crate::settings::{SettingsUpdate, TradingSettings};
    use tokio::time::timeout;

    fn shared_sim(seed: u64, cooldown: Duration) -> Arc<Mutex<TradingSimulator>> {
        let mut sim = TradingSimulator::new(
            TradingSettings::default(),
            Balance {
                base: 1.0,
                quote: 20_000.0,
            },
        )
        .with_feed(PriceFeed::with_seed(seed))
        .with_cooldown(cooldown);
        sim.seed_feed();
        Arc::new(Mutex::new(sim))
    }

    async fn wait_until<F: Fn() -> bool>(limit: Duration, cond: F) -> bool {
        timeout(limit, async {
            loop {
                if cond() {
                    return;
                }
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .is_ok()
    }

    #[tokio::test]
    async fn test_price_keeps_moving_while_inactive() {
        let sim = shared_sim(42, Duration::from_millis(20));
        let mut clock = SimulationClock::with_intervals(
            Duration::from_millis(10),
            Duration::from_millis(15),
        );
        clock.start(sim.clone());

        let grown = wait_until(Duration::from_secs(2), || {
            sim.lock().unwrap().price_history().len() > 25
        })
        .await;

        assert!(grown, "price history did not grow");
        assert!(!sim.lock().unwrap().settings().active);
        assert!(sim.lock().unwrap().trades().is_empty());
        clock.stop();
        assert!(!clock.is_running());
    }

    #[tokio::test]
    async fn test_clock_drives_executions_and_cooldowns() {
        let sim = shared_sim(7, Duration::from_millis(20));
        // A hair-thin rate so the walk crosses the target within a few ticks
        sim.lock()
            .unwrap()
            .update_settings(SettingsUpdate {
                rate_percentage: Some(0.05),
                ..Default::default()
            })
            .unwrap();
        sim.lock().unwrap().start_trading().unwrap();

        let mut clock = SimulationClock::with_intervals(
            Duration::from_millis(10),
            Duration::from_millis(15),
        );
        clock.start(sim.clone());

        // Two fills prove the whole chain: fill -> cooldown -> replacement
        // order -> opposite fill
        let filled_twice = wait_until(Duration::from_secs(10), || {
            sim.lock().unwrap().trades().len() >= 2
        })
        .await;
        assert!(filled_twice, "expected at least two fills");

        clock.stop();

        let trades = sim.lock().unwrap().trades();
        // Newest first, strictly alternating
        for pair in trades.windows(2) {
            assert_eq!(pair[0].action, pair[1].action.opposite());
        }
        assert!(sim.lock().unwrap().price_history().len() <= 100);
    }

    #[tokio::test]
    async fn test_stop_trading_voids_inflight_cooldown() {
        let sim = shared_sim(11, Duration::from_millis(50));

        let mut clock = SimulationClock::with_intervals(
            Duration::from_millis(10),
            Duration::from_millis(15),
        );
        clock.start(sim.clone());

        // Start, force a fill and stop in one lock scope, so the stop lands
        // before the 50ms cooldown can elapse
        {
            let mut s = sim.lock().unwrap();
            let order = s.start_trading().unwrap();
            s.simulate_target_reached(order.id).unwrap();
            s.stop_trading();
        }

        sleep(Duration::from_millis(200)).await;
        clock.stop();

        let s = sim.lock().unwrap();
        assert!(s.pending_order().is_none(), "cooldown fired after stop");
        assert!(!s.settings().active);
        assert_eq!(s.trades().len(), 1);
    }

    #[tokio::test]
    async fn test_check_tick_recovers_unscheduled_cooldown() {
        let sim = shared_sim(13, Duration::from_millis(10));
        sim.lock().unwrap().start_trading().unwrap();

        let mut clock = SimulationClock::with_intervals(
            // Price interval far in the future: only the check task runs
            Duration::from_secs(3600),
            Duration::from_millis(15),
        );
        clock.start(sim.clone());

        // A forced execution has no one-shot scheduled for it; the periodic
        // check must observe the expired deadline and place the replacement
        let order = sim.lock().unwrap().pending_order().unwrap();
        sim.lock().unwrap().simulate_target_reached(order.id).unwrap();

        let replaced = wait_until(Duration::from_secs(2), || {
            sim.lock().unwrap().pending_order().is_some()
        })
        .await;
        assert!(replaced, "replacement order was never placed");

        let next = sim.lock().unwrap().pending_order().unwrap();
        assert_eq!(next.action, order.action.opposite());
        clock.stop();
    }
}
