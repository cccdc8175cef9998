// Engine command surface and wiring
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventBus};
use crate::feed::PriceFeed;
use crate::ledger::Ledger;
use crate::metrics::{Metrics, MetricsAccumulator};
use crate::models::{Balance, PendingOrder, PriceTick, Trade, TradingMode};
use crate::settings::{SettingsStore, SettingsUpdate, TradingSettings};
use chrono::Utc;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::orders::{CooldownTicket, OrderEngine, DEFAULT_COOLDOWN};

/// The simulation engine. Owns the feed, settings, ledger, metrics and the
/// order state machine; every mutation is funneled through the command
/// methods here, and observers consume the query methods and the event
/// stream. Timers live outside (see `SimulationClock`) and call back into
/// the tick entry points.
pub struct TradingSimulator {
    settings: SettingsStore,
    feed: PriceFeed,
    ledger: Ledger,
    metrics: MetricsAccumulator,
    orders: OrderEngine,
    events: EventBus,
}

impl TradingSimulator {
    pub fn new(settings: TradingSettings, initial_balance: Balance) -> Self {
        Self {
            settings: SettingsStore::new(settings),
            feed: PriceFeed::new(),
            ledger: Ledger::new(initial_balance),
            metrics: MetricsAccumulator::new(),
            orders: OrderEngine::new(DEFAULT_COOLDOWN),
            events: EventBus::new(),
        }
    }

    /// Replace the feed, e.g. with a seeded one for reproducible sessions.
    pub fn with_feed(mut self, feed: PriceFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Shorten or lengthen the post-execution cooldown (tests and
    /// accelerated runs).
    pub fn with_cooldown(mut self, cooldown: std::time::Duration) -> Self {
        self.orders = OrderEngine::new(cooldown);
        self
    }

    /// Seed the price feed for the configured pair. Until this has run the
    /// feed has no current price and trading cannot start.
    pub fn seed_feed(&mut self) -> Vec<PriceTick> {
        let pair = self.settings.get().pair.clone();
        let ticks = self.feed.seed(&pair);
        tracing::info!(pair = %pair, points = ticks.len(), "seeded price history");
        if let Some(last) = ticks.last() {
            self.events.publish(EngineEvent::PriceUpdated(last.clone()));
        }
        ticks
    }

    // ------------------------------------------------------------------
    // Query surface
    // ------------------------------------------------------------------

    pub fn settings(&self) -> TradingSettings {
        self.settings.snapshot()
    }

    pub fn current_price(&self) -> Option<f64> {
        self.feed.current_price()
    }

    pub fn price_history(&self) -> Vec<PriceTick> {
        self.feed.history().iter().cloned().collect()
    }

    pub fn pending_order(&self) -> Option<PendingOrder> {
        self.orders.pending().cloned()
    }

    /// Newest-first executed trades.
    pub fn trades(&self) -> Vec<Trade> {
        self.ledger.trades().to_vec()
    }

    pub fn balance(&self) -> Balance {
        self.ledger.balance()
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics.metrics()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Command surface
    // ------------------------------------------------------------------

    /// Validated partial settings merge. A pair change reseeds the feed; a
    /// mode change clears the retained history. Rejections leave every
    /// field untouched and surface the reason as an event.
    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<()> {
        match self.settings.apply(update) {
            Ok(applied) => {
                if applied.pair_changed {
                    self.seed_feed();
                }
                if applied.mode_changed {
                    self.feed.clear_history();
                    let mode = self.settings.get().mode;
                    self.events.publish(EngineEvent::ModeChanged(mode));
                }
                self.events.publish(EngineEvent::SettingsUpdated);
                Ok(())
            }
            Err(err) => {
                self.events.publish(EngineEvent::ValidationFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Flip simulation/live. Refused while trading is active.
    pub fn toggle_mode(&mut self) -> Result<TradingMode> {
        match self.settings.toggle_mode() {
            Ok(mode) => {
                self.feed.clear_history();
                tracing::info!(mode = %mode, "mode switched");
                self.events.publish(EngineEvent::ModeChanged(mode));
                Ok(mode)
            }
            Err(err) => {
                self.events.publish(EngineEvent::ValidationFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Activate the strategy and place the initial order.
    pub fn start_trading(&mut self) -> Result<PendingOrder> {
        if self.settings.get().active {
            let err = EngineError::InvalidState("trading is already active".to_string());
            self.events.publish(EngineEvent::ValidationFailed {
                reason: err.to_string(),
            });
            return Err(err);
        }
        let Some(price) = self.feed.current_price() else {
            let err = EngineError::NoPriceAvailable(self.settings.get().pair.clone());
            self.events.publish(EngineEvent::ValidationFailed {
                reason: err.to_string(),
            });
            return Err(err);
        };

        self.settings.set_active(true);
        let order = self.orders.place(self.settings.get(), price);
        tracing::info!(
            action = %order.action,
            target = order.target_price,
            "trading started, initial order placed"
        );
        self.events.publish(EngineEvent::TradingStarted);
        self.events.publish(EngineEvent::OrderPlaced(order.clone()));
        Ok(order)
    }

    /// Deactivate the strategy and cancel the outstanding order. Calling it
    /// while inactive is a no-op; calling it twice is the same as once.
    pub fn stop_trading(&mut self) {
        if !self.settings.get().active {
            return;
        }
        self.settings.set_active(false);
        if let Some(order) = self.orders.cancel() {
            tracing::info!(action = %order.action, "pending order cancelled");
            self.events.publish(EngineEvent::OrderCancelled(order));
        }
        tracing::info!("trading stopped");
        self.events.publish(EngineEvent::TradingStopped);
    }

    /// Force-execute the outstanding order as if its price condition were
    /// met (manual override for demos). The id must name the current
    /// pending order; anything stale is refused.
    pub fn simulate_target_reached(&mut self, order_id: Uuid) -> Result<Trade> {
        if !self.settings.get().active {
            let err = EngineError::InvalidState("trading is not active".to_string());
            self.events.publish(EngineEvent::ValidationFailed {
                reason: err.to_string(),
            });
            return Err(err);
        }
        match self.execute(Some(order_id)) {
            Some((trade, _ticket)) => Ok(trade),
            None => {
                let err =
                    EngineError::InvalidState(format!("no pending order with id {order_id}"));
                self.events.publish(EngineEvent::ValidationFailed {
                    reason: err.to_string(),
                });
                Err(err)
            }
        }
    }

    // ------------------------------------------------------------------
    // Tick entry points (called by the clock)
    // ------------------------------------------------------------------

    /// Advance the feed by one tick and evaluate the outstanding order
    /// against the new price. The price is applied before the check, so the
    /// evaluation never sees a stale price.
    pub fn on_price_tick(&mut self) -> Option<CooldownTicket> {
        let tick = self.feed.tick()?;
        self.events.publish(EngineEvent::PriceUpdated(tick));
        self.check_pending_order()
    }

    /// Periodic order-condition check, independent of price ticks. Also
    /// installs the replacement order when a cooldown deadline has passed
    /// without its one-shot timer firing.
    pub fn on_check_tick(&mut self) -> Option<CooldownTicket> {
        self.check_pending_order()
    }

    /// A cooldown one-shot fired. The replacement order is installed only
    /// when the generation still matches and trading is still active; a
    /// stop that landed in between makes this a no-op.
    pub fn cooldown_elapsed(&mut self, generation: u64) {
        if !self.settings.get().active {
            return;
        }
        if !self.orders.cooldown_matches(generation) {
            return;
        }
        self.place_next_order();
    }

    fn check_pending_order(&mut self) -> Option<CooldownTicket> {
        if !self.settings.get().active {
            return None;
        }
        if self.orders.cooldown_expired(Utc::now()) {
            self.place_next_order();
            return None;
        }
        let price = self.feed.current_price()?;
        if self.orders.condition_met(price) {
            self.execute(None).map(|(_, ticket)| ticket)
        } else {
            None
        }
    }

    fn execute(&mut self, order_id: Option<Uuid>) -> Option<(Trade, CooldownTicket)> {
        let (order, ticket) = self.orders.begin_execution(order_id)?;
        let trade = Trade::fill(&order, self.settings.get().mode);

        self.ledger.append(trade.clone());
        self.metrics
            .record(&trade, self.settings.get().rate_percentage);
        self.settings.set_last_action(trade.action);

        tracing::info!(
            action = %trade.action,
            price = trade.price,
            total = trade.total,
            "order executed"
        );
        self.events.publish(EngineEvent::OrderExecuted(trade.clone()));

        Some((trade, ticket))
    }

    fn place_next_order(&mut self) {
        let Some(price) = self.feed.current_price() else {
            return;
        };
        let order = self.orders.place(self.settings.get(), price);
        tracing::info!(
            action = %order.action,
            target = order.target_price,
            "next order placed"
        );
        self.events.publish(EngineEvent::OrderPlaced(order));
    }
}
