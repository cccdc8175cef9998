// Pending-order state machine
use crate::models::{PendingOrder, TradeAction};
use crate::settings::TradingSettings;
use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Delay between an execution and the placement of the replacement order.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Lifecycle of the single outstanding order.
#[derive(Debug, Clone)]
pub enum OrderState {
    /// No active strategy.
    Idle,
    /// One order waiting for its target price.
    Pending(PendingOrder),
    /// An order just filled; the replacement is due once the delay elapses.
    Cooldown {
        until: DateTime<Utc>,
        generation: u64,
    },
}

/// Handed to whoever owns the timers when an execution starts a cooldown.
/// The generation must still match at fire time or the callback is void.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownTicket {
    pub generation: u64,
    pub delay: Duration,
}

/// Owns the single outstanding order and decides when it fills.
pub struct OrderEngine {
    state: OrderState,
    /// Bumped on every execution and cancellation, so stale timer callbacks
    /// can be told apart from the cooldown currently in force.
    generation: u64,
    cooldown: Duration,
}

impl OrderEngine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: OrderState::Idle,
            generation: 0,
            cooldown,
        }
    }

    pub fn state(&self) -> &OrderState {
        &self.state
    }

    pub fn pending(&self) -> Option<&PendingOrder> {
        match &self.state {
            OrderState::Pending(order) => Some(order),
            _ => None,
        }
    }

    /// Target price for the next order. A prior buy points the next sell
    /// above the current price; a prior sell points the next buy below it.
    pub fn target_price(settings: &TradingSettings, current_price: f64) -> f64 {
        let rate = settings.rate_percentage / 100.0;
        match settings.last_action {
            TradeAction::Buy => current_price * (1.0 + rate),
            TradeAction::Sell => current_price * (1.0 - rate),
        }
    }

    /// Create and install the next order, taking the side opposite to the
    /// last fill. Replaces whatever state was present.
    pub fn place(&mut self, settings: &TradingSettings, current_price: f64) -> PendingOrder {
        let order = PendingOrder::new(
            &settings.pair,
            settings.last_action.opposite(),
            Self::target_price(settings, current_price),
            settings.amount,
        );
        self.state = OrderState::Pending(order.clone());
        order
    }

    /// Whether `price` satisfies the pending order's fill condition: a buy
    /// fills at or below its target, a sell at or above.
    pub fn condition_met(&self, price: f64) -> bool {
        match &self.state {
            OrderState::Pending(order) => match order.action {
                TradeAction::Buy => price <= order.target_price,
                TradeAction::Sell => price >= order.target_price,
            },
            _ => false,
        }
    }

    /// Consume the pending order for execution and enter cooldown.
    ///
    /// When `order_id` is given it must name the outstanding order; an id
    /// that was already consumed or cancelled no longer matches and the
    /// trigger is dropped, so overlapping checks cannot fill twice.
    pub fn begin_execution(
        &mut self,
        order_id: Option<Uuid>,
    ) -> Option<(PendingOrder, CooldownTicket)> {
        match &self.state {
            OrderState::Pending(order) => {
                if order_id.is_some_and(|id| id != order.id) {
                    return None;
                }
            }
            _ => return None,
        }

        match std::mem::replace(&mut self.state, OrderState::Idle) {
            OrderState::Pending(order) => {
                self.generation += 1;
                let until = Utc::now()
                    + chrono::Duration::from_std(self.cooldown)
                        .unwrap_or_else(|_| chrono::Duration::seconds(10));
                self.state = OrderState::Cooldown {
                    until,
                    generation: self.generation,
                };
                Some((
                    order,
                    CooldownTicket {
                        generation: self.generation,
                        delay: self.cooldown,
                    },
                ))
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Drop the outstanding order, if any, and return to idle. Bumps the
    /// generation so any scheduled cooldown callback is void at fire time.
    pub fn cancel(&mut self) -> Option<PendingOrder> {
        self.generation += 1;
        match std::mem::replace(&mut self.state, OrderState::Idle) {
            OrderState::Pending(order) => Some(order),
            _ => None,
        }
    }

    /// True when `generation` names the cooldown currently in force.
    pub fn cooldown_matches(&self, generation: u64) -> bool {
        matches!(self.state, OrderState::Cooldown { generation: g, .. } if g == generation)
    }

    /// True once the cooldown deadline has passed. Lets the periodic check
    /// place the replacement for executions whose one-shot timer nobody
    /// scheduled.
    pub fn cooldown_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(&self.state, OrderState::Cooldown { until, .. } if now >= *until)
    }
}
