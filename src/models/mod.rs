use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Simulation vs live. Live is accepted by the engine but behaves exactly
/// like simulation; there is no exchange behind it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradingMode {
    Simulation,
    Live,
}

impl TradingMode {
    pub fn toggled(self) -> Self {
        match self {
            TradingMode::Simulation => TradingMode::Live,
            TradingMode::Live => TradingMode::Simulation,
        }
    }
}

impl std::fmt::Display for TradingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradingMode::Simulation => write!(f, "simulation"),
            TradingMode::Live => write!(f, "live"),
        }
    }
}

/// Side of a trade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl TradeAction {
    /// The strategy alternates: every fill flips the side of the next order.
    pub fn opposite(self) -> Self {
        match self {
            TradeAction::Buy => TradeAction::Sell,
            TradeAction::Sell => TradeAction::Buy,
        }
    }
}

impl std::fmt::Display for TradeAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeAction::Buy => write!(f, "buy"),
            TradeAction::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Failed,
}

/// Price at a specific point in time. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceTick {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// The single outstanding order waiting for its target price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub pair: String,
    pub action: TradeAction,
    pub target_price: f64,
    pub amount: f64,
    pub status: OrderStatus,
}

impl PendingOrder {
    pub fn new(pair: &str, action: TradeAction, target_price: f64, amount: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            pair: pair.to_string(),
            action,
            target_price,
            amount,
            status: OrderStatus::Pending,
        }
    }
}

/// An executed trade. Immutable once appended to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub pair: String,
    pub action: TradeAction,
    pub price: f64,
    pub amount: f64,
    pub total: f64,
    pub status: OrderStatus,
    pub mode: TradingMode,
}

impl Trade {
    /// Build the completed trade for an order filling at its target price.
    /// The fill price is the order's target, not the live price.
    pub fn fill(order: &PendingOrder, mode: TradingMode) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            pair: order.pair.clone(),
            action: order.action,
            price: order.target_price,
            amount: order.amount,
            total: order.target_price * order.amount,
            status: OrderStatus::Completed,
            mode,
        }
    }
}

/// Holdings of the traded asset (base) and the settlement currency (quote).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Balance {
    pub base: f64,
    pub quote: f64,
}
