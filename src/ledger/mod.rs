// Trade ledger and balances
use crate::models::{Balance, Trade, TradeAction};

/// Append-only record of executed trades plus the balances they move.
/// Trades are kept newest first; balances change only here, in lock-step
/// with each append.
pub struct Ledger {
    trades: Vec<Trade>,
    balance: Balance,
}

impl Ledger {
    pub fn new(initial_balance: Balance) -> Self {
        Self {
            trades: Vec::new(),
            balance: initial_balance,
        }
    }

    /// Record an executed trade and apply its balance delta in the same
    /// step: a buy adds the amount to base and pays the total from quote,
    /// a sell is the inverse.
    pub fn append(&mut self, trade: Trade) {
        match trade.action {
            TradeAction::Buy => {
                self.balance.base += trade.amount;
                self.balance.quote -= trade.total;
            }
            TradeAction::Sell => {
                self.balance.base -= trade.amount;
                self.balance.quote += trade.total;
            }
        }
        self.trades.insert(0, trade);
    }

    /// Newest-first view of all executed trades.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn balance(&self) -> Balance {
        self.balance
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }
}
