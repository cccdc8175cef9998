// Derived performance statistics
use crate::models::{Balance, Trade, TradeAction};
use serde::{Deserialize, Serialize};

/// Aggregate session statistics derived from the ledger.
///
/// Profit and ROI are an approximation by construction: every sell fill
/// credits `total × rate / 100` profit and `rate` ROI, regardless of what
/// the preceding buy cost. This mirrors the configured fill spacing rather
/// than mark-to-market P&L.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub total_trades: usize,
    pub successful_trades: usize,
    pub total_profit: f64,
    pub roi: f64,
    /// Percentage of trades counted successful. Reported as 0.0 while no
    /// trades exist (avoids the divide by zero); 100 once any trade fills,
    /// since every simulated fill counts as a success.
    pub win_rate: f64,
}

impl Metrics {
    /// Print a formatted session report to stdout (demo binaries).
    pub fn print_report(&self, balance: Balance) {
        println!("\n╔═══════════════════════════════════════════════╗");
        println!("║            SESSION PERFORMANCE REPORT         ║");
        println!("╚═══════════════════════════════════════════════╝\n");

        println!("📈 TRADES");
        println!("  Total Trades:          {}", self.total_trades);
        println!(
            "  Successful:            {} ({:.1}%)",
            self.successful_trades, self.win_rate
        );

        println!("\n💰 PERFORMANCE");
        println!("  Total Profit:          ${:.2}", self.total_profit);
        println!("  ROI:                   {:.2}%", self.roi);

        println!("\n🏦 BALANCES");
        println!("  Base:                  {:.6}", balance.base);
        println!("  Quote:                 ${:.2}", balance.quote);

        println!("\n═══════════════════════════════════════════════\n");
    }
}

/// Folds executed trades into `Metrics`. Updating after each append is
/// equivalent to recomputing over the full ledger.
pub struct MetricsAccumulator {
    metrics: Metrics,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self {
            metrics: Metrics::default(),
        }
    }

    /// Fold one executed trade in. `rate_percentage` is the configured rate
    /// in force at execution time.
    pub fn record(&mut self, trade: &Trade, rate_percentage: f64) {
        let m = &mut self.metrics;
        m.total_trades += 1;
        m.successful_trades += 1;
        if trade.action == TradeAction::Sell {
            m.total_profit += trade.total * rate_percentage / 100.0;
            m.roi += rate_percentage;
        }
        m.win_rate = m.successful_trades as f64 / m.total_trades as f64 * 100.0;
    }

    pub fn metrics(&self) -> Metrics {
        self.metrics
    }
}

impl Default for MetricsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PendingOrder, TradingMode};

    fn trade(action: TradeAction, price: f64, amount: f64) -> Trade {
        let order = PendingOrder::new("BTCUSDT", action, price, amount);
        Trade::fill(&order, TradingMode::Simulation)
    }

    #[test]
    fn test_zero_trades_convention() {
        let acc = MetricsAccumulator::new();
        let m = acc.metrics();

        assert_eq!(m.total_trades, 0);
        assert_eq!(m.win_rate, 0.0);
        assert_eq!(m.total_profit, 0.0);
        assert_eq!(m.roi, 0.0);
    }

    #[test]
    fn test_buy_counts_but_earns_nothing() {
        let mut acc = MetricsAccumulator::new();
        acc.record(&trade(TradeAction::Buy, 19_700.0, 0.01), 1.5);

        let m = acc.metrics();
        assert_eq!(m.total_trades, 1);
        assert_eq!(m.successful_trades, 1);
        assert_eq!(m.win_rate, 100.0);
        assert_eq!(m.total_profit, 0.0);
        assert_eq!(m.roi, 0.0);
    }

    #[test]
    fn test_sell_credits_rate_fraction() {
        let mut acc = MetricsAccumulator::new();
        // Sell 0.01 @ 20000 -> total 200; profit = 200 * 1.5% = 3
        acc.record(&trade(TradeAction::Sell, 20_000.0, 0.01), 1.5);

        let m = acc.metrics();
        assert!((m.total_profit - 3.0).abs() < 1e-9);
        assert!((m.roi - 1.5).abs() < 1e-9);
        assert_eq!(m.win_rate, 100.0);
    }

    #[test]
    fn test_accumulates_over_session() {
        let mut acc = MetricsAccumulator::new();
        acc.record(&trade(TradeAction::Buy, 19_700.0, 0.01), 1.5);
        acc.record(&trade(TradeAction::Sell, 19_995.55, 0.01), 1.5);
        acc.record(&trade(TradeAction::Buy, 19_695.6, 0.01), 1.5);

        let m = acc.metrics();
        assert_eq!(m.total_trades, 3);
        assert_eq!(m.successful_trades, 3);
        assert_eq!(m.win_rate, 100.0);
        // Only the one sell earned: 199.9555 * 0.015
        assert!((m.total_profit - 2.999_332_5).abs() < 1e-6);
        assert!((m.roi - 1.5).abs() < 1e-9);
    }
}
