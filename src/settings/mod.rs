// Strategy configuration store
use crate::error::{EngineError, Result};
use crate::models::{TradeAction, TradingMode};
use serde::{Deserialize, Serialize};

/// Strategy configuration plus the trading activity flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingSettings {
    pub mode: TradingMode,
    pub pair: String,
    /// Percent distance between consecutive fills.
    pub rate_percentage: f64,
    /// Amount of the base asset per order.
    pub amount: f64,
    /// Side of the most recent fill; the next order takes the opposite side.
    pub last_action: TradeAction,
    pub active: bool,
}

impl Default for TradingSettings {
    fn default() -> Self {
        Self {
            mode: TradingMode::Simulation,
            pair: "BTCUSDT".to_string(),
            rate_percentage: 1.5,
            amount: 0.01,
            last_action: TradeAction::Sell, // first order buys
            active: false,
        }
    }
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub mode: Option<TradingMode>,
    pub pair: Option<String>,
    pub rate_percentage: Option<f64>,
    pub amount: Option<f64>,
    pub last_action: Option<TradeAction>,
}

/// Which observable fields an accepted update actually changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppliedUpdate {
    pub pair_changed: bool,
    pub mode_changed: bool,
}

/// Owns the settings; every mutation passes validation here first.
pub struct SettingsStore {
    settings: TradingSettings,
}

impl SettingsStore {
    pub fn new(settings: TradingSettings) -> Self {
        Self { settings }
    }

    pub fn get(&self) -> &TradingSettings {
        &self.settings
    }

    pub fn snapshot(&self) -> TradingSettings {
        self.settings.clone()
    }

    /// Validate and merge a partial update. A rejected update leaves the
    /// settings exactly as they were.
    pub fn apply(&mut self, update: SettingsUpdate) -> Result<AppliedUpdate> {
        if let Some(rate) = update.rate_percentage {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(EngineError::Validation(format!(
                    "rate percentage must be positive, got {rate}"
                )));
            }
        }
        if let Some(amount) = update.amount {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(EngineError::Validation(format!(
                    "amount must be positive, got {amount}"
                )));
            }
        }

        let pair_changed = update
            .pair
            .as_deref()
            .is_some_and(|p| p != self.settings.pair);
        let mode_changed = update.mode.is_some_and(|m| m != self.settings.mode);

        if self.settings.active && mode_changed {
            return Err(EngineError::InvalidState(
                "stop trading before switching modes".to_string(),
            ));
        }
        if self.settings.active && pair_changed {
            return Err(EngineError::InvalidState(
                "stop trading before changing the pair".to_string(),
            ));
        }

        if let Some(mode) = update.mode {
            self.settings.mode = mode;
        }
        if let Some(pair) = update.pair {
            self.settings.pair = pair;
        }
        if let Some(rate) = update.rate_percentage {
            self.settings.rate_percentage = rate;
        }
        if let Some(amount) = update.amount {
            self.settings.amount = amount;
        }
        if let Some(action) = update.last_action {
            self.settings.last_action = action;
        }

        Ok(AppliedUpdate {
            pair_changed,
            mode_changed,
        })
    }

    /// Flip simulation/live. Refused while trading is active.
    pub fn toggle_mode(&mut self) -> Result<TradingMode> {
        if self.settings.active {
            return Err(EngineError::InvalidState(
                "stop trading before switching modes".to_string(),
            ));
        }
        self.settings.mode = self.settings.mode.toggled();
        Ok(self.settings.mode)
    }

    pub fn set_active(&mut self, active: bool) {
        self.settings.active = active;
    }

    pub fn set_last_action(&mut self, action: TradeAction) {
        self.settings.last_action = action;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = TradingSettings::default();
        assert_eq!(settings.mode, TradingMode::Simulation);
        assert_eq!(settings.pair, "BTCUSDT");
        assert_eq!(settings.rate_percentage, 1.5);
        assert_eq!(settings.amount, 0.01);
        assert_eq!(settings.last_action, TradeAction::Sell);
        assert!(!settings.active);
    }

    #[test]
    fn test_rejects_nonpositive_rate() {
        let mut store = SettingsStore::new(TradingSettings::default());

        let result = store.apply(SettingsUpdate {
            rate_percentage: Some(-1.0),
            ..Default::default()
        });

        assert!(matches!(result, Err(EngineError::Validation(_))));
        // Prior settings retained
        assert_eq!(store.get().rate_percentage, 1.5);
    }

    #[test]
    fn test_rejects_nonpositive_amount() {
        let mut store = SettingsStore::new(TradingSettings::default());

        let result = store.apply(SettingsUpdate {
            amount: Some(0.0),
            ..Default::default()
        });

        assert!(matches!(result, Err(EngineError::Validation(_))));
        assert_eq!(store.get().amount, 0.01);
    }

    #[test]
    fn test_rejected_update_merges_nothing() {
        let mut store = SettingsStore::new(TradingSettings::default());

        // Valid pair bundled with an invalid amount: the whole update is
        // rejected, not partially applied
        let result = store.apply(SettingsUpdate {
            pair: Some("ETHUSDT".to_string()),
            amount: Some(-5.0),
            ..Default::default()
        });

        assert!(result.is_err());
        assert_eq!(store.get().pair, "BTCUSDT");
    }

    #[test]
    fn test_mode_change_blocked_while_active() {
        let mut store = SettingsStore::new(TradingSettings::default());
        store.set_active(true);

        let result = store.apply(SettingsUpdate {
            mode: Some(TradingMode::Live),
            ..Default::default()
        });
        assert!(matches!(result, Err(EngineError::InvalidState(_))));

        let result = store.toggle_mode();
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
        assert_eq!(store.get().mode, TradingMode::Simulation);
    }

    #[test]
    fn test_pair_change_blocked_while_active() {
        let mut store = SettingsStore::new(TradingSettings::default());
        store.set_active(true);

        let result = store.apply(SettingsUpdate {
            pair: Some("ETHUSDT".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
        assert_eq!(store.get().pair, "BTCUSDT");
    }

    #[test]
    fn test_rate_change_allowed_while_active() {
        let mut store = SettingsStore::new(TradingSettings::default());
        store.set_active(true);

        let applied = store
            .apply(SettingsUpdate {
                rate_percentage: Some(2.0),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(applied, AppliedUpdate::default());
        assert_eq!(store.get().rate_percentage, 2.0);
    }

    #[test]
    fn test_pair_change_reported() {
        let mut store = SettingsStore::new(TradingSettings::default());

        let applied = store
            .apply(SettingsUpdate {
                pair: Some("ADAUSDT".to_string()),
                ..Default::default()
            })
            .unwrap();

        assert!(applied.pair_changed);
        assert!(!applied.mode_changed);
        assert_eq!(store.get().pair, "ADAUSDT");

        // Re-applying the same pair is not a change
        let applied = store
            .apply(SettingsUpdate {
                pair: Some("ADAUSDT".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert!(!applied.pair_changed);
    }

    #[test]
    fn test_toggle_mode_when_inactive() {
        let mut store = SettingsStore::new(TradingSettings::default());
        assert_eq!(store.toggle_mode().unwrap(), TradingMode::Live);
        assert_eq!(store.toggle_mode().unwrap(), TradingMode::Simulation);
    }
}
