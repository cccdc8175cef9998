// Engine event stream
use crate::models::{PendingOrder, PriceTick, Trade, TradingMode};
use tokio::sync::broadcast;

/// Semantic notifications emitted by the engine. How they are rendered
/// (log lines, toasts, widgets) is entirely the subscriber's concern.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    PriceUpdated(PriceTick),
    OrderPlaced(PendingOrder),
    OrderExecuted(Trade),
    OrderCancelled(PendingOrder),
    TradingStarted,
    TradingStopped,
    ModeChanged(TradingMode),
    SettingsUpdated,
    ValidationFailed { reason: String },
}

const EVENT_CAPACITY: usize = 256;

/// Broadcast fan-out for engine events. Publishing never blocks and never
/// fails; events are dropped when nobody is listening.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
