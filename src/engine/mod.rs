// Simulation engine: order state machine, command surface, timers
pub mod clock;
pub mod orders;
pub mod simulator;

pub use clock::{SimulationClock, ORDER_CHECK_INTERVAL, PRICE_TICK_INTERVAL};
pub use orders::{CooldownTicket, OrderEngine, OrderState, DEFAULT_COOLDOWN};
pub use simulator::TradingSimulator;
