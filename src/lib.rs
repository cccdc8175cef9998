// Core modules
pub mod engine;
pub mod error;
pub mod events;
pub mod feed;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod settings;

// Re-export commonly used types
pub use engine::{SimulationClock, TradingSimulator};
pub use error::{EngineError, Result};
pub use events::EngineEvent;
pub use models::*;
