//! Live orchestration of the ADX crossover strategy.
//!
//! The orchestrator owns all position and signal state. Market events arrive
//! on a single-consumer channel and are applied in order; a periodic cycle
//! handles square-off, exits, scanning and admission.

mod config;
mod events;
mod orchestrator;

pub use config::LiveConfig;
pub use events::StrategyEvent;
pub use orchestrator::{OrchestratorSettings, StrategyOrchestrator};
