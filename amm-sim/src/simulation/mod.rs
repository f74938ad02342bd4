//! Simulation modules

pub mod orchestrator;
pub mod pool_state;

pub use orchestrator::{Orchestrator, PoolSummary, SimulationResults, SimulationSummary};
pub use pool_state::{PoolSnapshot, PoolTracker};
