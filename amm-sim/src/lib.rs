//! Randomized market simulation for the constant-product AMM engine
//!
//! Drives traders and liquidity providers against an [`amm::Exchange`] over an
//! in-memory token ledger, checks the engine's invariants after every step,
//! and reports the outcome as JSON, text and HTML.

pub mod analytics;
pub mod bots;
pub mod config;
pub mod simulation;
pub mod utils;

pub use analytics::report::generate_report;
pub use config::SimulationConfig;
pub use simulation::orchestrator::Orchestrator;
