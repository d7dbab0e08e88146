//! Period-based financial ledger simulation library
//!
//! This crate models how financial entities (accounts, liabilities,
//! investments, income and expense trackers) evolve across discrete time
//! periods under scheduled events. It supports:
//! - Immutable, sequence-numbered entity versions forming an audit trail
//! - A closed set of event variants (recurring, conditional, calculation, creation)
//! - Period/timeline progression with carry-forward of entity state
//! - Dynamic entities materialized by events during a run
//! - A structured audit stream injected per run
//! - UK income tax, National Insurance and capital gains tax calculations
//!
//! # Builder DSL
//!
//! ```ignore
//! use ratrace_core::config::ScenarioBuilder;
//! use ratrace_core::model::{Entity, Event};
//!
//! let scenario = ScenarioBuilder::new()
//!     .start(2025, 1, 1)
//!     .periods(12)
//!     .entity(Entity::new("savings", "Savings Account"))
//!     .event_for("savings", Event::recurring("deposit", 5_000.0).every_period())
//!     .build();
//!
//! let run = ratrace_core::simulation::simulate(&scenario)?;
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod apply;
pub mod audit;
pub mod error;
pub mod finance_model;
pub mod metrics;
pub mod simulation;
pub mod taxes;
pub mod timeline;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod config;
pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use audit::{AuditLog, AuditRecord, AuditSink, TracingSink};
pub use config::{Component, Scenario, ScenarioBuilder};
pub use error::{SimulationError, ValidationError};
pub use finance_model::{FinanceModel, ModelDump};
pub use metrics::SimulationMetrics;
pub use simulation::{CarryForwardPolicy, SimulationRun, Simulator, simulate, simulate_batch};
pub use timeline::{PeriodEntityAggregate, PeriodLength, TimePeriod, Timeline};
