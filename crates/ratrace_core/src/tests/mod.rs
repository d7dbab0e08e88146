//! Scenario-level tests for the ledger simulator
//!
//! Tests are organized by topic:
//! - `simulation` - period loop, carry-forward, event ordering, failures
//! - `dynamic_entities` - creation events and buffered merging
//! - `flows` - flow aggregation against the version chain
//! - `components` - scenarios built from rental and portfolio components
//! - `finance_model` - facade queries, dump and reset
//! - `round_trip` - serde round trips of scenarios

mod components;
mod dynamic_entities;
mod finance_model;
mod round_trip;

use crate::config::{Scenario, ScenarioBuilder};
use crate::model::{Entity, Event};

/// One account with one recurring event in every period
fn savings_scenario(periods: usize, opening: f64, amount: f64) -> Scenario {
    ScenarioBuilder::new()
        .name("Savings")
        .periods(periods)
        .entity(Entity::new("savings", "Savings Account").with_initial_value(opening))
        .event_for(
            "savings",
            Event::recurring("deposit", amount).labeled("deposit").every_period(),
        )
        .build()
}
