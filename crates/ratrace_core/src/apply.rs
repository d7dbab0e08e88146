//! Apply events to entity versions
//!
//! Every event exposes three operations:
//! - `apply` derives the next version from the current one. It never mutates
//!   its input. A logical no-op returns the input itself (`Cow::Borrowed`),
//!   which callers use to detect that nothing changed.
//! - `generate_flows` describes the money movement between two versions.
//! - `create_entities` lists entities the event introduces into the run.

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;

use crate::error::{SimulationError, ValidationError};
use crate::model::{
    CalculationRule, Entity, EntityVersion, Event, EventKind, Flow, FlowDirection,
};

impl Event {
    /// Derive the next version of an entity from `from`.
    pub fn apply<'a>(
        &self,
        from: &'a EntityVersion,
    ) -> Result<Cow<'a, EntityVersion>, SimulationError> {
        match &self.kind {
            EventKind::Recurring(params) => self.credit(from, params.amount).map(Cow::Owned),
            EventKind::Conditional(params) => {
                if params.condition.evaluate(from.balance) {
                    self.credit(from, params.amount).map(Cow::Owned)
                } else {
                    Ok(Cow::Borrowed(from))
                }
            }
            EventKind::Calculation(rule) => Ok(Cow::Owned(calculate(rule, from))),
            EventKind::Creation(_) => Ok(Cow::Borrowed(from)),
        }
    }

    /// Flows implied by moving from `from` to `to`: one inflow or outflow
    /// for a non-zero balance change, nothing otherwise.
    pub fn generate_flows(
        &self,
        from: &EntityVersion,
        to: &EntityVersion,
    ) -> Result<Vec<Flow>, ValidationError> {
        let delta = to.balance - from.balance;
        if delta == 0.0 {
            return Ok(Vec::new());
        }

        let direction = if delta > 0.0 {
            FlowDirection::Inflow
        } else {
            FlowDirection::Outflow
        };
        let flow = Flow::new(
            format!("{}:{}:{}", self.id, to.entity_id, to.sequence),
            from.version_ref(),
            to.version_ref(),
            delta.abs(),
            direction,
            self.event_type(),
            true,
        )?
        .with_metadata("event_id", self.id.as_str())
        .with_metadata("variant", self.kind.name());

        Ok(vec![flow])
    }

    /// Entity templates this event materializes
    pub fn create_entities(&self) -> Vec<Entity> {
        match &self.kind {
            EventKind::Creation(params) => params.entities.clone(),
            _ => Vec::new(),
        }
    }

    fn credit(&self, from: &EntityVersion, amount: f64) -> Result<EntityVersion, SimulationError> {
        if amount < 0.0 && from.balance + amount < 0.0 {
            return Err(SimulationError::InsufficientFunds {
                entity_id: from.entity_id.clone(),
                event_id: self.id.clone(),
                balance: from.balance,
                required: amount.abs(),
            });
        }
        Ok(from.derive_next(from.balance + amount, from.rate))
    }
}

fn calculate(rule: &CalculationRule, from: &EntityVersion) -> EntityVersion {
    match *rule {
        CalculationRule::RateThreshold {
            threshold,
            above_rate,
            at_or_below_rate,
        } => {
            let rate = if from.balance > threshold {
                above_rate
            } else {
                at_or_below_rate
            };
            from.derive_next(from.balance, rate)
        }
        CalculationRule::InvestmentReturns {
            expected_return,
            volatility,
            inflation_affected,
            inflation_rate,
            seed,
        } => {
            let balance = from.balance;
            let mut rng = StdRng::seed_from_u64(version_seed(seed, from));
            let random_factor = 1.0 + (rng.random::<f64>() - 0.5) * volatility;

            let mut period_return = balance * expected_return * random_factor;
            if inflation_affected {
                period_return -= balance * inflation_rate;
            }

            let rate = if balance != 0.0 {
                period_return / balance
            } else {
                0.0
            };
            from.derive_next(balance + period_return, rate)
        }
    }
}

/// Seed derived from the event seed and the identity of the input version,
/// so the same input always draws the same factor.
fn version_seed(seed: u64, from: &EntityVersion) -> u64 {
    let mut hasher = FxHasher::default();
    seed.hash(&mut hasher);
    from.entity_id.hash(&mut hasher);
    from.sequence.hash(&mut hasher);
    hasher.finish()
}
