//! Simulation loop
//!
//! Periods are processed strictly in index order. Within a period every
//! entity in the scenario's entity set gets a carry-in version, then every
//! applicable event bound to the period is applied in list order, threading
//! the version through. Entities introduced by creation events are buffered
//! and join the run from the next period.

use std::borrow::Cow;
use std::collections::BTreeMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::audit::{AuditLog, AuditRecord, AuditSink};
use crate::config::Scenario;
use crate::error::{SimulationError, ValidationError};
use crate::metrics::SimulationMetrics;
use crate::model::{Entity, EntityId, EntityVersion, Flow, FlowDirection};
use crate::timeline::{CARRIED_BALANCE_KEY, TimePeriod, Timeline};

/// What to do when an established entity has no version in the previous period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryForwardPolicy {
    /// Fail with `MissingCarryForward`
    #[default]
    Strict,
    /// Start again from the entity's initial value and log a warning
    Reinitialize,
}

#[derive(Debug, Clone, Default)]
pub struct Simulator {
    policy: CarryForwardPolicy,
    dynamic_entities: Vec<Entity>,
    /// Period index each dynamic entity joins at
    joins_at: BTreeMap<EntityId, usize>,
    metrics: SimulationMetrics,
}

impl Simulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: CarryForwardPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> CarryForwardPolicy {
        self.policy
    }

    /// Entities materialized by creation events during the run
    pub fn dynamic_entities(&self) -> &[Entity] {
        &self.dynamic_entities
    }

    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Forget dynamic entities and metrics; the policy is kept
    pub fn reset(&mut self) {
        self.dynamic_entities.clear();
        self.joins_at.clear();
        self.metrics = SimulationMetrics::default();
    }

    /// Run every period of `timeline`.
    ///
    /// The timeline must already be laid out (`Scenario::initialize`) and must
    /// not hold results from an earlier run. On error the run stops where it
    /// failed; versions already stored stay in the timeline.
    pub fn play_out(
        &mut self,
        scenario: &mut Scenario,
        timeline: &mut Timeline,
        sink: &mut impl AuditSink,
    ) -> Result<(), SimulationError> {
        if timeline.has_results() {
            return Err(SimulationError::TimelineAlreadyPopulated);
        }
        tracing::debug!(
            scenario = %scenario.name,
            periods = timeline.len(),
            entities = scenario.initial_entities.len(),
            "starting run"
        );
        for index in 0..timeline.len() {
            self.step(scenario, timeline, index, sink)?;
        }
        Ok(())
    }

    /// Process a single period, then merge the entities it created
    pub fn step(
        &mut self,
        scenario: &mut Scenario,
        timeline: &mut Timeline,
        index: usize,
        sink: &mut impl AuditSink,
    ) -> Result<(), SimulationError> {
        let len = timeline.len();
        let (done, rest) = timeline.periods_mut().split_at_mut(index.min(len));
        let Some(period) = rest.first_mut() else {
            return Err(SimulationError::PeriodOutOfRange { index, len });
        };
        let previous = done.last();

        tracing::debug!(period = index, start = %period.start, "processing period");

        let mut created = Vec::new();
        for entity in &scenario.initial_entities {
            let (carry_in, carried) = self.carry_in(entity, index, period, previous)?;
            let mut flows = Vec::new();
            if carried {
                flows.push(carry_flow(&carry_in, index)?);
            }
            let chain =
                self.run_entity(entity, carry_in, period, index, sink, &mut flows, &mut created)?;
            period.store(entity.id.clone(), chain, flows);
        }

        self.metrics.record_period();
        self.merge(scenario, created, index + 1);
        Ok(())
    }

    /// Carry-in version, and whether it was carried from the previous period
    fn carry_in(
        &self,
        entity: &Entity,
        index: usize,
        period: &TimePeriod,
        previous: Option<&TimePeriod>,
    ) -> Result<(EntityVersion, bool), SimulationError> {
        let fresh = || (entity.initial_version(period.start), false);

        if index == 0 {
            return Ok(fresh());
        }
        if let Some(version) = previous.and_then(|p| p.final_version(&entity.id)) {
            return Ok((version.clone(), true));
        }
        if self.joins_at.get(&entity.id) == Some(&index) {
            return Ok(fresh());
        }
        match self.policy {
            CarryForwardPolicy::Strict => Err(SimulationError::MissingCarryForward {
                entity_id: entity.id.clone(),
                period_index: index,
            }),
            CarryForwardPolicy::Reinitialize => {
                tracing::warn!(
                    entity = %entity.id,
                    period = index,
                    "no version to carry forward, reinitializing"
                );
                Ok(fresh())
            }
        }
    }

    /// Thread one entity's version through the period's events.
    /// Returns the chain, carry-in first.
    #[allow(clippy::too_many_arguments)]
    fn run_entity(
        &mut self,
        entity: &Entity,
        carry_in: EntityVersion,
        period: &TimePeriod,
        index: usize,
        sink: &mut impl AuditSink,
        flows: &mut Vec<Flow>,
        created: &mut Vec<Entity>,
    ) -> Result<Vec<EntityVersion>, SimulationError> {
        let mut chain = vec![carry_in];
        for event in period.events().iter().filter(|e| e.applies_to(&entity.id)) {
            let next = {
                let current = &chain[chain.len() - 1];
                match event.apply(current)? {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(next) => {
                        let next = next.stamped(period.start);
                        flows.extend(event.generate_flows(current, &next)?);
                        Some(next)
                    }
                }
            };

            let changed = next.is_some();
            sink.record(AuditRecord {
                event_id: event.id.clone(),
                event_type: event.event_type().to_string(),
                entity_id: entity.id.clone(),
                amount: event.resolved_amount(),
                date: period.start,
                period_index: index,
                changed,
            });
            self.metrics.record_application(&event.id, changed);

            if let Some(next) = next {
                chain.push(next);
            }
            created.extend(event.create_entities());
        }
        Ok(chain)
    }

    fn merge(&mut self, scenario: &mut Scenario, created: Vec<Entity>, joins_at: usize) {
        let mut merged = 0;
        for template in created {
            if scenario.entity(&template.id).is_some() {
                continue;
            }
            let entity = template.clone_as_new();
            tracing::debug!(entity = %entity.id, period = joins_at, "entity created");
            self.joins_at.insert(entity.id.clone(), joins_at);
            self.dynamic_entities.push(entity.clone());
            scenario.initial_entities.push(entity);
            merged += 1;
        }
        if merged > 0 {
            self.metrics.record_created(merged);
        }
    }
}

/// The inter-period link from the previous period's final version.
/// `amount` is unsigned; the signed balance goes in the `balance` metadata.
fn carry_flow(carry_in: &EntityVersion, index: usize) -> Result<Flow, ValidationError> {
    let flow = Flow::new(
        format!("carry:{}:p{index}", carry_in.entity_id),
        carry_in.version_ref(),
        carry_in.version_ref(),
        carry_in.balance.abs(),
        FlowDirection::CarryForward,
        "carry_forward",
        false,
    )?;
    Ok(flow.with_metadata(CARRIED_BALANCE_KEY, carry_in.balance))
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// The scenario as it stood at the end of the run, dynamic entities included
    pub scenario: Scenario,
    pub timeline: Timeline,
    pub audit: AuditLog,
    pub metrics: SimulationMetrics,
    pub dynamic_entities: Vec<Entity>,
}

/// Validate and run a copy of `scenario` with a fresh timeline and audit log
pub fn simulate(scenario: &Scenario) -> Result<SimulationRun, SimulationError> {
    let mut scenario = scenario.clone();
    scenario.incorporate_components();
    scenario.validate()?;

    let mut timeline = Timeline::new();
    scenario.initialize(&mut timeline);

    let mut audit = AuditLog::new();
    let mut simulator = Simulator::new();
    simulator.play_out(&mut scenario, &mut timeline, &mut audit)?;

    Ok(SimulationRun {
        scenario,
        timeline,
        audit,
        metrics: simulator.metrics,
        dynamic_entities: simulator.dynamic_entities,
    })
}

/// Run independent scenarios, each with its own audit log
pub fn simulate_batch(scenarios: &[Scenario]) -> Vec<Result<SimulationRun, SimulationError>> {
    #[cfg(feature = "parallel")]
    let runs = scenarios.par_iter().map(simulate).collect();

    #[cfg(not(feature = "parallel"))]
    let runs = scenarios.iter().map(simulate).collect();

    runs
}
