//! Finance model facade
//!
//! Owns a scenario, its timeline, the simulator and the run's audit log,
//! and answers queries once the run is done.

use std::fmt;

use jiff::civil::Date;
use serde::Serialize;

use crate::audit::AuditLog;
use crate::config::Scenario;
use crate::error::SimulationError;
use crate::metrics::SimulationMetrics;
use crate::model::{Entity, EntityCategory, EntityId};
use crate::simulation::{CarryForwardPolicy, Simulator};
use crate::timeline::{PeriodEntityAggregate, Timeline};

#[derive(Debug, Clone)]
pub struct FinanceModel {
    scenario: Scenario,
    timeline: Timeline,
    simulator: Simulator,
    audit: AuditLog,
}

impl FinanceModel {
    pub fn new(scenario: Scenario) -> Self {
        Self::with_policy(scenario, CarryForwardPolicy::default())
    }

    pub fn with_policy(scenario: Scenario, policy: CarryForwardPolicy) -> Self {
        Self {
            scenario,
            timeline: Timeline::new(),
            simulator: Simulator::with_policy(policy),
            audit: AuditLog::new(),
        }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Incorporate components, validate, lay out the timeline if needed and
    /// play it out. Fails if the timeline already holds results.
    ///
    /// Audit records and metrics left by a run that failed before storing
    /// anything are discarded first.
    pub fn run_simulation(&mut self) -> Result<(), SimulationError> {
        if self.timeline.has_results() {
            return Err(SimulationError::TimelineAlreadyPopulated);
        }
        self.reset();
        self.scenario.incorporate_components();
        self.scenario.validate()?;
        if self.timeline.is_empty() {
            self.scenario.initialize(&mut self.timeline);
        }
        self.simulator
            .play_out(&mut self.scenario, &mut self.timeline, &mut self.audit)
    }

    /// Clear results so the scenario can be run again. Entities created
    /// during the run are removed from the scenario.
    pub fn reset(&mut self) {
        let dynamic: Vec<EntityId> = self
            .simulator
            .dynamic_entities()
            .iter()
            .map(|e| e.id.clone())
            .collect();
        self.scenario
            .initial_entities
            .retain(|e| !dynamic.contains(&e.id));
        self.timeline.reset();
        self.audit.clear();
        self.simulator.reset();
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn dynamic_entities(&self) -> &[Entity] {
        self.simulator.dynamic_entities()
    }

    pub fn metrics(&self) -> &SimulationMetrics {
        self.simulator.metrics()
    }

    pub fn query(&self, entity_id: &EntityId, period: usize) -> Option<PeriodEntityAggregate> {
        self.timeline
            .period(period)?
            .period_entity_aggregate(entity_id)
    }

    /// Aggregate for the last period
    pub fn query_final(&self, entity_id: &EntityId) -> Option<PeriodEntityAggregate> {
        self.timeline
            .last_period()?
            .period_entity_aggregate(entity_id)
    }

    pub fn dump(&self) -> ModelDump {
        let scenario = &self.scenario;
        let last = self.timeline.last_period();

        let mut totals = Totals::default();
        let mut entities = Vec::new();
        for entity in &scenario.initial_entities {
            let Some(final_version) = last.and_then(|p| p.final_version(&entity.id)) else {
                continue;
            };
            let opening = self
                .timeline
                .entity_history(&entity.id)
                .first()
                .map_or(entity.initial_value, |v| v.balance);
            let balance = final_version.balance;
            totals.add(entity.category, balance);
            entities.push(EntityLine {
                id: entity.id.clone(),
                name: entity.name.clone(),
                category: entity.category,
                balance,
                change: balance - opening,
            });
        }

        let asset_groups = scenario
            .asset_groups
            .iter()
            .map(|group| GroupLine {
                name: group.name.clone(),
                balance: last.map_or(0.0, |p| group.period_balance(p)),
            })
            .collect();

        ModelDump {
            scenario_name: scenario.name.clone(),
            start: self.timeline.periods().first().map(|p| p.start),
            end: last.map(|p| p.end),
            entity_count: scenario.initial_entities.len(),
            dynamic_entity_count: self.dynamic_entities().len(),
            event_count: scenario.event_count(),
            period_count: self.timeline.len(),
            components: scenario
                .components
                .iter()
                .map(|c| c.describe(scenario.start_date))
                .collect(),
            entities,
            total_assets: totals.assets,
            total_liabilities: totals.liabilities,
            net_worth: totals.assets - totals.liabilities,
            total_income: totals.income,
            total_expenses: totals.expenses,
            net_cash_flow: totals.income - totals.expenses,
            asset_groups,
        }
    }
}

#[derive(Default)]
struct Totals {
    assets: f64,
    liabilities: f64,
    income: f64,
    expenses: f64,
}

impl Totals {
    fn add(&mut self, category: EntityCategory, balance: f64) {
        match category {
            EntityCategory::Asset => self.assets += balance,
            EntityCategory::Liability => self.liabilities += balance.abs(),
            EntityCategory::Income => self.income += balance,
            EntityCategory::Expense => self.expenses += balance,
            EntityCategory::Other => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityLine {
    pub id: EntityId,
    pub name: String,
    pub category: EntityCategory,
    pub balance: f64,
    /// Final balance minus opening balance
    pub change: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupLine {
    pub name: String,
    pub balance: f64,
}

/// Plain-data summary of a model after a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDump {
    pub scenario_name: String,
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub entity_count: usize,
    pub dynamic_entity_count: usize,
    pub event_count: usize,
    pub period_count: usize,
    pub components: Vec<String>,
    pub entities: Vec<EntityLine>,
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub net_worth: f64,
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_cash_flow: f64,
    pub asset_groups: Vec<GroupLine>,
}

impl fmt::Display for ModelDump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scenario: {}", self.scenario_name)?;
        match (self.start, self.end) {
            (Some(start), Some(end)) => writeln!(f, "Period: {start} to {end}")?,
            _ => writeln!(f, "Period: not initialized")?,
        }
        writeln!(
            f,
            "Entities: {} ({} created during the run), events: {}, periods: {}",
            self.entity_count, self.dynamic_entity_count, self.event_count, self.period_count
        )?;

        if !self.components.is_empty() {
            writeln!(f, "\nComponents:")?;
            for line in &self.components {
                writeln!(f, "  {line}")?;
            }
        }

        if !self.entities.is_empty() {
            writeln!(f, "\nFinal balances:")?;
            for line in &self.entities {
                writeln!(
                    f,
                    "  {:<32} {:<10} {:>14.2} ({:+.2})",
                    line.name,
                    line.category.label(),
                    line.balance,
                    line.change
                )?;
            }
        }

        writeln!(f, "\nTotal assets:      {:.2}", self.total_assets)?;
        writeln!(f, "Total liabilities: {:.2}", self.total_liabilities)?;
        writeln!(f, "Net worth:         {:.2}", self.net_worth)?;
        writeln!(f, "Total income:      {:.2}", self.total_income)?;
        writeln!(f, "Total expenses:    {:.2}", self.total_expenses)?;
        writeln!(f, "Net cash flow:     {:.2}", self.net_cash_flow)?;

        if !self.asset_groups.is_empty() {
            writeln!(f, "\nAsset groups:")?;
            for group in &self.asset_groups {
                writeln!(f, "  {:<32} {:>14.2}", group.name, group.balance)?;
            }
        }
        Ok(())
    }
}
