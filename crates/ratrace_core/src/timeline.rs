//! Periods and the timeline
//!
//! A `TimePeriod` owns the events bound to it and, once a run has visited
//! it, one version chain and one flow list per entity. The first element of
//! each chain is the carry-in: the previous period's final version, or a
//! fresh initial version for an entity's first period.

use std::collections::BTreeMap;

use jiff::civil::Date;
use jiff::{Span, ToSpan};
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, EntityVersion, Event, Flow, FlowDirection, PropertyValue};

/// Metadata key holding the signed balance on carry-forward flows
pub const CARRIED_BALANCE_KEY: &str = "balance";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodLength {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl PeriodLength {
    pub fn span(&self) -> Span {
        match self {
            PeriodLength::Monthly => 1.month(),
            PeriodLength::Quarterly => 3.months(),
            PeriodLength::Yearly => 1.year(),
        }
    }

    pub fn periods_per_year(&self) -> u32 {
        match self {
            PeriodLength::Monthly => 12,
            PeriodLength::Quarterly => 4,
            PeriodLength::Yearly => 1,
        }
    }

    /// Scale an annual figure down to one period
    pub fn per_period(&self, annual: f64) -> f64 {
        annual / f64::from(self.periods_per_year())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePeriod {
    pub start: Date,
    pub end: Date,
    pub risk_free_rate: f64,
    pub inflation: f64,
    events: Vec<Event>,
    #[serde(default)]
    version_chains: BTreeMap<EntityId, Vec<EntityVersion>>,
    #[serde(default)]
    flows: BTreeMap<EntityId, Vec<Flow>>,
}

impl TimePeriod {
    pub fn new(start: Date, end: Date, risk_free_rate: f64, inflation: f64) -> Self {
        Self {
            start,
            end,
            risk_free_rate,
            inflation,
            events: Vec::new(),
            version_chains: BTreeMap::new(),
            flows: BTreeMap::new(),
        }
    }

    /// Append an event. Events apply in insertion order.
    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Entities with a chain in this period
    pub fn entity_ids(&self) -> impl Iterator<Item = &EntityId> {
        self.version_chains.keys()
    }

    pub fn chain(&self, entity_id: &EntityId) -> Option<&[EntityVersion]> {
        self.version_chains.get(entity_id).map(Vec::as_slice)
    }

    pub fn version_at(&self, entity_id: &EntityId, index: usize) -> Option<&EntityVersion> {
        self.chain(entity_id)?.get(index)
    }

    pub fn final_version(&self, entity_id: &EntityId) -> Option<&EntityVersion> {
        self.chain(entity_id)?.last()
    }

    pub fn flows(&self, entity_id: &EntityId) -> &[Flow] {
        self.flows.get(entity_id).map_or(&[], Vec::as_slice)
    }

    pub(crate) fn store(&mut self, entity_id: EntityId, chain: Vec<EntityVersion>, flows: Vec<Flow>) {
        self.flows.insert(entity_id.clone(), flows);
        self.version_chains.insert(entity_id, chain);
    }

    /// Intra-period flows summed per direction: at most one inflow and one
    /// outflow, inflow first. Source is the carry-in, target the final version.
    pub fn aggregated_flows(&self, entity_id: &EntityId) -> Vec<Flow> {
        let Some(chain) = self.chain(entity_id) else {
            return Vec::new();
        };
        let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
            return Vec::new();
        };

        let mut out = Vec::with_capacity(2);
        for direction in [FlowDirection::Inflow, FlowDirection::Outflow] {
            let matching: Vec<&Flow> = self
                .flows(entity_id)
                .iter()
                .filter(|f| f.intra_period && f.direction == direction)
                .collect();
            if matching.is_empty() {
                continue;
            }
            let mut metadata = BTreeMap::new();
            metadata.insert(
                "count".to_string(),
                PropertyValue::Number(matching.len() as f64),
            );
            out.push(Flow {
                id: format!("{entity_id}:{}:net", direction.label()),
                source: first.version_ref(),
                target: last.version_ref(),
                amount: matching.iter().map(|f| f.amount).sum(),
                direction,
                flow_type: "aggregate".to_string(),
                metadata,
                intra_period: true,
            });
        }
        out
    }

    /// The carry-forward link into this period, if the entity existed before it
    pub fn inter_period_flows(&self, entity_id: &EntityId) -> Vec<Flow> {
        self.flows(entity_id)
            .iter()
            .filter(|f| !f.intra_period)
            .cloned()
            .collect()
    }

    pub fn period_entity_aggregate(&self, entity_id: &EntityId) -> Option<PeriodEntityAggregate> {
        let final_version = self.final_version(entity_id)?.clone();
        Some(PeriodEntityAggregate {
            final_version,
            net_intra_flows: self.aggregated_flows(entity_id),
            inter_flows: self.inter_period_flows(entity_id),
        })
    }

    pub fn has_results(&self) -> bool {
        !self.version_chains.is_empty()
    }

    /// Drop version chains and flows; bound events stay
    pub fn clear_results(&mut self) {
        self.version_chains.clear();
        self.flows.clear();
    }
}

/// An entity's end state in one period plus its net movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodEntityAggregate {
    pub final_version: EntityVersion,
    pub net_intra_flows: Vec<Flow>,
    pub inter_flows: Vec<Flow>,
}

impl PeriodEntityAggregate {
    pub fn net_balance(&self) -> f64 {
        self.final_version.balance
    }

    pub fn total_inflow(&self) -> f64 {
        self.sum_direction(FlowDirection::Inflow)
    }

    pub fn total_outflow(&self) -> f64 {
        self.sum_direction(FlowDirection::Outflow)
    }

    /// Inflow minus outflow; equals the balance change across the period
    pub fn net_flow(&self) -> f64 {
        self.total_inflow() - self.total_outflow()
    }

    /// Signed balance carried in from the previous period, if any
    pub fn carried_in(&self) -> Option<f64> {
        let carry = self.inter_flows.first()?;
        match carry.metadata.get(CARRIED_BALANCE_KEY) {
            Some(PropertyValue::Number(balance)) => Some(*balance),
            _ => Some(carry.amount),
        }
    }

    fn sum_direction(&self, direction: FlowDirection) -> f64 {
        self.net_intra_flows
            .iter()
            .filter(|f| f.direction == direction)
            .map(|f| f.amount)
            .sum()
    }
}

/// Ordered sequence of periods
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    periods: Vec<TimePeriod>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_period(&mut self, period: TimePeriod) {
        self.periods.push(period);
    }

    pub fn periods(&self) -> &[TimePeriod] {
        &self.periods
    }

    pub(crate) fn periods_mut(&mut self) -> &mut [TimePeriod] {
        &mut self.periods
    }

    pub fn period(&self, index: usize) -> Option<&TimePeriod> {
        self.periods.get(index)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn last_period(&self) -> Option<&TimePeriod> {
        self.periods.last()
    }

    /// Every version of an entity across the timeline, in derivation order.
    /// Carry-ins that repeat the previous period's final version are skipped.
    pub fn entity_history(&self, entity_id: &EntityId) -> Vec<EntityVersion> {
        let mut history: Vec<EntityVersion> = Vec::new();
        for period in &self.periods {
            let Some(chain) = period.chain(entity_id) else {
                continue;
            };
            let skip = match (history.last(), chain.first()) {
                (Some(last), Some(carry_in)) => usize::from(last == carry_in),
                _ => 0,
            };
            history.extend(chain.iter().skip(skip).cloned());
        }
        history
    }

    pub fn has_results(&self) -> bool {
        self.periods.iter().any(TimePeriod::has_results)
    }

    /// Clear results from every period
    pub fn reset(&mut self) {
        for period in &mut self.periods {
            period.clear_results();
        }
    }
}
