//! Event system - schedules and variant payloads
//!
//! Events are the only mechanism that changes entity state. Each event
//! carries a strongly typed payload for exactly one variant; application
//! logic lives in `crate::apply`.

use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::{EntityId, EventId};

/// When an event is bound to periods of the timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// Bound to every period
    EveryPeriod,
    /// Bound to a single period, by index
    AtPeriod(usize),
    /// Registered but not bound to any period
    #[default]
    Unbound,
}

impl Schedule {
    pub fn fires_in(&self, period_index: usize) -> bool {
        match self {
            Schedule::EveryPeriod => true,
            Schedule::AtPeriod(i) => *i == period_index,
            Schedule::Unbound => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceCondition {
    GreaterThan(f64),
    GreaterThanOrEqual(f64),
    LessThan(f64),
    LessThanOrEqual(f64),
}

impl BalanceCondition {
    pub fn value(&self) -> f64 {
        match self {
            BalanceCondition::GreaterThan(v)
            | BalanceCondition::GreaterThanOrEqual(v)
            | BalanceCondition::LessThan(v)
            | BalanceCondition::LessThanOrEqual(v) => *v,
        }
    }

    pub fn evaluate(&self, balance: f64) -> bool {
        match self {
            BalanceCondition::GreaterThan(v) => balance > *v,
            BalanceCondition::GreaterThanOrEqual(v) => balance >= *v,
            BalanceCondition::LessThan(v) => balance < *v,
            BalanceCondition::LessThanOrEqual(v) => balance <= *v,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurringParams {
    /// Signed: positive credits, negative debits
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionalParams {
    pub condition: BalanceCondition,
    #[serde(default)]
    pub amount: f64,
}

fn default_threshold() -> f64 {
    1_000.0
}

fn default_above_rate() -> f64 {
    5.0
}

fn default_at_or_below_rate() -> f64 {
    3.0
}

fn default_true() -> bool {
    true
}

/// How a calculation event derives new state from the current version
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum CalculationRule {
    /// rate = above_rate if balance > threshold, else at_or_below_rate.
    /// Balance untouched.
    RateThreshold {
        #[serde(default = "default_threshold")]
        threshold: f64,
        #[serde(default = "default_above_rate")]
        above_rate: f64,
        #[serde(default = "default_at_or_below_rate")]
        at_or_below_rate: f64,
    },
    /// Per-period investment return. The random factor is seeded from
    /// `seed`, the entity id and the input sequence.
    InvestmentReturns {
        expected_return: f64,
        #[serde(default)]
        volatility: f64,
        #[serde(default = "default_true")]
        inflation_affected: bool,
        #[serde(default)]
        inflation_rate: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl Default for CalculationRule {
    fn default() -> Self {
        CalculationRule::RateThreshold {
            threshold: default_threshold(),
            above_rate: default_above_rate(),
            at_or_below_rate: default_at_or_below_rate(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreationParams {
    /// Entity templates materialized each time the event is applied
    #[serde(default)]
    pub entities: Vec<Entity>,
}

/// The closed set of event variants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventKind {
    Recurring(RecurringParams),
    Conditional(ConditionalParams),
    Calculation(CalculationRule),
    Creation(CreationParams),
}

impl EventKind {
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Recurring(_) => "recurring",
            EventKind::Conditional(_) => "conditional",
            EventKind::Calculation(_) => "calculation",
            EventKind::Creation(_) => "creation",
        }
    }

    /// Every numeric parameter of the payload, by field name
    pub fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        match self {
            EventKind::Recurring(p) => vec![("amount", p.amount)],
            EventKind::Conditional(p) => {
                vec![("amount", p.amount), ("condition", p.condition.value())]
            }
            EventKind::Calculation(CalculationRule::RateThreshold {
                threshold,
                above_rate,
                at_or_below_rate,
            }) => vec![
                ("threshold", *threshold),
                ("above_rate", *above_rate),
                ("at_or_below_rate", *at_or_below_rate),
            ],
            EventKind::Calculation(CalculationRule::InvestmentReturns {
                expected_return,
                volatility,
                inflation_rate,
                ..
            }) => vec![
                ("expected_return", *expected_return),
                ("volatility", *volatility),
                ("inflation_rate", *inflation_rate),
            ],
            EventKind::Creation(_) => Vec::new(),
        }
    }
}

/// A scheduled state transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    /// Free-form type label reported in the audit stream ("deposit", "rent", ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub label: String,
    /// Entity this event applies to; untargeted events apply to every entity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<EntityId>,
    #[serde(default)]
    pub schedule: Schedule,
    pub kind: EventKind,
}

impl Event {
    pub fn new(id: impl Into<EventId>, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            target: None,
            schedule: Schedule::Unbound,
            kind,
        }
    }

    pub fn recurring(id: impl Into<EventId>, amount: f64) -> Self {
        Self::new(id, EventKind::Recurring(RecurringParams { amount }))
    }

    pub fn conditional(id: impl Into<EventId>, condition: BalanceCondition, amount: f64) -> Self {
        Self::new(
            id,
            EventKind::Conditional(ConditionalParams { condition, amount }),
        )
    }

    pub fn calculation(id: impl Into<EventId>, rule: CalculationRule) -> Self {
        Self::new(id, EventKind::Calculation(rule))
    }

    pub fn creation(id: impl Into<EventId>, entities: Vec<Entity>) -> Self {
        Self::new(id, EventKind::Creation(CreationParams { entities }))
    }

    #[must_use]
    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    #[must_use]
    pub fn targeting(mut self, entity_id: impl Into<EntityId>) -> Self {
        self.target = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn every_period(mut self) -> Self {
        self.schedule = Schedule::EveryPeriod;
        self
    }

    #[must_use]
    pub fn at_period(mut self, index: usize) -> Self {
        self.schedule = Schedule::AtPeriod(index);
        self
    }

    pub fn applies_to(&self, entity_id: &EntityId) -> bool {
        self.target.as_ref().is_none_or(|t| t == entity_id)
    }

    /// Type reported in audit records: the label, or the variant name when unlabeled
    pub fn event_type(&self) -> &str {
        if self.label.is_empty() {
            self.kind.name()
        } else {
            &self.label
        }
    }

    /// The amount parameter, for variants that carry one
    pub fn resolved_amount(&self) -> f64 {
        match &self.kind {
            EventKind::Recurring(p) => p.amount,
            EventKind::Conditional(p) => p.amount,
            EventKind::Calculation(_) | EventKind::Creation(_) => 0.0,
        }
    }
}
