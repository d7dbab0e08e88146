//! Scenario configuration
//!
//! A `Scenario` holds everything needed to lay out a timeline and run it:
//! the opening entity set, per-entity event templates, latent events and
//! the higher-level components that expand into entities and events.
//! Scenarios round-trip through serde; the CLI stores them as YAML or JSON.
//!
//! ```ignore
//! use ratrace_core::config::ScenarioBuilder;
//! use ratrace_core::model::{Entity, Event};
//!
//! let scenario = ScenarioBuilder::new()
//!     .name("Savings")
//!     .start(2025, 1, 1)
//!     .periods(12)
//!     .entity(Entity::new("savings", "Savings").with_initial_value(1_000.0))
//!     .event_for("savings", Event::recurring("deposit", 500.0).every_period())
//!     .build();
//! ```

use std::collections::{BTreeMap, BTreeSet};

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{AssetGroup, Entity, EntityId, Event, EventKind};
use crate::timeline::{PeriodLength, TimePeriod, Timeline};

pub mod builder;
pub mod components;

pub use builder::ScenarioBuilder;
pub use components::{Component, InvestmentPortfolio, InvestmentType, RentalProperty};

fn default_name() -> String {
    "Untitled Scenario".to_string()
}

fn default_start_date() -> Date {
    jiff::civil::date(2025, 1, 1)
}

fn default_risk_free_rate() -> f64 {
    3.5
}

fn default_inflation() -> f64 {
    2.0
}

fn default_num_periods() -> usize {
    12
}

/// Complete scenario configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_start_date")]
    pub start_date: Date,
    #[serde(default)]
    pub period_length: PeriodLength,
    /// Percent
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Percent
    #[serde(default = "default_inflation")]
    pub inflation: f64,
    #[serde(default = "default_num_periods")]
    pub num_periods: usize,

    /// Entities taking part in the run, in processing order. Grows as
    /// creation events materialize new entities.
    #[serde(default)]
    pub initial_entities: Vec<Entity>,
    /// Events bound per entity; an untargeted template targets its key
    #[serde(default)]
    pub event_templates: BTreeMap<EntityId, Vec<Event>>,
    /// Named entity blueprints, looked up by key
    #[serde(default)]
    pub entity_templates: BTreeMap<String, Entity>,
    /// Events not tied to an entity template. Bound when their schedule fires.
    #[serde(default)]
    pub latent_events: Vec<Event>,

    #[serde(default)]
    pub components: Vec<Component>,
    #[serde(default)]
    pub asset_groups: Vec<AssetGroup>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: default_name(),
            start_date: default_start_date(),
            period_length: PeriodLength::default(),
            risk_free_rate: default_risk_free_rate(),
            inflation: default_inflation(),
            num_periods: default_num_periods(),
            initial_entities: Vec::new(),
            event_templates: BTreeMap::new(),
            entity_templates: BTreeMap::new(),
            latent_events: Vec::new(),
            components: Vec::new(),
            asset_groups: Vec::new(),
        }
    }
}

impl Scenario {
    /// Lay out `num_periods` periods and bind events to them.
    ///
    /// Per period: each entity's templates that fire (in entity order, with
    /// untargeted templates targeted at their entity), then the latent
    /// events that fire.
    pub fn initialize(&self, timeline: &mut Timeline) {
        let span = self.period_length.span();
        let mut start = self.start_date;

        for index in 0..self.num_periods {
            let end = start.saturating_add(span);
            let mut period = TimePeriod::new(start, end, self.risk_free_rate, self.inflation);

            for entity_id in self.template_order() {
                let Some(templates) = self.event_templates.get(entity_id) else {
                    continue;
                };
                for template in templates.iter().filter(|e| e.schedule.fires_in(index)) {
                    let mut event = template.clone();
                    if event.target.is_none() {
                        event.target = Some(entity_id.clone());
                    }
                    period.add_event(event);
                }
            }
            for event in self.latent_events.iter().filter(|e| e.schedule.fires_in(index)) {
                period.add_event(event.clone());
            }

            timeline.add_period(period);
            start = end;
        }
    }

    /// Template keys in binding order: configured entities first, then keys
    /// naming entities that creation events will materialize.
    fn template_order(&self) -> Vec<&EntityId> {
        let mut order: Vec<&EntityId> = self.initial_entities.iter().map(|e| &e.id).collect();
        for key in self.event_templates.keys() {
            if !order.contains(&key) {
                order.push(key);
            }
        }
        order
    }

    /// Ids of entities that creation events can introduce
    pub fn creatable_entity_ids(&self) -> BTreeSet<&EntityId> {
        self.event_templates
            .values()
            .flatten()
            .chain(&self.latent_events)
            .flat_map(|event| match &event.kind {
                EventKind::Creation(params) => params.entities.as_slice(),
                _ => &[][..],
            })
            .map(|entity| &entity.id)
            .collect()
    }

    pub fn register_latent_event(&mut self, event: Event) {
        self.latent_events.push(event);
    }

    pub fn template(&self, key: &str) -> Option<&Entity> {
        self.entity_templates.get(key)
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.initial_entities.iter().find(|e| &e.id == id)
    }

    /// Templates plus latent events
    pub fn event_count(&self) -> usize {
        self.event_templates.values().map(Vec::len).sum::<usize>() + self.latent_events.len()
    }

    /// Add entities and targeted event templates from every component.
    /// Entities already present are left alone, so calling this twice is harmless.
    pub fn incorporate_components(&mut self) {
        for component in &self.components {
            let mut added = BTreeSet::new();
            for entity in component.entities() {
                if self.initial_entities.iter().any(|e| e.id == entity.id) {
                    continue;
                }
                added.insert(entity.id.clone());
                self.initial_entities.push(entity);
            }
            for event in component.events(self.period_length) {
                let Some(target) = event.target.clone() else {
                    continue;
                };
                if added.contains(&target) {
                    self.event_templates.entry(target).or_default().push(event);
                }
            }
        }
    }

    /// Check the scenario is self-consistent
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.num_periods == 0 {
            return Err(ValidationError::NoPeriods);
        }
        if !self.risk_free_rate.is_finite() {
            return Err(ValidationError::NotFinite {
                context: format!("scenario {}", self.name),
                field: "risk-free rate",
            });
        }
        if !self.inflation.is_finite() {
            return Err(ValidationError::NotFinite {
                context: format!("scenario {}", self.name),
                field: "inflation",
            });
        }

        let mut known = BTreeSet::new();
        for entity in &self.initial_entities {
            if entity.id.as_str().trim().is_empty() {
                return Err(ValidationError::EmptyField {
                    context: format!("entity {:?}", entity.name),
                    field: "id",
                });
            }
            if !known.insert(&entity.id) {
                return Err(ValidationError::DuplicateEntity(entity.id.clone()));
            }
        }
        known.extend(self.creatable_entity_ids());

        for (key, events) in &self.event_templates {
            if !known.contains(key) {
                return Err(ValidationError::UnknownEntity {
                    event_id: None,
                    entity_id: key.clone(),
                });
            }
            for event in events {
                check_event(event, &known)?;
            }
        }
        for event in &self.latent_events {
            check_event(event, &known)?;
        }

        for component in &self.components {
            component.validate(self.start_date)?;
        }
        Ok(())
    }
}

fn check_event(event: &Event, known: &BTreeSet<&EntityId>) -> Result<(), ValidationError> {
    if let Some(target) = &event.target
        && !known.contains(target)
    {
        return Err(ValidationError::UnknownEntity {
            event_id: Some(event.id.clone()),
            entity_id: target.clone(),
        });
    }
    for (field, value) in event.kind.numeric_fields() {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite {
                context: format!("event {}", event.id),
                field,
            });
        }
    }
    Ok(())
}
