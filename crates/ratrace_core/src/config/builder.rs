//! Fluent builder for scenarios
//!
//! Entities are kept in insertion order, which is also the order the
//! simulator visits them in.

use jiff::civil::Date;

use super::Scenario;
use super::components::Component;
use crate::model::{AssetGroup, Entity, EntityId, Event};
use crate::timeline::PeriodLength;

#[derive(Debug, Clone, Default)]
pub struct ScenarioBuilder {
    scenario: Scenario,
}

impl ScenarioBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.scenario.name = name.into();
        self
    }

    #[must_use]
    pub fn start(mut self, year: i16, month: i8, day: i8) -> Self {
        self.scenario.start_date = jiff::civil::date(year, month, day);
        self
    }

    #[must_use]
    pub fn start_date(mut self, date: Date) -> Self {
        self.scenario.start_date = date;
        self
    }

    #[must_use]
    pub fn periods(mut self, count: usize) -> Self {
        self.scenario.num_periods = count;
        self
    }

    #[must_use]
    pub fn period_length(mut self, length: PeriodLength) -> Self {
        self.scenario.period_length = length;
        self
    }

    /// Percent
    #[must_use]
    pub fn risk_free_rate(mut self, rate: f64) -> Self {
        self.scenario.risk_free_rate = rate;
        self
    }

    /// Percent
    #[must_use]
    pub fn inflation(mut self, rate: f64) -> Self {
        self.scenario.inflation = rate;
        self
    }

    #[must_use]
    pub fn entity(mut self, entity: Entity) -> Self {
        self.scenario.initial_entities.push(entity);
        self
    }

    /// Add an event template under `entity_id`
    #[must_use]
    pub fn event_for(mut self, entity_id: impl Into<EntityId>, event: Event) -> Self {
        self.scenario
            .event_templates
            .entry(entity_id.into())
            .or_default()
            .push(event);
        self
    }

    #[must_use]
    pub fn latent_event(mut self, event: Event) -> Self {
        self.scenario.register_latent_event(event);
        self
    }

    #[must_use]
    pub fn template(mut self, key: impl Into<String>, entity: Entity) -> Self {
        self.scenario.entity_templates.insert(key.into(), entity);
        self
    }

    #[must_use]
    pub fn component(mut self, component: Component) -> Self {
        self.scenario.components.push(component);
        self
    }

    #[must_use]
    pub fn asset_group(mut self, group: AssetGroup) -> Self {
        self.scenario.asset_groups.push(group);
        self
    }

    #[must_use]
    pub fn build(self) -> Scenario {
        self.scenario
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_sets_fields() {
        let scenario = ScenarioBuilder::new()
            .name("Test")
            .start(2026, 4, 6)
            .periods(4)
            .period_length(PeriodLength::Quarterly)
            .risk_free_rate(4.0)
            .inflation(3.0)
            .entity(Entity::new("a", "A"))
            .asset_group(AssetGroup::new("all").with_asset("a"))
            .build();

        assert_eq!(scenario.name, "Test");
        assert_eq!(scenario.start_date, jiff::civil::date(2026, 4, 6));
        assert_eq!(scenario.num_periods, 4);
        assert_eq!(scenario.period_length, PeriodLength::Quarterly);
        assert_eq!(scenario.risk_free_rate, 4.0);
        assert_eq!(scenario.inflation, 3.0);
        assert_eq!(scenario.initial_entities.len(), 1);
        assert_eq!(scenario.asset_groups.len(), 1);
    }

    #[test]
    fn test_defaults() {
        let scenario = ScenarioBuilder::new().build();
        assert_eq!(scenario.risk_free_rate, 3.5);
        assert_eq!(scenario.inflation, 2.0);
        assert_eq!(scenario.start_date, jiff::civil::date(2025, 1, 1));
    }
}
