use serde::{Deserialize, Serialize};

use super::entity::Entity;
use super::ids::EntityId;
use crate::timeline::TimePeriod;

/// A named grouping of assets and liabilities, nested arbitrarily deep.
///
/// Values are looked up by id: the group only references entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub category: String,
    #[serde(default)]
    pub assets: Vec<EntityId>,
    #[serde(default)]
    pub liabilities: Vec<EntityId>,
    #[serde(default)]
    pub initial_funds: f64,
    #[serde(default)]
    pub sub_groups: Vec<AssetGroup>,
}

impl AssetGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_asset(mut self, id: impl Into<EntityId>) -> Self {
        self.assets.push(id.into());
        self
    }

    #[must_use]
    pub fn with_liability(mut self, id: impl Into<EntityId>) -> Self {
        self.liabilities.push(id.into());
        self
    }

    #[must_use]
    pub fn with_sub_group(mut self, group: AssetGroup) -> Self {
        self.sub_groups.push(group);
        self
    }

    /// Every referenced entity id, sub-groups included
    pub fn all_entity_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self
            .assets
            .iter()
            .chain(&self.liabilities)
            .cloned()
            .collect();
        for sub in &self.sub_groups {
            ids.extend(sub.all_entity_ids());
        }
        ids
    }

    /// Initial value of referenced assets plus the group's own funds
    pub fn total_asset_value(&self, entities: &[Entity]) -> f64 {
        let own: f64 = self
            .assets
            .iter()
            .filter_map(|id| initial_value(entities, id))
            .sum();
        let nested: f64 = self
            .sub_groups
            .iter()
            .map(|g| g.total_asset_value(entities))
            .sum();
        own + nested + self.initial_funds
    }

    /// Liabilities counted as positive amounts owed
    pub fn total_liability_value(&self, entities: &[Entity]) -> f64 {
        let own: f64 = self
            .liabilities
            .iter()
            .filter_map(|id| initial_value(entities, id))
            .map(f64::abs)
            .sum();
        let nested: f64 = self
            .sub_groups
            .iter()
            .map(|g| g.total_liability_value(entities))
            .sum();
        own + nested
    }

    pub fn net_worth(&self, entities: &[Entity]) -> f64 {
        self.total_asset_value(entities) - self.total_liability_value(entities)
    }

    /// Sum of final balances in `period` over every referenced entity.
    /// Entities without a version in the period contribute nothing.
    pub fn period_balance(&self, period: &TimePeriod) -> f64 {
        self.all_entity_ids()
            .iter()
            .filter_map(|id| period.final_version(id))
            .map(|v| v.balance)
            .sum()
    }
}

fn initial_value(entities: &[Entity], id: &EntityId) -> Option<f64> {
    entities
        .iter()
        .find(|e| &e.id == id)
        .map(|e| e.initial_value)
}
