//! Entities and their immutable versions
//!
//! An `Entity` is configuration: identity, category labels, an opening
//! value and a bag of base properties. It never holds simulation state.
//! State lives in `EntityVersion` snapshots, which are created by event
//! application or by the carry-forward routine and never mutated after
//! publication.

use std::collections::BTreeMap;

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use super::ids::EntityId;

/// Primary category label of an entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Asset,
    Liability,
    Income,
    Expense,
    #[default]
    Other,
}

impl EntityCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EntityCategory::Asset => "Asset",
            EntityCategory::Liability => "Liability",
            EntityCategory::Income => "Income",
            EntityCategory::Expense => "Expense",
            EntityCategory::Other => "Other",
        }
    }
}

/// A typed base-property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Flag(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

pub type Attributes = BTreeMap<String, PropertyValue>;

/// A financial entity as configured
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub category: EntityCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_category: Option<String>,
    #[serde(default)]
    pub initial_value: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub base_properties: Attributes,
    /// Templates describe entities to be materialized later (by a creation
    /// event); they are cloned into non-template form when merged.
    #[serde(default)]
    pub is_template: bool,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: EntityCategory::Other,
            detailed_category: None,
            initial_value: 0.0,
            base_properties: BTreeMap::new(),
            is_template: false,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: EntityCategory) -> Self {
        self.category = category;
        self
    }

    #[must_use]
    pub fn with_detailed_category(mut self, label: impl Into<String>) -> Self {
        self.detailed_category = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_initial_value(mut self, value: f64) -> Self {
        self.initial_value = value;
        self
    }

    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.base_properties.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn as_template(mut self) -> Self {
        self.is_template = true;
        self
    }

    /// Copy of this entity in non-template form
    pub fn clone_as_new(&self) -> Self {
        Self {
            is_template: false,
            ..self.clone()
        }
    }

    /// Fresh opening version: balance = initial value, rate 0, sequence 0
    pub fn initial_version(&self, date: Date) -> EntityVersion {
        EntityVersion {
            entity_id: self.id.clone(),
            date,
            sequence: 0,
            balance: self.initial_value,
            rate: 0.0,
            attributes: self.base_properties.clone(),
            previous: None,
        }
    }
}

/// Reference to one version of one entity: the entity id plus the version's
/// position in that entity's derivation chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionRef {
    pub entity_id: EntityId,
    pub sequence: u32,
}

/// Immutable snapshot of an entity's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityVersion {
    pub entity_id: EntityId,
    pub date: Date,
    pub sequence: u32,
    pub balance: f64,
    pub rate: f64,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: Attributes,
    /// Sequence of the version this one was derived from. Chains link
    /// backward only; the sequence doubles as the index into the chain.
    pub previous: Option<u32>,
}

impl EntityVersion {
    /// Successor version with new balance and rate
    #[must_use]
    pub fn derive_next(&self, balance: f64, rate: f64) -> Self {
        Self {
            entity_id: self.entity_id.clone(),
            date: self.date,
            sequence: self.sequence + 1,
            balance,
            rate,
            attributes: self.attributes.clone(),
            previous: Some(self.sequence),
        }
    }

    /// Stamp a freshly derived version with the date it takes effect.
    /// Only used before the version is published to a chain.
    #[must_use]
    pub(crate) fn stamped(mut self, date: Date) -> Self {
        self.date = date;
        self
    }

    pub fn version_ref(&self) -> VersionRef {
        VersionRef {
            entity_id: self.entity_id.clone(),
            sequence: self.sequence,
        }
    }
}
