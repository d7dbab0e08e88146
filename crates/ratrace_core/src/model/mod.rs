//! Data model for the ledger simulator
//!
//! - `Entity` / `EntityVersion`: configuration and immutable state snapshots
//! - `Event` / `EventKind`: scheduled state transitions
//! - `Flow`: money movement between versions
//! - `Person`, `UkTaxConfig`: tax inputs
//! - `AssetGroup`: reporting groups

mod asset_group;
mod entity;
mod events;
mod flow;
mod ids;
mod person;
mod tax_config;

pub use asset_group::AssetGroup;
pub use entity::{Attributes, Entity, EntityCategory, EntityVersion, PropertyValue, VersionRef};
pub use events::{
    BalanceCondition, CalculationRule, ConditionalParams, CreationParams, Event, EventKind,
    RecurringParams, Schedule,
};
pub use flow::{Flow, FlowDirection};
pub use ids::{EntityId, EventId};
pub use person::{MaritalStatus, Person};
pub use tax_config::{Jurisdiction, TaxBracket, UkTaxConfig};
