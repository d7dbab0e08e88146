//! Monetary flows between entity versions
//!
//! Flows are a side channel: they describe money movement implied by an
//! event application (or by carrying state across a period boundary). They
//! never drive state themselves; balances live in the version chain.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::entity::{PropertyValue, VersionRef};
use crate::error::ValidationError;

/// Direction of a flow relative to the entity it is recorded against
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    Inflow,
    Outflow,
    /// State carried from one period's final version into the next period
    CarryForward,
}

impl FlowDirection {
    pub fn label(&self) -> &'static str {
        match self {
            FlowDirection::Inflow => "inflow",
            FlowDirection::Outflow => "outflow",
            FlowDirection::CarryForward => "carry_forward",
        }
    }
}

/// A directed monetary movement between two entity versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub id: String,
    pub source: VersionRef,
    pub target: VersionRef,
    /// Always non-negative; the direction carries the sign
    pub amount: f64,
    pub direction: FlowDirection,
    pub flow_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, PropertyValue>,
    pub intra_period: bool,
}

impl Flow {
    /// Build a validated flow. Fails on an empty id or type, or on a
    /// negative or non-finite amount.
    pub fn new(
        id: impl Into<String>,
        source: VersionRef,
        target: VersionRef,
        amount: f64,
        direction: FlowDirection,
        flow_type: impl Into<String>,
        intra_period: bool,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        let flow_type = flow_type.into();

        if id.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                context: "flow".to_string(),
                field: "id",
            });
        }
        if flow_type.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                context: format!("flow {id}"),
                field: "type",
            });
        }
        if !amount.is_finite() {
            return Err(ValidationError::NotFinite {
                context: format!("flow {id}"),
                field: "amount",
            });
        }
        if amount < 0.0 {
            return Err(ValidationError::Negative {
                context: format!("flow {id}"),
                field: "amount",
                value: amount,
            });
        }

        Ok(Self {
            id,
            source,
            target,
            amount,
            direction,
            flow_type,
            metadata: BTreeMap::new(),
            intra_period,
        })
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Amount signed by direction: positive in, negative out, zero for carry-forward
    pub fn signed_amount(&self) -> f64 {
        match self.direction {
            FlowDirection::Inflow => self.amount,
            FlowDirection::Outflow => -self.amount,
            FlowDirection::CarryForward => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityId;

    fn vref(seq: u32) -> VersionRef {
        VersionRef {
            entity_id: EntityId::from("acct"),
            sequence: seq,
        }
    }

    #[test]
    fn test_valid_flow() {
        let flow = Flow::new("f1", vref(0), vref(1), 25.0, FlowDirection::Outflow, "fee", true)
            .unwrap()
            .with_metadata("note", "monthly");
        assert_eq!(flow.signed_amount(), -25.0);
        assert_eq!(
            flow.metadata.get("note"),
            Some(&PropertyValue::Text("monthly".into()))
        );
    }

    #[test]
    fn test_zero_amount_is_allowed() {
        assert!(Flow::new("f", vref(0), vref(1), 0.0, FlowDirection::Inflow, "t", true).is_ok());
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = Flow::new("f", vref(0), vref(1), -1.0, FlowDirection::Inflow, "t", true)
            .unwrap_err();
        assert!(matches!(err, ValidationError::Negative { field: "amount", .. }));
    }

    #[test]
    fn test_empty_id_and_type_rejected() {
        let err = Flow::new("", vref(0), vref(1), 1.0, FlowDirection::Inflow, "t", true)
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField { field: "id", .. }));

        let err = Flow::new("f", vref(0), vref(1), 1.0, FlowDirection::Inflow, "  ", true)
            .unwrap_err();
        assert!(matches!(err, ValidationError::EmptyField { field: "type", .. }));
    }

    #[test]
    fn test_nan_amount_rejected() {
        let err = Flow::new("f", vref(0), vref(1), f64::NAN, FlowDirection::Inflow, "t", true)
            .unwrap_err();
        assert!(matches!(err, ValidationError::NotFinite { .. }));
    }
}
