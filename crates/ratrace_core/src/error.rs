use std::fmt;

use crate::model::{EntityId, EventId};

/// Errors raised when configuration is self-inconsistent.
///
/// Always local to construction or validation time: the caller fixes the
/// configuration and rebuilds.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    EmptyField {
        context: String,
        field: &'static str,
    },
    Negative {
        context: String,
        field: &'static str,
        value: f64,
    },
    NotPositive {
        context: String,
        field: &'static str,
        value: f64,
    },
    NotFinite {
        context: String,
        field: &'static str,
    },
    OutOfRange {
        context: String,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    MortgageExceedsPropertyValue {
        context: String,
        mortgage: f64,
        property_value: f64,
    },
    InvalidTaxCode {
        context: String,
        code: String,
    },
    BirthDateAfter {
        context: String,
        date_of_birth: jiff::civil::Date,
        as_of: jiff::civil::Date,
    },
    DuplicateEntity(EntityId),
    UnknownEntity {
        event_id: Option<EventId>,
        entity_id: EntityId,
    },
    NoPeriods,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyField { context, field } => {
                write!(f, "{context}: {field} cannot be empty")
            }
            ValidationError::Negative {
                context,
                field,
                value,
            } => write!(f, "{context}: {field} cannot be negative (got {value})"),
            ValidationError::NotPositive {
                context,
                field,
                value,
            } => write!(f, "{context}: {field} must be positive (got {value})"),
            ValidationError::NotFinite { context, field } => {
                write!(f, "{context}: {field} must be a finite number")
            }
            ValidationError::OutOfRange {
                context,
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{context}: {field} must be between {min} and {max} (got {value})"
            ),
            ValidationError::MortgageExceedsPropertyValue {
                context,
                mortgage,
                property_value,
            } => write!(
                f,
                "{context}: mortgage amount {mortgage} exceeds property value {property_value}"
            ),
            ValidationError::InvalidTaxCode { context, code } => {
                write!(f, "{context}: invalid UK tax code {code:?}")
            }
            ValidationError::BirthDateAfter {
                context,
                date_of_birth,
                as_of,
            } => write!(
                f,
                "{context}: date of birth {date_of_birth} is after {as_of}"
            ),
            ValidationError::DuplicateEntity(id) => write!(f, "duplicate entity id {id}"),
            ValidationError::UnknownEntity {
                event_id: Some(event_id),
                entity_id,
            } => write!(f, "event {event_id} targets unknown entity {entity_id}"),
            ValidationError::UnknownEntity {
                event_id: None,
                entity_id,
            } => write!(f, "event templates reference unknown entity {entity_id}"),
            ValidationError::NoPeriods => write!(f, "scenario must simulate at least one period"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while a run is in progress.
///
/// Fatal for the run: versions already produced are not rolled back, and the
/// timeline must be reset before running again.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationError {
    InsufficientFunds {
        entity_id: EntityId,
        event_id: EventId,
        balance: f64,
        required: f64,
    },
    /// An entity that took part in earlier periods has no version in the
    /// immediately preceding period.
    MissingCarryForward {
        entity_id: EntityId,
        period_index: usize,
    },
    /// The timeline already holds version chains from an earlier run
    TimelineAlreadyPopulated,
    PeriodOutOfRange {
        index: usize,
        len: usize,
    },
    Validation(ValidationError),
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InsufficientFunds {
                entity_id,
                event_id,
                balance,
                required,
            } => write!(
                f,
                "insufficient funds for {entity_id} (event {event_id}): balance {balance:.2}, required {required:.2}"
            ),
            SimulationError::MissingCarryForward {
                entity_id,
                period_index,
            } => write!(
                f,
                "entity {entity_id} has no version in period {} to carry into period {period_index}",
                period_index.saturating_sub(1)
            ),
            SimulationError::TimelineAlreadyPopulated => {
                write!(f, "timeline already holds simulation results; reset it first")
            }
            SimulationError::PeriodOutOfRange { index, len } => {
                write!(f, "period {index} is out of range for a timeline of {len} periods")
            }
            SimulationError::Validation(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Validation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationError> for SimulationError {
    fn from(err: ValidationError) -> Self {
        SimulationError::Validation(err)
    }
}
