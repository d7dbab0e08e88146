//! Audit stream
//!
//! One record per event application, no-ops included. The sink is passed
//! into each run, so concurrent runs never share a log.

use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::model::{EntityId, EventId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub event_id: EventId,
    pub event_type: String,
    pub entity_id: EntityId,
    /// The event's amount parameter, 0 for variants without one
    pub amount: f64,
    /// Start date of the period the event was applied in
    pub date: Date,
    pub period_index: usize,
    /// False when the application returned its input unchanged
    pub changed: bool,
}

/// Receives audit records as the simulator produces them
pub trait AuditSink {
    fn record(&mut self, record: AuditRecord);
}

impl AuditSink for Vec<AuditRecord> {
    fn record(&mut self, record: AuditRecord) {
        self.push(record);
    }
}

/// In-memory audit log
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn for_entity<'a>(
        &'a self,
        entity_id: &'a EntityId,
    ) -> impl Iterator<Item = &'a AuditRecord> + 'a {
        self.records.iter().filter(move |r| &r.entity_id == entity_id)
    }

    pub fn for_event<'a>(&'a self, event_id: &'a EventId) -> impl Iterator<Item = &'a AuditRecord> + 'a {
        self.records.iter().filter(move |r| &r.event_id == event_id)
    }
}

impl AuditSink for AuditLog {
    fn record(&mut self, record: AuditRecord) {
        self.records.push(record);
    }
}

/// Forwards every record to `tracing` at info level
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl AuditSink for TracingSink {
    fn record(&mut self, record: AuditRecord) {
        tracing::info!(
            event_id = %record.event_id,
            event_type = %record.event_type,
            entity_id = %record.entity_id,
            amount = record.amount,
            date = %record.date,
            period = record.period_index,
            changed = record.changed,
            "event applied"
        );
    }
}
