//! Run metrics: counters collected while playing out a timeline

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::model::EventId;

/// Counters collected during a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimulationMetrics {
    /// Periods fully processed
    pub periods_processed: u64,
    /// Event applications, no-ops included
    pub event_applications: u64,
    /// Applications that returned their input unchanged
    pub no_op_applications: u64,
    /// Entities merged into the run by creation events
    pub entities_created: u64,
    /// Per-event application counts
    pub events_by_id: FxHashMap<EventId, u64>,
}

impl SimulationMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_period(&mut self) {
        self.periods_processed += 1;
    }

    pub fn record_application(&mut self, event_id: &EventId, changed: bool) {
        self.event_applications += 1;
        if !changed {
            self.no_op_applications += 1;
        }
        *self.events_by_id.entry(event_id.clone()).or_insert(0) += 1;
    }

    pub fn record_created(&mut self, count: usize) {
        self.entities_created += count as u64;
    }

    /// Share of applications that changed state
    #[must_use]
    pub fn change_ratio(&self) -> f64 {
        if self.event_applications == 0 {
            0.0
        } else {
            (self.event_applications - self.no_op_applications) as f64
                / self.event_applications as f64
        }
    }
}
