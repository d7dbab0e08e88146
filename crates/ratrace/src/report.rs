//! Machine-readable run report

use jiff::civil::Date;
use serde::Serialize;

use ratrace_core::model::EntityId;
use ratrace_core::{FinanceModel, ModelDump, SimulationMetrics};

#[derive(Debug, Clone, Serialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub balance: f64,
    pub inflow: f64,
    pub outflow: f64,
    /// Versions produced in the period, carry-in included
    pub versions: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PeriodSummary {
    pub index: usize,
    pub start: Date,
    pub end: Date,
    pub events: usize,
    pub entities: Vec<EntitySnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: ModelDump,
    pub metrics: SimulationMetrics,
    pub audit_records: usize,
    pub periods: Vec<PeriodSummary>,
}

impl RunReport {
    pub fn from_model(model: &FinanceModel) -> Self {
        let periods = model
            .timeline()
            .periods()
            .iter()
            .enumerate()
            .map(|(index, period)| PeriodSummary {
                index,
                start: period.start,
                end: period.end,
                events: period.events().len(),
                entities: period
                    .entity_ids()
                    .filter_map(|id| {
                        let aggregate = period.period_entity_aggregate(id)?;
                        Some(EntitySnapshot {
                            id: id.clone(),
                            balance: aggregate.net_balance(),
                            inflow: aggregate.total_inflow(),
                            outflow: aggregate.total_outflow(),
                            versions: period.chain(id).map_or(0, <[_]>::len),
                        })
                    })
                    .collect(),
            })
            .collect();

        Self {
            summary: model.dump(),
            metrics: model.metrics().clone(),
            audit_records: model.audit().len(),
            periods,
        }
    }
}
