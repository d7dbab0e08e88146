//! Subcommand implementations
//!
//! Each command returns the text to print so the binary stays a thin
//! dispatcher and the commands can be tested against a temporary store.

use std::fmt::Write as _;
use std::path::PathBuf;

use color_eyre::eyre::{WrapErr, bail, eyre};

use ratrace_core::model::{Entity, EntityCategory, EntityId, Event, Person, UkTaxConfig};
use ratrace_core::taxes::{IncomeSources, calculate_tax_efficiency, calculate_total_tax};
use ratrace_core::{FinanceModel, Scenario, ScenarioBuilder};

use crate::report::RunReport;
use crate::storage::{ScenarioFormat, ScenarioStore};

/// A year of monthly deposits into one savings account
pub fn demo_scenario() -> Scenario {
    ScenarioBuilder::new()
        .name("Savings Demo")
        .start(2025, 1, 1)
        .periods(12)
        .entity(
            Entity::new("savings", "Savings Account")
                .with_category(EntityCategory::Asset)
                .with_detailed_category("Cash"),
        )
        .event_for(
            "savings",
            Event::recurring("monthly_deposit", 5_000.0)
                .labeled("deposit")
                .every_period(),
        )
        .build()
}

/// Write the demo scenario under `name`. Refuses to overwrite unless `force`.
pub fn init(store: &ScenarioStore, name: &str, json: bool, force: bool) -> color_eyre::Result<PathBuf> {
    if !force && store.find(name).is_some() {
        bail!("scenario {name:?} already exists (use --force to overwrite)");
    }
    let format = if json {
        ScenarioFormat::Json
    } else {
        ScenarioFormat::Yaml
    };
    let mut scenario = demo_scenario();
    scenario.name = name.to_string();
    let path = store.save(name, &scenario, format)?;
    tracing::info!(scenario = name, path = %path.display(), "scenario initialized");
    Ok(path)
}

fn run_model(store: &ScenarioStore, reference: &str) -> color_eyre::Result<FinanceModel> {
    let scenario = store.load(reference)?;
    let mut model = FinanceModel::new(scenario);
    model
        .run_simulation()
        .wrap_err_with(|| format!("simulation of {reference:?} failed"))?;
    tracing::info!(
        scenario = reference,
        periods = model.timeline().len(),
        audit_records = model.audit().len(),
        "simulation complete"
    );
    Ok(model)
}

/// Run a stored scenario and render the dump, or the JSON report
pub fn run(store: &ScenarioStore, reference: &str, json: bool) -> color_eyre::Result<String> {
    let model = run_model(store, reference)?;
    if json {
        Ok(serde_json::to_string_pretty(&RunReport::from_model(&model))?)
    } else {
        Ok(model.dump().to_string())
    }
}

/// Aggregate for one entity in `period`, or in the last period
pub fn query(
    store: &ScenarioStore,
    reference: &str,
    entity: &str,
    period: Option<usize>,
) -> color_eyre::Result<String> {
    let model = run_model(store, reference)?;
    let entity_id = EntityId::from(entity);
    let index = match period {
        Some(index) => index,
        None => model.timeline().len().saturating_sub(1),
    };
    let aggregate = model
        .query(&entity_id, index)
        .ok_or_else(|| eyre!("no state for {entity:?} in period {index}"))?;

    let mut out = String::new();
    writeln!(out, "Entity:      {entity_id}")?;
    writeln!(out, "Period:      {index}")?;
    writeln!(out, "Balance:     {:.2}", aggregate.net_balance())?;
    writeln!(out, "Inflow:      {:.2}", aggregate.total_inflow())?;
    writeln!(out, "Outflow:     {:.2}", aggregate.total_outflow())?;
    writeln!(out, "Net flow:    {:.2}", aggregate.net_flow())?;
    match aggregate.carried_in() {
        Some(balance) => writeln!(out, "Carried in:  {balance:.2}")?,
        None => writeln!(out, "Carried in:  none")?,
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaxRequest {
    pub income: IncomeSources,
    pub scottish: bool,
    pub personal_allowance: Option<f64>,
}

/// Tax for a single person with the 2024/25 schedules
pub fn tax(request: &TaxRequest) -> color_eyre::Result<String> {
    let mut person = Person::new("taxpayer", "Tax", "Payer");
    person.scottish_taxpayer = request.scottish;
    if let Some(allowance) = request.personal_allowance {
        person.personal_allowance = allowance;
    }
    person.validate(jiff::civil::date(2024, 4, 6))?;

    let config = UkTaxConfig::default();
    let result = calculate_total_tax(&person, &request.income, &config);
    let efficiency = calculate_tax_efficiency(&person, &result, &config);

    let mut out = String::new();
    writeln!(out, "Gross income:       {:.2}", result.gross_income)?;
    writeln!(out, "Taxable income:     {:.2}", result.taxable_income)?;
    writeln!(out, "Income tax:         {:.2}", result.income_tax)?;
    writeln!(out, "National Insurance: {:.2}", result.national_insurance)?;
    writeln!(out, "Capital gains tax:  {:.2}", result.capital_gains_tax)?;
    writeln!(out, "Total tax:          {:.2}", result.total_tax)?;
    writeln!(out, "Net income:         {:.2}", result.net_income())?;
    writeln!(out, "Effective rate:     {:.2}%", result.effective_rate * 100.0)?;
    writeln!(out, "Marginal rate:      {:.0}%", efficiency.marginal_rate * 100.0)?;
    Ok(out)
}

pub fn list(store: &ScenarioStore) -> color_eyre::Result<String> {
    let names = store.list()?;
    if names.is_empty() {
        return Ok(format!(
            "No scenarios in {} (create one with `ratrace init`)\n",
            store.root().display()
        ));
    }
    let mut out = String::new();
    for name in names {
        writeln!(out, "{name}")?;
    }
    Ok(out)
}
