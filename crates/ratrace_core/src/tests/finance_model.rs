//! Tests for the `FinanceModel` facade

use super::savings_scenario;
use crate::config::{Component, InvestmentPortfolio, InvestmentType, ScenarioBuilder};
use crate::error::SimulationError;
use crate::finance_model::FinanceModel;
use crate::model::{Entity, EntityCategory, EntityId, Event};

#[test]
fn test_query_after_run() {
    let mut model = FinanceModel::new(savings_scenario(12, 100.0, 5_000.0));
    model.run_simulation().unwrap();

    let savings = EntityId::from("savings");
    let first = model.query(&savings, 0).unwrap();
    assert_eq!(first.net_balance(), 5_100.0);
    assert_eq!(first.total_inflow(), 5_000.0);
    assert!(first.inter_flows.is_empty());

    let last = model.query_final(&savings).unwrap();
    assert_eq!(last.net_balance(), 60_100.0);
    assert_eq!(last.net_flow(), 5_000.0);
    assert_eq!(last.inter_flows.len(), 1);

    assert!(model.query(&savings, 12).is_none());
    assert!(model.query(&EntityId::from("missing"), 0).is_none());
    assert_eq!(model.audit().len(), 12);
}

#[test]
fn test_query_before_run_is_empty() {
    let model = FinanceModel::new(savings_scenario(3, 0.0, 1.0));
    assert!(model.query_final(&EntityId::from("savings")).is_none());
    assert_eq!(model.dump().period_count, 0);
}

#[test]
fn test_second_run_requires_reset() {
    let mut model = FinanceModel::new(savings_scenario(3, 0.0, 1.0));
    model.run_simulation().unwrap();
    assert_eq!(
        model.run_simulation(),
        Err(SimulationError::TimelineAlreadyPopulated)
    );

    model.reset();
    assert!(model.audit().is_empty());
    assert!(!model.timeline().has_results());
    model.run_simulation().unwrap();
    assert_eq!(model.audit().len(), 3);
    assert_eq!(model.metrics().periods_processed, 3);
}

#[test]
fn test_retry_after_early_failure_starts_clean() {
    let scenario = ScenarioBuilder::new()
        .periods(2)
        .entity(Entity::new("cash", "Cash").with_initial_value(100.0))
        .event_for("cash", Event::recurring("deposit", 50.0).every_period())
        .event_for("cash", Event::recurring("rent", -500.0).every_period())
        .build();
    let mut model = FinanceModel::new(scenario);

    for _ in 0..2 {
        assert!(matches!(
            model.run_simulation(),
            Err(SimulationError::InsufficientFunds { .. })
        ));
        assert!(!model.timeline().has_results());
        assert_eq!(model.audit().len(), 1);
        assert_eq!(model.metrics().event_applications, 1);
    }
}

#[test]
fn test_reset_drops_created_entities() {
    let scenario = ScenarioBuilder::new()
        .periods(3)
        .entity(Entity::new("parent", "Parent"))
        .event_for(
            "parent",
            Event::creation("spawn", vec![Entity::new("child", "Child").as_template()]).at_period(0),
        )
        .build();
    let mut model = FinanceModel::new(scenario);

    model.run_simulation().unwrap();
    assert_eq!(model.dynamic_entities().len(), 1);
    assert_eq!(model.scenario().initial_entities.len(), 2);

    model.reset();
    assert!(model.dynamic_entities().is_empty());
    assert_eq!(model.scenario().initial_entities.len(), 1);

    model.run_simulation().unwrap();
    assert_eq!(model.scenario().initial_entities.len(), 2);
}

#[test]
fn test_dump_totals() {
    let scenario = ScenarioBuilder::new()
        .name("Household")
        .periods(2)
        .entity(
            Entity::new("cash", "Cash")
                .with_category(EntityCategory::Asset)
                .with_initial_value(1_000.0),
        )
        .entity(
            Entity::new("card", "Credit Card")
                .with_category(EntityCategory::Liability)
                .with_initial_value(-300.0),
        )
        .entity(Entity::new("pay", "Salary").with_category(EntityCategory::Income))
        .entity(Entity::new("bills", "Bills").with_category(EntityCategory::Expense))
        .event_for("cash", Event::recurring("save", 100.0).every_period())
        .event_for("pay", Event::recurring("earn", 2_000.0).every_period())
        .event_for("bills", Event::recurring("spend", 500.0).every_period())
        .component(Component::InvestmentPortfolio(InvestmentPortfolio::new(
            "gia",
            InvestmentType::Bonds,
            0.0,
        )))
        .build();
    let mut model = FinanceModel::new(scenario);
    model.run_simulation().unwrap();

    let dump = model.dump();
    assert_eq!(dump.scenario_name, "Household");
    assert_eq!(dump.period_count, 2);
    assert_eq!(dump.start, Some(jiff::civil::date(2025, 1, 1)));
    assert_eq!(dump.end, Some(jiff::civil::date(2025, 3, 1)));
    assert_eq!(dump.entity_count, 5);
    assert_eq!(dump.components.len(), 1);
    assert_eq!(dump.total_assets, 1_200.0);
    assert_eq!(dump.total_liabilities, 300.0);
    assert_eq!(dump.net_worth, 900.0);
    assert_eq!(dump.total_income, 4_000.0);
    assert_eq!(dump.total_expenses, 1_000.0);
    assert_eq!(dump.net_cash_flow, 3_000.0);

    let cash = dump.entities.iter().find(|l| l.id.as_str() == "cash").unwrap();
    assert_eq!(cash.change, 200.0);

    let text = dump.to_string();
    assert!(text.starts_with("Scenario: Household"));
    assert!(text.contains("Net worth:         900.00"));
    assert!(text.contains("BONDS Portfolio [gia]"));
}
