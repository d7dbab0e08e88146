//! Scenarios assembled from components

use crate::config::{
    Component, InvestmentPortfolio, InvestmentType, RentalProperty, Scenario, ScenarioBuilder,
};
use crate::model::{AssetGroup, EntityId, Person};
use crate::simulation::simulate;
use crate::timeline::PeriodLength;

fn rental() -> RentalProperty {
    RentalProperty::new("flat", 200_000.0)
        .mortgage(150_000.0, 0.05, 25)
        .rent(1_000.0, 0.05)
        .costs(100.0, 0.012, 600.0)
}

fn portfolio() -> InvestmentPortfolio {
    InvestmentPortfolio::new("isa", InvestmentType::Stocks, 10_000.0)
        .contributing(500.0)
        .seeded(3)
}

fn landlord_scenario() -> Scenario {
    ScenarioBuilder::new()
        .name("Landlord")
        .periods(12)
        .component(Component::RentalProperty(rental()))
        .component(Component::InvestmentPortfolio(portfolio()))
        .component(Component::Person(Person::new("me", "Sam", "Taylor")))
        .asset_group(
            AssetGroup::new("Property")
                .with_asset("flat_property")
                .with_liability("flat_mortgage"),
        )
        .build()
}

fn final_balance(run: &crate::simulation::SimulationRun, id: &str) -> f64 {
    run.timeline
        .last_period()
        .and_then(|p| p.final_version(&EntityId::from(id)))
        .map(|v| v.balance)
        .unwrap()
}

#[test]
fn test_components_expand_into_entities() {
    let run = simulate(&landlord_scenario()).unwrap();
    // 6 rental + 2 portfolio + 2 person
    assert_eq!(run.scenario.initial_entities.len(), 10);
    assert!(run.scenario.entity(&EntityId::from("me_tax_calculation")).is_some());
}

#[test]
fn test_rental_accumulates_over_a_year() {
    let run = simulate(&landlord_scenario()).unwrap();
    let property = rental();

    assert!((final_balance(&run, "flat_rent_income") - 950.0 * 12.0).abs() < 1e-6);
    assert!((final_balance(&run, "flat_ancillary_expenses") - 1_200.0).abs() < 1e-6);
    assert!((final_balance(&run, "flat_property_tax") - 2_400.0).abs() < 1e-6);
    assert!((final_balance(&run, "flat_insurance") - 600.0).abs() < 1e-6);
    assert!((final_balance(&run, "flat_property") - 206_000.0).abs() < 1e-6);

    let mortgage = final_balance(&run, "flat_mortgage");
    let expected = -150_000.0 + property.monthly_mortgage_payment() * 12.0;
    assert!(mortgage < 0.0);
    assert!((mortgage - expected).abs() < 1e-6);
}

#[test]
fn test_portfolio_tracks_contributions() {
    let run = simulate(&landlord_scenario()).unwrap();

    assert!((final_balance(&run, "isa_contributions") - 6_000.0).abs() < 1e-6);
    // Positive expected return net of inflation, so the account outgrows its inputs
    assert!(final_balance(&run, "isa_account") > 16_000.0);
}

#[test]
fn test_person_entities_stay_at_allowance() {
    let run = simulate(&landlord_scenario()).unwrap();
    assert_eq!(final_balance(&run, "me_personal_allowance"), 12_570.0);
    assert_eq!(final_balance(&run, "me_tax_calculation"), 0.0);
}

#[test]
fn test_yearly_periods_scale_component_events() {
    let scenario = ScenarioBuilder::new()
        .periods(2)
        .period_length(PeriodLength::Yearly)
        .component(Component::RentalProperty(rental()))
        .build();
    let run = simulate(&scenario).unwrap();

    assert!((final_balance(&run, "flat_rent_income") - 950.0 * 24.0).abs() < 1e-6);
    assert_eq!(run.timeline.periods()[1].start, jiff::civil::date(2026, 1, 1));
}

#[test]
fn test_invalid_component_fails_validation() {
    let scenario = ScenarioBuilder::new()
        .component(Component::RentalProperty(
            RentalProperty::new("bad", 100.0).mortgage(500.0, 0.05, 25),
        ))
        .build();
    assert!(simulate(&scenario).is_err());
}

#[test]
fn test_asset_group_balance_after_run() {
    let run = simulate(&landlord_scenario()).unwrap();
    let group = &run.scenario.asset_groups[0];
    let last = run.timeline.last_period().unwrap();

    let expected = final_balance(&run, "flat_property") + final_balance(&run, "flat_mortgage");
    assert!((group.period_balance(last) - expected).abs() < 1e-6);
}
