//! Serde round trips of scenarios and run output

use crate::config::{Component, InvestmentPortfolio, InvestmentType, RentalProperty, Scenario, ScenarioBuilder};
use crate::model::{
    BalanceCondition, CalculationRule, Entity, EntityCategory, EntityId, Event, EventKind, Person,
    Schedule,
};
use crate::simulation::simulate;
use crate::timeline::PeriodLength;

fn full_scenario() -> Scenario {
    ScenarioBuilder::new()
        .name("Everything")
        .start(2024, 4, 6)
        .period_length(PeriodLength::Quarterly)
        .periods(4)
        .entity(
            Entity::new("current", "Current Account")
                .with_category(EntityCategory::Asset)
                .with_initial_value(2_500.0)
                .with_property("bank", "Example Bank")
                .with_property("overdraft", 500.0),
        )
        .event_for("current", Event::recurring("wage", 3_000.0).labeled("salary").every_period())
        .event_for(
            "current",
            Event::conditional("sweep", BalanceCondition::GreaterThanOrEqual(10_000.0), -1_000.0)
                .every_period(),
        )
        .event_for(
            "current",
            Event::calculation("tier", CalculationRule::default()).every_period(),
        )
        .latent_event(
            Event::creation("open_isa", vec![Entity::new("isa", "ISA").as_template()])
                .targeting("current")
                .at_period(2),
        )
        .template("isa", Entity::new("isa", "ISA").as_template())
        .component(Component::RentalProperty(RentalProperty::new("flat", 150_000.0).rent(800.0, 0.0)))
        .component(Component::InvestmentPortfolio(
            InvestmentPortfolio::new("btc", InvestmentType::Crypto, 1_000.0).seeded(9),
        ))
        .component(Component::Person(Person::new("me", "Jo", "Bloggs")))
        .build()
}

#[test]
fn test_scenario_json_round_trip() {
    let scenario = full_scenario();
    let json = serde_json::to_string_pretty(&scenario).unwrap();
    let back: Scenario = serde_json::from_str(&json).unwrap();

    assert_eq!(back, scenario);
    assert_eq!(back.event_count(), scenario.event_count());
    assert_eq!(back.components.len(), 3);

    let templates = &back.event_templates[&EntityId::from("current")];
    assert!(matches!(templates[0].kind, EventKind::Recurring(_)));
    assert!(matches!(templates[1].kind, EventKind::Conditional(_)));
    assert!(matches!(templates[2].kind, EventKind::Calculation(_)));
    assert!(matches!(back.latent_events[0].kind, EventKind::Creation(_)));
    assert_eq!(back.latent_events[0].schedule, Schedule::AtPeriod(2));
}

#[test]
fn test_round_tripped_scenario_runs_identically() {
    let scenario = full_scenario();
    let json = serde_json::to_string(&scenario).unwrap();
    let back: Scenario = serde_json::from_str(&json).unwrap();

    let a = simulate(&scenario).unwrap();
    let b = simulate(&back).unwrap();
    assert_eq!(a.timeline, b.timeline);
    assert_eq!(a.audit, b.audit);
}

#[test]
fn test_minimal_document_uses_defaults() {
    let json = r#"{
        "initial_entities": [
            { "id": "cash", "name": "Cash", "initial_value": 10.0 }
        ]
    }"#;
    let scenario: Scenario = serde_json::from_str(json).unwrap();

    assert_eq!(scenario.name, "Untitled Scenario");
    assert_eq!(scenario.num_periods, 12);
    assert_eq!(scenario.period_length, PeriodLength::Monthly);
    assert_eq!(scenario.start_date, jiff::civil::date(2025, 1, 1));
    assert_eq!(scenario.initial_entities[0].category, EntityCategory::Other);
    assert!(scenario.validate().is_ok());
}

#[test]
fn test_component_tag_in_json() {
    let component = Component::InvestmentPortfolio(InvestmentPortfolio::new(
        "isa",
        InvestmentType::Bonds,
        100.0,
    ));
    let value = serde_json::to_value(&component).unwrap();
    assert_eq!(value["component"], "investment_portfolio");
    assert_eq!(value["investment_type"], "bonds");
}
