//! Tests for entities created during a run
//!
//! Created entities are buffered while a period is processed and merged
//! afterwards, so they take part from the next period on.

use crate::config::{Scenario, ScenarioBuilder};
use crate::model::{Entity, EntityId, Event, EventId};
use crate::simulation::simulate;

fn loan_scenario(creation: Event) -> Scenario {
    ScenarioBuilder::new()
        .periods(4)
        .entity(Entity::new("parent", "Parent").with_initial_value(1_000.0))
        .event_for("parent", creation)
        .event_for("loan", Event::recurring("loan_interest", 10.0).every_period())
        .build()
}

fn loan_template() -> Entity {
    Entity::new("loan", "Loan")
        .with_initial_value(500.0)
        .as_template()
}

#[test]
fn test_created_entity_joins_next_period() {
    let scenario = loan_scenario(Event::creation("spawn", vec![loan_template()]).at_period(1));
    let run = simulate(&scenario).unwrap();
    let loan = EntityId::from("loan");
    let periods = run.timeline.periods();

    assert!(periods[0].chain(&loan).is_none());
    assert!(periods[1].chain(&loan).is_none());

    let chain = periods[2].chain(&loan).unwrap();
    assert_eq!(chain[0].balance, 500.0);
    assert_eq!(chain[0].sequence, 0);
    assert_eq!(chain[0].date, periods[2].start);
    assert_eq!(chain[1].balance, 510.0);
    assert!(periods[2].inter_period_flows(&loan).is_empty());

    assert_eq!(periods[3].final_version(&loan).unwrap().balance, 520.0);
    assert_eq!(periods[3].inter_period_flows(&loan).len(), 1);
}

#[test]
fn test_merged_entity_is_not_a_template() {
    let scenario = loan_scenario(Event::creation("spawn", vec![loan_template()]).at_period(0));
    let run = simulate(&scenario).unwrap();

    assert_eq!(run.dynamic_entities.len(), 1);
    assert!(!run.dynamic_entities[0].is_template);
    let merged = run.scenario.entity(&EntityId::from("loan")).unwrap();
    assert!(!merged.is_template);
    assert_eq!(run.metrics.entities_created, 1);
}

#[test]
fn test_repeated_creation_is_merged_once() {
    let scenario = loan_scenario(Event::creation("spawn", vec![loan_template()]).every_period());
    let run = simulate(&scenario).unwrap();

    assert_eq!(run.dynamic_entities.len(), 1);
    let count = run
        .scenario
        .initial_entities
        .iter()
        .filter(|e| e.id.as_str() == "loan")
        .count();
    assert_eq!(count, 1);
}

#[test]
fn test_creation_is_audited_as_no_op() {
    let scenario = loan_scenario(Event::creation("spawn", vec![loan_template()]).at_period(0));
    let run = simulate(&scenario).unwrap();

    let spawn = EventId::from("spawn");
    let records: Vec<_> = run.audit.for_event(&spawn).collect();
    assert_eq!(records.len(), 1);
    assert!(!records[0].changed);
    assert_eq!(records[0].event_type, "creation");

    // Parent chain holds only the carry-in
    let parent = EntityId::from("parent");
    assert_eq!(run.timeline.periods()[0].chain(&parent).unwrap().len(), 1);

    // Loan events applied in periods 1..=3
    assert_eq!(run.audit.for_entity(&EntityId::from("loan")).count(), 3);
}
