//! Behavioural tests for adjacency-based entity deduplication.

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, path::PathBuf};

use geodict_core::{Deduplicator, EntityRecord, EntitySink, test_support::RecordingSink};

#[derive(Debug, Default)]
struct DedupWorld {
    sink: RefCell<RecordingSink>,
}

#[fixture]
fn world() -> DedupWorld {
    DedupWorld::default()
}

fn parse_records(list: &str) -> Vec<EntityRecord> {
    list.split(',')
        .map(str::trim)
        .map(|entry| {
            let mut parts = entry.split('/');
            let name = parts.next().expect("record name");
            let category = parts.next().expect("record category");
            let subcategory = parts.next().expect("record subcategory");
            EntityRecord::new(name, "OpenStreetMap")
                .expect("valid name")
                .with_category(category, subcategory)
        })
        .collect()
}

#[given("a recording destination")]
fn recording_destination(world: &DedupWorld) {
    world.sink.replace(RecordingSink::default());
}

#[when("the records \"{records}\" are observed")]
fn observe_records(world: &DedupWorld, records: String) {
    let mut sink = world.sink.borrow_mut();
    let mut dedup = Deduplicator::new();
    for record in parse_records(records.trim_matches('"')) {
        dedup
            .observe(&record, |r| sink.create_entity(r))
            .expect("recording sink is infallible");
    }
}

#[then("{count} entities are created")]
fn entity_count(world: &DedupWorld, count: usize) {
    assert_eq!(world.sink.borrow().entities().len(), count);
}

#[then("the entity names are \"{names}\"")]
fn entity_names(world: &DedupWorld, names: String) {
    let expected: Vec<&str> = names.trim_matches('"').split(',').map(str::trim).collect();
    assert_eq!(world.sink.borrow().names(), expected);
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/dedup.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        vec![
            "consecutive identical records share one entity",
            "separated identical records stay distinct",
        ]
    );
}

#[scenario(path = "tests/features/dedup.feature", index = 0)]
fn consecutive_records_collapse(world: DedupWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/dedup.feature", index = 1)]
fn separated_records_stay_distinct(world: DedupWorld) {
    let _ = world;
}
