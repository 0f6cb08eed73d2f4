use std::sync::Arc;

use festival_loader::envelope::Envelope;
use festival_loader::normalize::normalize_time;
use festival_loader::orchestrator::IngestionOrchestrator;
use festival_loader::storage::InMemoryObjectStorage;
use festival_loader::store::{BatchUpserter, InMemoryRecordStore};
use festival_loader::types::{CanonicalRecord, ObjectLocation};
use tempfile::tempdir;

fn record(performer: &str, stage: &str, date: &str, start: &str, popularity: Option<i64>) -> CanonicalRecord {
    CanonicalRecord::new(
        performer,
        stage,
        date,
        normalize_time(start).unwrap(),
        normalize_time("23:59").unwrap(),
        popularity,
    )
}

fn seeded() -> InMemoryRecordStore {
    InMemoryRecordStore::from_records([
        record("The Midnight", "Main", "2025-07-12", "8:00pm", Some(87)),
        record("Khruangbin", "Main", "2025-07-12", "21:30", None),
        record("Men I Trust", "Garden", "2025-07-12", "7:15pm", Some(40)),
        record("Men I Trust", "Main", "2025-07-13", "6:00pm", Some(55)),
        record("Bonobo", "Garden", "2025-07-13", "11:00pm", Some(87)),
    ])
}

fn performers(records: &[CanonicalRecord]) -> Vec<&str> {
    records.iter().map(|r| r.performer()).collect()
}

#[test]
fn point_lookup_by_composite_key() {
    let store = seeded();
    let hit = store.get("Khruangbin", "2025-07-12#21:30#Main").unwrap().unwrap();
    assert_eq!(hit.stage(), "Main");
    assert!(store.get("Khruangbin", "2025-07-12#21:30#Garden").unwrap().is_none());
}

#[test]
fn performer_lookup_returns_every_set_in_performance_order() {
    let store = seeded();
    let sets = store.by_performer("Men I Trust").unwrap();
    let keys: Vec<_> = sets.iter().map(|r| r.performance_key()).collect();
    assert_eq!(keys, ["2025-07-12#19:15#Garden", "2025-07-13#18:00#Main"]);
}

#[test]
fn stage_lookup_is_ordered_and_narrowed_by_prefix() {
    let store = seeded();

    let main = store.by_stage("Main", None).unwrap();
    assert_eq!(performers(&main), ["The Midnight", "Khruangbin", "Men I Trust"]);

    let first_day = store.by_stage("Main", Some("2025-07-12")).unwrap();
    assert_eq!(performers(&first_day), ["The Midnight", "Khruangbin"]);

    let nine_pm = store.by_stage("Main", Some("2025-07-12#21")).unwrap();
    assert_eq!(performers(&nine_pm), ["Khruangbin"]);

    assert!(store.by_stage("Dome", None).unwrap().is_empty());
}

#[test]
fn date_lookup_orders_by_start_time() {
    let store = seeded();
    let day = store.by_date("2025-07-12").unwrap();
    assert_eq!(performers(&day), ["Men I Trust", "The Midnight", "Khruangbin"]);
}

#[test]
fn popularity_index_skips_records_without_popularity() {
    let store = seeded();

    let all = store.popular(None).unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.iter().all(|r| r.performer() != "Khruangbin"));
    assert_eq!(all[0].popularity(), Some(87));
    assert_eq!(all[3].popularity(), Some(40));

    let top = store.popular(Some(80)).unwrap();
    // ties break on the primary key
    assert_eq!(performers(&top), ["Bonobo", "The Midnight"]);
}

#[test]
fn upserts_replace_whole_records() {
    let store = seeded();
    let replacement = record("Khruangbin", "Main", "2025-07-12", "9:30pm", Some(99));

    let written = BatchUpserter::new(&store, 25).upsert(&[replacement]).unwrap();
    assert_eq!(written, 1);
    assert_eq!(store.len(), 5);
    let hit = store.get("Khruangbin", "2025-07-12#21:30#Main").unwrap().unwrap();
    assert_eq!(hit.popularity(), Some(99));
    assert_eq!(hit.popularity_bucket(), Some("POPULARITY"));
}

#[test]
fn snapshot_round_trip_preserves_every_record() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let store = seeded();
    store.save(&path).unwrap();

    let reloaded = InMemoryRecordStore::load(&path).unwrap();
    assert_eq!(reloaded.records().unwrap(), store.records().unwrap());
}

#[test]
fn snapshot_uses_persisted_attribute_names() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    InMemoryRecordStore::from_records([record("Bonobo", "Garden", "2025-07-13", "11:00pm", None)])
        .save(&path)
        .unwrap();

    let items: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let item = &items[0];
    assert_eq!(item["Performance"], "2025-07-13#23:00#Garden");
    assert_eq!(item["DateStart"], "2025-07-13#23:00");
    assert_eq!(item["StartSort"], "23:00");
    assert_eq!(item["StartMinutes"], 1380);
    assert!(item.get("Popularity").is_none());
    assert!(item.get("PopularityBucket").is_none());
}

#[test]
fn missing_snapshot_is_an_empty_store() {
    let dir = tempdir().unwrap();
    let store = InMemoryRecordStore::load(dir.path().join("absent.json")).unwrap();
    assert!(store.is_empty());
}

#[test]
fn tampered_snapshot_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(
        &path,
        r#"[{"Performer":"A","Performance":"wrong","Stage":"Main","Date":"d",
            "StartTime":"20:00","EndTime":"21:00","StartMinutes":1200,"EndMinutes":1260,
            "DateStart":"d#20:00","StartSort":"20:00"}]"#,
    )
    .unwrap();
    assert!(InMemoryRecordStore::load(&path).is_err());
}

#[test]
fn ingested_files_are_queryable() {
    let storage = Arc::new(InMemoryObjectStorage::new().with_object(
        "fest-uploads",
        "lineup_items.json",
        std::fs::read("tests/fixtures/lineup_items.json").unwrap(),
    ));
    let store = Arc::new(InMemoryRecordStore::new());
    IngestionOrchestrator::new(storage, store.clone())
        .run(&Envelope::for_locations(&[ObjectLocation::new(
            "fest-uploads",
            "lineup_items.json",
        )]))
        .unwrap();

    let sets = store.by_performer("Japanese Breakfast").unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(store.popular(None).unwrap().len(), 1);
    assert_eq!(store.by_date("2025-07-14").unwrap()[0].start().hhmm(), "14:00");
}
