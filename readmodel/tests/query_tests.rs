mod common;

use common::{CountingStore, car, car_spec, engine, engine_on, init_tracing};
use pretty_assertions::assert_eq;
use readmodel::{
    Criteria, EntityTypeSpec, IndexField, MemoryStore, Page, Paging, ReadModel, ReadModelConfig,
    ReadModelError, Sort, SortField, Store,
};
use readmodel_store::ManualClock;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn ids(page: &Page) -> Vec<u64> {
    page.items
        .iter()
        .map(|e| e["id"].as_u64().unwrap_or_default())
        .collect()
}

fn seeded() -> ReadModel {
    let rm = engine();
    rm.set("car", &car(1, "low", 99, 10, "Honda", &[1, 2])).unwrap();
    rm.set("car", &car(2, "low", 100, 20, "Audi", &[2, 3])).unwrap();
    rm.set("car", &car(3, "high", 99, 30, "Ford", &[3])).unwrap();
    rm.set("car", &car(4, "high", 100, 5, "BMW", &[4])).unwrap();
    rm
}

fn query(rm: &ReadModel, criteria: Criteria) -> Page {
    rm.get("car", &criteria, &Sort::default(), Paging::default())
        .unwrap()
}

// ── Criteria semantics ───────────────────────────────────────────

#[test]
fn single_value_matches_exactly() {
    let rm = seeded();
    let page = query(&rm, Criteria::new().eq("priceRange", "low"));
    assert_eq!(page.total, 2);
    // default sort: make, alpha ascending
    assert_eq!(ids(&page), vec![2, 1]);
}

#[test]
fn multiple_values_are_a_union() {
    let rm = seeded();
    let page = query(&rm, Criteria::new().any_of("featureId", [1, 4]));
    assert_eq!(page.total, 2);
    assert_eq!(ids(&page), vec![4, 1]);
}

#[test]
fn multiple_fields_are_an_intersection() {
    let rm = seeded();
    let page = query(&rm, Criteria::new().eq("priceRange", "high").eq("year", 99));
    assert_eq!(page.total, 1);
    assert_eq!(ids(&page), vec![3]);
}

#[test]
fn union_filtered_by_intersection() {
    let rm = seeded();
    let criteria = Criteria::new().any_of("featureId", [2, 3]).eq("year", 99);
    let page = query(&rm, criteria);
    assert_eq!(page.total, 2);
    assert_eq!(ids(&page), vec![3, 1]);
}

#[test]
fn single_element_list_is_an_intersection() {
    let rm = seeded();
    let page = query(&rm, Criteria::new().any_of("featureId", [3]).eq("priceRange", "low"));
    assert_eq!(ids(&page), vec![2]);
}

#[test]
fn criteria_from_json() {
    let rm = seeded();
    let criteria = Criteria::from_json(&json!({"featureId": [1, 3], "priceRange": "low"})).unwrap();
    let page = query(&rm, criteria);
    assert_eq!(ids(&page), vec![2, 1]);
}

#[test]
fn no_match_is_empty_page() {
    let rm = seeded();
    let page = query(&rm, Criteria::new().eq("priceRange", "none"));
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());
}

#[test]
fn query_sees_updates_after_cache_expiry() {
    let clock = Arc::new(ManualClock::new());
    let rm = engine_on(Arc::new(MemoryStore::with_clock(clock.clone())));
    rm.set("car", &car(1, "low", 99, 10, "Honda", &[])).unwrap();

    let criteria = Criteria::new().eq("priceRange", "low");
    let total = |rm: &ReadModel| rm.get("car", &criteria, &Sort::default(), Paging::default()).unwrap().total;
    assert_eq!(total(&rm), 1);

    rm.set("car", &car(2, "low", 99, 10, "Kia", &[])).unwrap();
    // cached result is still within its TTL
    assert_eq!(total(&rm), 1);

    clock.advance(Duration::from_secs(5));
    assert_eq!(total(&rm), 2);
}

#[test]
fn deleted_entities_drop_out_of_pages() {
    let rm = seeded();
    rm.delete("car", "1").unwrap();
    let page = query(&rm, Criteria::new().eq("year", 100));
    assert_eq!(ids(&page), vec![2, 4]);
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn empty_criteria_rejected() {
    let rm = seeded();
    let err = rm
        .get("car", &Criteria::new(), &Sort::default(), Paging::default())
        .unwrap_err();
    assert!(matches!(err, ReadModelError::EmptyCriteria));
}

#[test]
fn unknown_sort_field_rejected() {
    let rm = seeded();
    let err = rm
        .get(
            "car",
            &Criteria::new().eq("priceRange", "low"),
            &Sort::asc("colour"),
            Paging::default(),
        )
        .unwrap_err();
    assert!(
        matches!(err, ReadModelError::UnknownSortField { ref field, .. } if field == "colour")
    );
    // nothing was materialized
    assert!(rm.store().keys_with_prefix("q:").unwrap().is_empty());
}

#[test]
fn unregistered_type_rejected() {
    let rm = seeded();
    let err = rm
        .get("boat", &Criteria::new().eq("a", 1), &Sort::default(), Paging::default())
        .unwrap_err();
    assert!(matches!(err, ReadModelError::NotRegistered(_)));
}

// ── Sort and paging ──────────────────────────────────────────────

fn hundred() -> ReadModel {
    let rm = engine();
    for i in 1..=100u32 {
        // zero-padded so lexical order matches numeric order
        let make = format!("make-{i:03}");
        rm.set("car", &car(i, "all", 99, 1000 - i, &make, &[])).unwrap();
    }
    rm
}

fn all(rm: &ReadModel, sort: Sort, paging: Paging) -> Page {
    rm.get("car", &Criteria::new().eq("priceRange", "all"), &sort, paging)
        .unwrap()
}

#[test]
fn first_page_of_ten() {
    let rm = hundred();
    let page = all(&rm, Sort::default(), Paging::new(1, 10));
    assert_eq!(page.total, 100);
    assert_eq!(ids(&page), (1..=10).collect::<Vec<u64>>());
}

#[test]
fn second_page_of_twenty() {
    let rm = hundred();
    let page = all(&rm, Sort::asc("make"), Paging::new(2, 20));
    assert_eq!(ids(&page), (21..=40).collect::<Vec<u64>>());
}

#[test]
fn descending_reverses_order() {
    let rm = hundred();
    let page = all(&rm, Sort::desc("make"), Paging::new(1, 10));
    assert_eq!(ids(&page), (91..=100).rev().collect::<Vec<u64>>());
}

#[test]
fn numeric_sort_field() {
    let rm = hundred();
    // price = 1000 - id, so ascending price is descending id
    let page = all(&rm, Sort::asc("price"), Paging::new(1, 3));
    assert_eq!(ids(&page), vec![100, 99, 98]);
}

#[test]
fn default_page_size_applies() {
    let rm = hundred();
    let page = all(&rm, Sort::default(), Paging::default());
    assert_eq!(page.items.len(), 10);
}

#[test]
fn page_past_the_end_is_empty() {
    let rm = hundred();
    let page = all(&rm, Sort::default(), Paging::new(11, 10));
    assert!(page.items.is_empty());
    assert_eq!(page.total, 100);
}

#[test]
fn sort_from_json_descending() {
    let rm = hundred();
    let sort = Sort::from_json(&json!({"make": -1})).unwrap();
    let page = all(&rm, sort, Paging::new(1, 1));
    assert_eq!(ids(&page), vec![100]);
}

#[test]
fn computed_sort_field() {
    let mut rm = engine();
    rm.register(
        "book",
        EntityTypeSpec::new()
            .id_field("isbn")
            .index(IndexField::new("shelf"))
            .sort(SortField::alpha("author").from_source("/author/last"))
            .default_sort("author"),
    )
    .unwrap();
    for (isbn, last) in [("1", "Woolf"), ("2", "Austen"), ("3", "Eliot")] {
        rm.set("book", &json!({"isbn": isbn, "shelf": "a", "author": {"last": last}}))
            .unwrap();
    }
    let page = rm
        .get("book", &Criteria::new().eq("shelf", "a"), &Sort::default(), Paging::default())
        .unwrap();
    let authors: Vec<&Value> = page.items.iter().map(|b| &b["author"]["last"]).collect();
    assert_eq!(authors, vec!["Austen", "Eliot", "Woolf"]);
}

#[test]
fn typed_results() {
    #[derive(Debug, Deserialize)]
    struct Car {
        id: u32,
        make: String,
    }

    let rm = seeded();
    let page = rm
        .get_as::<Car>(
            "car",
            &Criteria::new().eq("priceRange", "high"),
            &Sort::desc("make"),
            Paging::default(),
        )
        .unwrap();
    let makes: Vec<(u32, &str)> = page.items.iter().map(|c| (c.id, c.make.as_str())).collect();
    assert_eq!(makes, vec![(3, "Ford"), (4, "BMW")]);
}

// ── Result-set caching ───────────────────────────────────────────

fn counting() -> (Arc<ManualClock>, Arc<CountingStore>, ReadModel<CountingStore>) {
    let clock = Arc::new(ManualClock::new());
    let store = Arc::new(CountingStore::new(MemoryStore::with_clock(clock.clone())));
    let rm = engine_on(store.clone());
    rm.set("car", &car(1, "low", 99, 10, "Honda", &[1, 2])).unwrap();
    rm.set("car", &car(2, "low", 100, 20, "Audi", &[2, 3])).unwrap();
    (clock, store, rm)
}

fn run(rm: &ReadModel<CountingStore>, criteria: &Criteria) -> Page {
    rm.get("car", criteria, &Sort::default(), Paging::default())
        .unwrap()
}

#[test]
fn identical_queries_reuse_materialized_sets() {
    let (clock, store, rm) = counting();
    let criteria = Criteria::new().any_of("featureId", [1, 3]).eq("priceRange", "low");

    let first = run(&rm, &criteria);
    assert_eq!(store.materializations(), 2);

    clock.advance(Duration::from_secs(2));
    let second = run(&rm, &criteria);
    assert_eq!(store.materializations(), 2);
    assert_eq!(first, second);

    clock.advance(Duration::from_secs(3));
    let third = run(&rm, &criteria);
    assert_eq!(store.materializations(), 4);
    assert_eq!(third.total, 2);
}

#[test]
fn cache_entries_expire() {
    let (clock, store, rm) = counting();
    run(&rm, &Criteria::new().eq("priceRange", "low"));
    assert_eq!(store.keys_with_prefix("q:").unwrap().len(), 1);
    clock.advance(Duration::from_secs(5));
    assert!(store.keys_with_prefix("q:").unwrap().is_empty());
}

#[test]
fn cache_keys_do_not_disturb_index_discovery() {
    let (_clock, _store, rm) = counting();
    run(&rm, &Criteria::new().any_of("featureId", [1, 2]));
    rm.set("car", &car(1, "low", 99, 10, "Honda", &[3])).unwrap();
    for key in rm.store().keys_with_prefix("x:car-featureId:").unwrap() {
        assert!(!key.contains('_'), "cache entry leaked into index namespace: {key}");
    }
}

#[test]
fn separator_characters_in_values_get_their_own_cache_entry() {
    let rm = engine();
    rm.set("car", &car(1, "a", 99, 1, "Audi", &[])).unwrap();
    rm.set("car", &car(2, "b", 99, 2, "BMW", &[])).unwrap();
    rm.set("car", &car(3, "a_x:car-priceRange:b", 99, 3, "Kia", &[])).unwrap();

    let union = query(&rm, Criteria::new().any_of("priceRange", ["a", "b"]));
    assert_eq!(ids(&union), vec![1, 2]);

    let single = query(&rm, Criteria::new().eq("priceRange", "a_x:car-priceRange:b"));
    assert_eq!(single.total, 1);
    assert_eq!(ids(&single), vec![3]);
}

// ── TTL configuration ────────────────────────────────────────────

fn configured(temp_set_ttl_secs: u64) -> ReadModel {
    init_tracing();
    let mut rm = ReadModel::new(ReadModelConfig {
        temp_set_ttl_secs,
        ..ReadModelConfig::default()
    });
    rm.register("car", car_spec()).unwrap();
    rm.set("car", &car(1, "low", 99, 10, "Honda", &[1, 2])).unwrap();
    rm.set("car", &car(2, "low", 100, 20, "Audi", &[2, 3])).unwrap();
    rm
}

#[test]
fn zero_ttl_returns_full_pages_without_caching() {
    let rm = configured(0);
    let criteria = Criteria::new().any_of("featureId", [1, 3]).eq("priceRange", "low");
    let page = query(&rm, criteria.clone());
    assert_eq!(page.total, 2);
    assert_eq!(ids(&page), vec![2, 1]);
    assert!(rm.store().keys_with_prefix("q:").unwrap().is_empty());

    rm.set("car", &car(3, "low", 99, 30, "Ford", &[1])).unwrap();
    let page = query(&rm, criteria);
    assert_eq!(ids(&page), vec![2, 3, 1]);
}

#[test]
fn unbounded_ttl_keeps_results() {
    let rm = configured(u64::MAX);
    let page = query(&rm, Criteria::new().eq("priceRange", "low"));
    assert_eq!(page.total, 2);
    assert_eq!(ids(&page), vec![2, 1]);
    assert_eq!(rm.store().keys_with_prefix("q:").unwrap().len(), 1);
}
