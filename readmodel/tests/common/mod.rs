#![allow(dead_code)]

use readmodel::{EntityTypeSpec, IndexField, MemoryStore, ReadModel, ReadModelConfig, SortField};
use readmodel_store::{Batch, SortSpec, Store, StoreResult};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// The `car` type used across the engine tests.
pub fn car_spec() -> EntityTypeSpec {
    EntityTypeSpec::new()
        .id_field("id")
        .index(IndexField::new("priceRange"))
        .index(IndexField::computed("year", |e| e["yearOfManufacture"].clone()))
        .index(IndexField::computed("featureId", |e| e["featureIds"].clone()))
        .sort(SortField::alpha("make"))
        .sort(SortField::numeric("price"))
        .default_sort("make")
}

pub fn car(id: u32, price_range: &str, year: u32, price: u32, make: &str, features: &[u32]) -> Value {
    json!({
        "id": id,
        "priceRange": price_range,
        "yearOfManufacture": year,
        "price": price,
        "make": make,
        "featureIds": features,
    })
}

pub fn engine() -> ReadModel {
    init_tracing();
    let mut rm = ReadModel::new(ReadModelConfig::default());
    rm.register("car", car_spec()).unwrap();
    rm
}

pub fn engine_on<S: Store>(store: Arc<S>) -> ReadModel<S> {
    init_tracing();
    let mut rm = ReadModel::with_store(store, ReadModelConfig::default());
    rm.register("car", car_spec()).unwrap();
    rm
}

pub fn members(rm: &ReadModel<impl Store>, key: &str) -> BTreeSet<String> {
    rm.store().smembers(key).unwrap()
}

pub fn set_of(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Delegating store that counts union/intersection materializations.
pub struct CountingStore {
    inner: MemoryStore,
    materializations: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            materializations: AtomicUsize::new(0),
        }
    }

    pub fn materializations(&self) -> usize {
        self.materializations.load(Ordering::SeqCst)
    }
}

impl Store for CountingStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        self.inner.mget(keys)
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        self.inner.exists(key)
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        self.inner.hgetall(key)
    }

    fn smembers(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        self.inner.smembers(key)
    }

    fn sismember(&self, key: &str, member: &str) -> StoreResult<bool> {
        self.inner.sismember(key, member)
    }

    fn scard(&self, key: &str) -> StoreResult<usize> {
        self.inner.scard(key)
    }

    fn sunionstore(&self, dest: &str, sources: &[String]) -> StoreResult<usize> {
        self.materializations.fetch_add(1, Ordering::SeqCst);
        self.inner.sunionstore(dest, sources)
    }

    fn sinterstore(&self, dest: &str, sources: &[String]) -> StoreResult<usize> {
        self.materializations.fetch_add(1, Ordering::SeqCst);
        self.inner.sinterstore(dest, sources)
    }

    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        self.inner.expire(key, ttl)
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        self.inner.keys_with_prefix(prefix)
    }

    fn sort(&self, key: &str, spec: &SortSpec) -> StoreResult<Vec<String>> {
        self.inner.sort(key, spec)
    }

    fn exec(&self, batch: Batch) -> StoreResult<()> {
        self.inner.exec(batch)
    }
}
