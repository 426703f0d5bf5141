use crate::{Batch, SortSpec, StoreResult};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

/// A key/value/set store the indexing engine runs on.
///
/// Reads are individual calls. Writes are queued into a [`Batch`] and handed
/// to [`Store::exec`], which must apply them atomically. Union- and
/// intersection-store are the exception: they materialize derived sets
/// that only the query path reads.
pub trait Store: Send + Sync {
    /// Returns the string value at `key`.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Returns the string values at `keys`, in order, `None` for absent keys.
    fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// Returns whether `key` holds any live value.
    fn exists(&self, key: &str) -> StoreResult<bool>;

    /// Returns every field of the hash at `key` (empty if absent).
    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>>;

    /// Returns the members of the set at `key` (empty if absent).
    fn smembers(&self, key: &str) -> StoreResult<BTreeSet<String>>;

    fn sismember(&self, key: &str, member: &str) -> StoreResult<bool>;

    /// Returns the cardinality of the set at `key`.
    fn scard(&self, key: &str) -> StoreResult<usize>;

    /// Stores the union of `sources` at `dest`, returning its cardinality.
    fn sunionstore(&self, dest: &str, sources: &[String]) -> StoreResult<usize>;

    /// Stores the intersection of `sources` at `dest`, returning its cardinality.
    fn sinterstore(&self, dest: &str, sources: &[String]) -> StoreResult<usize>;

    /// Attaches a time-to-live to `key`. Returns false if the key is absent.
    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool>;

    /// Lists every live key starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>>;

    /// Sorts the members of the set at `key` and returns the requested window.
    fn sort(&self, key: &str, spec: &SortSpec) -> StoreResult<Vec<String>>;

    /// Applies every command in `batch`, or none of them.
    fn exec(&self, batch: Batch) -> StoreResult<()>;

    /// Releases the store's resources. Later calls may fail.
    fn quit(&self) -> StoreResult<()> {
        Ok(())
    }
}
