//! In-process store backend.
//!
//! Holds strings, hashes, and sets in one keyspace behind a mutex, with lazy
//! expiry against an injectable [`Clock`]. Batches are applied under a single
//! lock hold and rolled back on the first failing command.

use crate::{Batch, Clock, Command, SortSpec, Store, StoreError, StoreResult, SystemClock};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
enum Data {
    Str(String),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

#[derive(Debug, Clone)]
struct Entry {
    data: Data,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(data: Data) -> Self {
        Self {
            data,
            expires_at: None,
        }
    }
}

#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, Entry>,
    closed: bool,
}

impl Keyspace {
    /// Drops `key` if its time-to-live has passed.
    fn purge(&mut self, key: &str, now: Instant) {
        let expired = self
            .entries
            .get(key)
            .and_then(|e| e.expires_at)
            .is_some_and(|at| at <= now);
        if expired {
            self.entries.remove(key);
        }
    }

    fn live(&mut self, key: &str, now: Instant) -> Option<&Entry> {
        self.purge(key, now);
        self.entries.get(key)
    }

    fn set(&mut self, key: &str, now: Instant) -> StoreResult<Option<&BTreeSet<String>>> {
        match self.live(key, now).map(|e| &e.data) {
            None => Ok(None),
            Some(Data::Set(members)) => Ok(Some(members)),
            Some(_) => Err(wrong_type(key, "set")),
        }
    }

    fn set_mut(&mut self, key: &str, now: Instant) -> StoreResult<&mut BTreeSet<String>> {
        self.purge(key, now);
        let entry = self
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::new(Data::Set(BTreeSet::new())));
        match &mut entry.data {
            Data::Set(members) => Ok(members),
            _ => Err(wrong_type(key, "set")),
        }
    }

    fn hash(&mut self, key: &str, now: Instant) -> StoreResult<Option<&BTreeMap<String, String>>> {
        match self.live(key, now).map(|e| &e.data) {
            None => Ok(None),
            Some(Data::Hash(fields)) => Ok(Some(fields)),
            Some(_) => Err(wrong_type(key, "hash")),
        }
    }

    /// Replaces `dest` with `members`; an empty result removes the key.
    fn store_set(&mut self, dest: &str, members: BTreeSet<String>) -> usize {
        let len = members.len();
        if members.is_empty() {
            self.entries.remove(dest);
        } else {
            self.entries
                .insert(dest.to_string(), Entry::new(Data::Set(members)));
        }
        len
    }

    fn apply(&mut self, command: Command, now: Instant) -> StoreResult<()> {
        match command {
            Command::Set { key, value } => {
                self.entries.insert(key, Entry::new(Data::Str(value)));
            }
            Command::Del { key } => {
                self.entries.remove(&key);
            }
            Command::HSet { key, field, value } => {
                self.purge(&key, now);
                let entry = self
                    .entries
                    .entry(key.clone())
                    .or_insert_with(|| Entry::new(Data::Hash(BTreeMap::new())));
                match &mut entry.data {
                    Data::Hash(fields) => {
                        fields.insert(field, value);
                    }
                    _ => return Err(wrong_type(&key, "hash")),
                }
            }
            Command::SAdd { key, members } => {
                if !members.is_empty() {
                    self.set_mut(&key, now)?.extend(members);
                }
            }
            Command::SRem { key, members } => {
                if self.set(&key, now)?.is_none() {
                    return Ok(());
                }
                let set = self.set_mut(&key, now)?;
                for m in &members {
                    set.remove(m);
                }
                if set.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

/// An in-memory [`Store`].
pub struct MemoryStore {
    keyspace: Mutex<Keyspace>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store that reads time from `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            keyspace: Mutex::new(Keyspace::default()),
            clock,
        }
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.keys_with_prefix("")?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Keyspace>> {
        let guard = self
            .keyspace
            .lock()
            .map_err(|e| StoreError::Backend(format!("keyspace lock poisoned: {e}")))?;
        if guard.closed {
            return Err(StoreError::Closed);
        }
        Ok(guard)
    }

    fn combine(
        &self,
        dest: &str,
        sources: &[String],
        op: fn(&BTreeSet<String>, &BTreeSet<String>) -> BTreeSet<String>,
        missing_empties: bool,
    ) -> StoreResult<usize> {
        let now = self.clock.now();
        let mut ks = self.lock()?;
        let mut acc: Option<BTreeSet<String>> = None;
        for source in sources {
            let members = match ks.set(source, now)?.cloned() {
                Some(m) => m,
                None if missing_empties => return Ok(ks.store_set(dest, BTreeSet::new())),
                None => BTreeSet::new(),
            };
            acc = Some(match acc {
                None => members,
                Some(prev) => op(&prev, &members),
            });
        }
        Ok(ks.store_set(dest, acc.unwrap_or_default()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let now = self.clock.now();
        let mut ks = self.lock()?;
        match ks.live(key, now).map(|e| &e.data) {
            None => Ok(None),
            Some(Data::Str(s)) => Ok(Some(s.clone())),
            Some(_) => Err(wrong_type(key, "string")),
        }
    }

    fn mget(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        let now = self.clock.now();
        let mut ks = self.lock()?;
        Ok(keys
            .iter()
            .map(|k| match ks.live(k, now).map(|e| &e.data) {
                Some(Data::Str(s)) => Some(s.clone()),
                _ => None,
            })
            .collect())
    }

    fn exists(&self, key: &str) -> StoreResult<bool> {
        let now = self.clock.now();
        Ok(self.lock()?.live(key, now).is_some())
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        let now = self.clock.now();
        Ok(self.lock()?.hash(key, now)?.cloned().unwrap_or_default())
    }

    fn smembers(&self, key: &str) -> StoreResult<BTreeSet<String>> {
        let now = self.clock.now();
        Ok(self.lock()?.set(key, now)?.cloned().unwrap_or_default())
    }

    fn sismember(&self, key: &str, member: &str) -> StoreResult<bool> {
        let now = self.clock.now();
        Ok(self
            .lock()?
            .set(key, now)?
            .is_some_and(|m| m.contains(member)))
    }

    fn scard(&self, key: &str) -> StoreResult<usize> {
        let now = self.clock.now();
        Ok(self.lock()?.set(key, now)?.map_or(0, BTreeSet::len))
    }

    fn sunionstore(&self, dest: &str, sources: &[String]) -> StoreResult<usize> {
        self.combine(dest, sources, |a, b| a.union(b).cloned().collect(), false)
    }

    fn sinterstore(&self, dest: &str, sources: &[String]) -> StoreResult<usize> {
        self.combine(dest, sources, |a, b| a.intersection(b).cloned().collect(), true)
    }

    fn expire(&self, key: &str, ttl: Duration) -> StoreResult<bool> {
        let now = self.clock.now();
        let mut ks = self.lock()?;
        ks.purge(key, now);
        match ks.entries.get_mut(key) {
            Some(entry) => {
                // a deadline past the clock's range never expires
                entry.expires_at = now.checked_add(ttl);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let now = self.clock.now();
        let mut ks = self.lock()?;
        ks.entries
            .retain(|_, e| e.expires_at.is_none_or(|at| at > now));
        let mut keys: Vec<String> = ks
            .entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }

    fn sort(&self, key: &str, spec: &SortSpec) -> StoreResult<Vec<String>> {
        let now = self.clock.now();
        let mut ks = self.lock()?;
        let members: Vec<String> = ks
            .set(key, now)?
            .map(|m| m.iter().cloned().collect())
            .unwrap_or_default();
        let rows = members
            .into_iter()
            .map(|member| {
                let hash_key = format!("{}{}", spec.hash_prefix, member);
                let weight = match ks.live(&hash_key, now).map(|e| &e.data) {
                    Some(Data::Hash(fields)) => fields.get(&spec.field).cloned(),
                    _ => None,
                };
                (member, weight)
            })
            .collect();
        drop(ks);
        spec.apply(rows)
    }

    fn exec(&self, batch: Batch) -> StoreResult<()> {
        let now = self.clock.now();
        let mut ks = self.lock()?;

        let mut snapshot: HashMap<String, Option<Entry>> = HashMap::new();
        for command in batch.commands() {
            let key = command.key();
            if !snapshot.contains_key(key) {
                ks.purge(key, now);
                snapshot.insert(key.to_string(), ks.entries.get(key).cloned());
            }
        }

        let count = batch.len();
        for command in batch {
            if let Err(e) = ks.apply(command, now) {
                for (key, prior) in snapshot {
                    match prior {
                        Some(entry) => ks.entries.insert(key, entry),
                        None => ks.entries.remove(&key),
                    };
                }
                debug!(error = %e, "batch rolled back");
                return Err(e);
            }
        }
        debug!(commands = count, "batch applied");
        Ok(())
    }

    fn quit(&self) -> StoreResult<()> {
        let mut ks = self.lock()?;
        ks.entries.clear();
        ks.closed = true;
        debug!("memory store closed");
        Ok(())
    }
}
