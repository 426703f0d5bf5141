//! Index-set maintenance.
//!
//! An entity key belongs to `x:<type>-<field>:<value>` exactly when its
//! current extraction for `field` includes `value`. New entities only need
//! adds. Existing ones are reconciled: every index set ever created for the
//! field is discovered by prefix, the entity is removed from those whose
//! value it no longer has, and the current values are (re-)added. Adds are
//! idempotent, so values that did not change keep their membership.

use crate::engine::require;
use crate::{ReadModel, ReadModelError, ReadModelResult, keys};
use readmodel_model::{index_values, scalar_string};
use readmodel_store::{Batch, Store};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Queues membership of `entity_key` in the index set of every value.
pub(crate) fn add_index(
    batch: &mut Batch,
    entity_type: &str,
    entity_key: &str,
    field: &str,
    values: &[String],
) {
    for value in values {
        batch.sadd(keys::index_key(entity_type, field, value), entity_key);
    }
}

/// Queues removal of `entity_key` from stale index sets of `field`, then
/// adds it to the sets for `values`.
pub(crate) fn reconcile_index<S: Store + ?Sized>(
    store: &S,
    batch: &mut Batch,
    entity_type: &str,
    entity_key: &str,
    field: &str,
    values: &[String],
) -> ReadModelResult<()> {
    let prefix = keys::index_prefix(entity_type, field);
    let wanted: HashSet<String> = values.iter().map(|v| format!("{prefix}{v}")).collect();

    for existing in store.keys_with_prefix(&prefix)? {
        if !wanted.contains(&existing) {
            debug!(index = %existing, entity = %entity_key, "removing from index");
            batch.srem(existing, entity_key);
        }
    }
    add_index(batch, entity_type, entity_key, field, values);
    Ok(())
}

/// Indexes one entity under one or more externally supplied values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexUpdate {
    pub entity_id: String,
    pub index_name: String,
    /// A scalar, or an array for multi-membership.
    pub value: Value,
}

impl IndexUpdate {
    pub fn new(
        entity_id: impl Into<String>,
        index_name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            entity_id: entity_id.into(),
            index_name: index_name.into(),
            value: value.into(),
        }
    }
}

/// Replaces the full membership of one index value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndexUpdate {
    pub index_name: String,
    pub value: Value,
    pub entity_ids: Vec<String>,
}

impl InvertedIndexUpdate {
    pub fn new<I, T>(index_name: impl Into<String>, value: impl Into<Value>, entity_ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            index_name: index_name.into(),
            value: value.into(),
            entity_ids: entity_ids.into_iter().map(Into::into).collect(),
        }
    }
}

fn require_index_name(name: &str) -> ReadModelResult<()> {
    require("index name", name)?;
    if name.contains(':') {
        return Err(ReadModelError::Validation(format!(
            "index name {name:?} must not contain ':'"
        )));
    }
    Ok(())
}

impl<S: Store> ReadModel<S> {
    /// Maintains "one entity -> many values" membership for an index whose
    /// values do not come from the entity payload.
    ///
    /// Adds if the entity has never been written, otherwise reconciles the
    /// named index exactly as [`set`](Self::set) does for declared fields.
    pub fn set_index(&self, entity_type: &str, update: &IndexUpdate) -> ReadModelResult<()> {
        require("type", entity_type)?;
        require("entity id", &update.entity_id)?;
        require_index_name(&update.index_name)?;
        if update.value.is_null() {
            return Err(ReadModelError::Validation("value required".into()));
        }

        let values = index_values(&update.value);
        let entity_key = keys::entity_key(entity_type, &update.entity_id);
        let mut batch = Batch::new();
        if self.store.exists(&entity_key)? {
            reconcile_index(
                self.store.as_ref(),
                &mut batch,
                entity_type,
                &entity_key,
                &update.index_name,
                &values,
            )?;
        } else {
            add_index(&mut batch, entity_type, &entity_key, &update.index_name, &values);
        }
        self.store.exec(batch)?;
        debug!(entity = %entity_key, index = %update.index_name, values = values.len(), "set index");
        Ok(())
    }

    /// Maintains "one value -> many entities" membership by overwriting the
    /// index set for `(type, index_name, value)` with exactly `entity_ids`.
    pub fn set_inverted_index(
        &self,
        entity_type: &str,
        update: &InvertedIndexUpdate,
    ) -> ReadModelResult<()> {
        require("type", entity_type)?;
        require_index_name(&update.index_name)?;
        let Some(value) = scalar_string(&update.value) else {
            return Err(ReadModelError::Validation("value required".into()));
        };
        if update.entity_ids.is_empty() {
            return Err(ReadModelError::Validation("entity ids cannot be empty".into()));
        }
        for id in &update.entity_ids {
            require("entity id", id)?;
        }

        let index_key = keys::index_key(entity_type, &update.index_name, &value);
        let members = update
            .entity_ids
            .iter()
            .map(|id| keys::entity_key(entity_type, id));
        let mut batch = Batch::new();
        batch.del(index_key.as_str()).sadd_all(index_key.as_str(), members);
        self.store.exec(batch)?;
        debug!(index = %index_key, entities = update.entity_ids.len(), "set inverted index");
        Ok(())
    }
}
