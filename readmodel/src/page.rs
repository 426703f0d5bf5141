//! Sorting, paging, and payload resolution for queries.

use crate::query::{Criteria, ResultSetPlan};
use crate::{ReadModel, ReadModelError, ReadModelResult, keys};
use readmodel_store::{SortOrder, SortSpec, Store};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Requested ordering. `field: None` means the type's default sort field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: Option<String>,
    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            order: SortOrder::Desc,
        }
    }

    /// Parses the `{"<field>": 1 | -1}` shape; `-1` is descending.
    /// An empty object selects the default field, ascending. Only the first
    /// key as written is used.
    pub fn from_json(value: &Value) -> ReadModelResult<Self> {
        let Value::Object(map) = value else {
            return Err(ReadModelError::Validation("sort must be an object".into()));
        };
        Ok(match map.iter().next() {
            None => Self::default(),
            Some((field, dir)) if dir.as_i64() == Some(-1) => Self::desc(field.as_str()),
            Some((field, _)) => Self::asc(field.as_str()),
        })
    }
}

/// Requested page window. Zero means "use the default" for either field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Paging {
    pub page_number: usize,
    pub page_size: usize,
}

impl Paging {
    pub fn new(page_number: usize, page_size: usize) -> Self {
        Self {
            page_number,
            page_size,
        }
    }

    /// Returns `(offset, count)` with defaults applied.
    fn window(&self, default_page_size: usize) -> (usize, usize) {
        let size = if self.page_size == 0 {
            default_page_size
        } else {
            self.page_size
        };
        let number = self.page_number.max(1);
        ((number - 1).saturating_mul(size), size)
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T = Value> {
    pub items: Vec<T>,
    /// Size of the whole result set before paging.
    pub total: usize,
}

impl<S: Store> ReadModel<S> {
    /// Returns one sorted page of the entities matching `criteria`, plus the
    /// total number of matches.
    pub fn get(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        sort: &Sort,
        paging: Paging,
    ) -> ReadModelResult<Page> {
        let ty = self.registered(entity_type)?;
        let plan = ResultSetPlan::compile(entity_type, criteria)?;

        let field = sort.field.as_deref().unwrap_or(&ty.default_sort_field);
        let Some(alpha) = ty.sort_mode(field) else {
            return Err(ReadModelError::UnknownSortField {
                entity_type: entity_type.to_string(),
                field: field.to_string(),
            });
        };
        let (offset, count) = paging.window(self.config.page_size);

        debug!(key = %plan.key, "get");
        let (result_key, total) = self.materialize(&plan)?;

        let spec = SortSpec::by_hash_field(keys::HASH_PREFIX, field)
            .alpha(alpha)
            .order(sort.order)
            .limit(offset, count);
        debug!(key = %result_key, field, alpha, order = ?sort.order, offset, count, "sort");
        let sorted = self.store.sort(&result_key, &spec);
        if !self.config.caches_results() {
            self.discard(&plan)?;
        }
        let entity_keys = sorted?;
        debug!(found = entity_keys.len(), "found items");

        let items = self.resolve(&entity_keys)?;
        Ok(Page { items, total })
    }

    /// Typed variant of [`get`](Self::get).
    pub fn get_as<T: DeserializeOwned>(
        &self,
        entity_type: &str,
        criteria: &Criteria,
        sort: &Sort,
        paging: Paging,
    ) -> ReadModelResult<Page<T>> {
        let page = self.get(entity_type, criteria, sort, paging)?;
        let items = page
            .items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<_, _>>()?;
        Ok(Page {
            items,
            total: page.total,
        })
    }

    /// Bulk-fetches payloads in order. Keys deleted since the result set was
    /// materialized are skipped.
    fn resolve(&self, entity_keys: &[String]) -> ReadModelResult<Vec<Value>> {
        if entity_keys.is_empty() {
            return Ok(Vec::new());
        }
        let raw = self.store.mget(entity_keys)?;
        let mut items = Vec::with_capacity(raw.len());
        for (key, payload) in entity_keys.iter().zip(raw) {
            match payload {
                Some(json) => items.push(serde_json::from_str(&json)?),
                None => warn!(entity = %key, "result references a missing entity"),
            }
        }
        Ok(items)
    }
}
