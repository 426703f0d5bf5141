//! Criteria and result-set planning.
//!
//! Each criterion names an index field and one or more values. Several
//! values become *union* sources (match any), a single value becomes an
//! *intersection* source (must match). Unions are materialized first into
//! one temporary set, which then joins the intersection sources. Every
//! materialized set is named after its sources and kept for the configured
//! TTL, so identical queries inside that window reuse it. A TTL of zero
//! disables reuse: sets are built per query and dropped after sorting.

use crate::{ReadModel, ReadModelError, ReadModelResult, keys};
use readmodel_model::index_values;
use readmodel_store::{Batch, Store};
use serde_json::Value;
use tracing::debug;

/// Ordered field -> value(s) criteria.
///
/// Order only affects the name of the cached result set, never its contents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    entries: Vec<(String, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires `field` to equal `value`. An array value means "any of".
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((field.into(), value.into()));
        self
    }

    /// Requires `field` to equal at least one of `values`.
    pub fn any_of<I, V>(self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        self.eq(field, Value::Array(values))
    }

    /// Builds criteria from a JSON object such as `{"make": "Ford", "year": [99, 100]}`,
    /// keeping the keys in the order written.
    pub fn from_json(value: &Value) -> ReadModelResult<Self> {
        let Value::Object(map) = value else {
            return Err(ReadModelError::Validation("criteria must be an object".into()));
        };
        Ok(Self {
            entries: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Store operations needed to produce a query's result set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResultSetPlan {
    pub(crate) unions: Vec<String>,
    pub(crate) intersections: Vec<String>,
    /// Canonical name of the union of `unions`.
    pub(crate) unions_key: String,
    /// Canonical name of the final result.
    pub(crate) key: String,
}

impl ResultSetPlan {
    pub(crate) fn compile(entity_type: &str, criteria: &Criteria) -> ReadModelResult<Self> {
        if criteria.is_empty() {
            return Err(ReadModelError::EmptyCriteria);
        }

        let mut unions: Vec<String> = Vec::new();
        let mut intersections: Vec<String> = Vec::new();
        for (field, value) in &criteria.entries {
            if field.is_empty() {
                return Err(ReadModelError::Validation("criteria field name required".into()));
            }
            let values = index_values(value);
            let target = match values.len() {
                0 => {
                    return Err(ReadModelError::Validation(format!(
                        "criterion {field} has no values"
                    )));
                }
                1 => &mut intersections,
                _ => &mut unions,
            };
            for v in values {
                let key = keys::index_key(entity_type, field, &v);
                if !target.contains(&key) {
                    target.push(key);
                }
            }
        }

        let unions_key = plan_segment('u', &unions);
        let key = format!("{unions_key}{}", plan_segment('i', &intersections));

        Ok(Self {
            unions,
            intersections,
            unions_key,
            key,
        })
    }
}

/// Encodes one group of sources as `<tag>[<len>:<key>...]`.
///
/// Length prefixes keep distinct source lists from sharing a name even when
/// index values contain separator characters.
fn plan_segment(tag: char, sources: &[String]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let mut out = format!("{tag}[");
    for source in sources {
        out.push_str(&format!("{}:{source}", source.len()));
    }
    out.push(']');
    out
}

impl<S: Store> ReadModel<S> {
    /// Produces the result set for `plan`, returning its key and cardinality.
    pub(crate) fn materialize(&self, plan: &ResultSetPlan) -> ReadModelResult<(String, usize)> {
        if plan.unions.is_empty() {
            let key = keys::result_key(&plan.key);
            let total = self.make_intersection(&key, &plan.intersections)?;
            return Ok((key, total));
        }

        let union_key = keys::result_key(&plan.unions_key);
        let union_total = self.make_union(&union_key, &plan.unions)?;
        if plan.intersections.is_empty() {
            return Ok((union_key, union_total));
        }

        let mut sources = plan.intersections.clone();
        sources.push(union_key);
        let key = keys::result_key(&plan.key);
        let total = self.make_intersection(&key, &sources)?;
        Ok((key, total))
    }

    /// Removes the sets `materialize` built for `plan`. Only needed when
    /// results are not cached.
    pub(crate) fn discard(&self, plan: &ResultSetPlan) -> ReadModelResult<()> {
        let mut batch = Batch::new();
        if !plan.unions.is_empty() {
            batch.del(keys::result_key(&plan.unions_key));
        }
        batch.del(keys::result_key(&plan.key));
        self.store.exec(batch)?;
        Ok(())
    }

    fn make_union(&self, key: &str, sources: &[String]) -> ReadModelResult<usize> {
        let cached = self.config.caches_results();
        if cached && self.store.exists(key)? {
            debug!(key, "using existing union");
            return Ok(self.store.scard(key)?);
        }
        let total = self.store.sunionstore(key, sources)?;
        if cached {
            self.store.expire(key, self.config.temp_set_ttl())?;
        }
        Ok(total)
    }

    fn make_intersection(&self, key: &str, sources: &[String]) -> ReadModelResult<usize> {
        let cached = self.config.caches_results();
        if cached && self.store.exists(key)? {
            debug!(key, "using existing intersection");
            return Ok(self.store.scard(key)?);
        }
        let total = self.store.sinterstore(key, sources)?;
        if cached {
            self.store.expire(key, self.config.temp_set_ttl())?;
        }
        Ok(total)
    }
}
