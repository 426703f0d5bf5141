//! External sort description and comparison rules.

use crate::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Direction of an external sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Sorts the members of a set by one field of each member's hash.
///
/// For member `m` the weight is field `field` of hash `{hash_prefix}{m}`.
/// Numeric mode treats a missing weight as 0 and fails on non-numbers;
/// alpha mode compares bytes and places missing weights first. Equal weights
/// fall back to comparing the members themselves so results are stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub hash_prefix: String,
    pub field: String,
    pub alpha: bool,
    pub order: SortOrder,
    pub offset: usize,
    pub count: usize,
}

impl SortSpec {
    /// Ascending numeric sort with no window.
    pub fn by_hash_field(hash_prefix: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            hash_prefix: hash_prefix.into(),
            field: field.into(),
            alpha: false,
            order: SortOrder::Asc,
            offset: 0,
            count: usize::MAX,
        }
    }

    pub fn alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn limit(mut self, offset: usize, count: usize) -> Self {
        self.offset = offset;
        self.count = count;
        self
    }

    /// Orders `(member, weight)` pairs and applies the window.
    pub(crate) fn apply(&self, rows: Vec<(String, Option<String>)>) -> StoreResult<Vec<String>> {
        let mut keyed: Vec<(String, Weight)> = rows
            .into_iter()
            .map(|(member, weight)| Ok((member, self.weight(weight)?)))
            .collect::<StoreResult<_>>()?;

        keyed.sort_by(|(ma, wa), (mb, wb)| {
            let ord = wa.cmp(wb).then_with(|| ma.cmp(mb));
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        Ok(keyed
            .into_iter()
            .skip(self.offset)
            .take(self.count)
            .map(|(member, _)| member)
            .collect())
    }

    fn weight(&self, raw: Option<String>) -> StoreResult<Weight> {
        if self.alpha {
            return Ok(Weight::Text(raw));
        }
        let Some(raw) = raw else {
            return Ok(Weight::Number(0.0));
        };
        match raw.trim().parse::<f64>() {
            Ok(n) if !n.is_nan() => Ok(Weight::Number(n)),
            _ => Err(StoreError::NotNumeric(raw)),
        }
    }
}

enum Weight {
    Number(f64),
    Text(Option<String>),
}

impl Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // A spec never mixes modes.
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}
