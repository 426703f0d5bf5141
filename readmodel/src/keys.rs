//! Store key layout.
//!
//! | key                        | kind   | holds                          |
//! |----------------------------|--------|--------------------------------|
//! | `<type>:<id>`              | string | serialized entity              |
//! | `h:<type>:<id>`            | hash   | sort projection                |
//! | `x:<type>-<field>:<value>` | set    | entity keys holding that value |
//! | `q:<plan>`                 | set    | materialized query result      |

pub(crate) const HASH_PREFIX: &str = "h:";
const INDEX_PREFIX: &str = "x:";
const RESULT_PREFIX: &str = "q:";

/// Whether `entity_type` would put entity keys inside another namespace.
pub(crate) fn is_reserved_type(entity_type: &str) -> bool {
    entity_type.contains(':')
        || [HASH_PREFIX, INDEX_PREFIX, RESULT_PREFIX]
            .iter()
            .any(|prefix| prefix.strip_suffix(':') == Some(entity_type))
}

pub(crate) fn entity_key(entity_type: &str, id: &str) -> String {
    format!("{entity_type}:{id}")
}

pub(crate) fn hash_key(entity_key: &str) -> String {
    format!("{HASH_PREFIX}{entity_key}")
}

/// Prefix shared by every index set of one field.
pub(crate) fn index_prefix(entity_type: &str, field: &str) -> String {
    format!("{INDEX_PREFIX}{entity_type}-{field}:")
}

pub(crate) fn index_key(entity_type: &str, field: &str, value: &str) -> String {
    format!("{}{value}", index_prefix(entity_type, field))
}

/// Prefix shared by every index set of one type.
pub(crate) fn type_index_prefix(entity_type: &str) -> String {
    format!("{INDEX_PREFIX}{entity_type}-")
}

pub(crate) fn result_key(plan: &str) -> String {
    format!("{RESULT_PREFIX}{plan}")
}
