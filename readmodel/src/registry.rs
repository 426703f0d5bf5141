//! Registered entity types.

use crate::{ReadModelError, ReadModelResult, keys};
use readmodel_model::{EntityTypeSpec, ValueSource, scalar_string};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A validated entity type declaration.
#[derive(Debug)]
pub(crate) struct RegisteredType {
    pub(crate) name: String,
    pub(crate) spec: EntityTypeSpec,
    id: ValueSource,
    pub(crate) default_sort_field: String,
    /// Sort field name -> alpha flag.
    sort_modes: HashMap<String, bool>,
}

impl RegisteredType {
    /// Returns the comparison mode of a declared sort field (`true` = alpha).
    pub(crate) fn sort_mode(&self, field: &str) -> Option<bool> {
        self.sort_modes.get(field).copied()
    }

    /// Resolves an entity's identifier.
    pub(crate) fn extract_id(&self, entity: &Value) -> ReadModelResult<String> {
        scalar_string(&self.id.extract(entity))
            .filter(|id| !id.is_empty())
            .ok_or_else(|| {
                ReadModelError::Validation(format!("entity of type {} has no id", self.name))
            })
    }
}

#[derive(Debug, Default)]
pub(crate) struct TypeRegistry {
    types: HashMap<String, Arc<RegisteredType>>,
}

impl TypeRegistry {
    pub(crate) fn register(
        &mut self,
        entity_type: &str,
        spec: EntityTypeSpec,
    ) -> ReadModelResult<Arc<RegisteredType>> {
        if entity_type.is_empty() {
            return Err(ReadModelError::Configuration(
                "type required for register".into(),
            ));
        }
        if keys::is_reserved_type(entity_type) {
            return Err(ReadModelError::Configuration(format!(
                "type name {entity_type:?} collides with a reserved key namespace"
            )));
        }
        let Some(id) = spec.id.clone() else {
            return Err(ReadModelError::Configuration(format!(
                "id field required to register {entity_type}"
            )));
        };
        let Some(default_sort_field) = spec.default_sort_field.clone() else {
            return Err(ReadModelError::Configuration(format!(
                "default sort field required to register {entity_type}"
            )));
        };
        if spec.sort_field(&default_sort_field).is_none() {
            return Err(ReadModelError::Configuration(format!(
                "{default_sort_field} is not specified as a sort field of {entity_type}"
            )));
        }

        let sort_modes = spec
            .sort_fields
            .iter()
            .map(|f| (f.field_name.clone(), f.alpha))
            .collect();

        let registered = Arc::new(RegisteredType {
            name: entity_type.to_string(),
            spec,
            id,
            default_sort_field,
            sort_modes,
        });
        self.types
            .insert(entity_type.to_string(), Arc::clone(&registered));
        Ok(registered)
    }

    pub(crate) fn get(&self, entity_type: &str) -> ReadModelResult<Arc<RegisteredType>> {
        self.types
            .get(entity_type)
            .cloned()
            .ok_or_else(|| ReadModelError::NotRegistered(entity_type.to_string()))
    }

    pub(crate) fn contains(&self, entity_type: &str) -> bool {
        self.types.contains_key(entity_type)
    }
}
