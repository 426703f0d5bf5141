use crate::engine::require;
use crate::index::{add_index, reconcile_index};
use crate::{ReadModel, ReadModelError, ReadModelResult, keys};
use readmodel_model::{index_values, scalar_string};
use readmodel_store::{Batch, Store};
use serde::Serialize;
use tracing::debug;

impl<S: Store> ReadModel<S> {
    /// Writes an entity, its sort projection, and its index memberships in
    /// one batch.
    ///
    /// The sort projection is rewritten wholesale, so a sort field whose
    /// value is now missing drops out of it.
    pub fn set<T: Serialize + ?Sized>(&self, entity_type: &str, entity: &T) -> ReadModelResult<()> {
        let ty = self.registered(entity_type)?;
        let entity = serde_json::to_value(entity)?;
        if entity.is_null() {
            return Err(ReadModelError::Validation("entity required".into()));
        }
        let id = ty.extract_id(&entity)?;
        let entity_key = keys::entity_key(entity_type, &id);
        let exists = self.store.exists(&entity_key)?;

        let mut batch = Batch::new();
        batch.set(entity_key.as_str(), entity.to_string());

        let hash_key = keys::hash_key(&entity_key);
        batch.del(hash_key.as_str());
        for field in &ty.spec.sort_fields {
            if let Some(value) = scalar_string(&field.source.extract(&entity)) {
                batch.hset(hash_key.as_str(), field.field_name.as_str(), value);
            }
        }

        for field in &ty.spec.indexed_fields {
            let values = index_values(&field.source.extract(&entity));
            if exists {
                reconcile_index(
                    self.store.as_ref(),
                    &mut batch,
                    entity_type,
                    &entity_key,
                    &field.field_name,
                    &values,
                )?;
            } else {
                add_index(&mut batch, entity_type, &entity_key, &field.field_name, &values);
            }
        }

        self.store.exec(batch)?;
        debug!(entity = %entity_key, updated = exists, "set entity");
        Ok(())
    }

    /// Removes an entity, its sort projection, and its membership in every
    /// index set of its type, in one batch.
    pub fn delete(&self, entity_type: &str, id: &str) -> ReadModelResult<()> {
        require("type", entity_type)?;
        require("id", id)?;

        let entity_key = keys::entity_key(entity_type, id);
        let mut batch = Batch::new();
        for index in self
            .store
            .keys_with_prefix(&keys::type_index_prefix(entity_type))?
        {
            batch.srem(index, entity_key.as_str());
        }
        batch.del(keys::hash_key(&entity_key)).del(entity_key.as_str());

        self.store.exec(batch)?;
        debug!(entity = %entity_key, "deleted");
        Ok(())
    }
}
