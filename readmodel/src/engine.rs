//! The engine handle: configuration, store, and registered types.

use crate::registry::{RegisteredType, TypeRegistry};
use crate::{ReadModelConfig, ReadModelError, ReadModelResult, keys};
use readmodel_model::EntityTypeSpec;
use readmodel_store::{MemoryStore, Store};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Indexing and query engine over a [`Store`].
///
/// Writes (`set`, `set_index`, `set_inverted_index`, `delete`) each commit as
/// one store batch. Reads (`get`, `find`) are not transactional: materialized
/// query results live for `temp_set_ttl_secs` and are not invalidated by
/// writes, so a query may lag a concurrent write by up to that long.
///
/// Concurrent writes to the *same* entity must be serialized by the caller.
pub struct ReadModel<S: Store = MemoryStore> {
    pub(crate) store: Arc<S>,
    pub(crate) config: ReadModelConfig,
    registry: TypeRegistry,
    owns_store: bool,
}

impl<S: Store + Default> ReadModel<S> {
    /// Creates an engine with its own store.
    pub fn new(config: ReadModelConfig) -> Self {
        let mut engine = Self::with_store(Arc::new(S::default()), config);
        engine.owns_store = true;
        engine
    }
}

impl<S: Store> ReadModel<S> {
    /// Creates an engine on an externally managed store.
    ///
    /// [`quit`](Self::quit) leaves such a store open.
    pub fn with_store(store: Arc<S>, config: ReadModelConfig) -> Self {
        info!(
            page_size = config.page_size,
            temp_set_ttl_secs = config.temp_set_ttl_secs,
            "read-model configured"
        );
        Self {
            store,
            config,
            registry: TypeRegistry::default(),
            owns_store: false,
        }
    }

    pub fn config(&self) -> &ReadModelConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Registers an entity type.
    ///
    /// Fails with [`ReadModelError::Configuration`] if the type name is empty,
    /// the declaration has no id source or default sort field, the default sort field
    /// is not among the declared sort fields, or an index field name contains
    /// `:`. Re-registering a type replaces its previous declaration.
    pub fn register(&mut self, entity_type: &str, spec: EntityTypeSpec) -> ReadModelResult<()> {
        if let Some(field) = spec
            .indexed_fields
            .iter()
            .find(|f| f.field_name.is_empty() || f.field_name.contains(':'))
        {
            return Err(ReadModelError::Configuration(format!(
                "invalid index field name {:?} for {entity_type}",
                field.field_name
            )));
        }
        let registered = self.registry.register(entity_type, spec)?;
        debug!(
            entity_type = %registered.name,
            indexed_fields = registered.spec.indexed_fields.len(),
            sort_fields = registered.spec.sort_fields.len(),
            "registered entity"
        );
        Ok(())
    }

    pub fn is_registered(&self, entity_type: &str) -> bool {
        self.registry.contains(entity_type)
    }

    /// Fetches one entity payload by id.
    pub fn find(&self, entity_type: &str, id: &str) -> ReadModelResult<Option<Value>> {
        require("type", entity_type)?;
        require("id", id)?;
        let raw = self.store.get(&keys::entity_key(entity_type, id))?;
        raw.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(Into::into)
    }

    /// Typed variant of [`find`](Self::find).
    pub fn find_as<T: DeserializeOwned>(
        &self,
        entity_type: &str,
        id: &str,
    ) -> ReadModelResult<Option<T>> {
        self.find(entity_type, id)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(Into::into)
    }

    /// Shuts the engine down, closing the store only if the engine created it.
    pub fn quit(self) -> ReadModelResult<()> {
        if self.owns_store {
            self.store.quit()?;
            info!("read-model store closed");
        }
        Ok(())
    }

    pub(crate) fn registered(&self, entity_type: &str) -> ReadModelResult<Arc<RegisteredType>> {
        require("type", entity_type)?;
        self.registry.get(entity_type)
    }
}

/// Rejects an empty required argument.
pub(crate) fn require(name: &str, value: &str) -> ReadModelResult<()> {
    if value.is_empty() {
        return Err(ReadModelError::Validation(format!("{name} required")));
    }
    Ok(())
}
