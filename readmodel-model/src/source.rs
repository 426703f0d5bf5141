use serde_json::Value;
use std::fmt;
use std::sync::Arc;

type Extractor = dyn Fn(&Value) -> Value + Send + Sync;

/// Where an identity, index, or sort value is read from.
///
/// A `Field` is either a top-level key (`"make"`) or, when it starts with
/// `/`, a JSON pointer into the payload (`"/owner/id"`). A `Computed` source
/// derives the value from the whole entity.
#[derive(Clone)]
pub enum ValueSource {
    Field(String),
    Computed(Arc<Extractor>),
}

impl ValueSource {
    /// Reads a value directly from the entity.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// Derives a value with an arbitrary function of the entity.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Evaluates the source against an entity. Missing fields yield `Null`.
    pub fn extract(&self, entity: &Value) -> Value {
        match self {
            Self::Field(name) if name.starts_with('/') => {
                entity.pointer(name).cloned().unwrap_or(Value::Null)
            }
            Self::Field(name) => entity.get(name).cloned().unwrap_or(Value::Null),
            Self::Computed(f) => f(entity),
        }
    }
}

impl fmt::Debug for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.debug_tuple("Field").field(name).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl From<&str> for ValueSource {
    fn from(name: &str) -> Self {
        Self::field(name)
    }
}

impl From<String> for ValueSource {
    fn from(name: String) -> Self {
        Self::Field(name)
    }
}
