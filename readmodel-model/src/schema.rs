use crate::ValueSource;
use serde_json::Value;

/// Describes an entity type's identity, index fields, and sort fields.
///
/// Built with chained setters and validated when registered with the engine,
/// so an incomplete spec can be constructed but never registered.
#[derive(Debug, Clone, Default)]
pub struct EntityTypeSpec {
    pub id: Option<ValueSource>,
    pub indexed_fields: Vec<IndexField>,
    pub sort_fields: Vec<SortField>,
    pub default_sort_field: Option<String>,
}

impl EntityTypeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a field (or JSON pointer) as the entity identifier.
    pub fn id_field(mut self, name: impl Into<String>) -> Self {
        self.id = Some(ValueSource::Field(name.into()));
        self
    }

    /// Derives the entity identifier with a function.
    pub fn id_with<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.id = Some(ValueSource::computed(f));
        self
    }

    pub fn index(mut self, field: IndexField) -> Self {
        self.indexed_fields.push(field);
        self
    }

    pub fn sort(mut self, field: SortField) -> Self {
        self.sort_fields.push(field);
        self
    }

    pub fn default_sort(mut self, name: impl Into<String>) -> Self {
        self.default_sort_field = Some(name.into());
        self
    }

    /// Looks up a declared sort field by name.
    pub fn sort_field(&self, name: &str) -> Option<&SortField> {
        self.sort_fields.iter().find(|f| f.field_name == name)
    }
}

/// A field whose extracted value(s) determine index-set membership.
#[derive(Debug, Clone)]
pub struct IndexField {
    pub field_name: String,
    pub source: ValueSource,
}

impl IndexField {
    /// Indexes the entity's own `name` field.
    pub fn new(name: &str) -> Self {
        Self {
            field_name: name.into(),
            source: ValueSource::field(name),
        }
    }

    /// Indexes under `name` using values computed from the entity.
    /// The function may return a scalar or an array for multi-membership.
    pub fn computed<F>(name: &str, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::with_source(name, ValueSource::computed(f))
    }

    pub fn with_source(name: &str, source: ValueSource) -> Self {
        Self {
            field_name: name.into(),
            source,
        }
    }
}

/// A field projected into the entity's sort hash.
#[derive(Debug, Clone)]
pub struct SortField {
    pub field_name: String,
    pub source: ValueSource,
    /// Lexical comparison when true, numeric otherwise.
    pub alpha: bool,
}

impl SortField {
    /// Shorthand for a lexically sorted field.
    pub fn alpha(name: &str) -> Self {
        Self {
            field_name: name.into(),
            source: ValueSource::field(name),
            alpha: true,
        }
    }

    /// Shorthand for a numerically sorted field.
    pub fn numeric(name: &str) -> Self {
        Self {
            field_name: name.into(),
            source: ValueSource::field(name),
            alpha: false,
        }
    }

    /// Replaces the source the sort value is read from.
    pub fn from_source(mut self, source: impl Into<ValueSource>) -> Self {
        self.source = source.into();
        self
    }

    /// Computes the sort value with a function of the entity.
    pub fn computed_by<F>(self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.from_source(ValueSource::computed(f))
    }
}
