//! Entity type model for readmodel.
//!
//! Defines how a registered entity type is described to the indexing engine:
//! - [`ValueSource`]: where a value comes from (a field/JSON pointer, or a closure)
//! - [`IndexField`]: a field whose values feed exact-match index sets
//! - [`SortField`]: a field projected for external sorting (alpha or numeric)
//! - [`EntityTypeSpec`]: the full declaration handed to `ReadModel::register`
//!
//! These types carry no I/O. The engine crate evaluates them against
//! `serde_json::Value` payloads on every write.

mod schema;
mod source;
mod value;

pub use schema::{EntityTypeSpec, IndexField, SortField};
pub use source::ValueSource;
pub use value::{index_values, scalar_string};
