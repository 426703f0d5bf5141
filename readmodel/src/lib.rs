//! Secondary indexing and query layer over a key/set store.
//!
//! `readmodel` turns a store with set algebra, hashes, and external sort
//! into a queryable read model for denormalized entities:
//!
//! - **Registration**: each entity type declares its id, index fields, and
//!   sort fields ([`EntityTypeSpec`])
//! - **Writes**: [`ReadModel::set`] stores the payload and sort projection and
//!   reconciles index memberships so stale values never linger
//! - **External indexes**: [`ReadModel::set_index`] and
//!   [`ReadModel::set_inverted_index`] maintain memberships for values that do
//!   not come from the payload
//! - **Queries**: [`ReadModel::get`] compiles [`Criteria`] into union and
//!   intersection sets, caches them for a short TTL, and returns a sorted
//!   [`Page`]
//!
//! # Example
//!
//! ```
//! use readmodel::{Criteria, EntityTypeSpec, IndexField, Paging, ReadModel, ReadModelConfig, Sort, SortField};
//! use serde_json::json;
//!
//! let mut rm: ReadModel = ReadModel::new(ReadModelConfig::default());
//! rm.register(
//!     "car",
//!     EntityTypeSpec::new()
//!         .id_field("id")
//!         .index(IndexField::new("make"))
//!         .sort(SortField::alpha("model"))
//!         .default_sort("model"),
//! )
//! .unwrap();
//!
//! rm.set("car", &json!({"id": 1, "make": "Ford", "model": "Focus"})).unwrap();
//!
//! let page = rm
//!     .get("car", &Criteria::new().eq("make", "Ford"), &Sort::default(), Paging::default())
//!     .unwrap();
//! assert_eq!(page.total, 1);
//! ```

mod config;
mod engine;
mod error;
mod index;
mod keys;
mod page;
mod query;
mod registry;
mod writer;

pub use config::ReadModelConfig;
pub use engine::ReadModel;
pub use error::{ReadModelError, ReadModelResult};
pub use index::{IndexUpdate, InvertedIndexUpdate};
pub use page::{Page, Paging, Sort};
pub use query::Criteria;

pub use readmodel_model::{EntityTypeSpec, IndexField, SortField, ValueSource};
pub use readmodel_store::{MemoryStore, SortOrder, Store, StoreError};
