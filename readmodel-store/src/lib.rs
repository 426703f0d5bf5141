//! Store boundary for readmodel.
//!
//! The indexing engine never talks to a concrete database. It issues reads
//! through the [`Store`] trait and queues every mutation into a [`Batch`],
//! which a store must apply all-or-nothing.
//!
//! # Capabilities
//!
//! - String values: get, bulk get, exists
//! - Hashes: get-all (the per-entity sort projection)
//! - Sets: membership, cardinality, union-store and intersection-store
//! - Key enumeration by prefix
//! - Time-to-live on keys
//! - External sort of a set by a field of each member's hash, with paging
//!
//! [`MemoryStore`] implements all of it in-process and is what the engine
//! tests run against.

mod batch;
mod clock;
mod error;
mod memory;
mod sort;
mod store;

pub use batch::{Batch, Command};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use sort::{SortOrder, SortSpec};
pub use store::Store;
