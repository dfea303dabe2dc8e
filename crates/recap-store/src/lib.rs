//! Key-value store client used by the summary controller.
//!
//! The contract is deliberately small (`get`, `set`, `keys`, `delete`) plus a
//! single conditional write for leases. Backends are selected by URL scheme.

pub mod error;
pub mod pattern;
pub mod trait_client;
pub mod memory;
pub mod builder;
pub mod dbs;

pub use error::{Result, StoreError};
pub use pattern::KeyPattern;
pub use trait_client::KeyValueStore;
pub use memory::InMemoryStore;
pub use builder::{connect, BackendKind, StoreBuilder};

#[cfg(feature = "redis")]
pub use dbs::redis::RedisStore;
#[cfg(feature = "mongodb")]
pub use dbs::mongo::MongoStore;
