//! # rdf-value-store
//!
//! Persistent, content-addressed dictionary mapping RDF values (IRIs,
//! blank nodes, literals) and namespace strings to compact integer IDs
//! and back again.
//!
//! This crate provides:
//! - A value model (`Iri`, `Literal`, [`Value`]) with ID-stamped wrappers
//! - Deterministic byte encodings for every value kind
//! - A dual-direction index (ID → bytes and bytes → ID) hosted in a single
//!   ordered table, with overflow buckets for oversized payloads
//! - Revision-stamped caching that survives everything except `clear()`
//!
//! ## Design Principles
//!
//! 1. **IDs are forever**: monotonic allocation, no reuse, no reorganization
//! 2. **Byte layouts are the durability contract**: any change is a format break
//! 3. **Readers never block ID creation**: only catalog-wide clearing excludes
//!    other operations
//!
//! ## Example
//!
//! ```ignore
//! use rdf_value_store::ValueStore;
//!
//! let store = ValueStore::open("/var/data/my-store")?;
//! let iri = store.create_iri("http://example.org/foo")?;
//! let id = store.store_value(&iri)?;
//! assert_eq!(store.get_value(id)?.unwrap(), iri);
//! ```

pub mod cache;
pub mod config;
pub mod encoding;
pub mod error;
pub mod index;
pub mod revision;
pub mod store;
pub mod value;
pub mod vocab;

// Re-export main types
pub use config::ValueStoreConfig;
pub use error::{Error, Result};
pub use revision::{Revision, StoredValue};
pub use store::ValueStore;
pub use value::{Iri, Literal, Value, ValueId};
