//! Trove index layer.
//!
//! Models collections, content-addressed items, hierarchical tags and
//! per-collection folder trees entirely as key-value pairs inside a
//! [`KvEngine`](trove_kv::KvEngine). Every relationship is written in both
//! directions under separately prefixed namespaces, so either side can be
//! listed with one prefix scan.
//!
//! # Key Types
//!
//! - [`Datastore`] -- the handle every operation hangs off
//! - [`Key`] -- escaped, `::`-joined storage keys
//! - [`IndexError`] -- not-found, precondition, membership, integrity and
//!   engine failures
//!
//! # Design Rules
//!
//! 1. Every mutation runs in exactly one write transaction.
//! 2. Forward and reverse entries are written and removed together.
//! 3. A tag's count equals its live associations and is deleted at zero.
//! 4. Deleting a collection never deletes its items.
//! 5. An index disagreement aborts the operation as an integrity violation.
//!
//! ```
//! use trove_index::Datastore;
//! use trove_types::{Collection, Folder, Item, Tag};
//!
//! let ds = Datastore::in_memory();
//! ds.create_or_update_collection(&Collection::new("test.com", "Test", ""))?;
//! ds.create_or_update_item(&Item::new("Qm1", "notes").with_tags(["doc:md".parse::<Tag>()?]))?;
//! ds.create_or_update_folder(&Folder::new("test.com", "docs"))?;
//! ds.add_item_to_folder("Qm1", &Folder::new("test.com", "docs"))?;
//!
//! assert!(ds.is_item_in_collection("Qm1", "test.com")?);
//! assert_eq!(ds.search_tags("doc")?.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod collection;
pub mod datastore;
pub mod error;
mod folder;
mod item;
pub mod key;
mod keys;
mod tag;
mod value;

pub use datastore::Datastore;
pub use error::{IndexError, IndexResult};
pub use key::{encode_partial, Key, SEPARATOR};

pub use trove_kv::{EngineConfig, KvEngine};
pub use trove_types::{Collection, Filter, Folder, Item, Tag};
