//! Ordered transactional key-value engines for Trove.
//!
//! The index layer never talks to a database directly. It opens transactions
//! through the [`KvEngine`] trait and works with byte keys whose
//! lexicographic order groups related entries together, so a prefix scan
//! enumerates exactly one namespace.
//!
//! # Storage Backends
//!
//! All backends implement [`KvEngine`]:
//!
//! - [`InMemoryKv`] -- `BTreeMap` engine with snapshot readers and an overlay writer
//! - [`RedbKv`] -- durable single-file engine backed by redb
//!
//! # Design Rules
//!
//! 1. One writer at a time; any number of snapshot readers.
//! 2. Readers never block the writer and never observe uncommitted writes.
//! 3. A write transaction that is dropped without `commit` leaves no trace.
//! 4. The engine never interprets keys or values.
//! 5. All backend errors are propagated, never silently ignored.

pub mod config;
pub mod durable;
pub mod error;
pub mod memory;
pub mod traits;

pub use config::{Backend, EngineConfig};
pub use durable::RedbKv;
pub use error::{KvError, KvResult};
pub use memory::InMemoryKv;
pub use traits::{KvEngine, KvPair, ReadTxn, WriteTxn};
