//! Value types for Trove.
//!
//! This crate provides the plain data objects that callers hand to the Trove
//! index layer. None of them know how they are stored; the `trove-index`
//! crate maps them onto key-value namespaces.
//!
//! # Key Types
//!
//! - [`Collection`] -- A named, addressable set of items with an ownership flag
//! - [`Item`] -- A content-addressed resource with a name and a set of tags
//! - [`Tag`] -- A hierarchical label (`a:b:c`) made of non-empty segments
//! - [`Folder`] -- A node in a collection's folder tree, addressed by path
//! - [`Filter`] -- Tri-state predicate used when listing collections

pub mod collection;
pub mod error;
pub mod folder;
pub mod item;
pub mod tag;

pub use collection::{Collection, Filter};
pub use error::TypeError;
pub use folder::{join_path, Folder, PATH_SEPARATOR, ROOT_PATH};
pub use item::Item;
pub use tag::{Tag, TAG_SEPARATOR};
