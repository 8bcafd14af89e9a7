//! Key namespaces.
//!
//! Every relationship is stored twice, once under each side's namespace:
//!
//! ```text
//! collections::<addr>                          existence marker
//! collections_mine::<addr>                     owned-collection marker
//! collection::<addr>::{name|description|ismine}
//! collection_item::<addr>::<cid>               = <cid>
//! item_collection::<cid>::<addr>               = <addr>
//! folders::<addr>::<path>                      existence marker
//! folder::<addr>::<path>::children             = serialized ordered string list
//! folder_item::<addr>::<path>::<cid>           = <cid>
//! item_folder::<cid>::<addr>::<path>           = <path>
//! items::<cid>                                 existence marker
//! item::<cid>::name
//! item_tag::<cid>::<tagStr>                    = <tagStr>
//! tags::<tagStr>                               registry marker
//! tag::<tagStr>::count                         = uint32 big-endian
//! tag_item::<tagStr>::<cid>                    = <cid>
//! ```

use crate::key::{encode_partial, Key, SEPARATOR};

const COLLECTIONS: &str = "collections";
const COLLECTIONS_MINE: &str = "collections_mine";
const COLLECTION: &str = "collection";
const COLLECTION_ITEM: &str = "collection_item";
const ITEM_COLLECTION: &str = "item_collection";
const FOLDERS: &str = "folders";
const FOLDER: &str = "folder";
const FOLDER_ITEM: &str = "folder_item";
const ITEM_FOLDER: &str = "item_folder";
const ITEMS: &str = "items";
const ITEM: &str = "item";
const ITEM_TAG: &str = "item_tag";
const TAGS: &str = "tags";
const TAG: &str = "tag";
const TAG_ITEM: &str = "tag_item";

pub(crate) const ATTR_NAME: &str = "name";
pub(crate) const ATTR_DESCRIPTION: &str = "description";
pub(crate) const ATTR_IS_MINE: &str = "ismine";
const ATTR_CHILDREN: &str = "children";
const ATTR_COUNT: &str = "count";

// ---------------------------------------------------------------
// Collections
// ---------------------------------------------------------------

pub(crate) fn collection_marker(addr: &str) -> Vec<u8> {
    Key::of(&[COLLECTIONS, addr]).encode()
}

pub(crate) fn collection_markers() -> Vec<u8> {
    Key::of(&[COLLECTIONS]).prefix()
}

pub(crate) fn mine_marker(addr: &str) -> Vec<u8> {
    Key::of(&[COLLECTIONS_MINE, addr]).encode()
}

pub(crate) fn mine_markers() -> Vec<u8> {
    Key::of(&[COLLECTIONS_MINE]).prefix()
}

pub(crate) fn collection_attr(addr: &str, attr: &str) -> Vec<u8> {
    Key::of(&[COLLECTION, addr, attr]).encode()
}

pub(crate) fn collection_attrs(addr: &str) -> Vec<u8> {
    Key::of(&[COLLECTION, addr]).prefix()
}

// ---------------------------------------------------------------
// Item <-> collection
// ---------------------------------------------------------------

pub(crate) fn collection_item(addr: &str, cid: &str) -> Vec<u8> {
    Key::of(&[COLLECTION_ITEM, addr, cid]).encode()
}

pub(crate) fn collection_items(addr: &str) -> Vec<u8> {
    Key::of(&[COLLECTION_ITEM, addr]).prefix()
}

pub(crate) fn item_collection(cid: &str, addr: &str) -> Vec<u8> {
    Key::of(&[ITEM_COLLECTION, cid, addr]).encode()
}

pub(crate) fn item_collections(cid: &str) -> Vec<u8> {
    Key::of(&[ITEM_COLLECTION, cid]).prefix()
}

// ---------------------------------------------------------------
// Folders
// ---------------------------------------------------------------

pub(crate) fn folder_marker(addr: &str, path: &str) -> Vec<u8> {
    Key::of(&[FOLDERS, addr, path]).encode()
}

pub(crate) fn folder_markers(addr: &str) -> Vec<u8> {
    Key::of(&[FOLDERS, addr]).prefix()
}

pub(crate) fn folder_children(addr: &str, path: &str) -> Vec<u8> {
    Key::of(&[FOLDER, addr, path, ATTR_CHILDREN]).encode()
}

pub(crate) fn folder_attrs(addr: &str) -> Vec<u8> {
    Key::of(&[FOLDER, addr]).prefix()
}

// ---------------------------------------------------------------
// Item <-> folder
// ---------------------------------------------------------------

pub(crate) fn folder_item(addr: &str, path: &str, cid: &str) -> Vec<u8> {
    Key::of(&[FOLDER_ITEM, addr, path, cid]).encode()
}

pub(crate) fn folder_items(addr: &str, path: &str) -> Vec<u8> {
    Key::of(&[FOLDER_ITEM, addr, path]).prefix()
}

/// Items of every folder in a collection.
pub(crate) fn collection_folder_items(addr: &str) -> Vec<u8> {
    Key::of(&[FOLDER_ITEM, addr]).prefix()
}

pub(crate) fn item_folder(cid: &str, addr: &str, path: &str) -> Vec<u8> {
    Key::of(&[ITEM_FOLDER, cid, addr, path]).encode()
}

/// Every folder the item is in, across collections.
pub(crate) fn item_folders(cid: &str) -> Vec<u8> {
    Key::of(&[ITEM_FOLDER, cid]).prefix()
}

/// Every folder the item is in within one collection.
pub(crate) fn item_folders_in(cid: &str, addr: &str) -> Vec<u8> {
    Key::of(&[ITEM_FOLDER, cid, addr]).prefix()
}

// ---------------------------------------------------------------
// Items
// ---------------------------------------------------------------

pub(crate) fn item_marker(cid: &str) -> Vec<u8> {
    Key::of(&[ITEMS, cid]).encode()
}

pub(crate) fn item_name(cid: &str) -> Vec<u8> {
    Key::of(&[ITEM, cid, ATTR_NAME]).encode()
}

pub(crate) fn item_attrs(cid: &str) -> Vec<u8> {
    Key::of(&[ITEM, cid]).prefix()
}

// ---------------------------------------------------------------
// Tags
// ---------------------------------------------------------------

pub(crate) fn item_tag(cid: &str, tag: &str) -> Vec<u8> {
    Key::of(&[ITEM_TAG, cid, tag]).encode()
}

pub(crate) fn item_tags(cid: &str) -> Vec<u8> {
    Key::of(&[ITEM_TAG, cid]).prefix()
}

pub(crate) fn tag_marker(tag: &str) -> Vec<u8> {
    Key::of(&[TAGS, tag]).encode()
}

/// Registry keys whose tag string starts with `fragment`.
pub(crate) fn tag_markers_starting_with(fragment: &str) -> Vec<u8> {
    format!("{TAGS}{SEPARATOR}{}", encode_partial(fragment)).into_bytes()
}

pub(crate) fn tag_count(tag: &str) -> Vec<u8> {
    Key::of(&[TAG, tag, ATTR_COUNT]).encode()
}

pub(crate) fn tag_item(tag: &str, cid: &str) -> Vec<u8> {
    Key::of(&[TAG_ITEM, tag, cid]).encode()
}

pub(crate) fn tag_items(tag: &str) -> Vec<u8> {
    Key::of(&[TAG_ITEM, tag]).prefix()
}
