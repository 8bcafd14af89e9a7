//! Tag index with reference counting.
//!
//! An item-tag association is stored as `item_tag::<cid>::<tag>` and
//! `tag_item::<tag>::<cid>`. Each tag in use has a registry entry under
//! `tags::` and a count of its associations; both disappear when the count
//! drops to zero.

use tracing::debug;
use trove_kv::{ReadTxn, WriteTxn};
use trove_types::Tag;

use crate::datastore::{require_item, Datastore};
use crate::error::{IndexError, IndexResult};
use crate::key::Key;
use crate::keys;
use crate::value::{decode_count, encode_count};

impl Datastore {
    /// Tag an item. Returns `false` if the item already had the tag.
    pub fn add_item_tag(&self, cid: &str, tag: &Tag) -> IndexResult<bool> {
        let added = self.update(|txn| {
            require_item(&*txn, cid)?;
            add_tag_in_txn(txn, cid, tag)
        })?;
        debug!(cid, %tag, added, "item tag added");
        Ok(added)
    }

    /// Untag an item. Returns `false` if the item did not have the tag.
    pub fn remove_item_tag(&self, cid: &str, tag: &Tag) -> IndexResult<bool> {
        let removed = self.update(|txn| {
            require_item(&*txn, cid)?;
            remove_tag_in_txn(txn, cid, tag)
        })?;
        debug!(cid, %tag, removed, "item tag removed");
        Ok(removed)
    }

    pub fn has_tag(&self, cid: &str, tag: &Tag) -> IndexResult<bool> {
        Ok(self.read_item(cid)?.has_tag(tag))
    }

    /// Number of items carrying each tag, in input order. Unknown tags count
    /// zero.
    pub fn read_tag_item_count(&self, tags: &[Tag]) -> IndexResult<Vec<u32>> {
        self.view(|txn| {
            tags.iter()
                .map(|tag| read_count_in(txn, &tag.to_string()))
                .collect()
        })
    }

    /// Registered tags whose canonical string starts with `prefix`.
    ///
    /// Matching is on raw bytes, so a prefix may end partway through a
    /// segment: `"tag10"` matches `tag100:x`.
    pub fn search_tags(&self, prefix: &str) -> IndexResult<Vec<Tag>> {
        self.view(|txn| {
            let mut tags = txn
                .scan_prefix_keys(&keys::tag_markers_starting_with(prefix))?
                .iter()
                .map(|key| parse_stored_tag(&Key::decode_last(key)?))
                .collect::<IndexResult<Vec<_>>>()?;
            tags.dedup();
            Ok(tags)
        })
    }

    /// Content ids of the items carrying `tag`, in key order.
    pub fn read_tag_items(&self, tag: &Tag) -> IndexResult<Vec<String>> {
        self.view(|txn| {
            txn.scan_prefix_keys(&keys::tag_items(&tag.to_string()))?
                .iter()
                .map(|key| Key::decode_last(key))
                .collect()
        })
    }
}

pub(crate) fn parse_stored_tag(raw: &str) -> IndexResult<Tag> {
    raw.parse()
        .map_err(|e| IndexError::integrity(format!("stored tag {raw:?} is malformed: {e}")))
}

/// Tags currently associated with `cid`, in key order.
pub(crate) fn read_item_tags_in<T: ReadTxn + ?Sized>(txn: &T, cid: &str) -> IndexResult<Vec<Tag>> {
    txn.scan_prefix_keys(&keys::item_tags(cid))?
        .iter()
        .map(|key| parse_stored_tag(&Key::decode_last(key)?))
        .collect()
}

fn read_count_in<T: ReadTxn + ?Sized>(txn: &T, tag: &str) -> IndexResult<u32> {
    match txn.get(&keys::tag_count(tag))? {
        Some(bytes) => decode_count(&bytes),
        None => Ok(0),
    }
}

/// Which sides of an item-tag association are present.
fn association<T: ReadTxn + ?Sized>(txn: &T, cid: &str, tag: &str) -> IndexResult<(bool, bool)> {
    Ok((
        txn.contains(&keys::item_tag(cid, tag))?,
        txn.contains(&keys::tag_item(tag, cid))?,
    ))
}

fn one_sided(cid: &str, tag: &str, forward: bool) -> IndexError {
    let (present, missing) = if forward {
        ("item_tag", "tag_item")
    } else {
        ("tag_item", "item_tag")
    };
    IndexError::integrity(format!(
        "tag {tag:?} on item {cid} has a {present} entry but no {missing} entry"
    ))
}

/// Associate `tag` with `cid`. Returns `false` if already associated.
pub(crate) fn add_tag_in_txn(txn: &mut dyn WriteTxn, cid: &str, tag: &Tag) -> IndexResult<bool> {
    let tag = tag.to_string();
    match association(&*txn, cid, &tag)? {
        (true, true) => Ok(false),
        (false, false) => {
            txn.put(&keys::item_tag(cid, &tag), tag.as_bytes())?;
            txn.put(&keys::tag_item(&tag, cid), cid.as_bytes())?;
            txn.put(&keys::tag_marker(&tag), tag.as_bytes())?;
            adjust_count(txn, &tag, 1)?;
            Ok(true)
        }
        (forward, _) => Err(one_sided(cid, &tag, forward)),
    }
}

/// Drop the association of `tag` with `cid`. Returns `false` if there was
/// none.
pub(crate) fn remove_tag_in_txn(txn: &mut dyn WriteTxn, cid: &str, tag: &Tag) -> IndexResult<bool> {
    let tag = tag.to_string();
    match association(&*txn, cid, &tag)? {
        (false, false) => Ok(false),
        (true, true) => {
            txn.delete(&keys::item_tag(cid, &tag))?;
            txn.delete(&keys::tag_item(&tag, cid))?;
            adjust_count(txn, &tag, -1)?;
            Ok(true)
        }
        (forward, _) => Err(one_sided(cid, &tag, forward)),
    }
}

/// Apply `delta` to the tag's count. At zero the count and the registry
/// entry are removed.
fn adjust_count(txn: &mut dyn WriteTxn, tag: &str, delta: i64) -> IndexResult<u32> {
    let current = read_count_in(&*txn, tag)?;
    let next = i64::from(current) + delta;
    if next < 0 {
        return Err(IndexError::integrity(format!(
            "count of tag {tag:?} would drop below zero"
        )));
    }
    let next = u32::try_from(next)
        .map_err(|_| IndexError::integrity(format!("count of tag {tag:?} overflows u32")))?;

    if next == 0 {
        txn.delete(&keys::tag_count(tag))?;
        txn.delete(&keys::tag_marker(tag))?;
    } else {
        txn.put(&keys::tag_count(tag), &encode_count(next))?;
    }
    Ok(next)
}
