//! Item store.

use tracing::debug;
use trove_types::{Item, Tag};

use crate::collection::decode_item_folder;
use crate::datastore::{require_item, Datastore};
use crate::error::IndexResult;
use crate::key::Key;
use crate::keys;
use crate::tag::{add_tag_in_txn, read_item_tags_in, remove_tag_in_txn};
use crate::value::decode_string;

impl Datastore {
    /// Insert or update an item.
    ///
    /// The stored tag set is replaced by `item.tags`: dropped tags lose the
    /// association and a count, new tags gain both. The previous set is read
    /// inside the same write transaction. Duplicate tags are stored once.
    pub fn create_or_update_item(&self, item: &Item) -> IndexResult<()> {
        item.validate()?;
        let cid = item.cid.as_str();
        let wanted = dedup_tags(&item.tags);

        let (added, removed) = self.update(|txn| {
            txn.put(&keys::item_marker(cid), cid.as_bytes())?;
            txn.put(&keys::item_name(cid), item.name.as_bytes())?;

            let current = read_item_tags_in(&*txn, cid)?;
            let mut removed = 0usize;
            for tag in current.iter().filter(|t| !wanted.contains(t)) {
                remove_tag_in_txn(txn, cid, tag)?;
                removed += 1;
            }
            let mut added = 0usize;
            for tag in wanted.iter().filter(|t| !current.contains(t)) {
                add_tag_in_txn(txn, cid, tag)?;
                added += 1;
            }
            Ok((added, removed))
        })?;

        debug!(cid, added, removed, "item stored");
        Ok(())
    }

    /// Read an item with its tags in key order.
    pub fn read_item(&self, cid: &str) -> IndexResult<Item> {
        self.view(|txn| {
            require_item(txn, cid)?;
            let name = txn
                .get(&keys::item_name(cid))?
                .map(decode_string)
                .transpose()?
                .unwrap_or_default();
            let tags = read_item_tags_in(txn, cid)?;
            Ok(Item::new(cid, name).with_tags(tags))
        })
    }

    /// Delete an item together with its tags and every membership.
    pub fn delete_item(&self, cid: &str) -> IndexResult<()> {
        let (tags, collections, folders) = self.update(|txn| {
            require_item(&*txn, cid)?;

            let tags = read_item_tags_in(&*txn, cid)?;
            for tag in &tags {
                remove_tag_in_txn(txn, cid, tag)?;
            }

            let collections = txn.scan_prefix_keys(&keys::item_collections(cid))?;
            for key in &collections {
                let address = Key::decode_last(key)?;
                txn.delete(&keys::collection_item(&address, cid))?;
                txn.delete(key)?;
            }

            let folders = txn.scan_prefix_keys(&keys::item_folders(cid))?;
            for key in &folders {
                let (address, path) = decode_item_folder(key)?;
                txn.delete(&keys::folder_item(&address, &path, cid))?;
                txn.delete(key)?;
            }

            txn.delete_prefix(&keys::item_attrs(cid))?;
            txn.delete(&keys::item_marker(cid))?;
            Ok((tags.len(), collections.len(), folders.len()))
        })?;

        debug!(cid, tags, collections, folders, "item deleted");
        Ok(())
    }
}

fn dedup_tags(tags: &[Tag]) -> Vec<Tag> {
    let mut out: Vec<Tag> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !out.contains(tag) {
            out.push(tag.clone());
        }
    }
    out
}
