//! Folder tree and item-folder membership.
//!
//! Each collection owns one tree rooted at the empty path. A folder is a
//! marker key plus an insertion-ordered list of its children's full paths.
//! Subtree walks use an explicit stack so deep trees never recurse.

use std::collections::HashSet;

use tracing::{debug, warn};
use trove_kv::{ReadTxn, WriteTxn};
use trove_types::{Folder, ROOT_PATH};

use crate::collection::{link_collection, unlink_collection_if_orphaned};
use crate::datastore::{require_collection, require_folder, require_item, Datastore};
use crate::error::{IndexError, IndexResult};
use crate::key::Key;
use crate::keys;
use crate::value::{decode_children, encode_children};

impl Datastore {
    /// Create a folder, or do nothing if it already exists.
    ///
    /// A direct child of the root creates the root if needed. Deeper
    /// folders need their parent to exist. Returns `true` if the folder was
    /// created.
    pub fn create_or_update_folder(&self, folder: &Folder) -> IndexResult<bool> {
        folder.validate()?;
        let created = self.update(|txn| {
            require_collection(&*txn, &folder.address)?;
            create_folder_in_txn(txn, &folder.address, &folder.path)
        })?;

        debug!(address = %folder.address, path = %folder.path, created, "folder stored");
        Ok(created)
    }

    pub fn read_folder(&self, address: &str, path: &str) -> IndexResult<Folder> {
        self.view(|txn| {
            require_folder(txn, address, path)?;
            Ok(Folder::new(address, path))
        })
    }

    /// Returns `true` if the folder marker exists.
    pub fn is_folder_path_exists(&self, address: &str, path: &str) -> IndexResult<bool> {
        self.view(|txn| Ok(txn.contains(&keys::folder_marker(address, path))?))
    }

    /// Full paths of the folder's children, in creation order.
    pub fn read_folder_children(&self, folder: &Folder) -> IndexResult<Vec<String>> {
        self.view(|txn| {
            require_folder(txn, &folder.address, &folder.path)?;
            read_children_in(txn, &folder.address, &folder.path)
        })
    }

    /// Content ids of the items directly in the folder.
    pub fn read_folder_items(&self, folder: &Folder) -> IndexResult<Vec<String>> {
        self.view(|txn| {
            require_folder(txn, &folder.address, &folder.path)?;
            read_items_in(txn, &folder.address, &folder.path)
        })
    }

    /// Put an item into a folder. The item also joins the folder's
    /// collection if it was not a member yet.
    pub fn add_item_to_folder(&self, cid: &str, folder: &Folder) -> IndexResult<()> {
        self.update(|txn| {
            require_folder(&*txn, &folder.address, &folder.path)?;
            require_item(&*txn, cid)?;
            link_folder(txn, cid, &folder.address, &folder.path)?;
            if !txn.contains(&keys::collection_item(&folder.address, cid))? {
                link_collection(txn, cid, &folder.address)?;
            }
            Ok(())
        })?;

        debug!(cid, address = %folder.address, path = %folder.path, "item added to folder");
        Ok(())
    }

    /// Take an item out of a folder.
    ///
    /// If that was the item's last folder in the collection, the item also
    /// leaves the collection.
    pub fn remove_item_from_folder(&self, cid: &str, folder: &Folder) -> IndexResult<()> {
        let left_collection = self.update(|txn| {
            require_folder(&*txn, &folder.address, &folder.path)?;
            require_item(&*txn, cid)?;
            if !txn.contains(&keys::folder_item(&folder.address, &folder.path, cid))? {
                return Err(IndexError::ItemNotInFolder {
                    cid: cid.to_string(),
                    address: folder.address.clone(),
                    path: folder.path.clone(),
                });
            }
            unlink_folder(txn, cid, &folder.address, &folder.path)?;
            unlink_collection_if_orphaned(txn, cid, &folder.address)
        })?;

        debug!(
            cid,
            address = %folder.address,
            path = %folder.path,
            left_collection,
            "item removed from folder"
        );
        Ok(())
    }

    pub fn is_item_in_folder(&self, cid: &str, folder: &Folder) -> IndexResult<bool> {
        self.view(|txn| {
            require_folder(txn, &folder.address, &folder.path)?;
            require_item(txn, cid)?;
            Ok(txn.contains(&keys::folder_item(&folder.address, &folder.path, cid))?)
        })
    }

    /// Delete a folder and its whole subtree.
    ///
    /// Items lose their membership in every deleted folder, and leave the
    /// collection when no other folder of it still holds them. The root
    /// folder cannot be deleted.
    pub fn delete_folder(&self, folder: &Folder) -> IndexResult<()> {
        folder.validate()?;
        if folder.is_root() {
            warn!(address = %folder.address, "refusing to delete root folder");
            return Err(IndexError::InvalidInput(format!(
                "the root folder of {} cannot be deleted",
                folder.address
            )));
        }

        let deleted = self.update(|txn| {
            require_folder(&*txn, &folder.address, &folder.path)?;
            delete_subtree_in(txn, &folder.address, &folder.path)
        })?;

        debug!(address = %folder.address, path = %folder.path, deleted, "folder deleted");
        Ok(())
    }

    /// Copy the `from` subtree to `to`, then delete `from` unless `copy`.
    ///
    /// Missing destination folders are created. Every item in a source folder
    /// is linked into the matching destination folder and joins `to`'s
    /// collection. `to` may live in another collection.
    pub fn move_or_copy_folder(&self, from: &Folder, to: &Folder, copy: bool) -> IndexResult<()> {
        from.validate()?;
        to.validate()?;
        check_move_target(from, to, copy).map_err(|e| rejected_move(from, to, copy, e))?;

        let folders = self.update(|txn| {
            require_folder(&*txn, &from.address, &from.path)?;
            require_collection(&*txn, &to.address)?;

            let subtree = collect_subtree(&*txn, &from.address, &from.path)?;
            let targets = destinations(from, to, &subtree)
                .map_err(|e| rejected_move(from, to, copy, e))?;

            for (source, dest) in subtree.iter().zip(&targets) {
                create_folder_in_txn(txn, &dest.address, &dest.path)?;

                for cid in read_items_in(&*txn, &from.address, source)? {
                    link_folder(txn, &cid, &dest.address, &dest.path)?;
                    if !txn.contains(&keys::collection_item(&dest.address, &cid))? {
                        link_collection(txn, &cid, &dest.address)?;
                    }
                }
            }

            if !copy {
                delete_subtree_in(txn, &from.address, &from.path)?;
            }
            Ok(subtree.len())
        })?;

        debug!(
            from_address = %from.address,
            from = %from.path,
            to_address = %to.address,
            to = %to.path,
            copy,
            folders,
            "folder moved"
        );
        Ok(())
    }
}

fn check_move_target(from: &Folder, to: &Folder, copy: bool) -> IndexResult<()> {
    if !copy && from.is_root() {
        return Err(IndexError::InvalidInput(
            "the root folder cannot be moved".into(),
        ));
    }
    if from.address == to.address {
        if from.path == to.path {
            return Err(IndexError::InvalidInput(format!(
                "cannot move folder {:?} onto itself",
                from.path
            )));
        }
        if is_within(&from.path, &to.path) {
            return Err(IndexError::InvalidInput(format!(
                "cannot move folder {:?} into its own subtree {:?}",
                from.path, to.path
            )));
        }
    }
    Ok(())
}

/// Destination folder for every source folder, in the same order.
///
/// Within one collection no destination may land inside the source subtree.
/// That happens when moving onto an ancestor whose child shares a name with
/// a folder below the source, e.g. `a/b` onto `a` maps `a/b/b` to `a/b`.
fn destinations(from: &Folder, to: &Folder, subtree: &[String]) -> IndexResult<Vec<Folder>> {
    let mut targets = Vec::with_capacity(subtree.len());
    for source in subtree {
        let dest = to.child(relative_path(&from.path, source));
        if dest.address == from.address && is_within(&from.path, &dest.path) {
            return Err(IndexError::InvalidInput(format!(
                "moving {:?} to {:?} would overwrite {:?} inside the source",
                from.path, to.path, dest.path
            )));
        }
        targets.push(dest);
    }
    Ok(targets)
}

fn rejected_move(from: &Folder, to: &Folder, copy: bool, err: IndexError) -> IndexError {
    warn!(
        from_address = %from.address,
        from = %from.path,
        to_address = %to.address,
        to = %to.path,
        copy,
        error = %err,
        "rejected folder move"
    );
    err
}

/// Returns `true` if `path` is `ancestor` or lies below it.
fn is_within(ancestor: &str, path: &str) -> bool {
    ancestor.is_empty()
        || path == ancestor
        || path
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// `path` relative to `base`, where `path` is inside `base`.
fn relative_path<'a>(base: &str, path: &'a str) -> &'a str {
    if base.is_empty() {
        return path;
    }
    match path.strip_prefix(base) {
        Some(rest) => rest.strip_prefix('/').unwrap_or(rest),
        None => path,
    }
}

// ---------------------------------------------------------------------------
// Transaction-level helpers
// ---------------------------------------------------------------------------

/// Create the collection's root folder if it is missing.
pub(crate) fn create_root_in_txn(txn: &mut dyn WriteTxn, address: &str) -> IndexResult<bool> {
    let marker = keys::folder_marker(address, ROOT_PATH);
    if txn.contains(&marker)? {
        return Ok(false);
    }
    txn.put(&marker, ROOT_PATH.as_bytes())?;
    txn.put(&keys::folder_children(address, ROOT_PATH), &encode_children(&[])?)?;
    Ok(true)
}

fn create_folder_in_txn(txn: &mut dyn WriteTxn, address: &str, path: &str) -> IndexResult<bool> {
    if path.is_empty() {
        return create_root_in_txn(txn, address);
    }

    let marker = keys::folder_marker(address, path);
    if txn.contains(&marker)? {
        return Ok(false);
    }

    let folder = Folder::new(address, path);
    let parent = folder.parent_path();
    if parent.is_empty() {
        create_root_in_txn(txn, address)?;
    } else if !txn.contains(&keys::folder_marker(address, parent))? {
        return Err(IndexError::ParentFolderNotFound {
            address: address.to_string(),
            path: parent.to_string(),
        });
    }

    txn.put(&marker, path.as_bytes())?;
    txn.put(&keys::folder_children(address, path), &encode_children(&[])?)?;

    let mut siblings = read_children_in(&*txn, address, parent)?;
    siblings.push(path.to_string());
    txn.put(&keys::folder_children(address, parent), &encode_children(&siblings)?)?;
    Ok(true)
}

fn read_children_in<T: ReadTxn + ?Sized>(
    txn: &T,
    address: &str,
    path: &str,
) -> IndexResult<Vec<String>> {
    match txn.get(&keys::folder_children(address, path))? {
        Some(bytes) => decode_children(&bytes),
        None => Ok(Vec::new()),
    }
}

fn read_items_in<T: ReadTxn + ?Sized>(
    txn: &T,
    address: &str,
    path: &str,
) -> IndexResult<Vec<String>> {
    txn.scan_prefix_keys(&keys::folder_items(address, path))?
        .iter()
        .map(|key| Key::decode_last(key))
        .collect()
}

pub(crate) fn link_folder(
    txn: &mut dyn WriteTxn,
    cid: &str,
    address: &str,
    path: &str,
) -> IndexResult<()> {
    txn.put(&keys::folder_item(address, path, cid), cid.as_bytes())?;
    txn.put(&keys::item_folder(cid, address, path), path.as_bytes())?;
    Ok(())
}

fn unlink_folder(txn: &mut dyn WriteTxn, cid: &str, address: &str, path: &str) -> IndexResult<()> {
    txn.delete(&keys::folder_item(address, path, cid))?;
    txn.delete(&keys::item_folder(cid, address, path))?;
    Ok(())
}

/// Paths of the subtree rooted at `path`, in pre-order with children in
/// creation order.
fn collect_subtree<T: ReadTxn + ?Sized>(
    txn: &T,
    address: &str,
    path: &str,
) -> IndexResult<Vec<String>> {
    let mut order = Vec::new();
    let mut visited = HashSet::new();
    let mut stack = vec![path.to_string()];

    while let Some(current) = stack.pop() {
        if !visited.insert(current.clone()) {
            return Err(IndexError::integrity(format!(
                "folder {current:?} in {address} is reachable twice"
            )));
        }
        let children = read_children_in(txn, address, &current)?;
        for child in children.iter().rev() {
            if !txn.contains(&keys::folder_marker(address, child))? {
                return Err(IndexError::integrity(format!(
                    "folder {current:?} in {address} lists missing child {child:?}"
                )));
            }
            stack.push(child.clone());
        }
        order.push(current);
    }
    Ok(order)
}

/// Delete the subtree at `path` and unlink it from its parent.
///
/// Returns the number of folders removed.
fn delete_subtree_in(txn: &mut dyn WriteTxn, address: &str, path: &str) -> IndexResult<usize> {
    let subtree = collect_subtree(&*txn, address, path)?;

    // Reversed pre-order visits every folder after all of its descendants.
    for current in subtree.iter().rev() {
        for cid in read_items_in(&*txn, address, current)? {
            unlink_folder(txn, &cid, address, current)?;
            unlink_collection_if_orphaned(txn, &cid, address)?;
        }
        txn.delete(&keys::folder_children(address, current))?;
        txn.delete(&keys::folder_marker(address, current))?;
    }

    let parent = Folder::new(address, path).parent();
    let mut siblings = read_children_in(&*txn, address, &parent.path)?;
    siblings.retain(|child| child != path);
    txn.put(&keys::folder_children(address, &parent.path), &encode_children(&siblings)?)?;

    Ok(subtree.len())
}
