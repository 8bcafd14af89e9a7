//! Collection store and item-collection membership.

use tracing::debug;
use trove_kv::{ReadTxn, WriteTxn};
use trove_types::{Collection, Filter};

use crate::datastore::{require_collection, require_item, Datastore};
use crate::error::{IndexError, IndexResult};
use crate::folder::{create_root_in_txn, link_folder};
use crate::key::Key;
use crate::keys;
use crate::value::{decode_flag, decode_string, encode_flag};

impl Datastore {
    /// Insert or update a collection.
    ///
    /// A newly created collection also gets its root folder. Returns `true`
    /// if the collection did not exist before.
    pub fn create_or_update_collection(&self, collection: &Collection) -> IndexResult<bool> {
        collection.validate()?;
        let address = collection.address.as_str();

        let created = self.update(|txn| {
            let marker = keys::collection_marker(address);
            let created = !txn.contains(&marker)?;

            txn.put(&marker, address.as_bytes())?;
            txn.put(
                &keys::collection_attr(address, keys::ATTR_NAME),
                collection.name.as_bytes(),
            )?;
            txn.put(
                &keys::collection_attr(address, keys::ATTR_DESCRIPTION),
                collection.description.as_bytes(),
            )?;
            txn.put(
                &keys::collection_attr(address, keys::ATTR_IS_MINE),
                &encode_flag(collection.is_mine),
            )?;

            let mine = keys::mine_marker(address);
            if collection.is_mine {
                txn.put(&mine, address.as_bytes())?;
            } else {
                txn.delete(&mine)?;
            }

            if created {
                create_root_in_txn(txn, address)?;
            }
            Ok(created)
        })?;

        debug!(address, created, is_mine = collection.is_mine, "collection stored");
        Ok(created)
    }

    /// Read a collection record.
    pub fn read_collection(&self, address: &str) -> IndexResult<Collection> {
        self.view(|txn| {
            require_collection(txn, address)?;
            read_collection_in(txn, address)
        })
    }

    /// List collections passing both filters, in address order.
    ///
    /// `owned` filters on the is-mine flag and `empty` on whether the
    /// collection currently has no member items.
    pub fn list_collections(&self, owned: Filter, empty: Filter) -> IndexResult<Vec<Collection>> {
        self.view(|txn| {
            let registry = match owned {
                Filter::Only => keys::mine_markers(),
                Filter::Any | Filter::Except => keys::collection_markers(),
            };

            let mut out = Vec::new();
            for key in txn.scan_prefix_keys(&registry)? {
                let address = Key::decode_last(&key)?;
                if owned == Filter::Except && txn.contains(&keys::mine_marker(&address))? {
                    continue;
                }
                if empty != Filter::Any && !empty.matches(is_empty_in(txn, &address)?) {
                    continue;
                }
                out.push(read_collection_in(txn, &address)?);
            }
            Ok(out)
        })
    }

    /// Delete a collection, its folder tree and every membership in it.
    ///
    /// Member items are left in place.
    pub fn delete_collection(&self, address: &str) -> IndexResult<()> {
        let (items, folder_links) = self.update(|txn| {
            require_collection(&*txn, address)?;

            txn.delete(&keys::collection_marker(address))?;
            txn.delete(&keys::mine_marker(address))?;
            txn.delete_prefix(&keys::collection_attrs(address))?;

            let members = txn.scan_prefix_keys(&keys::collection_items(address))?;
            for key in &members {
                let cid = Key::decode_last(key)?;
                txn.delete(&keys::item_collection(&cid, address))?;
            }
            txn.delete_prefix(&keys::collection_items(address))?;

            let links = txn.scan_prefix_keys(&keys::collection_folder_items(address))?;
            for key in &links {
                let (path, cid) = decode_folder_item(key)?;
                txn.delete(&keys::item_folder(&cid, address, &path))?;
            }
            txn.delete_prefix(&keys::collection_folder_items(address))?;

            txn.delete_prefix(&keys::folder_markers(address))?;
            txn.delete_prefix(&keys::folder_attrs(address))?;
            Ok((members.len(), links.len()))
        })?;

        debug!(address, items, folder_links, "collection deleted");
        Ok(())
    }

    /// Returns `true` if no item is a member of the collection.
    pub fn is_collection_empty(&self, address: &str) -> IndexResult<bool> {
        self.view(|txn| {
            require_collection(txn, address)?;
            is_empty_in(txn, address)
        })
    }

    /// Add an item to a collection and to the collection's root folder.
    pub fn add_item_to_collection(&self, cid: &str, address: &str) -> IndexResult<()> {
        self.update(|txn| {
            require_item(&*txn, cid)?;
            require_collection(&*txn, address)?;
            if txn.contains(&keys::collection_item(address, cid))? {
                return Err(IndexError::ItemAlreadyInCollection {
                    cid: cid.to_string(),
                    address: address.to_string(),
                });
            }
            link_collection(txn, cid, address)?;
            link_folder(txn, cid, address, trove_types::ROOT_PATH)
        })?;

        debug!(cid, address, "item added to collection");
        Ok(())
    }

    /// Remove an item from a collection and from every folder in it.
    pub fn remove_item_from_collection(&self, cid: &str, address: &str) -> IndexResult<()> {
        let folders = self.update(|txn| {
            require_item(&*txn, cid)?;
            require_collection(&*txn, address)?;
            if !txn.contains(&keys::collection_item(address, cid))? {
                return Err(IndexError::ItemNotInCollection {
                    cid: cid.to_string(),
                    address: address.to_string(),
                });
            }
            unlink_collection(txn, cid, address)?;

            let links = txn.scan_prefix_keys(&keys::item_folders_in(cid, address))?;
            for key in &links {
                let path = Key::decode_last(key)?;
                txn.delete(&keys::folder_item(address, &path, cid))?;
                txn.delete(key)?;
            }
            Ok(links.len())
        })?;

        debug!(cid, address, folders, "item removed from collection");
        Ok(())
    }

    pub fn is_item_in_collection(&self, cid: &str, address: &str) -> IndexResult<bool> {
        self.view(|txn| {
            require_item(txn, cid)?;
            require_collection(txn, address)?;
            Ok(txn.contains(&keys::collection_item(address, cid))?)
        })
    }

    /// Content ids of the collection's members, in key order.
    pub fn read_collection_items(&self, address: &str) -> IndexResult<Vec<String>> {
        self.view(|txn| {
            require_collection(txn, address)?;
            txn.scan_prefix_keys(&keys::collection_items(address))?
                .iter()
                .map(|key| Key::decode_last(key))
                .collect()
        })
    }

    /// Addresses of every collection the item belongs to.
    pub fn read_item_collections(&self, cid: &str) -> IndexResult<Vec<String>> {
        self.view(|txn| {
            require_item(txn, cid)?;
            txn.scan_prefix_keys(&keys::item_collections(cid))?
                .iter()
                .map(|key| Key::decode_last(key))
                .collect()
        })
    }
}

fn read_collection_in<T: ReadTxn + ?Sized>(txn: &T, address: &str) -> IndexResult<Collection> {
    let attr = |name: &str| -> IndexResult<Option<Vec<u8>>> {
        Ok(txn.get(&keys::collection_attr(address, name))?)
    };

    let name = attr(keys::ATTR_NAME)?.map(decode_string).transpose()?;
    let description = attr(keys::ATTR_DESCRIPTION)?
        .map(decode_string)
        .transpose()?;
    let is_mine = attr(keys::ATTR_IS_MINE)?.is_some_and(|v| decode_flag(&v));

    Ok(Collection {
        address: address.to_string(),
        name: name.unwrap_or_default(),
        description: description.unwrap_or_default(),
        is_mine,
    })
}

fn is_empty_in<T: ReadTxn + ?Sized>(txn: &T, address: &str) -> IndexResult<bool> {
    Ok(!txn.has_prefix(&keys::collection_items(address))?)
}

/// Split a `folder_item::<addr>::<path>::<cid>` key into `(path, cid)`.
pub(crate) fn decode_folder_item(key: &[u8]) -> IndexResult<(String, String)> {
    match <[String; 4]>::try_from(Key::decode(key)?.into_segments()) {
        Ok([_, _, path, cid]) => Ok((path, cid)),
        Err(segments) => Err(IndexError::integrity(format!(
            "folder item key has {} segments, expected 4",
            segments.len()
        ))),
    }
}

/// Split an `item_folder::<cid>::<addr>::<path>` key into `(address, path)`.
pub(crate) fn decode_item_folder(key: &[u8]) -> IndexResult<(String, String)> {
    match <[String; 4]>::try_from(Key::decode(key)?.into_segments()) {
        Ok([_, _, address, path]) => Ok((address, path)),
        Err(segments) => Err(IndexError::integrity(format!(
            "item folder key has {} segments, expected 4",
            segments.len()
        ))),
    }
}

// ---------------------------------------------------------------------------
// Membership primitives
// ---------------------------------------------------------------------------

pub(crate) fn link_collection(txn: &mut dyn WriteTxn, cid: &str, address: &str) -> IndexResult<()> {
    txn.put(&keys::collection_item(address, cid), cid.as_bytes())?;
    txn.put(&keys::item_collection(cid, address), address.as_bytes())?;
    Ok(())
}

pub(crate) fn unlink_collection(txn: &mut dyn WriteTxn, cid: &str, address: &str) -> IndexResult<()> {
    txn.delete(&keys::collection_item(address, cid))?;
    txn.delete(&keys::item_collection(cid, address))?;
    Ok(())
}

/// Drop the item's collection membership if no folder of the collection
/// still holds it. Returns `true` if the membership was removed.
pub(crate) fn unlink_collection_if_orphaned(
    txn: &mut dyn WriteTxn,
    cid: &str,
    address: &str,
) -> IndexResult<bool> {
    if txn.has_prefix(&keys::item_folders_in(cid, address))? {
        return Ok(false);
    }
    unlink_collection(txn, cid, address)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trove_types::{Folder, Item};

    fn store_with_collection() -> Datastore {
        let ds = Datastore::in_memory();
        ds.create_or_update_collection(&Collection::new(
            "test.com",
            "Test Collection",
            "Test Description",
        ))
        .unwrap();
        ds
    }

    fn add_item(ds: &Datastore, cid: &str) {
        ds.create_or_update_item(&Item::new(cid, format!("item {cid}")))
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Create / read / update
    // -----------------------------------------------------------------------

    #[test]
    fn create_and_read_collection() {
        let ds = store_with_collection();
        let c = ds.read_collection("test.com").unwrap();
        assert_eq!(c.address, "test.com");
        assert_eq!(c.name, "Test Collection");
        assert_eq!(c.description, "Test Description");
        assert!(!c.is_mine);
    }

    #[test]
    fn update_changes_only_the_updated_field() {
        let ds = store_with_collection();
        let created = ds
            .create_or_update_collection(&Collection::new(
                "test.com",
                "Test Collection 2",
                "Test Description",
            ))
            .unwrap();
        assert!(!created);

        let c = ds.read_collection("test.com").unwrap();
        assert_eq!(c.name, "Test Collection 2");
        assert_eq!(c.description, "Test Description");
        assert_eq!(ds.list_collections(Filter::Any, Filter::Any).unwrap().len(), 1);
    }

    #[test]
    fn create_is_idempotent() {
        let ds = store_with_collection();
        let c = Collection::new("test.com", "Test Collection", "Test Description");
        ds.create_or_update_collection(&c).unwrap();
        ds.create_or_update_collection(&c).unwrap();
        assert_eq!(ds.read_collection("test.com").unwrap(), c);
        assert_eq!(
            ds.read_folder_children(&Folder::root("test.com")).unwrap(),
            Vec::<String>::new()
        );
    }

    #[test]
    fn new_collection_has_root_folder() {
        let ds = store_with_collection();
        assert_eq!(ds.read_folder("test.com", "").unwrap(), Folder::root("test.com"));
    }

    #[test]
    fn read_missing_collection() {
        let ds = Datastore::in_memory();
        let err = ds.read_collection("nope").unwrap_err();
        assert!(matches!(err, IndexError::CollectionNotFound(ref a) if a == "nope"));
        assert!(err.is_not_found());
    }

    #[test]
    fn empty_address_is_rejected() {
        let ds = Datastore::in_memory();
        let err = ds
            .create_or_update_collection(&Collection::new("", "x", ""))
            .unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn addresses_with_separators_are_kept_apart() {
        let ds = Datastore::in_memory();
        for addr in ["a", "a::b", "a:", "a\\"] {
            ds.create_or_update_collection(&Collection::new(addr, addr, ""))
                .unwrap();
        }
        ds.delete_collection("a").unwrap();
        let left: Vec<String> = ds
            .list_collections(Filter::Any, Filter::Any)
            .unwrap()
            .into_iter()
            .map(|c| c.address)
            .collect();
        assert_eq!(left.len(), 3);
        assert!(!left.contains(&"a".to_string()));
        assert_eq!(ds.read_collection("a::b").unwrap().name, "a::b");
    }

    // -----------------------------------------------------------------------
    // Listing filters
    // -----------------------------------------------------------------------

    #[test]
    fn list_with_owned_and_empty_filters() {
        let ds = Datastore::in_memory();
        ds.create_or_update_collection(&Collection::new("mine-full", "", "").mine(true))
            .unwrap();
        ds.create_or_update_collection(&Collection::new("mine-empty", "", "").mine(true))
            .unwrap();
        ds.create_or_update_collection(&Collection::new("other-full", "", ""))
            .unwrap();
        ds.create_or_update_collection(&Collection::new("other-empty", "", ""))
            .unwrap();
        add_item(&ds, "Qm1");
        ds.add_item_to_collection("Qm1", "mine-full").unwrap();
        ds.add_item_to_collection("Qm1", "other-full").unwrap();

        let addrs = |owned, empty| -> Vec<String> {
            ds.list_collections(owned, empty)
                .unwrap()
                .into_iter()
                .map(|c| c.address)
                .collect()
        };

        assert_eq!(addrs(Filter::Any, Filter::Any).len(), 4);
        assert_eq!(addrs(Filter::Only, Filter::Any), ["mine-empty", "mine-full"]);
        assert_eq!(addrs(Filter::Except, Filter::Any), ["other-empty", "other-full"]);
        assert_eq!(addrs(Filter::Any, Filter::Only), ["mine-empty", "other-empty"]);
        assert_eq!(addrs(Filter::Only, Filter::Except), ["mine-full"]);
        assert_eq!(addrs(Filter::Except, Filter::Only), ["other-empty"]);

        let mine = ds.list_collections(Filter::Only, Filter::Any).unwrap();
        assert!(mine.iter().all(|c| c.is_mine));
    }

    #[test]
    fn clearing_is_mine_removes_owned_marker() {
        let ds = Datastore::in_memory();
        ds.create_or_update_collection(&Collection::new("x", "", "").mine(true))
            .unwrap();
        ds.create_or_update_collection(&Collection::new("x", "", "").mine(false))
            .unwrap();
        assert!(ds.list_collections(Filter::Only, Filter::Any).unwrap().is_empty());
        assert!(!ds.read_collection("x").unwrap().is_mine);
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    #[test]
    fn add_and_remove_item() {
        let ds = store_with_collection();
        add_item(&ds, "Qm1");

        assert!(ds.is_collection_empty("test.com").unwrap());
        ds.add_item_to_collection("Qm1", "test.com").unwrap();
        assert!(ds.is_item_in_collection("Qm1", "test.com").unwrap());
        assert!(!ds.is_collection_empty("test.com").unwrap());
        assert_eq!(ds.read_collection_items("test.com").unwrap(), ["Qm1"]);
        assert_eq!(ds.read_item_collections("Qm1").unwrap(), ["test.com"]);
        assert!(ds.is_item_in_folder("Qm1", &Folder::root("test.com")).unwrap());

        ds.remove_item_from_collection("Qm1", "test.com").unwrap();
        assert!(!ds.is_item_in_collection("Qm1", "test.com").unwrap());
        assert!(ds.is_collection_empty("test.com").unwrap());
        assert!(ds.read_item_collections("Qm1").unwrap().is_empty());
        assert!(ds.read_folder_items(&Folder::root("test.com")).unwrap().is_empty());
    }

    #[test]
    fn duplicate_add_is_reported() {
        let ds = store_with_collection();
        add_item(&ds, "Qm1");
        ds.add_item_to_collection("Qm1", "test.com").unwrap();
        let err = ds.add_item_to_collection("Qm1", "test.com").unwrap_err();
        assert!(matches!(err, IndexError::ItemAlreadyInCollection { .. }));
    }

    #[test]
    fn remove_absent_item_is_reported() {
        let ds = store_with_collection();
        add_item(&ds, "Qm1");
        let err = ds.remove_item_from_collection("Qm1", "test.com").unwrap_err();
        assert!(matches!(err, IndexError::ItemNotInCollection { .. }));
    }

    #[test]
    fn membership_requires_both_sides() {
        let ds = store_with_collection();
        assert!(matches!(
            ds.add_item_to_collection("Qm1", "test.com"),
            Err(IndexError::ItemNotFound(_))
        ));
        add_item(&ds, "Qm1");
        assert!(matches!(
            ds.add_item_to_collection("Qm1", "other.com"),
            Err(IndexError::CollectionNotFound(_))
        ));
    }

    #[test]
    fn remove_from_collection_clears_subfolder_memberships() {
        let ds = store_with_collection();
        add_item(&ds, "Qm1");
        ds.create_or_update_folder(&Folder::new("test.com", "a")).unwrap();
        ds.add_item_to_folder("Qm1", &Folder::new("test.com", "a")).unwrap();

        ds.remove_item_from_collection("Qm1", "test.com").unwrap();
        assert!(!ds.is_item_in_folder("Qm1", &Folder::new("test.com", "a")).unwrap());
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_collection_keeps_items() {
        let ds = store_with_collection();
        ds.create_or_update_collection(&Collection::new("other.com", "", ""))
            .unwrap();
        add_item(&ds, "Qm1");
        ds.add_item_to_collection("Qm1", "test.com").unwrap();
        ds.add_item_to_collection("Qm1", "other.com").unwrap();
        ds.create_or_update_folder(&Folder::new("test.com", "a")).unwrap();
        ds.create_or_update_folder(&Folder::new("test.com", "a/b")).unwrap();
        ds.add_item_to_folder("Qm1", &Folder::new("test.com", "a/b")).unwrap();

        ds.delete_collection("test.com").unwrap();

        assert!(matches!(
            ds.read_collection("test.com"),
            Err(IndexError::CollectionNotFound(_))
        ));
        assert_eq!(ds.read_item("Qm1").unwrap().name, "item Qm1");
        assert_eq!(ds.read_item_collections("Qm1").unwrap(), ["other.com"]);
        assert!(!ds.is_folder_path_exists("test.com", "a").unwrap());
        assert!(!ds.is_folder_path_exists("test.com", "").unwrap());
        assert!(ds.is_item_in_folder("Qm1", &Folder::root("other.com")).unwrap());
    }

    #[test]
    fn delete_collection_leaves_no_keys_behind() {
        let ds = store_with_collection();
        add_item(&ds, "Qm1");
        ds.add_item_to_collection("Qm1", "test.com").unwrap();
        ds.create_or_update_folder(&Folder::new("test.com", "a")).unwrap();
        ds.add_item_to_folder("Qm1", &Folder::new("test.com", "a")).unwrap();

        ds.delete_collection("test.com").unwrap();

        let keys = ds.view(|txn| Ok(txn.scan_prefix_keys(b"")?)).unwrap();
        let rendered: Vec<String> = keys
            .iter()
            .map(|k| String::from_utf8_lossy(k).into_owned())
            .collect();
        assert_eq!(rendered, ["item::Qm1::name", "items::Qm1"]);
    }

    #[test]
    fn delete_missing_collection() {
        let ds = Datastore::in_memory();
        assert!(ds.delete_collection("nope").unwrap_err().is_not_found());
    }

    #[test]
    fn recreated_collection_starts_fresh() {
        let ds = store_with_collection();
        add_item(&ds, "Qm1");
        ds.add_item_to_collection("Qm1", "test.com").unwrap();
        ds.delete_collection("test.com").unwrap();

        assert!(ds
            .create_or_update_collection(&Collection::new("test.com", "again", ""))
            .unwrap());
        assert!(ds.is_collection_empty("test.com").unwrap());
        assert!(ds.read_folder("test.com", "").is_ok());
    }
}
