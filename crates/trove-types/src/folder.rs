use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Path of a collection's root folder.
pub const ROOT_PATH: &str = "";

/// Separator between folder path components.
pub const PATH_SEPARATOR: char = '/';

/// A folder inside one collection's tree.
///
/// A folder belongs to exactly one collection (by address). Within that
/// collection its path is unique. The empty path is the root folder, which
/// every collection has from creation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Folder {
    /// Address of the owning collection.
    pub address: String,
    /// `/`-separated path; `""` for the root.
    pub path: String,
}

impl Folder {
    pub fn new(address: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            path: path.into(),
        }
    }

    /// The root folder of the collection at `address`.
    pub fn root(address: impl Into<String>) -> Self {
        Self::new(address, ROOT_PATH)
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Path of the immediate parent. The root's parent is the root itself.
    pub fn parent_path(&self) -> &str {
        match self.path.rfind(PATH_SEPARATOR) {
            Some(idx) => &self.path[..idx],
            None => ROOT_PATH,
        }
    }

    /// The parent folder in the same collection.
    pub fn parent(&self) -> Folder {
        Folder::new(self.address.clone(), self.parent_path())
    }

    /// The folder at `relative` below this one. An empty `relative` is this
    /// folder.
    pub fn child(&self, relative: &str) -> Folder {
        Folder::new(self.address.clone(), join_path(&self.path, relative))
    }

    /// Check the address and path are well formed.
    ///
    /// The path must be empty (root) or a sequence of non-empty components
    /// separated by single `/` characters.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.address.is_empty() {
            return Err(TypeError::EmptyField { field: "address" });
        }
        validate_path(&self.path)
    }
}

/// Join a folder path and a relative path, treating `""` as the root.
pub fn join_path(base: &str, relative: &str) -> String {
    match (base.is_empty(), relative.is_empty()) {
        (true, _) => relative.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}{PATH_SEPARATOR}{relative}"),
    }
}

fn validate_path(path: &str) -> Result<(), TypeError> {
    if path.is_empty() {
        return Ok(());
    }
    if path.starts_with(PATH_SEPARATOR) || path.ends_with(PATH_SEPARATOR) {
        return Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: "must not start or end with '/'".into(),
        });
    }
    if path.split(PATH_SEPARATOR).any(str::is_empty) {
        return Err(TypeError::InvalidPath {
            path: path.to_string(),
            reason: "path components must not be empty".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_nested_folder() {
        let f = Folder::new("test.com", "folder1/folder2/folder4");
        assert_eq!(f.parent_path(), "folder1/folder2");
        assert_eq!(f.parent(), Folder::new("test.com", "folder1/folder2"));
    }

    #[test]
    fn parent_of_top_level_folder_is_root() {
        let f = Folder::new("test.com", "folder1");
        assert_eq!(f.parent_path(), ROOT_PATH);
        assert!(f.parent().is_root());
    }

    #[test]
    fn root_folder() {
        let root = Folder::root("test.com");
        assert!(root.is_root());
        assert_eq!(root.parent_path(), ROOT_PATH);
        assert_eq!(root.child("a").path, "a");
        assert_eq!(root.child("a").child("b").path, "a/b");
        assert_eq!(root.child("a").child("b/c").path, "a/b/c");
        assert_eq!(root.child("a").child(""), root.child("a"));
    }

    #[test]
    fn join_handles_root() {
        assert_eq!(join_path("", "a/b"), "a/b");
        assert_eq!(join_path("x", ""), "x");
        assert_eq!(join_path("x", "a/b"), "x/a/b");
    }

    #[test]
    fn validate_accepts_well_formed_paths() {
        assert!(Folder::root("a").validate().is_ok());
        assert!(Folder::new("a", "x").validate().is_ok());
        assert!(Folder::new("a", "x/y z/w").validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_paths() {
        assert!(Folder::new("a", "/x").validate().is_err());
        assert!(Folder::new("a", "x/").validate().is_err());
        assert!(Folder::new("a", "x//y").validate().is_err());
        assert_eq!(
            Folder::new("", "x").validate(),
            Err(TypeError::EmptyField { field: "address" })
        );
    }
}
