use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::tag::Tag;

/// One content-addressed resource.
///
/// Items exist independently of collections; they join collections and
/// folders through membership relations kept by the index layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Content identifier, opaque to this layer.
    pub cid: String,
    pub name: String,
    pub tags: Vec<Tag>,
}

impl Item {
    pub fn new(cid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            name: name.into(),
            tags: Vec::new(),
        }
    }

    /// Builder-style setter for the tag list.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags = tags.into_iter().collect();
        self
    }

    /// Returns `true` if the item carries a tag equal to `tag`.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn validate(&self) -> Result<(), TypeError> {
        if self.cid.is_empty() {
            return Err(TypeError::EmptyField { field: "cid" });
        }
        Ok(())
    }
}
