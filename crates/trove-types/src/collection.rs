use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A collection of items, identified by an opaque address.
///
/// The address is typically a name-system hash or a domain, but this layer
/// never interprets it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    pub address: String,
    pub name: String,
    pub description: String,
    /// Whether the local user publishes this collection.
    pub is_mine: bool,
}

impl Collection {
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            description: description.into(),
            is_mine: false,
        }
    }

    /// Builder-style setter for the ownership flag.
    pub fn mine(mut self, is_mine: bool) -> Self {
        self.is_mine = is_mine;
        self
    }

    pub fn validate(&self) -> Result<(), TypeError> {
        if self.address.is_empty() {
            return Err(TypeError::EmptyField { field: "address" });
        }
        Ok(())
    }
}

/// Tri-state filter used when listing collections.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Filter {
    /// Don't care.
    #[default]
    Any,
    /// Require the property to hold.
    Only,
    /// Require the property not to hold.
    Except,
}

impl Filter {
    /// Whether a value with the property set to `value` passes the filter.
    pub fn matches(self, value: bool) -> bool {
        match self {
            Filter::Any => true,
            Filter::Only => value,
            Filter::Except => !value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let c = Collection::new("test.com", "Test Collection", "Test Description").mine(true);
        assert_eq!(c.address, "test.com");
        assert_eq!(c.name, "Test Collection");
        assert_eq!(c.description, "Test Description");
        assert!(c.is_mine);
    }

    #[test]
    fn empty_address_is_rejected() {
        let c = Collection::new("", "n", "d");
        assert_eq!(c.validate(), Err(TypeError::EmptyField { field: "address" }));
    }

    #[test]
    fn filter_semantics() {
        assert!(Filter::Any.matches(true));
        assert!(Filter::Any.matches(false));
        assert!(Filter::Only.matches(true));
        assert!(!Filter::Only.matches(false));
        assert!(!Filter::Except.matches(true));
        assert!(Filter::Except.matches(false));
        assert_eq!(Filter::default(), Filter::Any);
    }
}
