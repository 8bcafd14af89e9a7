use thiserror::Error;

/// Errors produced when constructing or validating value types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("tag must have at least one segment")]
    EmptyTag,

    #[error("invalid tag segment {segment:?}: {reason}")]
    InvalidTagSegment { segment: String, reason: String },

    #[error("invalid folder path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
}
