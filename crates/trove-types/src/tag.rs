//! Hierarchical tags.
//!
//! A [`Tag`] is an ordered list of segments. Its canonical string form joins
//! the segments with `:`, so `["media", "audio", "flac"]` is written
//! `media:audio:flac` and is conceptually nested under `media:audio`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Separator between tag segments in the canonical string form.
pub const TAG_SEPARATOR: char = ':';

/// A hierarchical label attached to items.
///
/// Segments are non-empty and never contain [`TAG_SEPARATOR`], so the
/// canonical string round-trips through [`Tag::from_str`]. Two tags are equal
/// iff their segment lists are equal element-wise; order matters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Tag {
    segments: Vec<String>,
}

impl Tag {
    /// Build a tag from its segments, validating each one.
    pub fn new<I, S>(segments: I) -> Result<Self, TypeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(TypeError::EmptyTag);
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self { segments })
    }

    /// The ordered segments of this tag.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

fn validate_segment(segment: &str) -> Result<(), TypeError> {
    if segment.is_empty() {
        return Err(TypeError::InvalidTagSegment {
            segment: segment.to_string(),
            reason: "segment must not be empty".into(),
        });
    }
    if segment.contains(TAG_SEPARATOR) {
        return Err(TypeError::InvalidTagSegment {
            segment: segment.to_string(),
            reason: format!("segment must not contain {TAG_SEPARATOR:?}"),
        });
    }
    Ok(())
}

impl FromStr for Tag {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(TypeError::EmptyTag);
        }
        Self::new(s.split(TAG_SEPARATOR))
    }
}

impl TryFrom<Vec<String>> for Tag {
    type Error = TypeError;

    fn try_from(segments: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(segments)
    }
}

impl From<Tag> for Vec<String> {
    fn from(tag: Tag) -> Self {
        tag.segments
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{TAG_SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(segments: &[&str]) -> Tag {
        Tag::new(segments.iter().copied()).unwrap()
    }

    #[test]
    fn equal_segments_are_equal() {
        assert_eq!(tag(&["a", "b"]), tag(&["a", "b"]));
    }

    #[test]
    fn longer_tag_is_not_equal() {
        assert_ne!(tag(&["a", "b"]), tag(&["a", "b", "c"]));
    }

    #[test]
    fn segment_order_matters() {
        assert_ne!(tag(&["a", "b"]), tag(&["b", "a"]));
    }

    #[test]
    fn display_joins_with_colon() {
        assert_eq!(tag(&["tag1a", "tag1b", "tag1c"]).to_string(), "tag1a:tag1b:tag1c");
        assert_eq!(tag(&["solo"]).to_string(), "solo");
    }

    #[test]
    fn parse_splits_on_colon() {
        let parsed: Tag = "tag400a:tag400b".parse().unwrap();
        assert_eq!(parsed, tag(&["tag400a", "tag400b"]));
        assert_eq!(parsed.segments().len(), 2);
    }

    #[test]
    fn reject_empty_tag() {
        assert_eq!(Tag::new(Vec::<String>::new()), Err(TypeError::EmptyTag));
        assert_eq!("".parse::<Tag>(), Err(TypeError::EmptyTag));
    }

    #[test]
    fn reject_empty_segment() {
        assert!("a::b".parse::<Tag>().is_err());
        assert!(":a".parse::<Tag>().is_err());
        assert!("a:".parse::<Tag>().is_err());
    }

    #[test]
    fn reject_separator_inside_segment() {
        assert!(Tag::new(["a:b"]).is_err());
    }

    #[test]
    fn serde_validates_segments() {
        let json = serde_json::to_string(&tag(&["x", "y"])).unwrap();
        assert_eq!(json, r#"["x","y"]"#);
        let back: Tag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag(&["x", "y"]));
        assert!(serde_json::from_str::<Tag>(r#"["x",""]"#).is_err());
    }
}
