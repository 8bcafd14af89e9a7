//! Value codecs for the few non-string values the index stores.

use crate::error::{IndexError, IndexResult};

/// Encode a tag reference count.
pub(crate) fn encode_count(count: u32) -> [u8; 4] {
    count.to_be_bytes()
}

/// Decode a tag reference count stored as a big-endian `u32`.
pub(crate) fn decode_count(bytes: &[u8]) -> IndexResult<u32> {
    let raw: [u8; 4] = bytes.try_into().map_err(|_| {
        IndexError::integrity(format!(
            "tag count must be 4 bytes, found {}",
            bytes.len()
        ))
    })?;
    Ok(u32::from_be_bytes(raw))
}

pub(crate) fn encode_children(children: &[String]) -> IndexResult<Vec<u8>> {
    bincode::serialize(children).map_err(|e| IndexError::Serialization(e.to_string()))
}

pub(crate) fn decode_children(bytes: &[u8]) -> IndexResult<Vec<String>> {
    bincode::deserialize(bytes).map_err(|e| IndexError::Serialization(e.to_string()))
}

pub(crate) fn encode_flag(flag: bool) -> [u8; 1] {
    [u8::from(flag)]
}

/// Any non-zero first byte reads as `true`; an empty value reads as `false`.
pub(crate) fn decode_flag(bytes: &[u8]) -> bool {
    bytes.first().is_some_and(|b| *b != 0)
}

pub(crate) fn decode_string(bytes: Vec<u8>) -> IndexResult<String> {
    String::from_utf8(bytes)
        .map_err(|e| IndexError::integrity(format!("stored value is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_is_big_endian() {
        assert_eq!(encode_count(1), [0, 0, 0, 1]);
        assert_eq!(decode_count(&[0, 0, 1, 0]).unwrap(), 256);
    }

    #[test]
    fn truncated_count_is_an_integrity_error() {
        assert!(decode_count(&[0, 1]).unwrap_err().is_integrity_violation());
    }

    #[test]
    fn children_preserve_order() {
        let children = vec!["a/c".to_string(), "a/b".to_string()];
        let bytes = encode_children(&children).unwrap();
        assert_eq!(decode_children(&bytes).unwrap(), children);
        assert!(decode_children(&encode_children(&[]).unwrap()).unwrap().is_empty());
    }

    #[test]
    fn garbage_children_fail_to_decode() {
        let err = decode_children(&[0xff; 3]).unwrap_err();
        assert!(matches!(err, IndexError::Serialization(_)));
    }

    #[test]
    fn flags() {
        assert!(decode_flag(&encode_flag(true)));
        assert!(!decode_flag(&encode_flag(false)));
        assert!(!decode_flag(&[]));
    }

    #[test]
    fn invalid_utf8_value() {
        assert!(decode_string(vec![0xc3]).unwrap_err().is_integrity_violation());
        assert_eq!(decode_string(b"Qm1".to_vec()).unwrap(), "Qm1");
    }
}
