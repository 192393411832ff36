//! Reversible encoding of object state into an opaque payload.
//!
//! The store never looks inside a payload. It hands the object and its
//! ignore list to a [`PayloadCodec`] on save and asks the same codec to
//! rebuild the object on load. [`JsonCodec`] is the default.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CodecError, Result};

/// Turns objects into payload bytes and back.
///
/// Implementations must be symmetric: decoding an encoding made with an
/// empty ignore list reproduces every property of the original value.
pub trait PayloadCodec {
    /// Encodes `value`, leaving out every top-level property in `ignored`.
    fn encode<T: Serialize>(&self, collection: &str, value: &T, ignored: &[String])
    -> Result<Vec<u8>>;

    /// Rebuilds a value of type `T` from a payload.
    fn decode<T: DeserializeOwned>(&self, collection: &str, payload: &[u8]) -> Result<T>;
}

/// JSON payload codec backed by `serde_json`.
///
/// Ignored properties are removed from the top-level JSON object, so the
/// decoding type must tolerate their absence (for example with
/// `#[serde(default)]`).
///
/// # Examples
///
/// ```
/// use shelf_core::{JsonCodec, PayloadCodec};
/// use std::collections::BTreeMap;
///
/// let mut value = BTreeMap::new();
/// value.insert("name", "Alabama");
/// value.insert("cache", "stale");
///
/// let codec = JsonCodec;
/// let payload = codec.encode("State", &value, &["cache".to_string()]).unwrap();
/// let back: BTreeMap<String, String> = codec.decode("State", &payload).unwrap();
/// assert_eq!(back.len(), 1);
/// assert_eq!(back["name"], "Alabama");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        collection: &str,
        value: &T,
        ignored: &[String],
    ) -> Result<Vec<u8>> {
        let encode_err = |source| CodecError::Encode {
            collection: collection.to_string(),
            source,
        };

        let mut tree = serde_json::to_value(value).map_err(encode_err)?;
        if let Value::Object(ref mut map) = tree {
            for property in ignored {
                map.remove(property);
            }
        }
        serde_json::to_vec(&tree).map_err(encode_err)
    }

    fn decode<T: DeserializeOwned>(&self, collection: &str, payload: &[u8]) -> Result<T> {
        serde_json::from_slice(payload).map_err(|source| CodecError::Decode {
            collection: collection.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Frame {
        title: String,
        width: f64,
        height: f64,
        #[serde(default)]
        selected: bool,
    }

    fn frame() -> Frame {
        Frame {
            title: "window".into(),
            width: 320.0,
            height: 200.5,
            selected: true,
        }
    }

    #[test]
    fn test_round_trip_without_ignores() {
        let codec = JsonCodec;
        let payload = codec.encode("Frame", &frame(), &[]).unwrap();
        let back: Frame = codec.decode("Frame", &payload).unwrap();
        assert_eq!(back, frame());
    }

    #[test]
    fn test_ignored_property_is_not_stored() {
        let codec = JsonCodec;
        let payload = codec
            .encode("Frame", &frame(), &["selected".to_string()])
            .unwrap();
        let raw: Value = serde_json::from_slice(&payload).unwrap();
        assert!(raw.get("selected").is_none());
        assert_eq!(raw["title"], "window");

        let back: Frame = codec.decode("Frame", &payload).unwrap();
        assert!(!back.selected);
        assert_eq!(back.width, 320.0);
    }

    #[test]
    fn test_ignore_list_on_non_object_is_noop() {
        let codec = JsonCodec;
        let payload = codec.encode("Num", &42u32, &["x".to_string()]).unwrap();
        assert_eq!(payload, b"42");
    }

    #[test]
    fn test_decode_failure_names_collection() {
        let codec = JsonCodec;
        let err = codec.decode::<Frame>("Frame", b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Decode { ref collection, .. } if collection == "Frame"));
        assert!(err.to_string().contains("Frame"));
    }
}
