//! The persistable capability set and metadata extraction.
//!
//! A type becomes storable by implementing [`Persistable`]. Only
//! [`record`](Persistable::record) and [`record_mut`](Persistable::record_mut)
//! are required; every other accessor, the foreign-key mutator and the three
//! lifecycle hooks default to "not implemented", which the store treats as
//! an absent value or a no-op. Heterogeneous types can therefore share one
//! store without a common base type.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::HookError;
use crate::types::Record;

/// Capabilities a type advertises to the store.
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use shelf_core::{Persistable, Record};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct ChildObject {
///     #[serde(skip)]
///     record: Record,
///     child_name: String,
///     parent_id: Option<String>,
/// }
///
/// impl Persistable for ChildObject {
///     fn record(&self) -> &Record {
///         &self.record
///     }
///
///     fn record_mut(&mut self) -> &mut Record {
///         &mut self.record
///     }
///
///     fn foreign_key(&self) -> Option<String> {
///         self.parent_id.clone()
///     }
///
///     fn set_foreign_key(&mut self, foreign_key: &str) -> bool {
///         self.parent_id = Some(foreign_key.to_string());
///         true
///     }
/// }
///
/// assert!(ChildObject::collection().ends_with("::ChildObject"));
/// ```
pub trait Persistable: Serialize + DeserializeOwned {
    /// Name of the collection (one table per collection) this type lives in.
    ///
    /// Defaults to the fully qualified type name, so same-named types in
    /// different modules get separate tables. Override it when stored data
    /// must survive the type being renamed or moved.
    fn collection() -> String {
        collection_name_of::<Self>()
    }

    /// Store-owned identity and timestamps.
    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    /// Caller-defined logical key used for key lookups. Not required to be
    /// unique.
    fn object_key(&self) -> Option<String> {
        None
    }

    /// Key of another object this one points to.
    fn foreign_key(&self) -> Option<String> {
        None
    }

    /// Accepts a foreign key set by the store.
    ///
    /// Returns `false` when the type has no foreign key to set; the store
    /// then skips propagation instead of failing.
    fn set_foreign_key(&mut self, _foreign_key: &str) -> bool {
        false
    }

    /// Display label used for title lookups.
    fn title(&self) -> Option<String> {
        None
    }

    /// Sort weight used for range queries and explicit ordering.
    fn order_number(&self) -> Option<f64> {
        None
    }

    /// Top-level properties left out of the payload.
    fn ignored_properties(&self) -> &[&'static str] {
        &[]
    }

    /// Runs after the object has been inserted or updated.
    fn after_save(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs after the object has been decoded from a stored row.
    fn after_load(&mut self) -> Result<(), HookError> {
        Ok(())
    }

    /// Runs after the object's row has been removed.
    fn after_delete(&mut self) -> Result<(), HookError> {
        Ok(())
    }
}

/// Returns the fully qualified name of `T`, generic arguments included.
///
/// `my_app::model::State` and `my_app::archive::State` stay distinct, as do
/// `Page<u8>` and `Page<u16>`.
pub fn collection_name_of<T: ?Sized>() -> String {
    std::any::type_name::<T>().to_string()
}

/// Indexed metadata derived from an object on every save.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub key: Option<String>,
    pub foreign_key: Option<String>,
    pub title: Option<String>,
    pub order_number: Option<f64>,
    /// Properties excluded from the payload.
    pub ignored: Vec<String>,
}

impl Metadata {
    /// Reads every metadata capability of `object`.
    ///
    /// Capabilities the type does not implement come back as `None` (or an
    /// empty ignore list); that is never an error.
    pub fn extract<T: Persistable>(object: &T) -> Self {
        Self {
            key: object.object_key(),
            foreign_key: object.foreign_key(),
            title: object.title(),
            order_number: object.order_number(),
            ignored: object
                .ignored_properties()
                .iter()
                .map(|p| (*p).to_string())
                .collect(),
        }
    }

    pub fn ignores(&self, property: &str) -> bool {
        self.ignored.iter().any(|p| p == property)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Default, Serialize, Deserialize)]
    struct Plain {
        #[serde(skip)]
        record: Record,
        value: u32,
    }

    impl Persistable for Plain {
        fn record(&self) -> &Record {
            &self.record
        }

        fn record_mut(&mut self) -> &mut Record {
            &mut self.record
        }
    }

    #[derive(Default, Serialize, Deserialize)]
    struct Rich {
        #[serde(skip)]
        record: Record,
        name: String,
        rank: i32,
        scratch: String,
    }

    impl Persistable for Rich {
        fn collection() -> String {
            "rich_things".to_string()
        }

        fn record(&self) -> &Record {
            &self.record
        }

        fn record_mut(&mut self) -> &mut Record {
            &mut self.record
        }

        fn object_key(&self) -> Option<String> {
            Some(self.name.to_lowercase())
        }

        fn title(&self) -> Option<String> {
            Some(self.name.clone())
        }

        fn order_number(&self) -> Option<f64> {
            Some(f64::from(self.rank))
        }

        fn ignored_properties(&self) -> &[&'static str] {
            &["scratch"]
        }
    }

    #[test]
    fn test_extract_defaults_to_absent() {
        let metadata = Metadata::extract(&Plain::default());
        assert_eq!(metadata, Metadata::default());
    }

    #[test]
    fn test_extract_implemented_capabilities() {
        let rich = Rich {
            name: "Alabama".into(),
            rank: 7,
            ..Rich::default()
        };
        let metadata = Metadata::extract(&rich);
        assert_eq!(metadata.key.as_deref(), Some("alabama"));
        assert_eq!(metadata.title.as_deref(), Some("Alabama"));
        assert_eq!(metadata.order_number, Some(7.0));
        assert!(metadata.foreign_key.is_none());
        assert!(metadata.ignores("scratch"));
        assert!(!metadata.ignores("name"));
    }

    #[test]
    fn test_set_foreign_key_default_is_unsupported() {
        let mut plain = Plain::default();
        assert!(!plain.set_foreign_key("p1"));
    }

    mod archive {
        #[derive(Default, serde::Serialize, serde::Deserialize)]
        pub struct Plain {
            #[serde(skip)]
            pub record: crate::types::Record,
        }

        impl crate::object::Persistable for Plain {
            fn record(&self) -> &crate::types::Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut crate::types::Record {
                &mut self.record
            }
        }
    }

    #[test]
    fn test_collection_names() {
        assert_eq!(Plain::collection(), "shelf_core::object::tests::Plain");
        assert_eq!(Rich::collection(), "rich_things");
        assert_eq!(collection_name_of::<u8>(), "u8");
    }

    #[test]
    fn test_collection_names_keep_module_and_generics() {
        assert_ne!(Plain::collection(), archive::Plain::collection());
        assert_ne!(collection_name_of::<Vec<u8>>(), collection_name_of::<Vec<u16>>());
    }
}
