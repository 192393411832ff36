//! Core types for persisting arbitrary domain objects.
//!
//! This crate defines everything a store needs to know about an object
//! without knowing anything about the storage engine:
//!
//! - [`Persistable`] — the capability trait a type implements to be stored.
//!   Every accessor, mutator and lifecycle hook has a default, so a type only
//!   overrides the capabilities it actually has.
//! - [`Record`] — the store-owned identity and timestamps embedded in each
//!   persisted object.
//! - [`Metadata`] — the indexed fields derived from an object on every save.
//! - [`PayloadCodec`] / [`JsonCodec`] — reversible encoding of an object's
//!   state into an opaque payload.
//! - [`Query`], [`Filter`] and [`OrderBy`] — structured descriptions of the
//!   find/count requests a store answers.
//!
//! # Example
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use shelf_core::{Metadata, Persistable, Record};
//!
//! #[derive(Debug, Default, Serialize, Deserialize)]
//! struct State {
//!     #[serde(skip)]
//!     record: Record,
//!     name: String,
//!     abbreviation: String,
//! }
//!
//! impl Persistable for State {
//!     fn record(&self) -> &Record {
//!         &self.record
//!     }
//!
//!     fn record_mut(&mut self) -> &mut Record {
//!         &mut self.record
//!     }
//!
//!     fn object_key(&self) -> Option<String> {
//!         Some(self.abbreviation.clone())
//!     }
//!
//!     fn title(&self) -> Option<String> {
//!         Some(self.name.clone())
//!     }
//! }
//!
//! let state = State {
//!     name: "Alabama".into(),
//!     abbreviation: "AL".into(),
//!     ..State::default()
//! };
//! let metadata = Metadata::extract(&state);
//! assert_eq!(metadata.key.as_deref(), Some("AL"));
//! assert_eq!(metadata.title.as_deref(), Some("Alabama"));
//! assert!(metadata.foreign_key.is_none());
//! ```

mod codec;
mod error;
mod object;
mod query;
mod types;

pub use codec::{JsonCodec, PayloadCodec};
pub use error::{CodecError, HookError, Result};
pub use object::{Metadata, Persistable, collection_name_of};
pub use query::{Filter, Query};
pub use types::{OrderBy, Record, Timestamp, now};
