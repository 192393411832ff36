//! SQLite object store for [`Persistable`](shelf_core::Persistable) types.
//!
//! Each object type is stored in its own table, created on the first
//! insert. A row holds the object's identifier, the indexed metadata the
//! type advertises (key, foreign key, title, order number), creation and
//! update timestamps, and the encoded object state as an opaque payload.
//! Callers never write schema or SQL.
//!
//! # Architecture
//!
//! - **`schema`** — collection table naming, resolution and `CREATE TABLE`
//!   generation
//! - **`query`** — [`Query`](shelf_core::Query) → parameterized SQL clauses
//! - **`convert`** — object ↔ row transformations
//! - **`lifecycle`** — save/insert/update/delete/load and hooks
//! - **`find`** — find and count requests
//! - **`store`** — the [`Store`] handle: open/close/remove, locking and
//!   change notifications
//! - **`config`** — YAML store configuration
//!
//! # Quick start
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//! use shelf_core::{Persistable, Record};
//! use shelf_sqlite::Store;
//!
//! #[derive(Default, Serialize, Deserialize)]
//! struct ParentObject {
//!     #[serde(skip)]
//!     record: Record,
//!     parent_name: String,
//! }
//!
//! impl Persistable for ParentObject {
//!     fn record(&self) -> &Record {
//!         &self.record
//!     }
//!
//!     fn record_mut(&mut self) -> &mut Record {
//!         &mut self.record
//!     }
//!
//!     fn object_key(&self) -> Option<String> {
//!         Some(self.parent_name.clone())
//!     }
//! }
//!
//! let store = Store::default();
//! store.open("family").unwrap();
//!
//! let mut parent = ParentObject { parent_name: "A".into(), ..Default::default() };
//! store.save(&mut parent).unwrap();
//!
//! let id = parent.record.id().unwrap().to_string();
//! let loaded: Option<ParentObject> = store.load(&id).unwrap();
//! assert!(loaded.is_some());
//! ```
//!
//! # Concurrency
//!
//! A [`Store`] owns a single connection guarded by one mutex; concurrent
//! callers are serialized. Hooks run after the lock is released.

mod config;
mod convert;
mod error;
mod find;
mod lifecycle;
mod query;
mod schema;
mod store;

pub use config::{StoreConfig, StoreLocation};
pub use error::{Result, StoreError};
pub use query::{BuiltQuery, build as build_query};
pub use schema::{PREFIX_SEPARATOR, generate_empty_sql, generate_table_sql, quote_ident, table_name};
pub use store::{Store, StoreChanged, global};
