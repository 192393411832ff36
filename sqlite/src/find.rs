//! Find and count requests against one collection.
//!
//! [`Store::find`] and [`Store::count`] accept any [`Query`]. The remaining
//! methods are shortcuts for the common query shapes, each equivalent to
//! the matching [`Query`] constructor.
//!
//! # Example
//!
//! ```no_run
//! # use serde::{Deserialize, Serialize};
//! # use shelf_core::{Persistable, Record};
//! # #[derive(Default, Serialize, Deserialize)]
//! # struct State { #[serde(skip)] record: Record, name: String }
//! # impl Persistable for State {
//! #     fn record(&self) -> &Record { &self.record }
//! #     fn record_mut(&mut self) -> &mut Record { &mut self.record }
//! #     fn title(&self) -> Option<String> { Some(self.name.clone()) }
//! # }
//! use shelf_core::{OrderBy, Query};
//! use shelf_sqlite::Store;
//!
//! let store = Store::default();
//! store.open("states").unwrap();
//!
//! let matches: Vec<State> = store
//!     .find(&Query::in_title("ala").order_by(OrderBy::Title).limit(10))
//!     .unwrap();
//! let total = store.count_all::<State>().unwrap();
//! println!("{} of {total}", matches.len());
//! ```

use shelf_core::{OrderBy, PayloadCodec, Persistable, Query, Timestamp};
use tracing::debug;

use crate::convert::{count_rows, select_rows};
use crate::error::Result;
use crate::lifecycle::run_hook;
use crate::query::build;
use crate::schema::table_exists;
use crate::store::Store;

impl<C: PayloadCodec> Store<C> {
    /// Returns every object of type `T` matching `query`.
    ///
    /// A collection that has never had an object inserted yields an empty
    /// result. `after_load` runs on each object after the store lock has
    /// been released.
    ///
    /// # Errors
    ///
    /// If `after_load` fails for any object, the hook still runs on every
    /// other object and the first failure is returned as
    /// [`StoreError::Hook`](crate::StoreError::Hook) in place of the result.
    /// Stored rows are never affected by a load hook.
    pub fn find<T: Persistable>(&self, query: &Query) -> Result<Vec<T>> {
        let collection = T::collection();
        let table = self.table_for(&collection)?;
        let built = build(query);

        let rows = self.with_open(|open| {
            if !table_exists(&open.conn, &table)? {
                return Ok(Vec::new());
            }
            select_rows(&open.conn, &table, &built)
        })?;
        debug!(collection = %collection, found = rows.len(), "Find");

        let mut objects = Vec::with_capacity(rows.len());
        for row in rows {
            objects.push(row.into_object::<T, C>(&self.codec, &collection)?);
        }
        let mut first_failure = None;
        for object in &mut objects {
            let outcome = run_hook(&collection, "after_load", object.after_load());
            if first_failure.is_none() {
                first_failure = outcome.err();
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(objects),
        }
    }

    /// Counts the objects of type `T` matching `query`. Ordering and limit
    /// are ignored.
    pub fn count<T: Persistable>(&self, query: &Query) -> Result<usize> {
        self.count_collection(&T::collection(), query)
    }

    /// Counts rows of `collection` matching `query`.
    pub fn count_collection(&self, collection: &str, query: &Query) -> Result<usize> {
        let table = self.table_for(collection)?;
        let built = build(query);
        let count = self.with_open(|open| {
            if !table_exists(&open.conn, &table)? {
                return Ok(0);
            }
            count_rows(&open.conn, &table, &built)
        })?;
        debug!(collection = %collection, count, "Count");
        Ok(count)
    }

    /// Returns the first object, in insertion order, whose key equals `key`.
    pub fn find_with_key<T: Persistable>(&self, key: &str) -> Result<Option<T>> {
        Ok(self.find(&Query::with_key(key).limit(1))?.pop())
    }

    pub fn find_all<T: Persistable>(&self) -> Result<Vec<T>> {
        self.find(&Query::all())
    }

    pub fn find_all_ordered<T: Persistable>(&self, order_by: OrderBy, limit: usize) -> Result<Vec<T>> {
        self.find(&Query::all().order_by(order_by).limit(limit))
    }

    /// Objects whose key contains `fragment`.
    pub fn find_in_key<T: Persistable>(&self, fragment: &str) -> Result<Vec<T>> {
        self.find(&Query::in_key(fragment))
    }

    pub fn find_with_title<T: Persistable>(&self, title: &str) -> Result<Vec<T>> {
        self.find(&Query::with_title(title))
    }

    /// Objects whose title contains `fragment`.
    pub fn find_in_title<T: Persistable>(&self, fragment: &str) -> Result<Vec<T>> {
        self.find(&Query::in_title(fragment))
    }

    pub fn find_with_foreign_key<T: Persistable>(&self, foreign_key: &str) -> Result<Vec<T>> {
        self.find(&Query::with_foreign_key(foreign_key))
    }

    /// Objects whose foreign key contains `fragment`.
    pub fn find_in_foreign_key<T: Persistable>(&self, fragment: &str) -> Result<Vec<T>> {
        self.find(&Query::in_foreign_key(fragment))
    }

    /// Objects whose order number lies in `from..=to`.
    pub fn find_with_order_number<T: Persistable>(&self, from: f64, to: f64) -> Result<Vec<T>> {
        self.find(&Query::order_number_between(from, to))
    }

    pub fn created_most_recent<T: Persistable>(&self, top: usize) -> Result<Vec<T>> {
        self.find(&Query::created_most_recent(top))
    }

    pub fn created_least_recent<T: Persistable>(&self, top: usize) -> Result<Vec<T>> {
        self.find(&Query::created_least_recent(top))
    }

    pub fn created_between<T: Persistable>(&self, from: Timestamp, to: Timestamp) -> Result<Vec<T>> {
        self.find(&Query::created_between(from, to))
    }

    pub fn updated_most_recent<T: Persistable>(&self, top: usize) -> Result<Vec<T>> {
        self.find(&Query::updated_most_recent(top))
    }

    pub fn updated_least_recent<T: Persistable>(&self, top: usize) -> Result<Vec<T>> {
        self.find(&Query::updated_least_recent(top))
    }

    pub fn updated_between<T: Persistable>(&self, from: Timestamp, to: Timestamp) -> Result<Vec<T>> {
        self.find(&Query::updated_between(from, to))
    }

    pub fn count_all<T: Persistable>(&self) -> Result<usize> {
        self.count::<T>(&Query::all())
    }

    pub fn count_with_key<T: Persistable>(&self, key: &str) -> Result<usize> {
        self.count::<T>(&Query::with_key(key))
    }

    pub fn count_like_key<T: Persistable>(&self, fragment: &str) -> Result<usize> {
        self.count::<T>(&Query::in_key(fragment))
    }

    pub fn count_with_title<T: Persistable>(&self, title: &str) -> Result<usize> {
        self.count::<T>(&Query::with_title(title))
    }

    pub fn count_like_title<T: Persistable>(&self, fragment: &str) -> Result<usize> {
        self.count::<T>(&Query::in_title(fragment))
    }

    pub fn count_with_foreign_key<T: Persistable>(&self, foreign_key: &str) -> Result<usize> {
        self.count::<T>(&Query::with_foreign_key(foreign_key))
    }

    pub fn count_like_foreign_key<T: Persistable>(&self, fragment: &str) -> Result<usize> {
        self.count::<T>(&Query::in_foreign_key(fragment))
    }

    pub fn count_ordered_between<T: Persistable>(&self, from: f64, to: f64) -> Result<usize> {
        self.count::<T>(&Query::order_number_between(from, to))
    }

    pub fn count_created_between<T: Persistable>(&self, from: Timestamp, to: Timestamp) -> Result<usize> {
        self.count::<T>(&Query::created_between(from, to))
    }

    pub fn count_updated_between<T: Persistable>(&self, from: Timestamp, to: Timestamp) -> Result<usize> {
        self.count::<T>(&Query::updated_between(from, to))
    }
}
