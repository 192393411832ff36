//! Insert, update, delete and load of individual objects.
//!
//! An object without an identifier is transient. `save` inserts it: a new
//! identifier is generated, both timestamps are set to the same instant and
//! the row is written, creating the collection table in the same
//! transaction if this is the first row of its collection. An object with an
//! identifier is updated: `update_time` moves forward, `create_time` never
//! changes.
//!
//! Hooks run after the mutation has committed. A failing hook surfaces as
//! [`StoreError::Hook`] but the row change stays in place. Change notices
//! go out only when a row actually changed.

use shelf_core::{HookError, Metadata, PayloadCodec, Persistable, now};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::convert::{delete_row, insert_row, select_by_id, update_row};
use crate::error::{EngineContext, Result, StoreError};
use crate::schema::{ensure_table, generate_empty_sql, table_exists};
use crate::store::Store;

/// Maps a hook outcome onto the store error type.
pub(crate) fn run_hook(
    collection: &str,
    hook: &'static str,
    outcome: std::result::Result<(), HookError>,
) -> Result<()> {
    outcome.map_err(|source| {
        warn!(collection = %collection, hook, error = %source, "Hook failed");
        StoreError::Hook {
            hook,
            collection: collection.to_string(),
            source,
        }
    })
}

impl<C: PayloadCodec> Store<C> {
    /// Inserts a transient object or updates a persisted one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DeletedObject`] if the object was deleted
    /// through the store and its record was not reset since.
    pub fn save<T: Persistable>(&self, object: &mut T) -> Result<()> {
        if object.record().has_id() {
            self.update(object)
        } else {
            self.insert(object)
        }
    }

    /// Inserts a transient object and assigns its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyStored`] if the object already has an
    /// identifier.
    pub fn insert<T: Persistable>(&self, object: &mut T) -> Result<()> {
        let collection = T::collection();
        ensure_not_deleted(&collection, object)?;
        if let Some(id) = object.record().id() {
            return Err(StoreError::AlreadyStored {
                collection,
                id: id.to_string(),
            });
        }

        let table = self.table_for(&collection)?;
        let metadata = Metadata::extract(object);
        let payload = self.codec.encode(&collection, object, &metadata.ignored)?;
        let id = Uuid::now_v7().to_string();
        let timestamp = now();

        self.with_open(|open| {
            let tx = open.conn.unchecked_transaction().engine("insert", &table)?;
            ensure_table(&tx, &table)?;
            insert_row(&tx, &table, &id, &metadata, &timestamp, &timestamp, &payload)?;
            tx.commit().engine("insert", &table)
        })?;

        debug!(collection = %collection, id = %id, "Inserted object");
        object.record_mut().assign(id, timestamp, timestamp);
        self.notify(&collection);
        run_hook(&collection, "after_save", object.after_save())
    }

    /// Writes a persisted object's current state over its row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingIdentifier`] if the object was never
    /// inserted, or [`StoreError::NotStored`] if its row no longer exists.
    pub fn update<T: Persistable>(&self, object: &mut T) -> Result<()> {
        let collection = T::collection();
        ensure_not_deleted(&collection, object)?;
        let Some(id) = object.record().id().map(str::to_string) else {
            return Err(StoreError::MissingIdentifier { collection });
        };

        let table = self.table_for(&collection)?;
        let metadata = Metadata::extract(object);
        let payload = self.codec.encode(&collection, object, &metadata.ignored)?;
        // Never move update_time backwards, even if the clock does.
        let timestamp = match object.record().update_time() {
            Some(previous) => now().max(previous),
            None => now(),
        };

        let changed = self.with_open(|open| {
            if !table_exists(&open.conn, &table)? {
                return Ok(0);
            }
            update_row(&open.conn, &table, &id, &metadata, &timestamp, &payload)
        })?;
        if changed == 0 {
            return Err(StoreError::NotStored { collection, id });
        }

        debug!(collection = %collection, id = %id, "Updated object");
        object.record_mut().touch(timestamp);
        self.notify(&collection);
        run_hook(&collection, "after_save", object.after_save())
    }

    /// Removes a persisted object's row and marks the instance deleted.
    ///
    /// Deleting an object whose row is already gone succeeds and still runs
    /// `after_delete`, but sends no change notice.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingIdentifier`] if the object was never
    /// inserted.
    pub fn delete<T: Persistable>(&self, object: &mut T) -> Result<()> {
        let collection = T::collection();
        let Some(id) = object.record().id().map(str::to_string) else {
            return Err(StoreError::MissingIdentifier { collection });
        };
        let table = self.table_for(&collection)?;

        let removed = self.with_open(|open| {
            if !table_exists(&open.conn, &table)? {
                return Ok(0);
            }
            delete_row(&open.conn, &table, &id)
        })?;

        debug!(collection = %collection, id = %id, removed, "Deleted object");
        object.record_mut().mark_deleted();
        if removed > 0 {
            self.notify(&collection);
        }
        run_hook(&collection, "after_delete", object.after_delete())
    }

    /// Removes every object of type `T`. Per-object hooks are not run.
    pub fn delete_all<T: Persistable>(&self) -> Result<()> {
        self.empty_collection(&T::collection())
    }

    /// Removes every row of `collection`, keeping its table. Subscribers
    /// are notified only if rows were removed.
    pub fn empty_collection(&self, collection: &str) -> Result<()> {
        let table = self.table_for(collection)?;
        let removed = self.with_open(|open| {
            if !table_exists(&open.conn, &table)? {
                return Ok(0);
            }
            open.conn
                .execute(&generate_empty_sql(&table), [])
                .engine("empty", &table)
        })?;

        debug!(collection = %collection, removed, "Emptied collection");
        if removed > 0 {
            self.notify(collection);
        }
        Ok(())
    }

    /// Loads the object of type `T` with identifier `id`.
    ///
    /// Returns `None` when no such row exists. If `after_load` fails the
    /// call returns [`StoreError::Hook`] instead of the object; the stored
    /// row is untouched, so a later load can retry.
    pub fn load<T: Persistable>(&self, id: &str) -> Result<Option<T>> {
        let collection = T::collection();
        let table = self.table_for(&collection)?;

        let row = self.with_open(|open| {
            if !table_exists(&open.conn, &table)? {
                return Ok(None);
            }
            select_by_id(&open.conn, &table, id)
        })?;
        let Some(row) = row else {
            debug!(collection = %collection, id = %id, "Object not found");
            return Ok(None);
        };

        let mut object: T = row.into_object(&self.codec, &collection)?;
        run_hook(&collection, "after_load", object.after_load())?;
        Ok(Some(object))
    }

    /// Points `child` at `parent` and saves the child.
    ///
    /// The child's foreign key is set to the parent's identifier. Types that
    /// do not accept a foreign key are saved unchanged. Returns whether the
    /// foreign key was set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingIdentifier`] if the parent has not been
    /// saved yet.
    pub fn link_child<P, T>(&self, parent: &P, child: &mut T) -> Result<bool>
    where
        P: Persistable,
        T: Persistable,
    {
        let Some(parent_id) = parent.record().id() else {
            return Err(StoreError::MissingIdentifier {
                collection: P::collection(),
            });
        };

        let linked = child.set_foreign_key(parent_id);
        if !linked {
            warn!(
                parent = %P::collection(),
                child = %T::collection(),
                "Child does not accept a foreign key; saving without link"
            );
        }
        self.save(child)?;
        Ok(linked)
    }
}

fn ensure_not_deleted<T: Persistable>(collection: &str, object: &T) -> Result<()> {
    if object.record().is_deleted() {
        return Err(StoreError::DeletedObject {
            collection: collection.to_string(),
        });
    }
    Ok(())
}
