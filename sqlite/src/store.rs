//! The store handle: one SQLite connection, opened and closed explicitly.
//!
//! A [`Store`] owns at most one open connection at a time. All operations
//! serialize through a single mutex around that connection. Lifecycle hooks
//! run after the row mutation has committed and after the mutex has been
//! released, so a hook may call back into the same store.
//!
//! Every successful mutation sends a [`StoreChanged`] notice to each
//! subscriber. Notices carry only the collection name; consumers re-query.
//!
//! # Example
//!
//! ```no_run
//! use shelf_sqlite::{Store, StoreLocation};
//!
//! let store = Store::default();
//! store.open("inventory").unwrap();
//! let changes = store.subscribe();
//!
//! // ... save objects ...
//!
//! while let Ok(change) = changes.try_recv() {
//!     println!("{} changed", change.collection);
//! }
//! store.close();
//! store.remove(StoreLocation::from("inventory")).unwrap();
//! ```

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use rusqlite::Connection;
use shelf_core::JsonCodec;
use tracing::info;

use crate::config::{StoreConfig, StoreLocation};
use crate::error::{EngineContext, Result, StoreError};
use crate::schema::{list_collections, table_name};

/// Notice sent after a successful insert, update, delete or empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreChanged {
    pub collection: String,
}

/// State of an open store.
pub(crate) struct OpenStore {
    pub conn: Connection,
    pub path: Option<PathBuf>,
}

/// Handle to an object store backed by one SQLite database.
///
/// The codec type decides how object state is encoded into the payload
/// column; [`JsonCodec`] is the default.
pub struct Store<C = JsonCodec> {
    config: StoreConfig,
    pub(crate) codec: C,
    state: Mutex<Option<OpenStore>>,
    subscribers: Mutex<Vec<Sender<StoreChanged>>>,
}

impl Default for Store<JsonCodec> {
    fn default() -> Self {
        Self {
            config: StoreConfig::default(),
            codec: JsonCodec,
            state: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl Store<JsonCodec> {
    /// Creates a closed store with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPrefix`] if the table prefix is invalid.
    pub fn new(config: StoreConfig) -> Result<Self> {
        Self::with_codec(config, JsonCodec)
    }
}

impl<C> Store<C> {
    /// Creates a closed store that encodes payloads with `codec`.
    pub fn with_codec(config: StoreConfig, codec: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            codec,
            state: Mutex::new(None),
            subscribers: Mutex::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Opens the store at `location`.
    ///
    /// A store that is already open is closed first, then reopened against
    /// the new location. Named stores create their directory if needed.
    pub fn open(&self, location: impl Into<StoreLocation>) -> Result<()> {
        let location = location.into();
        let path = self.config.resolve(&location);

        let conn = match &path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)
            }
            None => Connection::open_in_memory(),
        }
        .engine("open", "store")?;

        // Contains-searches are case-sensitive.
        conn.execute_batch("PRAGMA case_sensitive_like = ON;")
            .engine("open", "store")?;

        let mut state = self.lock_state();
        if let Some(previous) = state.take() {
            info!(path = ?previous.path, "Closing store before reopening");
        }
        info!(path = ?path, "Opened store");
        *state = Some(OpenStore { conn, path });
        Ok(())
    }

    /// Opens the store named by [`StoreConfig::default_name`].
    pub fn open_default(&self) -> Result<()> {
        self.open(StoreLocation::Named(self.config.default_name.clone()))
    }

    /// Opens a private in-memory store.
    pub fn open_in_memory(&self) -> Result<()> {
        self.open(StoreLocation::Memory)
    }

    /// Releases the connection. Later operations fail with
    /// [`StoreError::StoreNotOpen`] until the store is opened again.
    pub fn close(&self) {
        if let Some(previous) = self.lock_state().take() {
            info!(path = ?previous.path, "Closed store");
        }
    }

    pub fn is_open(&self) -> bool {
        self.lock_state().is_some()
    }

    /// Path of the open database file; `None` when closed or in memory.
    pub fn path(&self) -> Option<PathBuf> {
        self.lock_state().as_ref().and_then(|s| s.path.clone())
    }

    /// Deletes the database file behind `location`.
    ///
    /// Removing a store that does not exist is not an error. In-memory
    /// locations have nothing to remove.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::StoreInUse`] if this store currently has that
    /// file open.
    pub fn remove(&self, location: impl Into<StoreLocation>) -> Result<()> {
        let Some(path) = self.config.resolve(&location.into()) else {
            return Ok(());
        };

        if self.path().as_deref() == Some(path.as_path()) {
            return Err(StoreError::StoreInUse(path));
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "Removed store");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes the store named by [`StoreConfig::default_name`].
    pub fn remove_default(&self) -> Result<()> {
        self.remove(StoreLocation::Named(self.config.default_name.clone()))
    }

    /// Registers a new change subscriber.
    ///
    /// Dropping the receiver unsubscribes it.
    pub fn subscribe(&self) -> Receiver<StoreChanged> {
        let (tx, rx) = mpsc::channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// Names of the collections stored under this store's prefix, sorted.
    ///
    /// Read from the database itself, so collections created through other
    /// connections are included.
    pub fn collections(&self) -> Result<Vec<String>> {
        let prefix = &self.config.table_prefix;
        self.with_open(|open| list_collections(&open.conn, prefix).engine("list", "sqlite_master"))
    }

    /// Table backing `collection` under this store's prefix.
    pub fn table_for(&self, collection: &str) -> Result<String> {
        table_name(&self.config.table_prefix, collection)
    }

    /// Runs `f` against the open connection while holding the store lock.
    pub(crate) fn with_open<R>(&self, f: impl FnOnce(&mut OpenStore) -> Result<R>) -> Result<R> {
        let mut state = self.lock_state();
        let open = state.as_mut().ok_or(StoreError::StoreNotOpen)?;
        f(open)
    }

    /// Tells every live subscriber that `collection` changed.
    pub(crate) fn notify(&self, collection: &str) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| {
            tx.send(StoreChanged {
                collection: collection.to_string(),
            })
            .is_ok()
        });
    }

    fn lock_state(&self) -> MutexGuard<'_, Option<OpenStore>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static GLOBAL: OnceLock<Store> = OnceLock::new();

/// Process-wide store with the default configuration.
///
/// A convenience for applications that want a single shared store; it
/// starts closed and must be opened like any other [`Store`].
pub fn global() -> &'static Store {
    GLOBAL.get_or_init(Store::default)
}
