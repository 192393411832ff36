//! Conversion between persistable objects and collection table rows.
//!
//! Writes the metadata columns and payload of an object into its table and
//! rebuilds objects from selected rows. Timestamps are stored as
//! fixed-width RFC 3339 text with microsecond precision (`...T12:00:00.000000Z`)
//! so that text comparison orders them chronologically.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params, params_from_iter};
use shelf_core::{Metadata, PayloadCodec, Persistable, Timestamp};

use crate::error::{EngineContext, Result, StoreError};
use crate::query::{BuiltQuery, SELECT_COLUMNS};
use crate::schema::quote_ident;

/// Formats a timestamp for storage.
pub(crate) fn timestamp_to_sql(t: &Timestamp) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a stored timestamp.
pub(crate) fn timestamp_from_sql(s: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::ConversionError(format!("invalid timestamp '{s}': {e}")))
}

/// A row as read back by a find or load.
#[derive(Debug, Clone)]
pub(crate) struct StoredRow {
    pub id: String,
    pub foreign_key: Option<String>,
    pub create_time: String,
    pub update_time: String,
    pub payload: Vec<u8>,
}

impl StoredRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            foreign_key: row.get(1)?,
            create_time: row.get(2)?,
            update_time: row.get(3)?,
            payload: row.get(4)?,
        })
    }

    /// Decodes the payload and re-applies the row's identity and foreign
    /// key onto the new instance. The load hook is not run here.
    pub fn into_object<T, C>(self, codec: &C, collection: &str) -> Result<T>
    where
        T: Persistable,
        C: PayloadCodec,
    {
        let mut object: T = codec.decode(collection, &self.payload)?;
        let create_time = timestamp_from_sql(&self.create_time)?;
        let update_time = timestamp_from_sql(&self.update_time)?;
        object
            .record_mut()
            .assign(self.id, create_time, update_time);
        if let Some(foreign_key) = self.foreign_key {
            object.set_foreign_key(&foreign_key);
        }
        Ok(object)
    }
}

/// Inserts a new row.
pub(crate) fn insert_row(
    conn: &Connection,
    table: &str,
    id: &str,
    metadata: &Metadata,
    create_time: &Timestamp,
    update_time: &Timestamp,
    payload: &[u8],
) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO {} (id, key, foreign_key, title, order_number, create_time, update_time, payload) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            quote_ident(table)
        ),
        params![
            id,
            metadata.key,
            metadata.foreign_key,
            metadata.title,
            metadata.order_number,
            timestamp_to_sql(create_time),
            timestamp_to_sql(update_time),
            payload,
        ],
    )
    .engine("insert", table)?;
    Ok(())
}

/// Rewrites the metadata, update time and payload of an existing row.
/// `create_time` is never touched. Returns the number of rows changed.
pub(crate) fn update_row(
    conn: &Connection,
    table: &str,
    id: &str,
    metadata: &Metadata,
    update_time: &Timestamp,
    payload: &[u8],
) -> Result<usize> {
    conn.execute(
        &format!(
            "UPDATE {} SET key = ?2, foreign_key = ?3, title = ?4, order_number = ?5, \
             update_time = ?6, payload = ?7 WHERE id = ?1",
            quote_ident(table)
        ),
        params![
            id,
            metadata.key,
            metadata.foreign_key,
            metadata.title,
            metadata.order_number,
            timestamp_to_sql(update_time),
            payload,
        ],
    )
    .engine("update", table)
}

/// Deletes a row by identifier. Returns the number of rows removed.
pub(crate) fn delete_row(conn: &Connection, table: &str, id: &str) -> Result<usize> {
    conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", quote_ident(table)),
        params![id],
    )
    .engine("delete", table)
}

/// Loads the row with the given identifier.
pub(crate) fn select_by_id(conn: &Connection, table: &str, id: &str) -> Result<Option<StoredRow>> {
    conn.query_row(
        &format!("SELECT {SELECT_COLUMNS} FROM {} WHERE id = ?1", quote_ident(table)),
        params![id],
        StoredRow::from_row,
    )
    .optional()
    .engine("load", table)
}

/// Runs a built find query.
pub(crate) fn select_rows(
    conn: &Connection,
    table: &str,
    built: &BuiltQuery,
) -> Result<Vec<StoredRow>> {
    let mut stmt = conn.prepare(&built.select_sql(table)).engine("find", table)?;
    let rows = stmt
        .query_map(params_from_iter(built.params.iter()), StoredRow::from_row)
        .engine("find", table)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .engine("find", table)?;
    Ok(rows)
}

/// Runs a built count query.
pub(crate) fn count_rows(conn: &Connection, table: &str, built: &BuiltQuery) -> Result<usize> {
    let count: i64 = conn
        .query_row(
            &built.count_sql(table),
            params_from_iter(built.params.iter()),
            |row| row.get(0),
        )
        .engine("count", table)?;
    Ok(count as usize)
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use shelf_core::{JsonCodec, Query, Record, now};

    use super::*;
    use crate::query::build;
    use crate::schema::generate_table_sql;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Note {
        #[serde(skip)]
        record: Record,
        text: String,
        #[serde(skip)]
        owner: Option<String>,
    }

    impl Persistable for Note {
        fn record(&self) -> &Record {
            &self.record
        }

        fn record_mut(&mut self) -> &mut Record {
            &mut self.record
        }

        fn set_foreign_key(&mut self, foreign_key: &str) -> bool {
            self.owner = Some(foreign_key.to_string());
            true
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&generate_table_sql("t_Note")).unwrap();
        conn
    }

    fn metadata(title: &str, order: f64) -> Metadata {
        Metadata {
            title: Some(title.to_string()),
            foreign_key: Some("owner-1".to_string()),
            order_number: Some(order),
            ..Metadata::default()
        }
    }

    #[test]
    fn test_timestamp_text_is_fixed_width_and_round_trips() {
        let t = now();
        let text = timestamp_to_sql(&t);
        assert_eq!(text.len(), "2026-01-01T00:00:00.000000Z".len());
        assert!(text.ends_with('Z'));
        assert_eq!(timestamp_from_sql(&text).unwrap(), t);
    }

    #[test]
    fn test_invalid_timestamp_is_conversion_error() {
        assert!(matches!(
            timestamp_from_sql("yesterday"),
            Err(StoreError::ConversionError(_))
        ));
    }

    #[test]
    fn test_insert_then_load_reapplies_identity() {
        let conn = setup();
        let t = now();
        let payload = JsonCodec
            .encode("Note", &Note { text: "hi".into(), ..Note::default() }, &[])
            .unwrap();
        insert_row(&conn, "t_Note", "n1", &metadata("hi", 1.0), &t, &t, &payload).unwrap();

        let row = select_by_id(&conn, "t_Note", "n1").unwrap().unwrap();
        let note: Note = row.into_object(&JsonCodec, "Note").unwrap();
        assert_eq!(note.text, "hi");
        assert_eq!(note.record.id(), Some("n1"));
        assert_eq!(note.record.create_time(), Some(t));
        assert_eq!(note.owner.as_deref(), Some("owner-1"));
    }

    #[test]
    fn test_select_missing_id_is_none() {
        let conn = setup();
        assert!(select_by_id(&conn, "t_Note", "nope").unwrap().is_none());
    }

    #[test]
    fn test_update_preserves_create_time() {
        let conn = setup();
        let created = now();
        insert_row(&conn, "t_Note", "n1", &metadata("a", 1.0), &created, &created, b"{}").unwrap();

        let later = now();
        let changed = update_row(&conn, "t_Note", "n1", &metadata("b", 2.0), &later, b"{}").unwrap();
        assert_eq!(changed, 1);

        let row = select_by_id(&conn, "t_Note", "n1").unwrap().unwrap();
        assert_eq!(row.create_time, timestamp_to_sql(&created));
        assert_eq!(row.update_time, timestamp_to_sql(&later));
        assert_eq!(update_row(&conn, "t_Note", "gone", &metadata("c", 3.0), &later, b"{}").unwrap(), 0);
    }

    #[test]
    fn test_select_and_count_with_built_query() {
        let conn = setup();
        let t = now();
        for (id, order) in [("a", 5.0), ("b", 1.0), ("c", 3.0)] {
            insert_row(&conn, "t_Note", id, &metadata(id, order), &t, &t, b"{}").unwrap();
        }

        let built = build(&Query::order_number_between(2.0, 6.0));
        let ids: Vec<_> = select_rows(&conn, "t_Note", &built)
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(count_rows(&conn, "t_Note", &built).unwrap(), 2);
    }

    #[test]
    fn test_delete_row() {
        let conn = setup();
        let t = now();
        insert_row(&conn, "t_Note", "n1", &metadata("a", 1.0), &t, &t, b"{}").unwrap();
        assert_eq!(delete_row(&conn, "t_Note", "n1").unwrap(), 1);
        assert_eq!(delete_row(&conn, "t_Note", "n1").unwrap(), 0);
    }
}
