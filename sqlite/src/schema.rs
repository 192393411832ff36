//! Collection table naming, resolution and SQL generation.
//!
//! Every collection is stored in its own table named
//! `{prefix}.{collection}`. Table and index names are always written as
//! quoted identifiers, so collection names keep their module paths and
//! generic arguments verbatim. Prefixes may not contain `.`, which makes
//! the prefix boundary unambiguous. All tables share one fixed layout: the
//! identifier, six indexed metadata columns and the payload.
//!
//! # Table structure
//!
//! | column         | type      | indexed |
//! |----------------|-----------|---------|
//! | `id`           | TEXT (PK) | yes     |
//! | `key`          | TEXT      | yes     |
//! | `foreign_key`  | TEXT      | yes     |
//! | `title`        | TEXT      | yes     |
//! | `order_number` | NUMERIC   | yes     |
//! | `create_time`  | TIMESTAMP | yes     |
//! | `update_time`  | TIMESTAMP | yes     |
//! | `payload`      | BLOB      | no      |
//!
//! Timestamps are fixed-width RFC 3339 text, so they sort chronologically.
//!
//! Tables are resolved against `sqlite_master` on every operation; another
//! connection may create a collection at any time.

use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::error::{EngineContext, Result, StoreError};

/// Indexed metadata columns, in table order after `id`.
pub(crate) const METADATA_COLUMNS: [&str; 6] = [
    "key",
    "foreign_key",
    "title",
    "order_number",
    "create_time",
    "update_time",
];

/// Separates the table prefix from the collection name.
pub const PREFIX_SEPARATOR: char = '.';

/// Separates a table name from the column in its index names.
const INDEX_SEPARATOR: char = '#';

/// Validates that a table prefix contains only alphanumeric characters and underscores.
pub(crate) fn validate_prefix(prefix: &str) -> Result<()> {
    if prefix.is_empty() {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    if !prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(StoreError::InvalidPrefix(prefix.to_string()));
    }
    Ok(())
}

/// Derives the table name of a collection.
///
/// The collection name is kept verbatim, so distinct collections always map
/// to distinct tables.
///
/// # Errors
///
/// Returns [`StoreError::InvalidCollection`] for a blank name or one
/// containing `#` or control characters.
pub fn table_name(prefix: &str, collection: &str) -> Result<String> {
    validate_prefix(prefix)?;
    if collection.trim().is_empty()
        || collection.contains(INDEX_SEPARATOR)
        || collection.chars().any(char::is_control)
    {
        return Err(StoreError::InvalidCollection(collection.to_string()));
    }
    Ok(format!("{prefix}{PREFIX_SEPARATOR}{collection}"))
}

/// Quotes `name` as an SQL identifier.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Generates the `CREATE TABLE` and `CREATE INDEX` statements for one
/// collection table.
///
/// Uses `IF NOT EXISTS` throughout, so running it twice is harmless.
pub fn generate_table_sql(table: &str) -> String {
    let quoted = quote_ident(table);
    let mut sql = format!(
        r#"
CREATE TABLE IF NOT EXISTS {quoted} (
    id TEXT PRIMARY KEY NOT NULL,
    key TEXT,
    foreign_key TEXT,
    title TEXT,
    order_number NUMERIC,
    create_time TIMESTAMP NOT NULL,
    update_time TIMESTAMP NOT NULL,
    payload BLOB NOT NULL
);
"#
    );
    for column in METADATA_COLUMNS {
        let index = quote_ident(&format!("{table}{INDEX_SEPARATOR}{column}"));
        sql.push_str(&format!(
            "CREATE INDEX IF NOT EXISTS {index} ON {quoted}({column});\n"
        ));
    }
    sql
}

/// Generates the statement that removes every row but keeps the table.
pub fn generate_empty_sql(table: &str) -> String {
    format!("DELETE FROM {}", quote_ident(table))
}

/// Reports whether `table` exists in the database.
///
/// # Errors
///
/// Returns [`StoreError::CollectionConflict`] when a table whose name
/// differs only in ASCII case exists instead.
pub(crate) fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let existing: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1 COLLATE NOCASE",
            [table],
            |row| row.get(0),
        )
        .optional()
        .engine("resolve table", table)?;
    match existing {
        None => Ok(false),
        Some(name) if name == table => Ok(true),
        Some(name) => Err(StoreError::CollectionConflict {
            table: table.to_string(),
            existing: name,
        }),
    }
}

/// Creates `table` and its indexes unless it already exists.
///
/// Meant to run inside the caller's transaction so a new table and its
/// first row commit together.
pub(crate) fn ensure_table(conn: &Connection, table: &str) -> Result<()> {
    if table_exists(conn, table)? {
        return Ok(());
    }
    conn.execute_batch(&generate_table_sql(table))
        .engine("create table", table)?;
    debug!(table = %table, "Created collection table");
    Ok(())
}

/// Lists the collections stored under `prefix`, sorted by name.
pub(crate) fn list_collections(conn: &Connection, prefix: &str) -> rusqlite::Result<Vec<String>> {
    let head = format!("{prefix}{PREFIX_SEPARATOR}");
    let mut stmt = conn.prepare(
        "SELECT substr(name, length(?1) + 1) FROM sqlite_master \
         WHERE type = 'table' AND substr(name, 1, length(?1)) = ?1 ORDER BY name",
    )?;
    let collections = stmt
        .query_map([head], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(collections)
}
