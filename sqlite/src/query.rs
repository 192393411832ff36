//! Translation of [`Query`] values into parameterized SQL.
//!
//! [`build`] turns a query into a where/order/limit clause triple plus the
//! values bound to the where clause's placeholders. Caller-supplied values
//! are always bound, never spliced into the SQL text. Only the limit, a
//! plain integer, is written inline.
//!
//! # Example
//!
//! ```
//! use shelf_core::{OrderBy, Query};
//! use shelf_sqlite::build_query;
//!
//! let built = build_query(&Query::in_title("abam").order_by(OrderBy::Title).limit(3));
//! assert_eq!(built.where_clause, r"WHERE title LIKE ?1 ESCAPE '\'");
//! assert_eq!(built.order_clause, "ORDER BY title ASC, rowid ASC");
//! assert_eq!(built.limit_clause, "LIMIT 3");
//! ```

use rusqlite::types::Value;
use shelf_core::{Filter, OrderBy, Query};

use crate::convert::timestamp_to_sql;
use crate::schema::quote_ident;

/// Columns read back for every found row.
pub(crate) const SELECT_COLUMNS: &str = "id, foreign_key, create_time, update_time, payload";

/// SQL fragments produced from a [`Query`].
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// `WHERE ...` or empty.
    pub where_clause: String,
    /// Values for the `?N` placeholders of `where_clause`, in order.
    pub params: Vec<Value>,
    /// Always present; insertion order when the query has no ordering.
    pub order_clause: String,
    /// `LIMIT n` or empty.
    pub limit_clause: String,
}

impl BuiltQuery {
    /// Full `SELECT` statement against `table`.
    pub fn select_sql(&self, table: &str) -> String {
        join_clauses(&[
            &format!("SELECT {SELECT_COLUMNS} FROM {}", quote_ident(table)),
            &self.where_clause,
            &self.order_clause,
            &self.limit_clause,
        ])
    }

    /// `SELECT COUNT(*)` statement against `table`. Ordering and limit do
    /// not apply to counts.
    pub fn count_sql(&self, table: &str) -> String {
        join_clauses(&[
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            &self.where_clause,
        ])
    }
}

/// Builds the clauses for `query`.
pub fn build(query: &Query) -> BuiltQuery {
    let (where_clause, params) = match &query.filter {
        Some(filter) => where_for(filter),
        None => (String::new(), Vec::new()),
    };

    BuiltQuery {
        where_clause,
        params,
        order_clause: order_clause(query.order_by),
        limit_clause: limit_clause(query.limit),
    }
}

fn where_for(filter: &Filter) -> (String, Vec<Value>) {
    let column = filter.column();
    match filter {
        Filter::KeyEquals(value) | Filter::TitleEquals(value) | Filter::ForeignKeyEquals(value) => (
            format!("WHERE {column} = ?1"),
            vec![Value::Text(value.clone())],
        ),
        Filter::KeyContains(value)
        | Filter::TitleContains(value)
        | Filter::ForeignKeyContains(value) => (
            format!(r"WHERE {column} LIKE ?1 ESCAPE '\'"),
            vec![Value::Text(contains_pattern(value))],
        ),
        Filter::OrderNumberBetween(from, to) => (
            range_clause(column),
            vec![Value::Real(*from), Value::Real(*to)],
        ),
        Filter::CreatedBetween(from, to) | Filter::UpdatedBetween(from, to) => (
            range_clause(column),
            vec![
                Value::Text(timestamp_to_sql(from)),
                Value::Text(timestamp_to_sql(to)),
            ],
        ),
    }
}

fn range_clause(column: &str) -> String {
    format!("WHERE {column} >= ?1 AND {column} <= ?2")
}

/// Wraps `value` in `%...%`, escaping the LIKE wildcards it contains.
fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn order_clause(order_by: Option<OrderBy>) -> String {
    match order_by {
        // Ties keep insertion order in the requested direction.
        Some(order) => format!(
            "ORDER BY {} {dir}, rowid {dir}",
            order.column(),
            dir = order.direction()
        ),
        None => "ORDER BY rowid ASC".to_string(),
    }
}

fn limit_clause(limit: usize) -> String {
    if limit > 0 {
        format!("LIMIT {limit}")
    } else {
        String::new()
    }
}

fn join_clauses(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use shelf_core::now;

    use super::*;

    #[test]
    fn test_unfiltered_query() {
        let built = build(&Query::all());
        assert!(built.where_clause.is_empty());
        assert!(built.params.is_empty());
        assert_eq!(built.order_clause, "ORDER BY rowid ASC");
        assert!(built.limit_clause.is_empty());
        assert_eq!(
            built.select_sql("t_.State"),
            format!(r#"SELECT {SELECT_COLUMNS} FROM "t_.State" ORDER BY rowid ASC"#)
        );
    }

    #[test]
    fn test_equality_binds_value() {
        let built = build(&Query::with_title("Robert'); DROP TABLE t_State;--"));
        assert_eq!(built.where_clause, "WHERE title = ?1");
        assert_eq!(
            built.params,
            vec![Value::Text("Robert'); DROP TABLE t_State;--".into())]
        );
        assert!(!built.select_sql("t_.State").contains("DROP"));
    }

    #[test]
    fn test_like_wraps_and_escapes() {
        let built = build(&Query::in_foreign_key("50%_off"));
        assert_eq!(built.where_clause, r"WHERE foreign_key LIKE ?1 ESCAPE '\'");
        assert_eq!(built.params, vec![Value::Text(r"%50\%\_off%".into())]);
    }

    #[test]
    fn test_order_number_range() {
        let built = build(&Query::order_number_between(2.0, 4.5));
        assert_eq!(
            built.where_clause,
            "WHERE order_number >= ?1 AND order_number <= ?2"
        );
        assert_eq!(built.params, vec![Value::Real(2.0), Value::Real(4.5)]);
    }

    #[test]
    fn test_time_range_binds_text() {
        let from = now();
        let to = now();
        let built = build(&Query::updated_between(from, to));
        assert_eq!(
            built.where_clause,
            "WHERE update_time >= ?1 AND update_time <= ?2"
        );
        assert_eq!(
            built.params,
            vec![
                Value::Text(timestamp_to_sql(&from)),
                Value::Text(timestamp_to_sql(&to))
            ]
        );
    }

    #[test]
    fn test_every_order_maps_to_its_column() {
        for order in OrderBy::ALL {
            let built = build(&Query::all().order_by(order));
            assert!(built.order_clause.starts_with(&format!(
                "ORDER BY {} {}",
                order.column(),
                order.direction()
            )));
        }
    }

    #[test]
    fn test_most_recent_is_descending_with_limit() {
        let built = build(&Query::created_most_recent(3));
        assert_eq!(built.order_clause, "ORDER BY create_time DESC, rowid DESC");
        assert_eq!(built.limit_clause, "LIMIT 3");
    }

    #[test]
    fn test_zero_limit_is_unbounded() {
        assert!(build(&Query::all().limit(0)).limit_clause.is_empty());
    }

    #[test]
    fn test_count_ignores_order_and_limit() {
        let built = build(&Query::with_key("AL").order_by(OrderBy::Key).limit(1));
        assert_eq!(
            built.count_sql("t_.State"),
            r#"SELECT COUNT(*) FROM "t_.State" WHERE key = ?1"#
        );
    }
}
