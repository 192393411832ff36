//! Structured find/count requests.
//!
//! A [`Query`] holds at most one [`Filter`], an optional [`OrderBy`] and a
//! limit. Equality/`LIKE` filters over key, title and foreign key and range
//! filters over order number and timestamps share the single filter slot,
//! so the two families are never combined in one request.
//!
//! # Examples
//!
//! ```
//! use shelf_core::{Filter, OrderBy, Query};
//!
//! let q = Query::in_title("abam").order_by(OrderBy::Title).limit(5);
//! assert_eq!(q.filter, Some(Filter::TitleContains("abam".into())));
//! assert_eq!(q.limit, 5);
//!
//! let recent = Query::created_most_recent(3);
//! assert_eq!(recent.order_by, Some(OrderBy::CreateTimeDescending));
//! assert!(recent.filter.is_none());
//! ```

use crate::types::{OrderBy, Timestamp};

/// Predicate over one metadata column.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    KeyEquals(String),
    /// Key contains the value (case-sensitive).
    KeyContains(String),
    TitleEquals(String),
    TitleContains(String),
    ForeignKeyEquals(String),
    ForeignKeyContains(String),
    /// Inclusive order-number range.
    OrderNumberBetween(f64, f64),
    /// Inclusive creation-time range.
    CreatedBetween(Timestamp, Timestamp),
    /// Inclusive update-time range.
    UpdatedBetween(Timestamp, Timestamp),
}

impl Filter {
    /// Metadata column the filter applies to.
    pub fn column(&self) -> &'static str {
        match self {
            Self::KeyEquals(_) | Self::KeyContains(_) => "key",
            Self::TitleEquals(_) | Self::TitleContains(_) => "title",
            Self::ForeignKeyEquals(_) | Self::ForeignKeyContains(_) => "foreign_key",
            Self::OrderNumberBetween(..) => "order_number",
            Self::CreatedBetween(..) => "create_time",
            Self::UpdatedBetween(..) => "update_time",
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::OrderNumberBetween(..) | Self::CreatedBetween(..) | Self::UpdatedBetween(..)
        )
    }
}

/// A find or count request against one collection.
///
/// `limit == 0` means unlimited. Counts ignore ordering and limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: usize,
}

impl Query {
    /// Every object in the collection, in insertion order.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            ..Self::default()
        }
    }

    pub fn with_key(key: impl Into<String>) -> Self {
        Self::filtered(Filter::KeyEquals(key.into()))
    }

    pub fn in_key(fragment: impl Into<String>) -> Self {
        Self::filtered(Filter::KeyContains(fragment.into()))
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Self::filtered(Filter::TitleEquals(title.into()))
    }

    pub fn in_title(fragment: impl Into<String>) -> Self {
        Self::filtered(Filter::TitleContains(fragment.into()))
    }

    pub fn with_foreign_key(foreign_key: impl Into<String>) -> Self {
        Self::filtered(Filter::ForeignKeyEquals(foreign_key.into()))
    }

    pub fn in_foreign_key(fragment: impl Into<String>) -> Self {
        Self::filtered(Filter::ForeignKeyContains(fragment.into()))
    }

    pub fn order_number_between(from: f64, to: f64) -> Self {
        Self::filtered(Filter::OrderNumberBetween(from, to))
    }

    pub fn created_between(from: Timestamp, to: Timestamp) -> Self {
        Self::filtered(Filter::CreatedBetween(from, to))
    }

    pub fn updated_between(from: Timestamp, to: Timestamp) -> Self {
        Self::filtered(Filter::UpdatedBetween(from, to))
    }

    /// The `top` most recently created objects, newest first.
    pub fn created_most_recent(top: usize) -> Self {
        Self::all().order_by(OrderBy::CreateTimeDescending).limit(top)
    }

    /// The `top` least recently created objects, oldest first.
    pub fn created_least_recent(top: usize) -> Self {
        Self::all().order_by(OrderBy::CreateTime).limit(top)
    }

    /// The `top` most recently updated objects, newest first.
    pub fn updated_most_recent(top: usize) -> Self {
        Self::all().order_by(OrderBy::UpdateTimeDescending).limit(top)
    }

    /// The `top` least recently updated objects, oldest first.
    pub fn updated_least_recent(top: usize) -> Self {
        Self::all().order_by(OrderBy::UpdateTime).limit(top)
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    /// Caps the number of results. `0` removes the cap.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::now;

    #[test]
    fn test_filter_columns() {
        assert_eq!(Filter::KeyContains("a".into()).column(), "key");
        assert_eq!(Filter::ForeignKeyEquals("a".into()).column(), "foreign_key");
        assert_eq!(Filter::OrderNumberBetween(1.0, 2.0).column(), "order_number");
        let t = now();
        assert_eq!(Filter::UpdatedBetween(t, t).column(), "update_time");
    }

    #[test]
    fn test_range_family() {
        let t = now();
        assert!(Filter::CreatedBetween(t, t).is_range());
        assert!(Filter::OrderNumberBetween(0.0, 1.0).is_range());
        assert!(!Filter::TitleEquals("x".into()).is_range());
    }

    #[test]
    fn test_recency_sugar() {
        let q = Query::updated_least_recent(4);
        assert_eq!(q.order_by, Some(OrderBy::UpdateTime));
        assert_eq!(q.limit, 4);
        assert_eq!(Query::all().limit, 0);
    }

    #[test]
    fn test_builder_chaining() {
        let q = Query::with_foreign_key("p1")
            .order_by(OrderBy::OrderNumberDescending)
            .limit(2);
        assert_eq!(q.filter, Some(Filter::ForeignKeyEquals("p1".into())));
        assert_eq!(q.order_by, Some(OrderBy::OrderNumberDescending));
        assert_eq!(q.limit, 2);
    }
}
