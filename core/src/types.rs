//! Identity, timestamp and ordering types shared by every store.
//!
//! [`Record`] is the part of an object the store owns: the generated
//! identifier and the creation/update timestamps. [`OrderBy`] enumerates
//! the twelve orderings a find request may ask for.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp type used for `create_time` and `update_time`.
pub type Timestamp = DateTime<Utc>;

/// Returns the current time truncated to microsecond precision.
///
/// Stores persist timestamps with microsecond precision, so truncating up
/// front keeps in-memory values equal to what a later load returns.
pub fn now() -> Timestamp {
    Utc::now().trunc_subsecs(6)
}

/// Ordering applied to find results.
///
/// Six logical columns, each ascending or descending. When no ordering is
/// requested, results come back in insertion order.
///
/// # Examples
///
/// ```
/// use shelf_core::OrderBy;
///
/// assert_eq!(OrderBy::OrderNumber.column(), "order_number");
/// assert!(OrderBy::CreateTimeDescending.is_descending());
/// assert_eq!(OrderBy::Title.reversed(), OrderBy::TitleDescending);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderBy {
    Key,
    Title,
    ForeignKey,
    CreateTime,
    UpdateTime,
    OrderNumber,
    KeyDescending,
    TitleDescending,
    ForeignKeyDescending,
    CreateTimeDescending,
    UpdateTimeDescending,
    OrderNumberDescending,
}

impl OrderBy {
    /// All twelve orderings, ascending variants first.
    pub const ALL: [Self; 12] = [
        Self::Key,
        Self::Title,
        Self::ForeignKey,
        Self::CreateTime,
        Self::UpdateTime,
        Self::OrderNumber,
        Self::KeyDescending,
        Self::TitleDescending,
        Self::ForeignKeyDescending,
        Self::CreateTimeDescending,
        Self::UpdateTimeDescending,
        Self::OrderNumberDescending,
    ];

    /// Name of the metadata column this ordering sorts on.
    pub fn column(self) -> &'static str {
        match self {
            Self::Key | Self::KeyDescending => "key",
            Self::Title | Self::TitleDescending => "title",
            Self::ForeignKey | Self::ForeignKeyDescending => "foreign_key",
            Self::CreateTime | Self::CreateTimeDescending => "create_time",
            Self::UpdateTime | Self::UpdateTimeDescending => "update_time",
            Self::OrderNumber | Self::OrderNumberDescending => "order_number",
        }
    }

    pub fn is_descending(self) -> bool {
        matches!(
            self,
            Self::KeyDescending
                | Self::TitleDescending
                | Self::ForeignKeyDescending
                | Self::CreateTimeDescending
                | Self::UpdateTimeDescending
                | Self::OrderNumberDescending
        )
    }

    /// SQL direction keyword for this ordering.
    pub fn direction(self) -> &'static str {
        if self.is_descending() { "DESC" } else { "ASC" }
    }

    /// The same column in the opposite direction.
    pub fn reversed(self) -> Self {
        match self {
            Self::Key => Self::KeyDescending,
            Self::Title => Self::TitleDescending,
            Self::ForeignKey => Self::ForeignKeyDescending,
            Self::CreateTime => Self::CreateTimeDescending,
            Self::UpdateTime => Self::UpdateTimeDescending,
            Self::OrderNumber => Self::OrderNumberDescending,
            Self::KeyDescending => Self::Key,
            Self::TitleDescending => Self::Title,
            Self::ForeignKeyDescending => Self::ForeignKey,
            Self::CreateTimeDescending => Self::CreateTime,
            Self::UpdateTimeDescending => Self::UpdateTime,
            Self::OrderNumberDescending => Self::OrderNumber,
        }
    }
}

/// Store-owned identity and timestamps of a persisted object.
///
/// A `Record` with no identifier is *transient*: it has never been
/// inserted. The store assigns the identifier and both timestamps on the
/// first save, refreshes `update_time` on every later save, and marks the
/// record deleted when the object is removed.
///
/// Embed one in each persistable type, usually with `#[serde(skip)]` so it
/// stays out of the payload; the store re-applies it from the row on load.
///
/// # Examples
///
/// ```
/// use shelf_core::Record;
///
/// let record = Record::default();
/// assert!(!record.has_id());
/// assert!(record.create_time().is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    id: Option<String>,
    create_time: Option<Timestamp>,
    update_time: Option<Timestamp>,
    #[serde(skip)]
    deleted: bool,
}

impl Record {
    /// The engine-assigned identifier, if the object has been saved.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    pub fn create_time(&self) -> Option<Timestamp> {
        self.create_time
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    /// Whether the object was deleted from the store through this instance.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns the record to the transient state.
    ///
    /// Clears the identifier, both timestamps and the deleted marker, so the
    /// next save inserts the object as a new row.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Clears only the identifier.
    ///
    /// A deleted record stays deleted; use [`reset`](Self::reset) to make
    /// the instance insertable again.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// Binds the record to a stored row. Used by stores on insert and load.
    pub fn assign(&mut self, id: String, create_time: Timestamp, update_time: Timestamp) {
        self.id = Some(id);
        self.create_time = Some(create_time);
        self.update_time = Some(update_time);
        self.deleted = false;
    }

    /// Refreshes `update_time` after an update.
    pub fn touch(&mut self, update_time: Timestamp) {
        self.update_time = Some(update_time);
    }

    pub fn mark_deleted(&mut self) {
        self.deleted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_by_columns() {
        let columns: Vec<_> = OrderBy::ALL.iter().map(|o| o.column()).collect();
        assert_eq!(
            &columns[..6],
            &["key", "title", "foreign_key", "create_time", "update_time", "order_number"]
        );
        assert_eq!(&columns[..6], &columns[6..]);
    }

    #[test]
    fn test_order_by_direction() {
        for order in &OrderBy::ALL[..6] {
            assert_eq!(order.direction(), "ASC");
            assert_eq!(order.reversed().direction(), "DESC");
            assert_eq!(order.reversed().reversed(), *order);
        }
    }

    #[test]
    fn test_now_is_truncated_to_micros() {
        let t = now();
        assert_eq!(t.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_record_lifecycle() {
        let mut record = Record::default();
        assert!(!record.has_id());

        let t = now();
        record.assign("abc".into(), t, t);
        assert_eq!(record.id(), Some("abc"));
        assert_eq!(record.create_time(), record.update_time());

        record.mark_deleted();
        record.clear_id();
        assert!(record.is_deleted());
        assert!(!record.has_id());

        record.reset();
        assert_eq!(record, Record::default());
    }
}
