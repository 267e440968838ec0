//! Filtered, sorted reads over batch rows.
//!
//! A [`BatchQuery`] carries a `WHERE` fragment, the positional arguments bound
//! into it and an `ORDER BY` fragment. The store passes all three through
//! unmodified, so columns of the `batches_with_sizes` view are addressable:
//! `id`, `title`, `status`, `visibility`, `has_started`, `deleted`,
//! `last_modification`, `total_size_bytes`, `current_size_bytes`.
//!
//! The typed helpers compose the selection text themselves and are the only
//! way untrusted input (e.g. HTTP query parameters) should reach a query.

use crate::status::Status;
use crate::types::BatchId;

/// Positional argument bound into a selection
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryArgument {
    /// Integer column value
    Integer(i64),
    /// Text column value
    Text(String),
}

impl From<i64> for QueryArgument {
    fn from(value: i64) -> Self {
        QueryArgument::Integer(value)
    }
}

impl From<bool> for QueryArgument {
    fn from(value: bool) -> Self {
        QueryArgument::Integer(i64::from(value))
    }
}

impl From<Status> for QueryArgument {
    fn from(status: Status) -> Self {
        QueryArgument::Integer(i64::from(status.code()))
    }
}

impl From<BatchId> for QueryArgument {
    fn from(id: BatchId) -> Self {
        QueryArgument::Integer(id.get())
    }
}

impl From<String> for QueryArgument {
    fn from(value: String) -> Self {
        QueryArgument::Text(value)
    }
}

impl From<&str> for QueryArgument {
    fn from(value: &str) -> Self {
        QueryArgument::Text(value.to_string())
    }
}

/// Query over batch rows
///
/// `BatchQuery::default()` selects every row in store order.
///
/// # Example
///
/// ```
/// use download_batch::{BatchQuery, Status};
///
/// let query = BatchQuery::default()
///     .with_status(Status::Running)
///     .with_deleted(false)
///     .sort_by_last_modified(true);
///
/// assert_eq!(query.selection.as_deref(), Some("(status = ?) AND (deleted = ?)"));
/// assert_eq!(query.sort_order.as_deref(), Some("last_modification DESC"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchQuery {
    /// `WHERE` fragment with `?` placeholders, or `None` for all rows
    pub selection: Option<String>,
    /// Arguments bound to the placeholders, in order
    pub selection_arguments: Vec<QueryArgument>,
    /// `ORDER BY` fragment, or `None` for store order
    pub sort_order: Option<String>,
}

impl BatchQuery {
    /// Build a query from raw parts
    pub fn new(
        selection: Option<String>,
        selection_arguments: Vec<QueryArgument>,
        sort_order: Option<String>,
    ) -> Self {
        Self {
            selection,
            selection_arguments,
            sort_order,
        }
    }

    /// Restrict to the given batch ids
    ///
    /// An empty id list matches nothing.
    pub fn with_ids(self, ids: &[BatchId]) -> Self {
        if ids.is_empty() {
            return self.and_where("0 = 1", Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let arguments = ids.iter().map(|id| QueryArgument::from(*id)).collect();
        self.and_where(&format!("id IN ({})", placeholders), arguments)
    }

    /// Restrict to batches whose persisted status equals `status`
    pub fn with_status(self, status: Status) -> Self {
        self.and_where("status = ?", vec![status.into()])
    }

    /// Restrict on the soft-delete flag
    pub fn with_deleted(self, deleted: bool) -> Self {
        self.and_where("deleted = ?", vec![deleted.into()])
    }

    /// Order by last modification, newest first when `descending`
    pub fn sort_by_last_modified(mut self, descending: bool) -> Self {
        let direction = if descending { "DESC" } else { "ASC" };
        self.sort_order = Some(format!("last_modification {}", direction));
        self
    }

    /// Order by ascending batch id
    pub fn sort_by_id(mut self) -> Self {
        self.sort_order = Some("id ASC".to_string());
        self
    }

    /// Both sides are parenthesised so a raw `OR` selection stays grouped
    fn and_where(mut self, clause: &str, arguments: Vec<QueryArgument>) -> Self {
        self.selection = Some(match self.selection.take() {
            Some(existing) => format!("({}) AND ({})", existing, clause),
            None => clause.to_string(),
        });
        self.selection_arguments.extend(arguments);
        self
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selects_everything() {
        let query = BatchQuery::default();
        assert!(query.selection.is_none());
        assert!(query.selection_arguments.is_empty());
        assert!(query.sort_order.is_none());
    }

    #[test]
    fn helpers_compose_with_and() {
        let query = BatchQuery::default()
            .with_ids(&[BatchId(3), BatchId(5)])
            .with_status(Status::Pending)
            .sort_by_id();

        assert_eq!(
            query.selection.as_deref(),
            Some("(id IN (?, ?)) AND (status = ?)")
        );
        assert_eq!(
            query.selection_arguments,
            vec![
                QueryArgument::Integer(3),
                QueryArgument::Integer(5),
                QueryArgument::Integer(190),
            ]
        );
        assert_eq!(query.sort_order.as_deref(), Some("id ASC"));
    }

    #[test]
    fn helpers_keep_raw_or_selection_grouped() {
        let query = BatchQuery::new(
            Some("status = ? OR status = ?".to_string()),
            vec![Status::Running.into(), Status::Pending.into()],
            None,
        )
        .with_deleted(false);

        assert_eq!(
            query.selection.as_deref(),
            Some("(status = ? OR status = ?) AND (deleted = ?)")
        );
        assert_eq!(
            query.selection_arguments,
            vec![
                QueryArgument::Integer(192),
                QueryArgument::Integer(190),
                QueryArgument::Integer(0),
            ]
        );
    }

    #[test]
    fn empty_id_list_matches_nothing() {
        let query = BatchQuery::default().with_ids(&[]);
        assert_eq!(query.selection.as_deref(), Some("0 = 1"));
        assert!(query.selection_arguments.is_empty());
    }

    #[test]
    fn later_sort_replaces_earlier() {
        let query = BatchQuery::default().sort_by_id().sort_by_last_modified(false);
        assert_eq!(query.sort_order.as_deref(), Some("last_modification ASC"));
    }

    #[test]
    fn deleted_flag_binds_as_integer() {
        let query = BatchQuery::default().with_deleted(true);
        assert_eq!(query.selection_arguments, vec![QueryArgument::Integer(1)]);
    }
}
