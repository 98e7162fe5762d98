//! Domain types returned to callers.
//!
//! These are the normalized, service-agnostic shapes produced by the
//! provider. Wire payloads never leak past the normalization step; the raw
//! field object is carried along in [`WorkRecord::raw_fields`] for
//! consumers that need fields the typed projection drops.

use chrono::{DateTime, Utc};

pub use crate::batch::ErrorPolicy;

/// A normalized work record.
#[derive(Debug, Clone)]
pub struct WorkRecord {
    /// Work item ID.
    pub id: i32,
    /// Revision number.
    pub revision: Option<i32>,
    /// Title.
    pub title: String,
    /// Workflow state (e.g. "Active", "Resolved").
    pub state: String,
    /// Work item type (e.g. "Bug", "Task").
    pub item_type: String,
    /// Assigned person, `None` when the field is absent.
    pub assignee: Option<String>,
    /// When the item was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the item was last changed.
    pub changed_at: Option<DateTime<Utc>>,
    /// Description (may contain HTML).
    pub description: Option<String>,
    /// Tags, split from the wire's `;`-separated string.
    pub tags: Vec<String>,
    /// The full wire field object, for fields the typed projection drops.
    pub raw_fields: serde_json::Value,
}

/// A normalized work item comment.
#[derive(Debug, Clone)]
pub struct Comment {
    /// Comment ID.
    pub id: i32,
    /// ID of the work item the comment belongs to.
    pub work_item_id: i32,
    /// Comment text.
    pub text: String,
    /// Author display name.
    pub author: String,
    /// When the comment was created.
    pub created_at: Option<DateTime<Utc>>,
    /// When the comment was last modified.
    pub modified_at: Option<DateTime<Utc>>,
}

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Filter lists for a work item query. Empty lists are inactive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    /// Workflow states to match (OR within the list).
    pub states: Vec<String>,
    /// Work item types to match (OR within the list).
    pub item_types: Vec<String>,
    /// Assignees to match (OR within the list).
    pub assigned_to: Vec<String>,
    /// Area paths to match, including all descendants.
    pub areas: Vec<String>,
    /// Iteration paths to match, including all descendants.
    pub iterations: Vec<String>,
}

impl QueryFilters {
    /// Whether no filter list is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
            && self.item_types.is_empty()
            && self.assigned_to.is_empty()
            && self.areas.is_empty()
            && self.iterations.is_empty()
    }
}

/// A structured work item query.
///
/// Pure value object; translation into the service's query language happens
/// inside the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemQuery {
    /// Filters combined with AND across lists.
    pub filters: QueryFilters,
    /// Field to order by (namespaced, e.g. "System.ChangedDate").
    pub order_by: Option<String>,
    /// Sort direction, applied only when `order_by` is set.
    pub direction: SortOrder,
    /// Maximum number of records to fetch.
    pub limit: Option<usize>,
}

impl WorkItemQuery {
    /// Whether the query has no active filters.
    ///
    /// An empty query matches nothing by convention: fetching with it
    /// returns an empty result without any network call.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// Expansion level for work item fetches, the `$expand` URL parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expand {
    None,
    Relations,
    Fields,
    Links,
    All,
}

impl Expand {
    /// The parameter value the service expects.
    #[must_use]
    pub fn as_param(&self) -> &'static str {
        match self {
            Expand::None => "none",
            Expand::Relations => "relations",
            Expand::Fields => "fields",
            Expand::Links => "links",
            Expand::All => "all",
        }
    }
}

/// Per-call options for batch work item fetches.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Expansion level (`$expand`).
    pub expand: Option<Expand>,
    /// Specific fields to fetch; empty fetches the server default set.
    /// Cannot be combined with `expand` on the service side.
    pub fields: Vec<String>,
    /// Fetch items as of this point in time (`asOf`).
    pub as_of: Option<DateTime<Utc>>,
    /// How chunk-level failures affect the merged result.
    pub error_policy: ErrorPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_empty() {
        assert!(WorkItemQuery::default().is_empty());
    }

    #[test]
    fn any_active_filter_makes_the_query_non_empty() {
        let query = WorkItemQuery {
            filters: QueryFilters {
                iterations: vec!["Sprint 1".to_string()],
                ..QueryFilters::default()
            },
            ..WorkItemQuery::default()
        };
        assert!(!query.is_empty());
    }

    #[test]
    fn order_and_limit_do_not_activate_a_query() {
        let query = WorkItemQuery {
            order_by: Some("System.ChangedDate".to_string()),
            limit: Some(10),
            ..WorkItemQuery::default()
        };
        assert!(query.is_empty());
    }

    #[test]
    fn expand_params_are_lowercase() {
        assert_eq!(Expand::All.as_param(), "all");
        assert_eq!(Expand::Relations.as_param(), "relations");
    }
}
