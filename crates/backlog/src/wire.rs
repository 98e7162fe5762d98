//! Azure DevOps work item API data types.
//!
//! These structs mirror the JSON payloads of the work item tracking REST
//! API. Only the fields the client reads are modeled, which keeps
//! deserialization resilient to additions on the service side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request body for the WIQL query endpoint.
///
/// API docs: https://learn.microsoft.com/en-us/rest/api/azure/devops/wit/wiql/query-by-wiql
#[derive(Debug, Clone, Serialize)]
pub struct WiqlRequest {
    /// The WIQL statement to execute.
    pub query: String,
}

/// Response of the WIQL query endpoint.
///
/// The query endpoint returns lightweight references only; full field sets
/// require a follow-up batch fetch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemQueryResult {
    /// Matched work item references, in query order.
    #[serde(default)]
    pub work_items: Vec<WorkItemRef>,
}

/// A work item reference as returned by a WIQL query.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemRef {
    /// Work item ID.
    pub id: i32,
    /// API URL of the work item.
    pub url: Option<String>,
}

/// A full work item as returned by the single and batch fetch endpoints.
///
/// API docs: https://learn.microsoft.com/en-us/rest/api/azure/devops/wit/work-items/list
#[derive(Debug, Clone, Deserialize)]
pub struct WireWorkItem {
    /// Work item ID.
    pub id: i32,
    /// Revision number.
    pub rev: Option<i32>,
    /// Namespaced field object (e.g. `System.Title`, `System.State`).
    /// Field presence depends on the requested `fields`/`$expand`.
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    /// API URL of the work item.
    pub url: Option<String>,
}

/// List envelope of the batch fetch endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemList {
    /// Number of items in `value`.
    #[serde(default)]
    pub count: usize,
    /// The fetched work items.
    #[serde(default)]
    pub value: Vec<WireWorkItem>,
}

/// An identity reference (person) attached to work items and comments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireIdentity {
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// Unique name, typically the sign-in address.
    pub unique_name: Option<String>,
}

/// A work item comment.
///
/// API docs: https://learn.microsoft.com/en-us/rest/api/azure/devops/wit/comments
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireComment {
    /// Comment ID.
    pub id: i32,
    /// ID of the work item the comment belongs to.
    #[serde(default)]
    pub work_item_id: i32,
    /// Comment text.
    #[serde(default)]
    pub text: String,
    /// Who created the comment.
    pub created_by: Option<WireIdentity>,
    /// When the comment was created.
    pub created_date: Option<DateTime<Utc>>,
    /// When the comment was last modified (absent if never modified).
    pub modified_date: Option<DateTime<Utc>>,
}

/// List envelope of the comment fetch endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentList {
    /// Number of comments in this response.
    #[serde(default)]
    pub count: usize,
    /// Total number of comments on the work item.
    #[serde(default)]
    pub total_count: usize,
    /// The comments.
    #[serde(default)]
    pub comments: Vec<WireComment>,
}

/// Request body for adding a comment to a work item.
#[derive(Debug, Clone, Serialize)]
pub struct CommentCreate {
    /// The comment text.
    pub text: String,
}
