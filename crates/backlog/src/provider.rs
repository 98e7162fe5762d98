//! High-level work item access.
//!
//! [`WorkItemProvider`] wraps the transport-level [`WorkItemsClient`] and
//! speaks in domain types: callers hand it a [`WorkItemQuery`] and get back
//! normalized [`WorkRecord`]s without touching WIQL or wire payloads.

pub mod convert;
pub mod wiql;

use std::collections::HashMap;

use crate::client::WorkItemsClient;
use crate::error::{Error, Result};
use crate::model::{BatchOptions, Comment, WorkItemQuery, WorkRecord};
use crate::rate_limit::RateLimitStatus;

/// Domain-level facade over the work item service.
#[derive(Clone)]
pub struct WorkItemProvider {
    client: WorkItemsClient,
}

impl WorkItemProvider {
    pub fn new(client: WorkItemsClient) -> Self {
        Self { client }
    }

    /// The underlying client, for callers that need a raw operation.
    pub fn client(&self) -> &WorkItemsClient {
        &self.client
    }

    /// Run a filtered query and return the matching records.
    ///
    /// An empty query returns no records and performs no network calls.
    /// `limit` truncates the set of matched ids; the returned records are
    /// in ascending id order regardless of the query's sort, which only
    /// governs which ids survive truncation.
    pub async fn fetch_work_items(&self, query: &WorkItemQuery) -> Result<Vec<WorkRecord>> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let wiql = wiql::build_wiql(query);
        tracing::debug!(%wiql, "running work item query");
        let mut refs = self.client.query_work_items(&wiql).await?;
        if let Some(limit) = query.limit {
            refs.truncate(limit);
        }

        let ids: Vec<i32> = refs.iter().map(|item| item.id).collect();
        let items = self
            .client
            .batch_get_work_items(&ids, &BatchOptions::default())
            .await?;
        Ok(items.iter().map(convert::to_work_record).collect())
    }

    /// Fetch a single record, or `None` if the id does not exist.
    pub async fn fetch_work_item(&self, id: i32) -> Result<Option<WorkRecord>> {
        match self.client.get_work_item(id, None).await {
            Ok(item) => Ok(Some(convert::to_work_record(&item))),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// All comments on a work item, oldest first as the service returns them.
    pub async fn fetch_comments(&self, id: i32) -> Result<Vec<Comment>> {
        let comments = self.client.get_work_item_comments(id).await?;
        Ok(comments.iter().map(convert::to_comment).collect())
    }

    /// Post a new comment and return it as recorded by the service.
    pub async fn add_comment(&self, id: i32, text: &str) -> Result<Comment> {
        let comment = self.client.add_work_item_comment(id, text).await?;
        Ok(convert::to_comment(&comment))
    }

    /// Comments for many work items at once, keyed by work item id.
    ///
    /// Items whose comments could not be fetched map to an empty list
    /// rather than failing the whole call.
    pub async fn fetch_comments_for(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<Comment>>> {
        let by_item = self.client.batch_get_comments(ids).await?;
        Ok(by_item
            .into_iter()
            .map(|(id, comments)| (id, comments.iter().map(convert::to_comment).collect()))
            .collect())
    }

    /// Current rate limit picture as of the most recent response.
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.client.rate_limit_status()
    }
}
