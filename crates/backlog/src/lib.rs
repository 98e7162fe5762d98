//! Backlog - a rate-limited batch client for Azure DevOps work items.
//!
//! This library wraps the Work Item Tracking REST API behind a typed client:
//! WIQL queries, chunked batch reads, comment access, and write-backs, all
//! dispatched through a client-side rate limiter that listens to the
//! service's quota headers.
//!
//! # Example
//!
//! ```ignore
//! use backlog::{ClientConfig, Connection, QueryFilters, WorkItemProvider, WorkItemQuery, WorkItemsClient};
//!
//! let connection = Connection::new("acme", "web", &token)?;
//! let client = WorkItemsClient::new(ClientConfig::new(connection))?;
//! let provider = WorkItemProvider::new(client);
//!
//! let query = WorkItemQuery {
//!     filters: QueryFilters {
//!         states: vec!["Active".into()],
//!         ..QueryFilters::default()
//!     },
//!     ..WorkItemQuery::default()
//! };
//! let records = provider.fetch_work_items(&query).await?;
//! ```

pub mod batch;
pub mod client;
pub mod connection;
pub mod error;
pub mod http;
pub mod model;
pub mod provider;
pub mod rate_limit;
pub mod retry;
pub mod wire;

pub use batch::{DEFAULT_CHUNK_SIZE, ErrorPolicy};
pub use client::{ClientConfig, WorkItemsClient};
pub use connection::Connection;
pub use error::{Error, Result};
pub use model::{
    BatchOptions, Comment, Expand, QueryFilters, SortOrder, WorkItemQuery, WorkRecord,
};
pub use provider::WorkItemProvider;
pub use rate_limit::{RateLimitOptions, RateLimitStatus, ServerQuota};
pub use retry::RetryPolicy;
