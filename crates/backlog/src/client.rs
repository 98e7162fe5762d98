//! Work item REST client: validation, batched fetches, and error mapping.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use backon::Retryable;
use chrono::{DateTime, SecondsFormat, Utc};
use futures::future::join_all;
use serde::de::DeserializeOwned;

use crate::batch::{DEFAULT_CHUNK_SIZE, process_batches};
use crate::connection::Connection;
use crate::error::{Error, Result, short_error_message};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpError, HttpHeaders, HttpMethod, HttpRequest, HttpResponse, HttpTransport, header_get};
use crate::model::{BatchOptions, Expand};
use crate::rate_limit::{RateLimitOptions, RateLimitStatus, RateLimiter};
use crate::retry::RetryPolicy;
use crate::wire::{
    CommentCreate, CommentList, WiqlRequest, WireComment, WireWorkItem, WorkItemList,
    WorkItemQueryResult, WorkItemRef,
};

/// Default HTTP timeout for the real transport.
const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Configuration for [`WorkItemsClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Validated connection settings (organization, project, token).
    pub connection: Connection,
    /// Rate limiter tuning.
    pub rate_limit: RateLimitOptions,
    /// Retry policy for transport-level failures.
    pub retry: RetryPolicy,
    /// HTTP timeout for the real transport.
    pub timeout: StdDuration,
}

impl ClientConfig {
    /// Configuration with default rate limiting, retries, and timeout.
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            rate_limit: RateLimitOptions::default(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Client for the work item tracking REST API.
///
/// All calls run through the rate limiter; transport-level failures are
/// retried per the configured policy, and every response's status is mapped
/// into the crate's error taxonomy before a caller sees it.
#[derive(Clone)]
pub struct WorkItemsClient {
    transport: Arc<dyn HttpTransport>,
    connection: Connection,
    limiter: RateLimiter,
    retry: RetryPolicy,
}

impl WorkItemsClient {
    /// Create a client backed by a real HTTP transport.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(config.timeout)?;
        Ok(Self::new_with_transport(config, Arc::new(transport)))
    }

    /// Create a client over an injected transport.
    pub fn new_with_transport(config: ClientConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            connection: config.connection,
            limiter: RateLimiter::new(config.rate_limit),
            retry: config.retry,
        }
    }

    /// The connection this client was built with.
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Snapshot of the rate limiter, for diagnostics.
    #[must_use]
    pub fn rate_limit_status(&self) -> RateLimitStatus {
        self.limiter.status()
    }

    /// Fetch a single work item by id.
    pub async fn get_work_item(&self, id: i32, expand: Option<Expand>) -> Result<WireWorkItem> {
        validate_ids(&[id])?;

        let mut params: Vec<(&str, String)> = Vec::new();
        if let Some(expand) = expand {
            params.push(("$expand", expand.as_param().to_string()));
        }

        let url = self.connection.build_url(&format!("_apis/wit/workitems/{id}"), &params)?;
        let response = self.send(HttpMethod::Get, url.as_str(), Vec::new()).await?;
        parse_response(response, &format!("work item {id}"), false)
    }

    /// Run a WIQL query and return the matched work item references.
    ///
    /// The query endpoint returns `{id, url}` references only; follow up
    /// with [`WorkItemsClient::batch_get_work_items`] for full field sets.
    pub async fn query_work_items(&self, wiql: &str) -> Result<Vec<WorkItemRef>> {
        let trimmed = wiql.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("query text must not be empty"));
        }

        let body = serde_json::to_vec(&WiqlRequest {
            query: trimmed.to_string(),
        })?;
        let url = self.connection.build_url("_apis/wit/wiql", &[])?;
        let response = self.send(HttpMethod::Post, url.as_str(), body).await?;
        let result: WorkItemQueryResult = parse_response(response, "query", true)?;
        Ok(result.work_items)
    }

    /// Fetch many work items, chunked to the server's batch size limit.
    ///
    /// Ids are validated up front, then deduplicated and sorted so
    /// identical id sets produce identical chunk requests. Empty input
    /// returns empty output without any network call.
    pub async fn batch_get_work_items(
        &self,
        ids: &[i32],
        options: &BatchOptions,
    ) -> Result<Vec<WireWorkItem>> {
        validate_ids(ids)?;
        process_batches(ids, DEFAULT_CHUNK_SIZE, options.error_policy, |chunk| {
            self.fetch_chunk(chunk, options)
        })
        .await
    }

    async fn fetch_chunk(&self, chunk: Vec<i32>, options: &BatchOptions) -> Result<Vec<WireWorkItem>> {
        let joined = chunk.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        let mut params: Vec<(&str, String)> = vec![("ids", joined)];
        if !options.fields.is_empty() {
            params.push(("fields", options.fields.join(",")));
        }
        if let Some(expand) = options.expand {
            params.push(("$expand", expand.as_param().to_string()));
        }
        if let Some(as_of) = options.as_of {
            params.push(("asOf", as_of.to_rfc3339_opts(SecondsFormat::Secs, true)));
        }

        let url = self.connection.build_url("_apis/wit/workitems", &params)?;
        let response = self.send(HttpMethod::Get, url.as_str(), Vec::new()).await?;
        let list: WorkItemList = parse_response(response, "work item batch", false)?;
        Ok(list.value)
    }

    /// Fetch all comments of a work item.
    pub async fn get_work_item_comments(&self, id: i32) -> Result<Vec<WireComment>> {
        validate_ids(&[id])?;

        let url = self
            .connection
            .build_url(&format!("_apis/wit/workItems/{id}/comments"), &[])?;
        let response = self.send(HttpMethod::Get, url.as_str(), Vec::new()).await?;
        let list: CommentList = parse_response(response, &format!("comments of work item {id}"), false)?;
        Ok(list.comments)
    }

    /// Add a comment to a work item.
    pub async fn add_work_item_comment(&self, id: i32, text: &str) -> Result<WireComment> {
        validate_ids(&[id])?;
        if text.trim().is_empty() {
            return Err(Error::validation("comment text must not be empty"));
        }

        let body = serde_json::to_vec(&CommentCreate {
            text: text.to_string(),
        })?;
        let url = self
            .connection
            .build_url(&format!("_apis/wit/workItems/{id}/comments"), &[])?;
        let response = self.send(HttpMethod::Post, url.as_str(), body).await?;
        parse_response(response, &format!("work item {id}"), false)
    }

    /// Fetch comments for many work items.
    ///
    /// The comment endpoint has no batch form, so this issues one fetch per
    /// unique id, all gated by the rate limiter. A failed per-id fetch is
    /// logged and yields an empty list for that id; the map always carries
    /// an entry for every requested id.
    pub async fn batch_get_comments(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<WireComment>>> {
        validate_ids(ids)?;
        let unique: Vec<i32> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();

        let fetches = unique
            .into_iter()
            .map(|id| async move { (id, self.get_work_item_comments(id).await) });

        let mut by_id = HashMap::new();
        for (id, outcome) in join_all(fetches).await {
            match outcome {
                Ok(comments) => {
                    by_id.insert(id, comments);
                }
                Err(err) => {
                    tracing::warn!(
                        "comments for work item {id} unavailable: {}",
                        short_error_message(&err)
                    );
                    by_id.insert(id, Vec::new());
                }
            }
        }
        Ok(by_id)
    }

    /// Send one request through the rate limiter with transport retries.
    ///
    /// Each attempt re-acquires a concurrency slot and re-applies pacing,
    /// so retries count against the dispatch rate like any other call. Only
    /// transport-level failures are retried; any HTTP response, whatever
    /// its status, ends the attempt loop. Quota headers are recorded from
    /// every response before the caller inspects the status.
    async fn send(&self, method: HttpMethod, url: &str, body: Vec<u8>) -> Result<HttpResponse> {
        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers: self.connection.auth_headers(),
            body,
        };

        let response = (|| {
            let request = request.clone();
            async move { self.limiter.execute(|| self.transport.send(request)).await }
        })
        .retry(self.retry.clone().into_backoff())
        .when(HttpError::is_transient)
        .notify(|err: &HttpError, delay: StdDuration| {
            tracing::warn!(
                delay_ms = delay.as_millis() as u64,
                "transient transport failure, will retry: {err}"
            );
        })
        .await?;

        self.limiter.update_from_headers(&response.headers);
        Ok(response)
    }
}

fn validate_ids(ids: &[i32]) -> Result<()> {
    if let Some(bad) = ids.iter().find(|id| **id <= 0) {
        return Err(Error::validation(format!(
            "work item ids must be positive (got {bad})"
        )));
    }
    Ok(())
}

/// Map a non-2xx response to the error taxonomy and parse a 2xx body.
fn parse_response<T: DeserializeOwned>(
    response: HttpResponse,
    resource: &str,
    from_query: bool,
) -> Result<T> {
    check_status(&response, resource, from_query)?;
    Ok(serde_json::from_slice(&response.body)?)
}

fn check_status(response: &HttpResponse, resource: &str, from_query: bool) -> Result<()> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }

    let message = String::from_utf8_lossy(&response.body).to_string();
    Err(match response.status {
        400 if from_query => Error::InvalidQuery { message },
        401 | 403 => Error::Authentication { message },
        404 => Error::NotFound {
            resource: resource.to_string(),
        },
        429 => Error::RateLimited {
            reset_at: reset_hint(&response.headers),
        },
        status => Error::Server { status, message },
    })
}

/// The reset instant a 429 response advertised, if any.
fn reset_hint(headers: &HttpHeaders) -> Option<DateTime<Utc>> {
    if let Some(seconds) = header_get(headers, "retry-after").and_then(|v| v.trim().parse::<i64>().ok()) {
        return Some(Utc::now() + chrono::Duration::seconds(seconds));
    }
    header_get(headers, "x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
}
