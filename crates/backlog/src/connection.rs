//! Connection settings, URL construction, and auth headers for the
//! work item API.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use url::Url;

use crate::error::{Error, Result};
use crate::http::HttpHeaders;

/// Host serving the work item API unless overridden.
pub const DEFAULT_HOST: &str = "dev.azure.com";

/// API version sent with every request unless overridden.
pub const DEFAULT_API_VERSION: &str = "7.1-preview.3";

/// Validated connection settings for one organization/project.
///
/// Construction checks that the organization, project, and access token are
/// all non-empty after trimming, so a client holding a `Connection` can
/// build URLs and auth headers without re-validating.
#[derive(Debug, Clone)]
pub struct Connection {
    organization: String,
    project: String,
    token: String,
    host: String,
    api_version: String,
}

impl Connection {
    /// Create a connection for the default host and API version.
    pub fn new(organization: &str, project: &str, token: &str) -> Result<Self> {
        let organization = non_empty("organization", organization)?;
        let project = non_empty("project", project)?;
        let token = non_empty("token", token)?;

        Ok(Self {
            organization,
            project,
            token,
            host: DEFAULT_HOST.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Override the service host.
    ///
    /// Accepts a bare host name (reached over HTTPS) or a scheme-qualified
    /// base such as `http://localhost:8080` for on-premises servers.
    #[must_use]
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.trim().trim_end_matches('/').to_string();
        self
    }

    /// Override the API version string.
    #[must_use]
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.trim().to_string();
        self
    }

    #[must_use]
    pub fn organization(&self) -> &str {
        &self.organization
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// Build a project-scoped API URL.
    ///
    /// `path` is the API path under the project root (e.g.
    /// `_apis/wit/workitems/123`). All query values are percent-encoded and
    /// the `api-version` parameter is always appended last, so identical
    /// inputs produce identical URLs.
    pub fn build_url(&self, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let base = if self.host.contains("://") {
            self.host.clone()
        } else {
            format!("https://{}", self.host)
        };
        let mut url = Url::parse(&base).map_err(|e| {
            Error::validation(format!("invalid host '{}': {e}", self.host))
        })?;

        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::validation(format!("host '{}' cannot carry a path", self.host))
            })?;
            segments.push(&self.organization);
            segments.push(&self.project);
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
        }

        {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
            pairs.append_pair("api-version", &self.api_version);
        }

        Ok(url)
    }

    /// Headers carried by every request: Basic auth derived from the access
    /// token (empty user, token as password) plus JSON content negotiation.
    #[must_use]
    pub fn auth_headers(&self) -> HttpHeaders {
        let credential = BASE64.encode(format!(":{}", self.token));
        vec![
            ("Authorization".to_string(), format!("Basic {credential}")),
            ("Content-Type".to_string(), "application/json".to_string()),
            ("Accept".to_string(), "application/json".to_string()),
        ]
    }
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}
