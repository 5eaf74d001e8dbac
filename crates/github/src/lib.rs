//! prbuild GitHub infrastructure adapter.
//!
//! Implements [`pipeline::PullRequestSource`] against the GitHub REST API:
//! `GET <api-base>/<number>`, where the base is the repository's `pulls`
//! collection (e.g. `https://api.github.com/repos/owner/repo/pulls`).
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. HTTP status
//! mapping and wire decoding live here; the [`pipeline`] crate only ever sees
//! [`pipeline::PullRequest`] and [`pipeline::FetchError`].

use async_trait::async_trait;
use pipeline::{FetchError, PullRequest, PullRequestNumber, PullRequestSource};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

const GITHUB_JSON: &str = "application/vnd.github+json";
const DEFAULT_USER_AGENT: &str = concat!("prbuild/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

/// The subset of the GitHub pull-request payload the service needs.
#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    head: HeadRef,
    user: Author,
}

#[derive(Debug, Deserialize)]
struct HeadRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct Author {
    login: String,
}

/// Decodes a pull-request payload into the domain type.
fn decode(number: PullRequestNumber, body: &[u8]) -> Result<PullRequest, FetchError> {
    let payload: PullRequestPayload =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode {
            message: e.to_string(),
        })?;
    Ok(PullRequest {
        number,
        head_sha: payload.head.sha,
        author_login: payload.user.login,
    })
}

/// Maps a non-success status onto the matching [`FetchError`].
fn status_error(status: StatusCode, url: String) -> FetchError {
    match status {
        StatusCode::NOT_FOUND => FetchError::NotFound { url },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FetchError::Forbidden {
            url,
            status: status.as_u16(),
        },
        _ => FetchError::UnexpectedStatus {
            url,
            status: status.as_u16(),
        },
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Fetches pull requests from one repository's `pulls` endpoint.
#[derive(Debug, Clone)]
pub struct GitHubPullRequestSource {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GitHubPullRequestSource {
    /// Creates a source for `api_base`; a trailing `/` is ignored.
    pub fn new(api_base: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport {
                message: e.to_string(),
            })?;
        Ok(Self::with_client(client, api_base))
    }

    /// Creates a source that sends requests through `client`.
    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_owned();
        Self {
            client,
            api_base,
            token: None,
        }
    }

    /// Authenticates requests with a bearer token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the metadata URL for `number`.
    pub fn url_for(&self, number: PullRequestNumber) -> String {
        format!("{}/{}", self.api_base, number)
    }
}

#[async_trait]
impl PullRequestSource for GitHubPullRequestSource {
    #[instrument(skip(self))]
    async fn fetch(&self, number: PullRequestNumber) -> Result<PullRequest, FetchError> {
        let url = self.url_for(number);
        debug!(%url, "fetching pull request metadata");
        let mut request = self
            .client
            .get(&url)
            .header(ACCEPT, GITHUB_JSON)
            .header(USER_AGENT, DEFAULT_USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| FetchError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "metadata request rejected");
            return Err(status_error(status, url));
        }

        let body = response.bytes().await.map_err(|e| FetchError::Transport {
            message: e.to_string(),
        })?;
        debug!(bytes = body.len(), "metadata received");
        decode(number, &body)
    }
}
