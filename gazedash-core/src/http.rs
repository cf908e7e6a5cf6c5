//! Typed JSON-over-HTTP client for the session API.
//!
//! Every call issues exactly one request: no retries, no caching. Responses
//! are read as text first and parsed leniently, so a non-JSON body never
//! fails at the parse step. Failures collapse into [`RequestError`], with
//! cancellation kept distinct so callers can drop it silently.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum RequestError {
    /// The caller's cancellation token fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// The server answered with a non-success status.
    #[error("{message}")]
    Status {
        status: u16,
        url: String,
        message: String,
        body: Value,
    },

    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("Invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl RequestError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }

    /// HTTP status, when the failure carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            RequestError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The server-supplied `detail` field of a JSON error body.
    pub fn detail(&self) -> Option<String> {
        match self {
            RequestError::Status { body, .. } => detail_of(body),
            _ => None,
        }
    }

    /// Single human-readable line for display.
    ///
    /// `"<status>: <detail>"` when the server explained itself,
    /// `"<status>: <message>"` for other status errors, and the plain error
    /// text for everything else.
    pub fn user_message(&self) -> String {
        match self {
            RequestError::Status {
                status, message, ..
            } => match self.detail() {
                Some(detail) if !detail.is_empty() => format!("{}: {}", status, detail),
                _ => format!("{}: {}", status, message),
            },
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Request options
// ============================================================================

/// Per-call options for [`HttpClient::request_json`].
#[derive(Debug, Clone)]
pub struct RequestOptions<'a> {
    pub method: Method,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    pub cancel: Option<&'a CancellationToken>,
}

impl Default for RequestOptions<'_> {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
            headers: HeaderMap::new(),
            cancel: None,
        }
    }
}

impl<'a> RequestOptions<'a> {
    pub fn get(cancel: Option<&'a CancellationToken>) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn post<B: Serialize + ?Sized>(
        body: &B,
        cancel: Option<&'a CancellationToken>,
    ) -> Result<Self, RequestError> {
        let body = serde_json::to_value(body).map_err(RequestError::Encode)?;
        Ok(Self {
            method: Method::POST,
            body: Some(body),
            cancel,
            ..Self::default()
        })
    }
}

// ============================================================================
// HttpClient
// ============================================================================

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client. `timeout` of `None` leaves requests unbounded.
    pub fn new(timeout: Option<Duration>) -> Result<Self, RequestError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Issue one JSON request and decode the response into `T`.
    ///
    /// If `opts.cancel` fires while the request is in flight the request
    /// future is dropped (aborting the connection) and
    /// [`RequestError::Cancelled`] is returned.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: RequestOptions<'_>,
    ) -> Result<T, RequestError> {
        let Some(token) = opts.cancel.cloned() else {
            return self.send(url, opts).await;
        };

        if token.is_cancelled() {
            return Err(RequestError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(url = %url, "Request aborted by cancellation");
                Err(RequestError::Cancelled)
            }
            result = self.send(url, opts) => result,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        url: &str,
        opts: RequestOptions<'_>,
    ) -> Result<T, RequestError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.extend(opts.headers);

        tracing::debug!(method = %opts.method, url = %url, "Sending request");

        let mut request = self.client.request(opts.method, url).headers(headers);
        if let Some(body) = &opts.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let data = parse_body(&text);

        if !status.is_success() {
            let message = detail_of(&data).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));

            tracing::warn!(
                status = status.as_u16(),
                url = %url,
                message = %message,
                "Session API returned an error status"
            );

            return Err(RequestError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                message,
                body: data,
            });
        }

        serde_json::from_value(data).map_err(|source| RequestError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

/// Empty text is `null`; text that is not JSON is kept as a JSON string.
fn parse_body(text: &str) -> Value {
    if text.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn detail_of(body: &Value) -> Option<String> {
    let detail = body.as_object()?.get("detail")?;
    Some(match detail {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

// ============================================================================
// TESTS
// ============================================================================
