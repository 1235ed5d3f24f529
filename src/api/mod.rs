//! API gateway — the single chokepoint for every network call.
//!
//! [`ApiClient`] attaches the bearer credential, performs the request through
//! a [`Transport`], interprets the status code, and hands back either the
//! decoded JSON or an [`ApiError`]. Callers propagate errors with `?` and
//! apply no partial updates when a call fails.
//!
//! A `401` on an authenticated call clears the stored credential: the session
//! is over and the user has to log in again.

pub mod endpoints;
pub mod transport;

use std::time::Instant;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::activity::ActivityLog;
use crate::session::CredentialStore;

pub use endpoints::{DateWindow, MeasurementQuery};
pub use transport::UreqTransport;

/// Path of the token-issuing endpoint, the only call allowed without a
/// stored credential.
pub const TOKEN_ENDPOINT: &str = "/token";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing credential, or the API rejected it. The stored token has been
    /// cleared; the caller should send the user to log in.
    #[error("not logged in")]
    NotAuthenticated,
    /// Any other non-2xx response.
    #[error("API error: {status}")]
    Status { status: u16, detail: Option<String> },
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Server-supplied `detail` message, when the error body carried one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
}

/// A request relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Body>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Body) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    fn is_token_request(&self) -> bool {
        self.path == TOKEN_ENDPOINT
    }
}

// ---------------------------------------------------------------------------
// Transport seam
// ---------------------------------------------------------------------------

/// Status and body of an HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// The request never produced a response (DNS, connect, timeout, ...).
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Moves an [`ApiRequest`] over the wire. Non-2xx statuses are returned as
/// `Ok`; only a missing response is an error.
pub trait Transport {
    fn send(&self, request: &ApiRequest, bearer: Option<&str>)
    -> Result<RawResponse, TransportError>;
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated API client.
#[derive(Debug)]
pub struct ApiClient<T = UreqTransport> {
    transport: T,
    credentials: CredentialStore,
    activity: ActivityLog,
}

impl ApiClient<UreqTransport> {
    /// Build the production client from the resolved config.
    pub fn from_config(
        config: &crate::config::LifetrackConfig,
    ) -> Result<Self, crate::session::SessionError> {
        let credentials = CredentialStore::from_config(config)?;
        let activity = if config.logging.activity_log {
            ActivityLog::default_location()
        } else {
            ActivityLog::disabled()
        };
        Ok(Self::new(UreqTransport::from_config(&config.api), credentials, activity))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn new(transport: T, credentials: CredentialStore, activity: ActivityLog) -> Self {
        Self {
            transport,
            credentials,
            activity,
        }
    }

    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Perform `request` and decode the JSON response body.
    pub fn request<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R, ApiError> {
        let token = self.credentials.token();
        if token.is_none() && !request.is_token_request() {
            tracing::debug!(path = %request.path, "no stored credential");
            return Err(ApiError::NotAuthenticated);
        }

        let started = Instant::now();
        let outcome = self.transport.send(&request, token.as_deref());
        let latency_ms = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                self.activity
                    .record(request.method.as_str(), &request.path, None, latency_ms);
                tracing::warn!(path = %request.path, error = %e, "API request failed");
                return Err(ApiError::Transport {
                    endpoint: request.path,
                    message: e.0,
                });
            }
        };

        self.activity.record(
            request.method.as_str(),
            &request.path,
            Some(response.status),
            latency_ms,
        );
        tracing::debug!(
            method = request.method.as_str(),
            path = %request.path,
            status = response.status,
            latency_ms,
            "API call"
        );

        if response.status == 401 && !request.is_token_request() {
            if let Err(e) = self.credentials.clear() {
                tracing::warn!(error = %e, "failed to clear rejected credential");
            }
            return Err(ApiError::NotAuthenticated);
        }

        if !(200..300).contains(&response.status) {
            return Err(ApiError::Status {
                status: response.status,
                detail: error_detail(&response.body),
            });
        }

        serde_json::from_str(&response.body).map_err(|source| ApiError::Decode {
            endpoint: request.path,
            source,
        })
    }
}

/// Extract the `detail` field the API puts in error bodies.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
