//! Production [`Transport`] over the synchronous `ureq` HTTP client.
//!
//! One agent is built per process and reused for every call, so connections
//! to the API are pooled. Non-2xx statuses come back as `ureq::Error::Status`
//! and are unwrapped into a plain [`RawResponse`]; the gateway decides what
//! they mean.
use std::time::Duration;

use super::{ApiRequest, Body, RawResponse, Transport, TransportError};
use crate::config::schema::ApiConfig;

#[derive(Debug)]
pub struct UreqTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl UreqTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let mut call = self
            .agent
            .request(request.method.as_str(), &self.url(&request.path))
            .set("Accept", "application/json");

        for (key, value) in &request.query {
            call = call.query(key, value);
        }
        if let Some(token) = bearer {
            call = call.set("Authorization", &format!("Bearer {token}"));
        }

        let result = match &request.body {
            None => call.call(),
            Some(Body::Json(value)) => call.send_json(value),
            Some(Body::Form(pairs)) => {
                let pairs: Vec<(&str, &str)> = pairs
                    .iter()
                    .map(|(k, v)| (k.as_str(), v.as_str()))
                    .collect();
                call.send_form(&pairs)
            }
        };

        match result {
            Ok(resp) => {
                let status = resp.status();
                let body = resp
                    .into_string()
                    .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;
                Ok(RawResponse { status, body })
            }
            Err(ureq::Error::Status(status, resp)) => Ok(RawResponse {
                status,
                body: resp.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(e)) => Err(TransportError(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
