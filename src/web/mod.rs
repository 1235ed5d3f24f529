//! Embedded web dashboard for lifetrack.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page app with dashboard, measurement and template pages
//! - JSON endpoints backed by one [`PageController`]
//!
//! Launched via `lifetrack web` (default: `http://127.0.0.1:9747`).

mod api;
mod frontend;

use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::api::{ApiClient, ApiError, Transport, UreqTransport};
use crate::app::PageController;
use crate::config::LifetrackConfig;
use crate::dashboard::TimeRange;

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// A rendered HTTP reply, independent of the server.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

const JSON: &str = "application/json; charset=utf-8";
const HTML: &str = "text/html; charset=utf-8";

impl Reply {
    pub fn json<T: Serialize>(status: u16, data: &T) -> Result<Self> {
        Ok(Self {
            status,
            content_type: JSON,
            body: serde_json::to_string(data).context("failed to serialize JSON response")?,
        })
    }

    pub fn error(status: u16, message: impl Into<String>) -> Self {
        let body = serde_json::json!({ "error": message.into() }).to_string();
        Self {
            status,
            content_type: JSON,
            body,
        }
    }

    /// Parsed JSON body.
    pub fn json_body(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.body).ok()
    }

    fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        Response::from_data(self.body.into_bytes())
            .with_header(content_type(self.content_type))
            .with_status_code(StatusCode(self.status))
    }
}

fn content_type(value: &str) -> Header {
    Header::from_bytes("Content-Type", value).unwrap()
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

/// Web front end state: the page controller and the API it talks to.
pub struct WebApp<T: Transport> {
    controller: PageController<T>,
    api_url: String,
}

impl<T: Transport> WebApp<T> {
    pub fn new(controller: PageController<T>, api_url: impl Into<String>) -> Self {
        Self {
            controller,
            api_url: api_url.into(),
        }
    }

    pub fn controller(&self) -> &PageController<T> {
        &self.controller
    }

    /// Route one request. Never fails: unexpected errors become a 500.
    pub fn handle(&mut self, method: &str, url: &str, body: Option<&str>) -> Reply {
        match self.dispatch(method, url, body) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(method, url, error = %e, "request failed");
                Reply::error(500, e.to_string())
            }
        }
    }

    fn dispatch(&mut self, method: &str, url: &str, body: Option<&str>) -> Result<Reply> {
        // Strip query string for path matching
        let path = url.split('?').next().unwrap_or(url);
        let body = body.unwrap_or("{}");
        let c = &mut self.controller;

        match (method, path) {
            // Frontend
            ("GET", "/") | ("GET", "/index.html") => Ok(Reply {
                status: 200,
                content_type: HTML,
                body: frontend::INDEX_HTML.to_string(),
            }),

            // Session
            ("GET", "/api/session") => api::get_session(c),
            ("POST", "/api/login") => api::post_login(c, body),
            ("POST", "/api/logout") => api::post_logout(c),
            ("POST", "/api/navigate") => api::post_navigate(c, body),

            // Templates
            ("GET", "/api/templates") => api::get_templates(c),
            ("POST", "/api/templates") => api::post_template(c, body),

            // Measurements
            ("GET", "/api/measurements") => api::get_measurements(c, url),
            ("POST", "/api/measurements") => api::post_measurement(c, body),
            ("GET", "/api/recorder") => api::get_recorder(c, url),

            // Dashboard
            ("GET", "/api/dashboard") => api::get_dashboard(c, url),

            ("GET", "/api/health") => api::get_health(c, &self.api_url),

            _ => Ok(Reply::error(404, "not found")),
        }
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local single-user dashboard). Errors are handled per request without
/// crashing the server.
pub fn serve(cfg: &LifetrackConfig, bind: Option<&str>, open: bool) -> Result<()> {
    let addr = bind.unwrap_or(&cfg.web.bind);
    let client = ApiClient::from_config(cfg)?;
    let mut controller: PageController<UreqTransport> = PageController::new(
        client,
        TimeRange::from_config(&cfg.dashboard),
        Local::now().date_naive(),
    );
    match controller.initialize() {
        Ok(()) | Err(ApiError::NotAuthenticated) => {}
        Err(e) => tracing::warn!(error = %e, "initial load failed"),
    }
    let mut app = WebApp::new(controller, cfg.api.base_url.clone());

    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    println!("lifetrack dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            tracing::debug!(error = %e, "could not open browser");
        }
    }

    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        // Read body up-front for methods that carry one
        let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
            let mut buf = String::new();
            let _ = request.as_reader().read_to_string(&mut buf);
            Some(buf)
        } else {
            None
        };

        let reply = app.handle(&method.to_string(), &url, body.as_deref());
        tracing::info!(method = %method, url = %url, status = reply.status, "request");
        let _ = request.respond(reply.into_response());
    }

    Ok(())
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}
