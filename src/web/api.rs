//! JSON API handlers for the web dashboard.
//!
//! Each handler drives the [`PageController`] and returns a [`Reply`].
//! Expected failures map to status codes: a missing or rejected session is
//! `401` (the frontend shows its login panel), form errors are `400`, and
//! failures of the upstream API are `502`.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::activity::{self, ActivitySummary};
use crate::api::{ApiError, Transport};
use crate::app::{Page, PageController, SubmitError};
use crate::browser::{MeasurementFilter, MeasurementRow};
use crate::dashboard::DashboardView;
use crate::editor::TemplateDraft;
use crate::forms::FormError;
use crate::model::Template;
use crate::registry::SelectOption;
use crate::session;

use super::Reply;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct NavigateRequest {
    page: Page,
}

/// New measurement as posted by the recorder form: raw input text per
/// value definition.
#[derive(Deserialize)]
struct RecordRequest {
    template_id: String,
    #[serde(default)]
    values: BTreeMap<String, String>,
    #[serde(default)]
    measured_at: Option<String>,
    #[serde(default)]
    notes: String,
}

#[derive(Serialize)]
struct SessionResponse<'a> {
    logged_in: bool,
    username: Option<&'a str>,
    page: Page,
    templates: Vec<SelectOption>,
    time_ranges: &'a [u32],
    active_days: Option<u32>,
    days: u32,
    filter: &'a MeasurementFilter,
}

#[derive(Serialize)]
struct MeasurementsResponse<'a> {
    filter: &'a MeasurementFilter,
    rows: Vec<MeasurementRow>,
}

#[derive(Serialize)]
struct DashboardResponse<'a> {
    time_ranges: &'a [u32],
    active_days: Option<u32>,
    view: DashboardView,
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    api_url: &'a str,
    logged_in: bool,
    username: Option<&'a str>,
    activity_log: bool,
    activity: Option<ActivitySummaryResponse>,
}

/// Activity log summary over the last week.
#[derive(Serialize)]
struct ActivitySummaryResponse {
    days: u32,
    calls: usize,
    failures: usize,
    avg_latency_ms: u64,
}

impl ActivitySummaryResponse {
    fn new(days: u32, summary: ActivitySummary) -> Self {
        Self {
            days,
            calls: summary.calls,
            failures: summary.failures,
            avg_latency_ms: summary.avg_latency_ms,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Value of query parameter `key`, percent-decoded.
fn query_param(url: &str, key: &str) -> Option<String> {
    url.split('?').nth(1)?.split('&').find_map(|pair| {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        if k != key {
            return None;
        }
        let v = v.replace('+', " ");
        urlencoding::decode(&v).ok().map(|s| s.into_owned())
    })
}

/// Parse the `?days=N` query parameter from a URL.
fn parse_days_param(url: &str) -> Option<u32> {
    query_param(url, "days")?.parse().ok()
}

fn parse_date_param(url: &str, key: &str) -> Result<Option<NaiveDate>, FormError> {
    match query_param(url, key).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FormError::InvalidTimestamp { raw }),
    }
}

fn parse_json<'a, T: Deserialize<'a>>(body: &'a str) -> Result<T, Reply> {
    serde_json::from_str(body).map_err(|e| Reply::error(400, format!("invalid JSON: {e}")))
}

fn api_failure(e: &ApiError) -> Result<Reply> {
    let status = match e {
        ApiError::NotAuthenticated => 401,
        _ => 502,
    };
    Reply::json(
        status,
        &serde_json::json!({ "error": e.to_string(), "detail": e.detail() }),
    )
}

fn form_failure(e: &FormError) -> Reply {
    Reply::error(400, e.to_string())
}

fn submit_failure(e: &SubmitError) -> Result<Reply> {
    match e {
        SubmitError::Form(e) => Ok(form_failure(e)),
        SubmitError::Api(e) => api_failure(e),
    }
}

fn session_reply<T: Transport>(c: &PageController<T>, logged_in: bool) -> Result<Reply> {
    let range = &c.dashboard().range;
    Reply::json(
        200,
        &SessionResponse {
            logged_in,
            username: c.user().map(|u| u.username.as_str()),
            page: c.active_page(),
            templates: c.registry().options("Select a template"),
            time_ranges: range.presets(),
            active_days: range.active(),
            days: range.days(),
            filter: c.filter(),
        },
    )
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// `GET /api/session` — login state, template options and view settings.
pub fn get_session<T: Transport>(c: &mut PageController<T>) -> Result<Reply> {
    if session::guard(c.client().credentials()).is_err() {
        return session_reply(c, false);
    }
    if c.user().is_none() {
        match c.initialize() {
            Ok(()) => {}
            Err(ApiError::NotAuthenticated) => return session_reply(c, false),
            Err(e) => return api_failure(&e),
        }
    }
    session_reply(c, true)
}

/// `POST /api/login` — `{ "username": .., "password": .. }`.
pub fn post_login<T: Transport>(c: &mut PageController<T>, body: &str) -> Result<Reply> {
    let req: LoginRequest = match parse_json(body) {
        Ok(req) => req,
        Err(reply) => return Ok(reply),
    };

    match c.client().issue_token(&req.username, &req.password) {
        Ok(token) => c.client().credentials().save(&token.access_token)?,
        Err(ApiError::Status { status: 401, .. }) => {
            return Ok(Reply::error(401, "incorrect username or password"));
        }
        Err(e) => return api_failure(&e),
    }

    if let Err(e) = c.initialize() {
        return api_failure(&e);
    }
    session_reply(c, true)
}

/// `POST /api/logout` — forget the credential and all cached views.
pub fn post_logout<T: Transport>(c: &mut PageController<T>) -> Result<Reply> {
    c.logout()?;
    session_reply(c, false)
}

/// `POST /api/navigate` — `{ "page": "dashboard" | "measurements" | "templates" }`.
pub fn post_navigate<T: Transport>(c: &mut PageController<T>, body: &str) -> Result<Reply> {
    let req: NavigateRequest = match parse_json(body) {
        Ok(req) => req,
        Err(reply) => return Ok(reply),
    };
    match c.navigate(req.page) {
        Ok(data) => Reply::json(200, &data),
        Err(e) => api_failure(&e),
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// `GET /api/templates` — refreshed template listing.
pub fn get_templates<T: Transport>(c: &mut PageController<T>) -> Result<Reply> {
    if let Err(e) = c.reload_templates() {
        return api_failure(&e);
    }
    let templates: &[Template] = c.registry().all();
    Reply::json(200, &templates)
}

/// `POST /api/templates` — body is a [`TemplateDraft`].
pub fn post_template<T: Transport>(c: &mut PageController<T>, body: &str) -> Result<Reply> {
    let draft: TemplateDraft = match parse_json(body) {
        Ok(draft) => draft,
        Err(reply) => return Ok(reply),
    };
    *c.open_editor() = draft;

    match c.submit_template() {
        Ok(created) => Reply::json(201, &created),
        Err(e) => submit_failure(&e),
    }
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

/// `GET /api/measurements?template_id=&start_date=&end_date=` — dates are
/// local calendar dates (`YYYY-MM-DD`). Without any parameter the current
/// filter is reused.
pub fn get_measurements<T: Transport>(c: &mut PageController<T>, url: &str) -> Result<Reply> {
    let has_filter = ["template_id", "start_date", "end_date"]
        .iter()
        .any(|key| query_param(url, key).is_some());

    if has_filter {
        let filter = match (
            parse_date_param(url, "start_date"),
            parse_date_param(url, "end_date"),
        ) {
            (Ok(start_date), Ok(end_date)) => MeasurementFilter {
                template_id: query_param(url, "template_id").filter(|v| !v.is_empty()),
                start_date,
                end_date,
            },
            (Err(e), _) | (_, Err(e)) => return Ok(form_failure(&e)),
        };
        c.set_filter(filter);
    }

    if let Err(e) = c.load_measurements() {
        return api_failure(&e);
    }
    Reply::json(
        200,
        &MeasurementsResponse {
            filter: c.filter(),
            rows: c.measurement_rows(),
        },
    )
}

/// `GET /api/recorder?template_id=` — a fresh measurement form rendered for
/// the template: one required numeric field per value definition.
pub fn get_recorder<T: Transport>(c: &mut PageController<T>, url: &str) -> Result<Reply> {
    c.open_recorder();
    let template_id = query_param(url, "template_id").unwrap_or_default();
    c.recorder_select_template(&template_id);
    Reply::json(200, &c.recorder())
}

/// `POST /api/measurements` — body is a [`RecordRequest`].
pub fn post_measurement<T: Transport>(c: &mut PageController<T>, body: &str) -> Result<Reply> {
    let req: RecordRequest = match parse_json(body) {
        Ok(req) => req,
        Err(reply) => return Ok(reply),
    };

    c.open_recorder();
    c.recorder_select_template(&req.template_id);
    let Some(form) = c.recorder_mut() else {
        return Ok(form_failure(&FormError::NoTemplate));
    };
    if form.template_id().is_none() {
        return Ok(form_failure(&FormError::NoTemplate));
    }
    for (name, raw) in &req.values {
        if let Err(e) = form.set_value(name, raw) {
            return Ok(form_failure(&e));
        }
    }
    if let Some(measured_at) = req.measured_at.filter(|v| !v.trim().is_empty()) {
        form.measured_at = measured_at;
    }
    form.notes = req.notes;

    match c.submit_measurement() {
        Ok(created) => Reply::json(201, &created),
        Err(e) => submit_failure(&e),
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// `GET /api/dashboard?template_id=&days=` — statistic cards and chart
/// series for the selected template. Omitting `days` selects the default
/// range.
pub fn get_dashboard<T: Transport>(c: &mut PageController<T>, url: &str) -> Result<Reply> {
    let template_id = query_param(url, "template_id");
    let days = parse_days_param(url);

    let view = match c.select_dashboard(template_id.as_deref(), days) {
        Ok(view) => view,
        Err(e) => return api_failure(&e),
    };
    let range = &c.dashboard().range;
    Reply::json(
        200,
        &DashboardResponse {
            time_ranges: range.presets(),
            active_days: range.active(),
            view,
        },
    )
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// `GET /api/health` — session state and recent API activity.
pub fn get_health<T: Transport>(c: &mut PageController<T>, api_url: &str) -> Result<Reply> {
    const WINDOW_DAYS: u32 = 7;

    let log_path = c.client().activity().path().map(|p| p.to_path_buf());
    let activity = log_path.as_deref().filter(|p| p.exists()).map(|path| {
        let entries = activity::read_entries_since_days(path, Some(WINDOW_DAYS));
        ActivitySummaryResponse::new(WINDOW_DAYS, activity::summarize(&entries))
    });

    Reply::json(
        200,
        &HealthResponse {
            api_url,
            logged_in: session::guard(c.client().credentials()).is_ok(),
            username: c.user().map(|u| u.username.as_str()),
            activity_log: log_path.is_some(),
            activity,
        },
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_days_param_extracts_value() {
        assert_eq!(parse_days_param("/api/dashboard?days=7"), Some(7));
        assert_eq!(
            parse_days_param("/api/dashboard?template_id=bp&days=90"),
            Some(90)
        );
    }

    #[test]
    fn parse_days_param_returns_none_for_missing_or_invalid() {
        assert_eq!(parse_days_param("/api/dashboard"), None);
        assert_eq!(parse_days_param("/api/dashboard?days=abc"), None);
        assert_eq!(parse_days_param("/api/dashboard?days="), None);
    }

    #[test]
    fn query_param_decodes_values() {
        assert_eq!(
            query_param("/api/measurements?template_id=a%2Fb", "template_id").as_deref(),
            Some("a/b")
        );
        assert_eq!(query_param("/x?name=Blood+Pressure", "name").as_deref(), Some("Blood Pressure"));
        assert_eq!(query_param("/x?flag", "flag").as_deref(), Some(""));
        assert_eq!(query_param("/x", "flag"), None);
    }

    #[test]
    fn date_params_parse_or_reject() {
        let url = "/api/measurements?start_date=2026-04-01&end_date=";
        assert_eq!(
            parse_date_param(url, "start_date").unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 1)
        );
        assert_eq!(parse_date_param(url, "end_date").unwrap(), None);
        assert!(parse_date_param("/x?start_date=04/01/2026", "start_date").is_err());
    }

    #[test]
    fn record_request_deserializes_raw_values() {
        let json = r#"{"template_id": "bp", "values": {"systolic": "120"}, "notes": ""}"#;
        let req: RecordRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.values["systolic"], "120");
        assert!(req.measured_at.is_none());
    }

    #[test]
    fn not_authenticated_maps_to_401() {
        let reply = api_failure(&ApiError::NotAuthenticated).unwrap();
        assert_eq!(reply.status, 401);
        let reply = api_failure(&ApiError::Status {
            status: 500,
            detail: None,
        })
        .unwrap();
        assert_eq!(reply.status, 502);
        assert_eq!(reply.json_body().unwrap()["error"], "API error: 500");
    }
}
