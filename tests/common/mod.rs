//! In-memory stand-in for the measurement API, shared by the integration
//! tests. Implements [`Transport`] so the real gateway, controller and web
//! handlers run unchanged on top of it.

#![allow(dead_code)]

use std::cell::RefCell;

use chrono::{DateTime, Local, NaiveDate, Utc};
use lifetrack::activity::ActivityLog;
use lifetrack::api::{ApiClient, ApiRequest, Body, Method, RawResponse, Transport, TransportError};
use lifetrack::app::PageController;
use lifetrack::dashboard::TimeRange;
use lifetrack::model::{
    Measurement, MeasurementValue, Statistic, StatisticsReport, Template, Unit, ValueDefinition,
};
use lifetrack::session::CredentialStore;
use tempfile::TempDir;

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";
pub const TOKEN: &str = "valid-token";

#[derive(Debug, Default)]
pub struct State {
    pub templates: Vec<Template>,
    pub measurements: Vec<Measurement>,
    /// Every request received, in order.
    pub requests: Vec<ApiRequest>,
    /// Reject every bearer token, as if the session expired server-side.
    pub expired: bool,
    /// Answer list reads (`GET /templates`, `GET /measurements`) with 500.
    pub failing_lists: bool,
}

#[derive(Debug, Default)]
pub struct FakeApi {
    pub state: RefCell<State>,
}

impl FakeApi {
    pub fn new(templates: Vec<Template>, measurements: Vec<Measurement>) -> Self {
        Self {
            state: RefCell::new(State {
                templates,
                measurements,
                ..State::default()
            }),
        }
    }

    pub fn expired() -> Self {
        let api = Self::default();
        api.state.borrow_mut().expired = true;
        api
    }

    /// Requests matching `method` and `path`.
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub fn posted_templates(&self) -> usize {
        self.count(Method::Post, "/templates")
    }

    pub fn posted_measurements(&self) -> usize {
        self.count(Method::Post, "/measurements")
    }
}

fn respond(status: u16, body: impl Into<String>) -> Result<RawResponse, TransportError> {
    Ok(RawResponse {
        status,
        body: body.into(),
    })
}

fn json<T: serde::Serialize>(status: u16, value: &T) -> Result<RawResponse, TransportError> {
    respond(status, serde_json::to_string(value).unwrap())
}

fn param(request: &ApiRequest, key: &str) -> Option<String> {
    request
        .query
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
}

fn instant_param(request: &ApiRequest, key: &str) -> Option<DateTime<Utc>> {
    param(request, key).map(|v| {
        DateTime::parse_from_rfc3339(&v)
            .unwrap()
            .with_timezone(&Utc)
    })
}

fn in_window(request: &ApiRequest, at: DateTime<Utc>) -> bool {
    instant_param(request, "start_date").is_none_or(|start| at >= start)
        && instant_param(request, "end_date").is_none_or(|end| at <= end)
}

fn json_body(request: &ApiRequest) -> serde_json::Value {
    match &request.body {
        Some(Body::Json(value)) => value.clone(),
        other => panic!("expected a JSON body, got {other:?}"),
    }
}

impl Transport for FakeApi {
    fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<RawResponse, TransportError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(request.clone());

        if request.path == "/token" {
            let form = match &request.body {
                Some(Body::Form(pairs)) => pairs.clone(),
                _ => Vec::new(),
            };
            let field = |k: &str| form.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
            if field("username") == Some(USERNAME) && field("password") == Some(PASSWORD) {
                return respond(200, format!(r#"{{"access_token":"{TOKEN}","token_type":"bearer"}}"#));
            }
            return respond(401, r#"{"detail":"Incorrect username or password"}"#);
        }

        if state.expired || bearer != Some(TOKEN) {
            return respond(401, r#"{"detail":"Could not validate credentials"}"#);
        }

        let segments: Vec<String> = request
            .path
            .trim_start_matches('/')
            .split('/')
            .map(|s| urlencoding::decode(s).unwrap().into_owned())
            .collect();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        if state.failing_lists
            && request.method == Method::Get
            && matches!(segments.as_slice(), ["templates"] | ["measurements"])
        {
            return respond(500, r#"{"detail":"Internal Server Error"}"#);
        }

        match (request.method, segments.as_slice()) {
            (Method::Get, ["users", "me"]) => {
                respond(200, format!(r#"{{"username":"{USERNAME}","disabled":false}}"#))
            }
            (Method::Get, ["templates"]) => json(200, &state.templates),
            (Method::Get, ["templates", id]) => match state.templates.iter().find(|t| t.id == *id) {
                Some(t) => json(200, t),
                None => respond(404, r#"{"detail":"Template not found"}"#),
            },
            (Method::Post, ["templates"]) => {
                let mut template: Template = serde_json::from_value(json_body(request)).unwrap();
                template.owner_id = Some(USERNAME.to_string());
                state.templates.push(template.clone());
                json(200, &template)
            }
            (Method::Get, ["measurements"]) => {
                let template_id = param(request, "template_id");
                let found: Vec<&Measurement> = state
                    .measurements
                    .iter()
                    .filter(|m| template_id.as_deref().is_none_or(|id| m.template_id == id))
                    .filter(|m| in_window(request, m.measured_at))
                    .collect();
                json(200, &found)
            }
            (Method::Get, ["measurements", id]) => {
                match state.measurements.iter().find(|m| m.id == *id) {
                    Some(m) => json(200, m),
                    None => respond(404, r#"{"detail":"Measurement not found"}"#),
                }
            }
            (Method::Post, ["measurements"]) => {
                let measurement: Measurement = serde_json::from_value(json_body(request)).unwrap();
                state.measurements.push(measurement.clone());
                json(200, &measurement)
            }
            (Method::Get, ["statistics", id]) => {
                let Some(template) = state.templates.iter().find(|t| t.id == *id) else {
                    return respond(404, r#"{"detail":"Template not found"}"#);
                };
                let mut report = StatisticsReport::new();
                for vd in &template.value_definitions {
                    let values: Vec<f64> = state
                        .measurements
                        .iter()
                        .filter(|m| m.template_id == template.id && in_window(request, m.measured_at))
                        .filter_map(|m| m.value_of(&vd.name))
                        .collect();
                    let count = values.len() as u64;
                    let stat = if values.is_empty() {
                        Statistic {
                            count,
                            avg: None,
                            min: None,
                            max: None,
                            unit: vd.unit.display_name.clone(),
                        }
                    } else {
                        Statistic {
                            count,
                            avg: Some(values.iter().sum::<f64>() / values.len() as f64),
                            min: values.iter().copied().reduce(f64::min),
                            max: values.iter().copied().reduce(f64::max),
                            unit: vd.unit.display_name.clone(),
                        }
                    };
                    report.insert(vd.name.clone(), stat);
                }
                json(200, &report)
            }
            _ => respond(404, r#"{"detail":"Not Found"}"#),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A controller over `api` with a credential store and activity log in a
/// temporary directory. The directory must outlive the controller.
pub fn controller(api: FakeApi, logged_in: bool) -> (TempDir, PageController<FakeApi>) {
    let dir = tempfile::tempdir().unwrap();
    let store = CredentialStore::at(dir.path().join("credentials.json"));
    if logged_in {
        store.save(TOKEN).unwrap();
    }
    let activity = ActivityLog::at(dir.path().join("activity.jsonl"));
    let client = ApiClient::new(api, store, activity);
    let controller = PageController::new(client, TimeRange::default(), Local::now().date_naive());
    (dir, controller)
}

pub fn definition(name: &str, display: &str, unit: &str) -> ValueDefinition {
    ValueDefinition {
        name: name.to_string(),
        display_name: display.to_string(),
        description: None,
        unit: Unit {
            name: unit.to_string(),
            display_name: unit.to_string(),
            description: None,
        },
        min_value: None,
        max_value: None,
    }
}

pub fn blood_pressure() -> Template {
    Template {
        id: "bp".to_string(),
        name: "Blood Pressure".to_string(),
        description: Some("Morning readings".to_string()),
        value_definitions: vec![
            definition("systolic", "Systolic", "mmHg"),
            definition("diastolic", "Diastolic", "mmHg"),
        ],
        created_at: Utc::now(),
        updated_at: None,
        is_active: true,
        owner_id: Some(USERNAME.to_string()),
    }
}

pub fn reading(id: &str, template_id: &str, at: DateTime<Utc>, values: &[(&str, f64)]) -> Measurement {
    Measurement {
        id: id.to_string(),
        template_id: template_id.to_string(),
        values: values
            .iter()
            .map(|(name, value)| MeasurementValue {
                definition_name: name.to_string(),
                value: *value,
            })
            .collect(),
        measured_at: at,
        recorded_at: at,
        notes: None,
        user_id: USERNAME.to_string(),
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
