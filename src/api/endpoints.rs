//! Typed wrappers for every endpoint the client consumes.

use chrono::{DateTime, SecondsFormat, Utc};

use super::{ApiClient, ApiError, ApiRequest, Body, TOKEN_ENDPOINT, Transport};
use crate::model::{Measurement, StatisticsReport, Template, Token, User};

/// A closed `[start, end]` interval of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    fn to_params(self) -> Vec<(String, String)> {
        vec![
            ("start_date".to_string(), iso_instant(self.start)),
            ("end_date".to_string(), iso_instant(self.end)),
        ]
    }
}

/// `GET /measurements` filters. Every field is independently optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeasurementQuery {
    pub template_id: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl MeasurementQuery {
    pub fn for_template(template_id: impl Into<String>, window: DateWindow) -> Self {
        Self {
            template_id: Some(template_id.into()),
            start: Some(window.start),
            end: Some(window.end),
        }
    }

    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(id) = &self.template_id {
            params.push(("template_id".to_string(), id.clone()));
        }
        if let Some(start) = self.start {
            params.push(("start_date".to_string(), iso_instant(start)));
        }
        if let Some(end) = self.end {
            params.push(("end_date".to_string(), iso_instant(end)));
        }
        params
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn id_path(prefix: &str, id: &str) -> String {
    format!("{prefix}/{}", urlencoding::encode(id))
}

fn json_body<S: serde::Serialize>(value: &S, endpoint: &str) -> Result<Body, ApiError> {
    serde_json::to_value(value)
        .map(Body::Json)
        .map_err(|source| ApiError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
}

impl<T: Transport> ApiClient<T> {
    /// `POST /token` with an OAuth2 password form.
    pub fn issue_token(&self, username: &str, password: &str) -> Result<Token, ApiError> {
        let form = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), username.to_string()),
            ("password".to_string(), password.to_string()),
        ];
        self.request(ApiRequest::post(TOKEN_ENDPOINT, Body::Form(form)))
    }

    /// `GET /users/me`.
    pub fn current_user(&self) -> Result<User, ApiError> {
        self.request(ApiRequest::get("/users/me"))
    }

    /// `GET /templates`.
    pub fn list_templates(&self) -> Result<Vec<Template>, ApiError> {
        self.request(ApiRequest::get("/templates"))
    }

    /// `GET /templates/{id}`.
    pub fn get_template(&self, id: &str) -> Result<Template, ApiError> {
        self.request(ApiRequest::get(id_path("/templates", id)))
    }

    /// `POST /templates`.
    pub fn create_template(&self, template: &Template) -> Result<Template, ApiError> {
        let body = json_body(template, "/templates")?;
        self.request(ApiRequest::post("/templates", body))
    }

    /// `GET /measurements` with optional filters.
    pub fn list_measurements(&self, query: &MeasurementQuery) -> Result<Vec<Measurement>, ApiError> {
        self.request(ApiRequest::get("/measurements").with_query(query.to_params()))
    }

    /// `GET /measurements/{id}`.
    pub fn get_measurement(&self, id: &str) -> Result<Measurement, ApiError> {
        self.request(ApiRequest::get(id_path("/measurements", id)))
    }

    /// `POST /measurements`.
    pub fn create_measurement(&self, measurement: &Measurement) -> Result<Measurement, ApiError> {
        let body = json_body(measurement, "/measurements")?;
        self.request(ApiRequest::post("/measurements", body))
    }

    /// `GET /statistics/{template_id}` over `window`.
    pub fn statistics(
        &self,
        template_id: &str,
        window: DateWindow,
    ) -> Result<StatisticsReport, ApiError> {
        self.request(ApiRequest::get(id_path("/statistics", template_id)).with_query(window.to_params()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn empty_query_has_no_params() {
        assert!(MeasurementQuery::default().to_params().is_empty());
    }

    #[test]
    fn query_params_are_independent() {
        let query = MeasurementQuery {
            template_id: None,
            start: None,
            end: Some(at(23, 59, 59)),
        };
        assert_eq!(
            query.to_params(),
            vec![("end_date".to_string(), "2026-03-14T23:59:59.000Z".to_string())]
        );
    }

    #[test]
    fn template_query_carries_window() {
        let window = DateWindow {
            start: at(0, 0, 0),
            end: at(12, 0, 0),
        };
        let params = MeasurementQuery::for_template("bp", window).to_params();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["template_id", "start_date", "end_date"]);
    }

    #[test]
    fn window_is_closed_on_both_ends() {
        let window = DateWindow {
            start: at(0, 0, 0),
            end: at(12, 0, 0),
        };
        assert!(window.contains(at(0, 0, 0)));
        assert!(window.contains(at(12, 0, 0)));
        assert!(!window.contains(at(12, 0, 1)));
    }

    #[test]
    fn ids_are_percent_encoded_in_paths() {
        assert_eq!(id_path("/templates", "a b/c"), "/templates/a%20b%2Fc");
    }
}
