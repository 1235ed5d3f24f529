//! Wire types shared by the API gateway and every view.
//!
//! These mirror the JSON bodies exchanged with the measurements API. Field
//! names are the API's snake_case names, so no serde renames are needed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// A named measurement unit, e.g. `mmHg` or `kg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// One scalar field a measurement of a template must supply.
///
/// `name` is unique within its template and is the join key used to match a
/// recorded [`MeasurementValue`] back to its definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDefinition {
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub unit: Unit,
    #[serde(default)]
    pub min_value: Option<f64>,
    #[serde(default)]
    pub max_value: Option<f64>,
}

/// A schema describing the set of numeric values a measurement carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub value_definitions: Vec<ValueDefinition>,
    #[serde(with = "instant")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        with = "instant::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Template {
    /// Look up a value definition by its `name`.
    pub fn definition(&self, name: &str) -> Option<&ValueDefinition> {
        self.value_definitions.iter().find(|vd| vd.name == name)
    }
}

// ---------------------------------------------------------------------------
// Measurements
// ---------------------------------------------------------------------------

/// A single recorded number, keyed by the definition it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementValue {
    pub definition_name: String,
    pub value: f64,
}

/// One occurrence of data collection against a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: String,
    pub template_id: String,
    pub values: Vec<MeasurementValue>,
    /// When the measured event happened (user supplied).
    #[serde(with = "instant")]
    pub measured_at: DateTime<Utc>,
    /// When the measurement was submitted.
    #[serde(with = "instant")]
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    pub user_id: String,
}

impl Measurement {
    /// The recorded value for `definition_name`, if present.
    pub fn value_of(&self, definition_name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|v| v.definition_name == definition_name)
            .map(|v| v.value)
    }
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Server-computed aggregate for one value definition over a window.
///
/// The API omits `avg`, `min` and `max` when `count` is zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub count: u64,
    #[serde(default)]
    pub avg: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    pub unit: String,
}

/// `GET /statistics/{template_id}` response, keyed by definition name.
pub type StatisticsReport = BTreeMap<String, Statistic>;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// The authenticated account, from `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub disabled: Option<bool>,
}

/// `POST /token` response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

// ---------------------------------------------------------------------------
// Timestamps
// ---------------------------------------------------------------------------

/// Serde adapter for API timestamps.
///
/// Writes RFC 3339. Reads RFC 3339, and also bare `YYYY-MM-DDTHH:MM:SS[.f]`
/// values, which the server emits for its UTC columns.
pub mod instant {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Parse an API timestamp. Offset-less values are read as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        raw.parse::<NaiveDateTime>().ok().map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        value.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::de::Error;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            value.serialize(s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(d)? {
                None => Ok(None),
                Some(raw) => super::parse(&raw)
                    .map(Some)
                    .ok_or_else(|| D::Error::custom(format!("invalid timestamp `{raw}`"))),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_deserializes_with_optional_fields_missing() {
        let json = r#"{
            "id": "t-1",
            "name": "Weight",
            "value_definitions": [{
                "name": "weight",
                "display_name": "Weight",
                "unit": {"name": "kg", "display_name": "kg"}
            }],
            "created_at": "2026-01-02T03:04:05Z"
        }"#;
        let template: Template = serde_json::from_str(json).unwrap();
        assert!(template.is_active);
        assert!(template.description.is_none());
        let vd = template.definition("weight").unwrap();
        assert!(vd.min_value.is_none());
        assert!(vd.unit.description.is_none());
    }

    #[test]
    fn statistic_without_observations_has_no_aggregates() {
        let json = r#"{"systolic": {"count": 0, "unit": "mmHg"}}"#;
        let report: StatisticsReport = serde_json::from_str(json).unwrap();
        let stat = &report["systolic"];
        assert_eq!(stat.count, 0);
        assert!(stat.avg.is_none());
        assert!(stat.min.is_none());
    }

    #[test]
    fn measurement_value_lookup() {
        let m = Measurement {
            id: "m".into(),
            template_id: "t".into(),
            values: vec![MeasurementValue {
                definition_name: "pulse".into(),
                value: 61.0,
            }],
            measured_at: Utc::now(),
            recorded_at: Utc::now(),
            notes: None,
            user_id: "admin".into(),
        };
        assert_eq!(m.value_of("pulse"), Some(61.0));
        assert_eq!(m.value_of("systolic"), None);
    }

    #[test]
    fn template_accepts_offsetless_timestamps() {
        let json = r#"{
            "id": "t-1",
            "name": "Weight",
            "value_definitions": [],
            "created_at": "2026-03-14T12:00:00.123456",
            "updated_at": "2026-03-15T09:00:00"
        }"#;
        let template: Template = serde_json::from_str(json).unwrap();
        assert_eq!(
            template.created_at.to_rfc3339(),
            "2026-03-14T12:00:00.123456+00:00"
        );
        assert_eq!(
            template.updated_at.map(|t| t.to_rfc3339()).as_deref(),
            Some("2026-03-15T09:00:00+00:00")
        );
    }

    #[test]
    fn measurement_accepts_offsetless_timestamps() {
        let json = r#"{
            "id": "m-1", "template_id": "t-1", "values": [],
            "measured_at": "2026-03-14T08:30:00",
            "recorded_at": "2026-03-14T08:31:02.5+01:00",
            "user_id": "admin"
        }"#;
        let m: Measurement = serde_json::from_str(json).unwrap();
        assert_eq!(m.measured_at.to_rfc3339(), "2026-03-14T08:30:00+00:00");
        assert_eq!(m.recorded_at.to_rfc3339(), "2026-03-14T07:31:02.500+00:00");
    }

    #[test]
    fn null_updated_at_and_garbage_timestamps() {
        let json = r#"{"id": "t", "name": "n", "value_definitions": [],
            "created_at": "2026-03-14T12:00:00Z", "updated_at": null}"#;
        let template: Template = serde_json::from_str(json).unwrap();
        assert!(template.updated_at.is_none());

        let bad = json.replace("2026-03-14T12:00:00Z", "yesterday");
        let err = serde_json::from_str::<Template>(&bad).unwrap_err();
        assert!(err.to_string().contains("invalid timestamp"));
    }

    #[test]
    fn timestamps_round_trip_as_rfc3339() {
        let json = r#"{"id": "t", "name": "n", "value_definitions": [],
            "created_at": "2026-03-14T12:00:00"}"#;
        let template: Template = serde_json::from_str(json).unwrap();
        let out = serde_json::to_value(&template).unwrap();
        assert_eq!(out["created_at"], "2026-03-14T12:00:00Z");
        assert!(out.get("updated_at").is_none());
    }

    #[test]
    fn token_defaults_to_bearer_type() {
        let token: Token = serde_json::from_str(r#"{"access_token": "abc"}"#).unwrap();
        assert_eq!(token.token_type, "bearer");
    }
}
