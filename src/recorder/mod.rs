//! Measurement recorder — one numeric field per value definition of the
//! selected template.
//!
//! Selecting a template re-renders every field from scratch, so values typed
//! for a previously selected template are discarded. Each field carries the
//! definition's `min`/`max` as input constraints and is required.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::forms::{self, FormError};
use crate::model::{Measurement, MeasurementValue, Template};

/// Accepted layouts for the "measured at" input, most specific first.
const LOCAL_INPUT_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// Layout the form pre-fills "measured at" with.
const LOCAL_INPUT_DEFAULT: &str = "%Y-%m-%dT%H:%M";

/// A rendered numeric input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericField {
    /// Value definition this input feeds, i.e. the measurement value key.
    pub definition_name: String,
    /// `"<display name> (<unit display name>)"`.
    pub label: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub required: bool,
    /// Text currently in the input.
    pub raw: String,
}

impl NumericField {
    fn check(&self) -> Result<f64, FormError> {
        if self.required && self.raw.trim().is_empty() {
            return Err(FormError::Required {
                field: self.label.clone(),
            });
        }
        let value = forms::parse_number(&self.label, &self.raw)?;
        if let Some(min) = self.min
            && value < min
        {
            return Err(FormError::BelowMinimum {
                field: self.label.clone(),
                min,
            });
        }
        if let Some(max) = self.max
            && value > max
        {
            return Err(FormError::AboveMaximum {
                field: self.label.clone(),
                max,
            });
        }
        Ok(value)
    }
}

/// Editable state of the "new measurement" form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MeasurementForm {
    template_id: Option<String>,
    fields: Vec<NumericField>,
    /// Local date-time text, `YYYY-MM-DDTHH:MM`.
    pub measured_at: String,
    pub notes: String,
}

impl MeasurementForm {
    /// A blank form with "measured at" set to the current local minute.
    pub fn new() -> Self {
        Self {
            measured_at: default_measured_at(&Local, Utc::now()),
            ..Self::default()
        }
    }

    pub fn template_id(&self) -> Option<&str> {
        self.template_id.as_deref()
    }

    pub fn fields(&self) -> &[NumericField] {
        &self.fields
    }

    /// Re-render the fields for `template`; `None` clears them.
    pub fn select_template(&mut self, template: Option<&Template>) {
        self.fields.clear();
        self.template_id = template.map(|t| t.id.clone());

        let Some(template) = template else {
            return;
        };
        self.fields = template
            .value_definitions
            .iter()
            .map(|vd| NumericField {
                definition_name: vd.name.clone(),
                label: format!("{} ({})", vd.display_name, vd.unit.display_name),
                min: vd.min_value,
                max: vd.max_value,
                required: true,
                raw: String::new(),
            })
            .collect();
    }

    /// Type `raw` into the input for `definition_name`.
    pub fn set_value(&mut self, definition_name: &str, raw: &str) -> Result<(), FormError> {
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.definition_name == definition_name)
            .ok_or_else(|| FormError::UnknownField {
                field: definition_name.to_string(),
            })?;
        field.raw = raw.to_string();
        Ok(())
    }

    /// Check the template selection, every numeric input and "measured at".
    pub fn validate(&self) -> Result<(), FormError> {
        self.values()?;
        parse_local_input(&self.measured_at)?;
        Ok(())
    }

    fn values(&self) -> Result<Vec<MeasurementValue>, FormError> {
        if self.template_id.is_none() {
            return Err(FormError::NoTemplate);
        }
        self.fields
            .iter()
            .map(|f| {
                f.check().map(|value| MeasurementValue {
                    definition_name: f.definition_name.clone(),
                    value,
                })
            })
            .collect()
    }

    /// Assemble the payload in the local time zone with a fresh id.
    pub fn build(&self, user_id: &str) -> Result<Measurement, FormError> {
        self.build_with(Uuid::new_v4(), user_id, &Local, Utc::now())
    }

    /// Assemble the payload: `measured_at` is the local input interpreted in
    /// `tz`; `recorded_at` is `now`.
    pub fn build_with<Tz: TimeZone>(
        &self,
        id: Uuid,
        user_id: &str,
        tz: &Tz,
        now: DateTime<Utc>,
    ) -> Result<Measurement, FormError> {
        let values = self.values()?;
        let template_id = self.template_id.clone().ok_or(FormError::NoTemplate)?;
        let local = parse_local_input(&self.measured_at)?;
        let measured_at = to_instant(tz, local).ok_or_else(|| FormError::InvalidTimestamp {
            raw: self.measured_at.clone(),
        })?;

        Ok(Measurement {
            id: id.to_string(),
            template_id,
            values,
            measured_at,
            recorded_at: now,
            notes: forms::optional_text(&self.notes),
            user_id: user_id.to_string(),
        })
    }
}

/// Parse a `datetime-local` style input.
pub fn parse_local_input(raw: &str) -> Result<NaiveDateTime, FormError> {
    let value = raw.trim();
    LOCAL_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .ok_or_else(|| FormError::InvalidTimestamp {
            raw: raw.to_string(),
        })
}

/// The absolute instant of a wall-clock time in `tz`. Ambiguous times (DST
/// fall-back) resolve to the earlier instant; skipped times yield `None`.
pub fn to_instant<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// `now` in `tz`, formatted for the "measured at" input.
pub fn default_measured_at<Tz: TimeZone>(tz: &Tz, now: DateTime<Utc>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.with_timezone(tz).format(LOCAL_INPUT_DEFAULT).to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::model::{Unit, ValueDefinition};

    fn definition(name: &str, min: Option<f64>, max: Option<f64>) -> ValueDefinition {
        ValueDefinition {
            name: name.to_string(),
            display_name: name.to_uppercase(),
            description: None,
            unit: Unit {
                name: "mmHg".to_string(),
                display_name: "mmHg".to_string(),
                description: None,
            },
            min_value: min,
            max_value: max,
        }
    }

    fn blood_pressure() -> Template {
        Template {
            id: "bp".to_string(),
            name: "Blood Pressure".to_string(),
            description: None,
            value_definitions: vec![
                definition("systolic", Some(50.0), Some(250.0)),
                definition("diastolic", None, None),
            ],
            created_at: Utc::now(),
            updated_at: None,
            is_active: true,
            owner_id: None,
        }
    }

    fn weight() -> Template {
        Template {
            id: "w".to_string(),
            name: "Weight".to_string(),
            value_definitions: vec![definition("weight", None, None)],
            ..blood_pressure()
        }
    }

    #[test]
    fn one_required_field_per_definition_with_constraints() {
        let mut form = MeasurementForm::new();
        form.select_template(Some(&blood_pressure()));

        let fields = form.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "SYSTOLIC (mmHg)");
        assert_eq!(fields[0].min, Some(50.0));
        assert_eq!(fields[0].max, Some(250.0));
        assert!(fields.iter().all(|f| f.required));
        assert_eq!(fields[1].min, None);
    }

    #[test]
    fn switching_templates_discards_values() {
        let mut form = MeasurementForm::new();
        form.select_template(Some(&blood_pressure()));
        form.set_value("systolic", "120").unwrap();

        form.select_template(Some(&weight()));
        assert_eq!(form.fields().len(), 1);
        assert!(form.set_value("systolic", "120").is_err());

        form.select_template(Some(&blood_pressure()));
        assert!(form.fields().iter().all(|f| f.raw.is_empty()));
    }

    #[test]
    fn clearing_selection_removes_fields() {
        let mut form = MeasurementForm::new();
        form.select_template(Some(&weight()));
        form.select_template(None);
        assert!(form.fields().is_empty());
        assert_eq!(form.validate(), Err(FormError::NoTemplate));
    }

    #[test]
    fn validation_enforces_required_and_range() {
        let mut form = MeasurementForm::new();
        form.select_template(Some(&blood_pressure()));
        assert!(matches!(form.validate(), Err(FormError::Required { .. })));

        form.set_value("systolic", "300").unwrap();
        form.set_value("diastolic", "80").unwrap();
        assert!(matches!(form.validate(), Err(FormError::AboveMaximum { .. })));

        form.set_value("systolic", "40").unwrap();
        assert!(matches!(form.validate(), Err(FormError::BelowMinimum { .. })));

        form.set_value("systolic", "abc").unwrap();
        assert!(matches!(form.validate(), Err(FormError::NotANumber { .. })));

        form.set_value("systolic", "120").unwrap();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn build_converts_local_input_to_instant() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let mut form = MeasurementForm::new();
        form.select_template(Some(&blood_pressure()));
        form.set_value("systolic", "120").unwrap();
        form.set_value("diastolic", "80.5").unwrap();
        form.measured_at = "2026-05-01T08:30".to_string();
        form.notes = "  ".to_string();

        let started = Utc::now();
        let measurement = form
            .build_with(Uuid::new_v4(), "admin", &tz, Utc::now())
            .unwrap();

        assert_eq!(
            measurement.measured_at,
            Utc.with_ymd_and_hms(2026, 5, 1, 6, 30, 0).unwrap()
        );
        assert!(measurement.recorded_at >= started);
        assert_eq!(measurement.template_id, "bp");
        assert_eq!(measurement.user_id, "admin");
        assert!(measurement.notes.is_none());
        let names: Vec<&str> = measurement
            .values
            .iter()
            .map(|v| v.definition_name.as_str())
            .collect();
        assert_eq!(names, vec!["systolic", "diastolic"]);
        assert_eq!(measurement.value_of("diastolic"), Some(80.5));
    }

    #[test]
    fn malformed_measured_at_is_rejected() {
        let mut form = MeasurementForm::new();
        form.select_template(Some(&weight()));
        form.set_value("weight", "70").unwrap();
        form.measured_at = "yesterday".to_string();
        assert!(matches!(
            form.validate(),
            Err(FormError::InvalidTimestamp { .. })
        ));
    }

    #[test]
    fn default_measured_at_is_local_minute() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 3, 15, 42).unwrap();
        assert_eq!(default_measured_at(&tz, now), "2025-12-31T22:15");
        assert!(parse_local_input(&default_measured_at(&tz, now)).is_ok());
    }

    #[test]
    fn seconds_are_accepted_in_local_input() {
        let parsed = parse_local_input("2026-05-01T08:30:15").unwrap();
        assert_eq!(parsed.format("%H:%M:%S").to_string(), "08:30:15");
    }
}
