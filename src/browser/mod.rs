//! Measurement browser — date/template filters and annotated listing rows.
//!
//! Filters are calendar dates in the user's time zone. The start date maps
//! to local midnight and the end date to the last millisecond of that day, so
//! the whole end date is included.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::api::MeasurementQuery;
use crate::model::Measurement;
use crate::recorder::to_instant;
use crate::registry::TemplateRegistry;

/// Label used when a measurement's template is not in the registry.
pub const UNKNOWN_TEMPLATE: &str = "Unknown Template";

/// Default lookback of the listing filter.
pub const DEFAULT_FILTER_DAYS: i64 = 30;

/// The three independent listing filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MeasurementFilter {
    pub template_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl MeasurementFilter {
    /// `[today − 30 days, today]` across all templates.
    pub fn last_30_days(today: NaiveDate) -> Self {
        Self {
            template_id: None,
            start_date: Some(today - Duration::days(DEFAULT_FILTER_DAYS)),
            end_date: Some(today),
        }
    }

    /// Translate the calendar filters into an API query in `tz`.
    pub fn to_query<Tz: TimeZone>(&self, tz: &Tz) -> MeasurementQuery {
        MeasurementQuery {
            template_id: self.template_id.clone().filter(|id| !id.is_empty()),
            start: self.start_date.and_then(|d| start_of_day(tz, d)),
            end: self.end_date.and_then(|d| end_of_day(tz, d)),
        }
    }

    /// Whether `instant` falls inside the date filters (template ignored).
    pub fn contains<Tz: TimeZone>(&self, tz: &Tz, instant: DateTime<Utc>) -> bool {
        let query = self.to_query(tz);
        query.start.is_none_or(|start| instant >= start) && query.end.is_none_or(|end| instant <= end)
    }
}

/// Local midnight of `date`.
///
/// Where a DST change skips midnight the day starts at its first wall-clock
/// minute that exists (01:00 in America/Santiago).
pub fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = date.and_time(NaiveTime::MIN);
    (0..MINUTES_PER_DAY).find_map(|minute| to_instant(tz, midnight + Duration::minutes(minute)))
}

/// Last millisecond of `date` in `tz`: one millisecond before the next day
/// starts, normally 23:59:59.999 local.
pub fn end_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let next = date.succ_opt()?;
    start_of_day(tz, next).map(|start| start - Duration::milliseconds(1))
}

const MINUTES_PER_DAY: i64 = 24 * 60;

// ---------------------------------------------------------------------------
// Annotated rows
// ---------------------------------------------------------------------------

/// One value, labelled for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedValue {
    /// Definition display name, or the raw definition name when unknown.
    pub label: String,
    pub value: f64,
    /// Unit display name; `None` when the definition is unknown.
    pub unit: Option<String>,
}

impl AnnotatedValue {
    /// `"Systolic: 120 mmHg"`, or `"pulse: 61"` without a known unit.
    pub fn display(&self) -> String {
        match &self.unit {
            Some(unit) => format!("{}: {} {}", self.label, self.value, unit),
            None => format!("{}: {}", self.label, self.value),
        }
    }
}

/// A listing row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementRow {
    pub id: String,
    pub measured_at: DateTime<Utc>,
    pub template_name: String,
    pub values: Vec<AnnotatedValue>,
    pub notes: Option<String>,
}

/// Label a measurement with its template's metadata. Missing templates and
/// definitions degrade to placeholder and raw names.
pub fn annotate(measurement: &Measurement, registry: &TemplateRegistry) -> MeasurementRow {
    let template = registry.find(&measurement.template_id);

    let values = measurement
        .values
        .iter()
        .map(|v| {
            let definition = template.and_then(|t| t.definition(&v.definition_name));
            AnnotatedValue {
                label: definition
                    .map(|d| d.display_name.clone())
                    .unwrap_or_else(|| v.definition_name.clone()),
                value: v.value,
                unit: definition.map(|d| d.unit.display_name.clone()),
            }
        })
        .collect();

    MeasurementRow {
        id: measurement.id.clone(),
        measured_at: measurement.measured_at,
        template_name: template
            .map(|t| t.name.clone())
            .unwrap_or_else(|| UNKNOWN_TEMPLATE.to_string()),
        values,
        notes: measurement.notes.clone(),
    }
}

pub fn annotate_all(measurements: &[Measurement], registry: &TemplateRegistry) -> Vec<MeasurementRow> {
    measurements.iter().map(|m| annotate(m, registry)).collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, LocalResult, NaiveDateTime};

    use super::*;
    use crate::model::{MeasurementValue, Template, Unit, ValueDefinition};

    fn tz() -> FixedOffset {
        FixedOffset::east_opt(3600).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32, ms: u32) -> DateTime<Utc> {
        let naive = date(y, m, d).and_hms_milli_opt(h, min, s, ms).unwrap();
        to_instant(&tz(), naive).unwrap()
    }

    #[test]
    fn end_date_includes_whole_local_day() {
        let filter = MeasurementFilter {
            end_date: Some(date(2026, 4, 10)),
            ..Default::default()
        };
        assert!(filter.contains(&tz(), local(2026, 4, 10, 23, 59, 59, 999)));
        assert!(!filter.contains(&tz(), local(2026, 4, 11, 0, 0, 0, 0)));
    }

    #[test]
    fn start_date_begins_at_local_midnight() {
        let filter = MeasurementFilter {
            start_date: Some(date(2026, 4, 1)),
            ..Default::default()
        };
        assert!(filter.contains(&tz(), local(2026, 4, 1, 0, 0, 0, 0)));
        assert!(!filter.contains(&tz(), local(2026, 3, 31, 23, 59, 59, 999)));
    }

    #[test]
    fn query_uses_normalized_instants() {
        let filter = MeasurementFilter {
            template_id: Some("bp".to_string()),
            start_date: Some(date(2026, 4, 1)),
            end_date: Some(date(2026, 4, 10)),
        };
        let query = filter.to_query(&tz());
        assert_eq!(query.template_id.as_deref(), Some("bp"));
        assert_eq!(
            query.start,
            Some(Utc.with_ymd_and_hms(2026, 3, 31, 23, 0, 0).unwrap())
        );
        let end = query.end.unwrap();
        assert_eq!(
            crate::api::endpoints::iso_instant(end),
            "2026-04-10T22:59:59.999Z"
        );
    }

    /// Chile-style zone: on 2026-09-06 clocks jump from 00:00 (-04) to
    /// 01:00 (-03), so that local midnight never happens.
    #[derive(Debug, Clone, Copy)]
    struct MidnightGap;

    impl MidnightGap {
        fn switch() -> NaiveDateTime {
            date(2026, 9, 6).and_hms_opt(4, 0, 0).unwrap()
        }
        fn before() -> FixedOffset {
            FixedOffset::west_opt(4 * 3600).unwrap()
        }
        fn after() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }
    }

    impl TimeZone for MidnightGap {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            MidnightGap
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let early = *local + Duration::hours(4) < Self::switch();
            let late = *local + Duration::hours(3) >= Self::switch();
            match (early, late) {
                (true, true) => LocalResult::Ambiguous(Self::before(), Self::after()),
                (true, false) => LocalResult::Single(Self::before()),
                (false, true) => LocalResult::Single(Self::after()),
                (false, false) => LocalResult::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc >= Self::switch() {
                Self::after()
            } else {
                Self::before()
            }
        }
    }

    #[test]
    fn skipped_midnight_keeps_both_bounds() {
        let filter = MeasurementFilter {
            template_id: None,
            start_date: Some(date(2026, 9, 6)),
            end_date: Some(date(2026, 9, 6)),
        };
        let query = filter.to_query(&MidnightGap);
        // 01:00 -03, the first local minute of that day.
        assert_eq!(
            query.start,
            Some(Utc.with_ymd_and_hms(2026, 9, 6, 4, 0, 0).unwrap())
        );
        assert_eq!(
            crate::api::endpoints::iso_instant(query.end.unwrap()),
            "2026-09-07T02:59:59.999Z"
        );

        // The day before ends right where the gap starts.
        let before = end_of_day(&MidnightGap, date(2026, 9, 5)).unwrap();
        assert_eq!(
            crate::api::endpoints::iso_instant(before),
            "2026-09-06T03:59:59.999Z"
        );
    }

    #[test]
    fn blank_filters_produce_empty_query() {
        let filter = MeasurementFilter {
            template_id: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(filter.to_query(&tz()), MeasurementQuery::default());
        assert!(filter.contains(&tz(), Utc::now()));
    }

    #[test]
    fn default_filter_spans_thirty_days() {
        let filter = MeasurementFilter::last_30_days(date(2026, 4, 30));
        assert_eq!(filter.start_date, Some(date(2026, 3, 31)));
        assert_eq!(filter.end_date, Some(date(2026, 4, 30)));
        assert!(filter.template_id.is_none());
    }

    fn registry() -> TemplateRegistry {
        let mut registry = TemplateRegistry::new();
        registry.replace(vec![Template {
            id: "bp".to_string(),
            name: "Blood Pressure".to_string(),
            description: None,
            value_definitions: vec![ValueDefinition {
                name: "systolic".to_string(),
                display_name: "Systolic".to_string(),
                description: None,
                unit: Unit {
                    name: "mmHg".to_string(),
                    display_name: "mmHg".to_string(),
                    description: None,
                },
                min_value: None,
                max_value: None,
            }],
            created_at: Utc::now(),
            updated_at: None,
            is_active: true,
            owner_id: None,
        }]);
        registry
    }

    fn measurement(template_id: &str, values: &[(&str, f64)]) -> Measurement {
        Measurement {
            id: "m1".to_string(),
            template_id: template_id.to_string(),
            values: values
                .iter()
                .map(|(name, value)| MeasurementValue {
                    definition_name: name.to_string(),
                    value: *value,
                })
                .collect(),
            measured_at: Utc::now(),
            recorded_at: Utc::now(),
            notes: None,
            user_id: "admin".to_string(),
        }
    }

    #[test]
    fn known_definitions_get_display_name_and_unit() {
        let row = annotate(&measurement("bp", &[("systolic", 120.0)]), &registry());
        assert_eq!(row.template_name, "Blood Pressure");
        assert_eq!(row.values[0].display(), "Systolic: 120 mmHg");
    }

    #[test]
    fn unknown_definition_falls_back_to_raw_name() {
        let row = annotate(
            &measurement("bp", &[("systolic", 120.0), ("pulse", 61.5)]),
            &registry(),
        );
        assert_eq!(row.values[1].label, "pulse");
        assert!(row.values[1].unit.is_none());
        assert_eq!(row.values[1].display(), "pulse: 61.5");
    }

    #[test]
    fn unknown_template_uses_placeholder() {
        let row = annotate(&measurement("gone", &[("systolic", 118.0)]), &registry());
        assert_eq!(row.template_name, UNKNOWN_TEMPLATE);
        assert_eq!(row.values[0].display(), "systolic: 118");
    }
}
