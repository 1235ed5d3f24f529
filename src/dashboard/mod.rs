//! Dashboard — per-template statistic cards and time-series charts.
//!
//! A render fetches statistics and raw measurements for one template over a
//! lookback window ending now, then rebuilds everything: any change of
//! template or time range is a full re-fetch, never an incremental update.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::api::{ApiClient, ApiError, DateWindow, MeasurementQuery, Transport};
use crate::model::{Measurement, StatisticsReport, Template};
use crate::registry::TemplateRegistry;

// ---------------------------------------------------------------------------
// Time range selector
// ---------------------------------------------------------------------------

/// Relative time-range selector: a set of day presets, at most one active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    presets: Vec<u32>,
    active: Option<u32>,
    default_days: u32,
}

impl TimeRange {
    pub fn new(presets: Vec<u32>, default_days: u32) -> Self {
        Self {
            presets,
            active: None,
            default_days,
        }
    }

    pub fn from_config(config: &crate::config::schema::DashboardConfig) -> Self {
        Self::new(config.time_ranges.clone(), config.default_days)
    }

    pub fn presets(&self) -> &[u32] {
        &self.presets
    }

    pub fn active(&self) -> Option<u32> {
        self.active
    }

    /// Activate the `days` preset. Unknown presets leave the selection as is.
    pub fn select(&mut self, days: u32) -> bool {
        if !self.presets.contains(&days) {
            return false;
        }
        self.active = Some(days);
        true
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Lookback in days: the active preset, else the default.
    pub fn days(&self) -> u32 {
        self.active.unwrap_or(self.default_days)
    }

    pub fn window_ending_at(&self, now: DateTime<Utc>) -> DateWindow {
        window_ending_at(now, self.days())
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::from_config(&crate::config::schema::DashboardConfig::default())
    }
}

/// `[now − days, now]`.
pub fn window_ending_at(now: DateTime<Utc>, days: u32) -> DateWindow {
    DateWindow {
        start: now - Duration::days(i64::from(days)),
        end: now,
    }
}

// ---------------------------------------------------------------------------
// Statistic cards
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub definition_name: String,
    pub title: String,
    /// Average rounded to one decimal place, e.g. `"125.0"`.
    pub average: String,
    pub unit: String,
    /// `"<min> - <max>"`.
    pub range: String,
    pub count: u64,
}

/// One card per value definition with at least one observation, in
/// definition order.
pub fn stat_cards(template: &Template, report: &StatisticsReport) -> Vec<StatCard> {
    template
        .value_definitions
        .iter()
        .filter_map(|vd| {
            let stat = report.get(&vd.name)?;
            if stat.count == 0 {
                return None;
            }
            let (avg, min, max) = (stat.avg?, stat.min?, stat.max?);
            Some(StatCard {
                definition_name: vd.name.clone(),
                title: vd.display_name.clone(),
                average: format!("{avg:.1}"),
                unit: stat.unit.clone(),
                range: format!("{min} - {max}"),
                count: stat.count,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Chart series
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub measured_at: DateTime<Utc>,
    /// Local calendar date of the point.
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub definition_name: String,
    /// `"<display name> (<unit display name>)"`.
    pub title: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }
}

/// One series per value definition, points in ascending `measured_at`
/// order. Measurements without a value for a definition are skipped for
/// that series only.
pub fn chart_series<Tz: TimeZone>(
    template: &Template,
    measurements: &[Measurement],
    tz: &Tz,
) -> Vec<ChartSeries>
where
    Tz::Offset: std::fmt::Display,
{
    let mut sorted: Vec<&Measurement> = measurements.iter().collect();
    sorted.sort_by_key(|m| m.measured_at);

    template
        .value_definitions
        .iter()
        .map(|vd| ChartSeries {
            definition_name: vd.name.clone(),
            title: format!("{} ({})", vd.display_name, vd.unit.display_name),
            points: sorted
                .iter()
                .filter_map(|m| {
                    m.value_of(&vd.name).map(|value| ChartPoint {
                        measured_at: m.measured_at,
                        label: m.measured_at.with_timezone(tz).format("%Y-%m-%d").to_string(),
                        value,
                    })
                })
                .collect(),
        })
        .collect()
}

/// Live chart instances keyed by definition name.
///
/// Installing a new set disposes every previous chart first, so a re-render
/// never leaves stale or duplicate charts behind.
#[derive(Debug, Default, Clone)]
pub struct ChartBoard {
    charts: BTreeMap<String, ChartSeries>,
}

impl ChartBoard {
    /// Dispose all current charts and install `series`. Returns how many
    /// charts were disposed.
    pub fn install(&mut self, series: Vec<ChartSeries>) -> usize {
        let disposed = self.dispose_all();
        self.charts = series
            .into_iter()
            .map(|s| (s.definition_name.clone(), s))
            .collect();
        disposed
    }

    pub fn dispose_all(&mut self) -> usize {
        let disposed = self.charts.len();
        self.charts.clear();
        disposed
    }

    pub fn get(&self, definition_name: &str) -> Option<&ChartSeries> {
        self.charts.get(definition_name)
    }

    pub fn len(&self) -> usize {
        self.charts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.charts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// What the dashboard panels show after a render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DashboardView {
    /// No template selected: statistics and chart panels are cleared.
    Empty,
    /// The selected template is not in the registry; panels are untouched.
    UnknownTemplate { template_id: String },
    Ready {
        template_id: String,
        template_name: String,
        days: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        cards: Vec<StatCard>,
        charts: Vec<ChartSeries>,
    },
}

/// Fetched inputs of one render.
#[derive(Debug, Clone)]
pub enum DashboardData {
    Empty,
    UnknownTemplate(String),
    Loaded {
        template: Template,
        days: u32,
        window: DateWindow,
        statistics: StatisticsReport,
        measurements: Vec<Measurement>,
    },
}

#[derive(Debug, Default, Clone)]
pub struct Dashboard {
    pub range: TimeRange,
    selected: Option<String>,
    cards: Vec<StatCard>,
    board: ChartBoard,
}

impl Dashboard {
    pub fn new(range: TimeRange) -> Self {
        Self {
            range,
            ..Self::default()
        }
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn cards(&self) -> &[StatCard] {
        &self.cards
    }

    pub fn board(&self) -> &ChartBoard {
        &self.board
    }

    /// Change the selected template. An empty id counts as no selection.
    pub fn select(&mut self, template_id: Option<&str>) {
        self.selected = template_id.filter(|id| !id.is_empty()).map(str::to_string);
    }

    /// Fetch everything the selected template's panels need. Nothing is
    /// changed until the data is handed to [`Dashboard::show`].
    pub fn fetch<T: Transport>(
        &self,
        client: &ApiClient<T>,
        registry: &TemplateRegistry,
        now: DateTime<Utc>,
    ) -> Result<DashboardData, ApiError> {
        let Some(template_id) = self.selected.clone() else {
            return Ok(DashboardData::Empty);
        };
        let Some(template) = registry.find(&template_id) else {
            return Ok(DashboardData::UnknownTemplate(template_id));
        };

        let days = self.range.days();
        let window = window_ending_at(now, days);
        let statistics = client.statistics(&template_id, window)?;
        let measurements =
            client.list_measurements(&MeasurementQuery::for_template(&template_id, window))?;

        Ok(DashboardData::Loaded {
            template: template.clone(),
            days,
            window,
            statistics,
            measurements,
        })
    }

    /// Rebuild the panels from fetched data.
    pub fn show<Tz: TimeZone>(&mut self, data: DashboardData, tz: &Tz) -> DashboardView
    where
        Tz::Offset: std::fmt::Display,
    {
        match data {
            DashboardData::Empty => {
                self.cards.clear();
                self.board.dispose_all();
                DashboardView::Empty
            }
            DashboardData::UnknownTemplate(template_id) => {
                DashboardView::UnknownTemplate { template_id }
            }
            DashboardData::Loaded {
                template,
                days,
                window,
                statistics,
                measurements,
            } => self.apply(&template, days, window, &statistics, &measurements, tz),
        }
    }

    /// Fetch and rebuild the panels for the selected template.
    pub fn render<T: Transport, Tz: TimeZone>(
        &mut self,
        client: &ApiClient<T>,
        registry: &TemplateRegistry,
        now: DateTime<Utc>,
        tz: &Tz,
    ) -> Result<DashboardView, ApiError>
    where
        Tz::Offset: std::fmt::Display,
    {
        let data = self.fetch(client, registry, now)?;
        Ok(self.show(data, tz))
    }

    /// Rebuild the panels from already fetched data.
    pub fn apply<Tz: TimeZone>(
        &mut self,
        template: &Template,
        days: u32,
        window: DateWindow,
        statistics: &StatisticsReport,
        measurements: &[Measurement],
        tz: &Tz,
    ) -> DashboardView
    where
        Tz::Offset: std::fmt::Display,
    {
        let cards = stat_cards(template, statistics);
        let charts = chart_series(template, measurements, tz);

        let disposed = self.board.install(charts.clone());
        tracing::debug!(template = %template.id, disposed, charts = charts.len(), "dashboard rendered");
        self.cards = cards.clone();

        DashboardView::Ready {
            template_id: template.id.clone(),
            template_name: template.name.clone(),
            days,
            start: window.start,
            end: window.end,
            cards,
            charts,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
