//! Page controller — owns every piece of view state.
//!
//! Exactly one [`Page`] is active at a time. Navigating performs the page's
//! on-enter load. Each view keeps a [`Generation`] counter: a load takes a
//! ticket when it starts and its result is only applied if no newer load of
//! the same view started in the meantime, so a slow stale response can never
//! overwrite newer state.

use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::api::{ApiClient, ApiError, MeasurementQuery, Transport};
use crate::browser::{self, MeasurementFilter, MeasurementRow};
use crate::dashboard::{Dashboard, DashboardData, DashboardView, TimeRange};
use crate::editor::TemplateDraft;
use crate::forms::FormError;
use crate::model::{Measurement, Template, User};
use crate::recorder::MeasurementForm;
use crate::registry::TemplateRegistry;
use crate::session;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Dashboard,
    Measurements,
    Templates,
}

impl std::str::FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(Self::Dashboard),
            "measurements" => Ok(Self::Measurements),
            "templates" => Ok(Self::Templates),
            other => Err(format!("unknown page '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Generations
// ---------------------------------------------------------------------------

/// Identifies one started load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic load counter for one view.
#[derive(Debug, Default, Clone)]
pub struct Generation {
    current: u64,
}

impl Generation {
    /// Start a load, invalidating every earlier ticket.
    pub fn begin(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }
}

/// What a page shows right after it was entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageData {
    /// `None` when a newer dashboard load superseded this one.
    Dashboard { view: Option<DashboardView> },
    Measurements {
        filter: MeasurementFilter,
        rows: Vec<MeasurementRow>,
    },
    Templates { templates: Vec<Template> },
}

/// Result of completing a load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Applied(T),
    /// A newer load of the same view started; the result was discarded.
    Stale,
}

#[derive(Debug, Default, Clone)]
struct Generations {
    measurements: Generation,
    dashboard: Generation,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a form submission did not complete.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Api(#[from] ApiError),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct PageController<T: Transport> {
    client: ApiClient<T>,
    registry: TemplateRegistry,
    user: Option<User>,
    active: Page,
    filter: MeasurementFilter,
    measurements: Vec<Measurement>,
    dashboard: Dashboard,
    editor: Option<TemplateDraft>,
    recorder: Option<MeasurementForm>,
    generations: Generations,
}

impl<T: Transport> PageController<T> {
    pub fn new(client: ApiClient<T>, range: TimeRange, today: NaiveDate) -> Self {
        Self {
            client,
            registry: TemplateRegistry::new(),
            user: None,
            active: Page::default(),
            filter: MeasurementFilter::last_30_days(today),
            measurements: Vec::new(),
            dashboard: Dashboard::new(range),
            editor: None,
            recorder: None,
            generations: Generations::default(),
        }
    }

    pub fn client(&self) -> &ApiClient<T> {
        &self.client
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn active_page(&self) -> Page {
        self.active
    }

    pub fn filter(&self) -> &MeasurementFilter {
        &self.filter
    }

    pub fn dashboard(&self) -> &Dashboard {
        &self.dashboard
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Gate on the stored credential, identify the user and load templates.
    pub fn initialize(&mut self) -> Result<(), ApiError> {
        if session::guard(self.client.credentials()).is_err() {
            return Err(ApiError::NotAuthenticated);
        }
        match self.client.current_user() {
            Ok(user) => self.user = Some(user),
            Err(ApiError::NotAuthenticated) => return Err(ApiError::NotAuthenticated),
            Err(e) => tracing::warn!(error = %e, "could not load user info"),
        }
        self.registry.load(&self.client)
    }

    /// Authenticated username, fetched on first use.
    pub fn user_id(&mut self) -> Result<String, ApiError> {
        if let Some(user) = &self.user {
            return Ok(user.username.clone());
        }
        let user = self.client.current_user()?;
        let username = user.username.clone();
        self.user = Some(user);
        Ok(username)
    }

    /// Forget the credential and every cached view.
    pub fn logout(&mut self) -> Result<(), session::SessionError> {
        self.client.credentials().clear()?;
        self.user = None;
        self.registry.replace(Vec::new());
        self.measurements.clear();
        self.dashboard.select(None);
        self.dashboard.show(DashboardData::Empty, &Local);
        Ok(())
    }

    /// Switch the active page and run its on-enter load.
    pub fn navigate(&mut self, page: Page) -> Result<PageData, ApiError> {
        self.active = page;
        match page {
            Page::Dashboard => {
                let view = match self.render_dashboard()? {
                    LoadOutcome::Applied(view) => Some(view),
                    LoadOutcome::Stale => None,
                };
                Ok(PageData::Dashboard { view })
            }
            Page::Measurements => {
                self.load_measurements()?;
                Ok(PageData::Measurements {
                    filter: self.filter.clone(),
                    rows: self.measurement_rows(),
                })
            }
            Page::Templates => {
                self.registry.load(&self.client)?;
                Ok(PageData::Templates {
                    templates: self.registry.all().to_vec(),
                })
            }
        }
    }

    // -- templates ---------------------------------------------------------

    pub fn reload_templates(&mut self) -> Result<(), ApiError> {
        self.registry.load(&self.client)
    }

    /// Open the template editor on a blank draft.
    pub fn open_editor(&mut self) -> &mut TemplateDraft {
        self.editor.insert(TemplateDraft::new())
    }

    pub fn editor(&self) -> Option<&TemplateDraft> {
        self.editor.as_ref()
    }

    pub fn editor_mut(&mut self) -> Option<&mut TemplateDraft> {
        self.editor.as_mut()
    }

    pub fn close_editor(&mut self) {
        self.editor = None;
    }

    /// Validate and post. Once the server has stored the template the editor
    /// closes and the registry reloads; a failed reload is only logged, since
    /// the submission itself succeeded. On a failed post the draft stays open
    /// as typed.
    pub fn submit_template(&mut self) -> Result<Template, SubmitError> {
        let draft = self.editor.as_ref().ok_or(FormError::Required {
            field: "template editor".to_string(),
        })?;
        let template = draft.build()?;
        let created = self.client.create_template(&template)?;
        self.editor = None;
        if let Err(e) = self.registry.load(&self.client) {
            tracing::warn!(error = %e, id = %created.id, "template saved but reload failed");
        }
        Ok(created)
    }

    // -- measurements ------------------------------------------------------

    pub fn set_filter(&mut self, filter: MeasurementFilter) {
        self.filter = filter;
    }

    /// Start a listing load: returns the ticket and the query to run.
    pub fn begin_measurement_load(&mut self) -> (Ticket, MeasurementQuery) {
        let ticket = self.generations.measurements.begin();
        (ticket, self.filter.to_query(&Local))
    }

    /// Apply a listing result if `ticket` is still the latest load.
    pub fn complete_measurement_load(
        &mut self,
        ticket: Ticket,
        measurements: Vec<Measurement>,
    ) -> LoadOutcome<usize> {
        if !self.generations.measurements.is_current(ticket) {
            tracing::debug!("discarding stale measurement listing");
            return LoadOutcome::Stale;
        }
        self.measurements = measurements;
        LoadOutcome::Applied(self.measurements.len())
    }

    pub fn load_measurements(&mut self) -> Result<LoadOutcome<usize>, ApiError> {
        let (ticket, query) = self.begin_measurement_load();
        let measurements = self.client.list_measurements(&query)?;
        Ok(self.complete_measurement_load(ticket, measurements))
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    /// Listing rows annotated against the registry.
    pub fn measurement_rows(&self) -> Vec<MeasurementRow> {
        browser::annotate_all(&self.measurements, &self.registry)
    }

    /// Open the measurement form on a blank state.
    pub fn open_recorder(&mut self) -> &mut MeasurementForm {
        self.recorder.insert(MeasurementForm::new())
    }

    pub fn recorder(&self) -> Option<&MeasurementForm> {
        self.recorder.as_ref()
    }

    pub fn recorder_mut(&mut self) -> Option<&mut MeasurementForm> {
        self.recorder.as_mut()
    }

    /// Re-render the open form for `template_id` (empty clears it).
    pub fn recorder_select_template(&mut self, template_id: &str) {
        let template = self.registry.find(template_id);
        if let Some(form) = self.recorder.as_mut() {
            form.select_template(template);
        }
    }

    /// Validate and post. After a successful post the form closes even if the
    /// listing reload fails, so a retry cannot store a duplicate.
    pub fn submit_measurement(&mut self) -> Result<Measurement, SubmitError> {
        let form = self.recorder.as_ref().ok_or(FormError::NoTemplate)?;
        form.validate()?;
        let user_id = self.user_id()?;
        let measurement = self
            .recorder
            .as_ref()
            .ok_or(FormError::NoTemplate)?
            .build(&user_id)?;
        let created = self.client.create_measurement(&measurement)?;
        self.recorder = None;
        if let Err(e) = self.load_measurements() {
            tracing::warn!(error = %e, id = %created.id, "measurement saved but reload failed");
        }
        Ok(created)
    }

    // -- dashboard ---------------------------------------------------------

    pub fn select_dashboard_template(
        &mut self,
        template_id: Option<&str>,
    ) -> Result<DashboardView, ApiError> {
        self.dashboard.select(template_id);
        self.render_dashboard_applied()
    }

    /// Activate a time-range preset (`None` falls back to the default) and
    /// re-render. Unknown presets leave the selection as it was.
    pub fn select_time_range(&mut self, days: Option<u32>) -> Result<DashboardView, ApiError> {
        self.set_time_range(days);
        self.render_dashboard_applied()
    }

    /// Change template and time range together with a single re-render.
    pub fn select_dashboard(
        &mut self,
        template_id: Option<&str>,
        days: Option<u32>,
    ) -> Result<DashboardView, ApiError> {
        self.dashboard.select(template_id);
        self.set_time_range(days);
        self.render_dashboard_applied()
    }

    fn set_time_range(&mut self, days: Option<u32>) {
        match days {
            Some(days) => {
                if !self.dashboard.range.select(days) {
                    tracing::debug!(days, "ignoring unknown time range preset");
                }
            }
            None => self.dashboard.range.clear(),
        }
    }

    /// Start a dashboard load.
    pub fn begin_dashboard_load(&mut self) -> Ticket {
        self.generations.dashboard.begin()
    }

    pub fn fetch_dashboard(&self) -> Result<DashboardData, ApiError> {
        self.dashboard.fetch(&self.client, &self.registry, Utc::now())
    }

    /// Show fetched data if `ticket` is still the latest dashboard load.
    pub fn complete_dashboard_load(
        &mut self,
        ticket: Ticket,
        data: DashboardData,
    ) -> LoadOutcome<DashboardView> {
        if !self.generations.dashboard.is_current(ticket) {
            tracing::debug!("discarding stale dashboard data");
            return LoadOutcome::Stale;
        }
        LoadOutcome::Applied(self.dashboard.show(data, &Local))
    }

    pub fn render_dashboard(&mut self) -> Result<LoadOutcome<DashboardView>, ApiError> {
        let ticket = self.begin_dashboard_load();
        let data = self.fetch_dashboard()?;
        Ok(self.complete_dashboard_load(ticket, data))
    }

    fn render_dashboard_applied(&mut self) -> Result<DashboardView, ApiError> {
        match self.render_dashboard()? {
            LoadOutcome::Applied(view) => Ok(view),
            // Loads are sequential here, so nothing can overtake this one.
            LoadOutcome::Stale => Ok(DashboardView::Empty),
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
    fn newer_ticket_invalidates_older() {
        let mut generation = Generation::default();
        let first = generation.begin();
        let second = generation.begin();
        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn page_parses_from_str() {
        assert_eq!("measurements".parse::<Page>(), Ok(Page::Measurements));
        assert!("settings".parse::<Page>().is_err());
    }
}
