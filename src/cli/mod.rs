//! CLI command implementations for lifetrack.
//!
//! Provides subcommand handlers for:
//! - `lifetrack login|logout|whoami` — session management
//! - `lifetrack templates list|show|create` — template registry and editor
//! - `lifetrack measurements list|show` — measurement browser
//! - `lifetrack record` — measurement recorder
//! - `lifetrack dashboard` — statistic cards and sparklines for one template
//! - `lifetrack health` — check config, credential, API reachability
//! - `lifetrack config show|init|set|reset` — configuration management

use std::io::{BufRead, IsTerminal};
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Local, NaiveDate, Utc};
use colored::Colorize;

use crate::activity;
use crate::api::{ApiClient, ApiError, UreqTransport};
use crate::app::{PageController, SubmitError};
use crate::browser::{MeasurementFilter, MeasurementRow};
use crate::config::{self, LifetrackConfig};
use crate::dashboard::{ChartSeries, DashboardView, StatCard, TimeRange};
use crate::editor;
use crate::model::Template;
use crate::session;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// Hint appended whenever the session is missing or was rejected.
const LOGIN_HINT: &str = "not logged in (run `lifetrack login <username>`)";

fn controller(cfg: &LifetrackConfig) -> Result<PageController<UreqTransport>> {
    let client = ApiClient::from_config(cfg)?;
    Ok(PageController::new(
        client,
        TimeRange::from_config(&cfg.dashboard),
        Local::now().date_naive(),
    ))
}

/// Turn gateway errors into user-facing ones, pointing at `login` when the
/// session is gone.
fn api_error(e: ApiError) -> anyhow::Error {
    match e {
        ApiError::NotAuthenticated => anyhow!(LOGIN_HINT),
        ApiError::Status {
            status,
            detail: Some(detail),
        } => anyhow!("API error: {status} ({detail})"),
        other => other.into(),
    }
}

fn submit_error(e: SubmitError) -> anyhow::Error {
    match e {
        SubmitError::Api(e) => api_error(e),
        SubmitError::Form(e) => anyhow!("invalid input: {e}"),
    }
}

/// Initialize a controller: credential gate, user info, template registry.
fn session_controller(cfg: &LifetrackConfig) -> Result<PageController<UreqTransport>> {
    let mut controller = controller(cfg)?;
    controller.initialize().map_err(api_error)?;
    Ok(controller)
}

// ---------------------------------------------------------------------------
// lifetrack login | logout | whoami
// ---------------------------------------------------------------------------

/// Exchange username and password for a token and store it.
///
/// The password is read from the first line of stdin when not given.
pub fn run_login(cfg: &LifetrackConfig, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };

    let client = ApiClient::from_config(cfg)?;
    let token = client
        .issue_token(username, &password)
        .map_err(|e| match e {
            ApiError::Status { status: 401, .. } => anyhow!("incorrect username or password"),
            other => api_error(other),
        })?;
    client
        .credentials()
        .save(&token.access_token)
        .context("failed to store credential")?;

    println!(
        "{} Logged in as {}",
        "✓".green().bold(),
        username.bold()
    );
    Ok(())
}

fn read_password() -> Result<String> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password is required");
    }
    Ok(password)
}

/// Forget the stored credential.
pub fn run_logout(cfg: &LifetrackConfig) -> Result<()> {
    let store = session::CredentialStore::from_config(cfg)?;
    store.clear()?;
    println!("{} Logged out", "✓".green().bold());
    Ok(())
}

pub fn run_whoami(cfg: &LifetrackConfig) -> Result<()> {
    let client = ApiClient::from_config(cfg)?;
    let user = client.current_user().map_err(api_error)?;
    let status = if user.disabled.unwrap_or(false) {
        " (disabled)".red().to_string()
    } else {
        String::new()
    };
    println!("{}{}", user.username.bold(), status);
    Ok(())
}

// ---------------------------------------------------------------------------
// lifetrack templates
// ---------------------------------------------------------------------------

pub fn run_templates_list(cfg: &LifetrackConfig, format: OutputFormat) -> Result<()> {
    let controller = session_controller(cfg)?;
    let templates = controller.registry().all();

    if templates.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No templates yet. Create one with `lifetrack templates create`.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(templates)?),
        OutputFormat::Csv => print_templates_csv(templates),
        OutputFormat::Table => print_templates_table(templates),
    }
    Ok(())
}

fn print_templates_table(templates: &[Template]) {
    println!("{}", "Templates".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {:<24} {:<38} Values", "Name", "Id");
    println!("  {}", "-".repeat(70));

    for (i, t) in templates.iter().enumerate() {
        let line = format!(
            "  {:<24} {:<38} {}",
            truncate(&t.name, 24),
            t.id,
            t.value_definitions.len()
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }
}

fn print_templates_csv(templates: &[Template]) {
    println!("id,name,description,values,created_at");
    for t in templates {
        println!(
            "{},{},{},{},{}",
            csv_field(&t.id),
            csv_field(&t.name),
            csv_field(t.description.as_deref().unwrap_or("")),
            t.value_definitions.len(),
            t.created_at.to_rfc3339(),
        );
    }
}

pub fn run_templates_show(cfg: &LifetrackConfig, id: &str, format: OutputFormat) -> Result<()> {
    let client = ApiClient::from_config(cfg)?;
    let template = client.get_template(id).map_err(api_error)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&template)?);
        return Ok(());
    }

    println!("{}", template.name.bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Id:         ".bold(), template.id);
    if let Some(description) = &template.description {
        println!("  {} {}", "Description:".bold(), description);
    }
    println!(
        "  {} {}",
        "Created:    ".bold(),
        template.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    );
    println!();
    println!(
        "  {:<16} {:<20} {:<10} {:>8} {:>8}",
        "Name", "Display", "Unit", "Min", "Max"
    );
    println!("  {}", "-".repeat(66));
    for vd in &template.value_definitions {
        println!(
            "  {:<16} {:<20} {:<10} {:>8} {:>8}",
            truncate(&vd.name, 16),
            truncate(&vd.display_name, 20),
            truncate(&vd.unit.display_name, 10),
            vd.min_value.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
            vd.max_value.map(|v| v.to_string()).unwrap_or_else(|| "-".into()),
        );
    }
    Ok(())
}

/// Compose a template from `--value` specs and post it.
pub fn run_templates_create(
    cfg: &LifetrackConfig,
    name: &str,
    description: Option<&str>,
    values: &[String],
) -> Result<()> {
    let mut controller = session_controller(cfg)?;

    let draft = controller.open_editor();
    draft.name = name.to_string();
    draft.description = description.unwrap_or_default().to_string();
    for spec in values {
        draft.push_row(editor::parse_row_spec(spec).map_err(|e| anyhow!("invalid --value: {e}"))?);
    }

    let created = controller.submit_template().map_err(submit_error)?;
    println!(
        "{} Created template {} ({})",
        "✓".green().bold(),
        created.name.bold(),
        created.id.dimmed()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// lifetrack measurements
// ---------------------------------------------------------------------------

pub fn run_measurements_list(
    cfg: &LifetrackConfig,
    template: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    format: OutputFormat,
) -> Result<()> {
    let mut controller = session_controller(cfg)?;

    // Explicit dates replace the default window; omitting both keeps it.
    let mut filter = if from.is_some() || to.is_some() {
        MeasurementFilter {
            start_date: from,
            end_date: to,
            ..Default::default()
        }
    } else {
        controller.filter().clone()
    };
    filter.template_id = template.map(str::to_string);
    controller.set_filter(filter);

    controller.load_measurements().map_err(api_error)?;
    let rows = controller.measurement_rows();

    if rows.is_empty() && format == OutputFormat::Table {
        println!("{}", "No measurements in this range.".yellow());
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Csv => print_rows_csv(&rows),
        OutputFormat::Table => print_rows_table(&rows),
    }
    Ok(())
}

fn print_rows_table(rows: &[MeasurementRow]) {
    println!("{}", "Measurements".bold().cyan());
    println!("{}", "=".repeat(70));
    println!("  {:<17} {:<20} Values", "Measured at", "Template");
    println!("  {}", "-".repeat(68));

    for (i, row) in rows.iter().enumerate() {
        let values = row
            .values
            .iter()
            .map(|v| v.display())
            .collect::<Vec<_>>()
            .join(", ");
        let line = format!(
            "  {:<17} {:<20} {}",
            local_minute(row.measured_at),
            truncate(&row.template_name, 20),
            values
        );
        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
        if let Some(notes) = &row.notes {
            println!("  {:<17} {}", "", notes.italic().dimmed());
        }
    }
}

fn print_rows_csv(rows: &[MeasurementRow]) {
    println!("id,measured_at,template,values,notes");
    for row in rows {
        let values = row
            .values
            .iter()
            .map(|v| v.display())
            .collect::<Vec<_>>()
            .join("; ");
        println!(
            "{},{},{},{},{}",
            csv_field(&row.id),
            row.measured_at.to_rfc3339(),
            csv_field(&row.template_name),
            csv_field(&values),
            csv_field(row.notes.as_deref().unwrap_or("")),
        );
    }
}

pub fn run_measurements_show(cfg: &LifetrackConfig, id: &str, format: OutputFormat) -> Result<()> {
    let controller = session_controller(cfg)?;
    let measurement = controller
        .client()
        .get_measurement(id)
        .map_err(api_error)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&measurement)?);
        return Ok(());
    }

    let row = crate::browser::annotate(&measurement, controller.registry());
    println!("{}", row.template_name.bold().cyan());
    println!("{}", "=".repeat(50));
    println!("  {} {}", "Id:         ".bold(), row.id);
    println!("  {} {}", "Measured at:".bold(), local_minute(row.measured_at));
    println!(
        "  {} {}",
        "Recorded at:".bold(),
        local_minute(measurement.recorded_at)
    );
    println!("  {} {}", "User:       ".bold(), measurement.user_id);
    for value in &row.values {
        println!("    {}", value.display());
    }
    if let Some(notes) = &row.notes {
        println!("  {} {}", "Notes:      ".bold(), notes);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// lifetrack record
// ---------------------------------------------------------------------------

/// Record a measurement: `values` are `definition_name=value` pairs.
pub fn run_record(
    cfg: &LifetrackConfig,
    template_id: &str,
    at: Option<&str>,
    values: &[String],
    notes: Option<&str>,
) -> Result<()> {
    let mut controller = session_controller(cfg)?;
    if controller.registry().find(template_id).is_none() {
        bail!("unknown template '{template_id}' (see `lifetrack templates list`)");
    }

    controller.open_recorder();
    controller.recorder_select_template(template_id);

    let form = controller
        .recorder_mut()
        .ok_or_else(|| anyhow!("measurement form is not open"))?;
    for pair in values {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("invalid --value '{pair}' (expected name=value)"))?;
        form.set_value(name.trim(), raw.trim())
            .map_err(|e| anyhow!("invalid --value: {e}"))?;
    }
    if let Some(at) = at {
        form.measured_at = at.to_string();
    }
    form.notes = notes.unwrap_or_default().to_string();

    let created = controller.submit_measurement().map_err(submit_error)?;
    println!(
        "{} Recorded measurement at {} ({})",
        "✓".green().bold(),
        local_minute(created.measured_at),
        created.id.dimmed()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// lifetrack dashboard
// ---------------------------------------------------------------------------

pub fn run_dashboard(
    cfg: &LifetrackConfig,
    template_id: &str,
    days: Option<u32>,
    format: OutputFormat,
) -> Result<()> {
    let mut controller = session_controller(cfg)?;

    if let Some(days) = days
        && !controller.dashboard().range.presets().contains(&days)
    {
        bail!(
            "unsupported time range {days} (choose one of {:?})",
            controller.dashboard().range.presets()
        );
    }
    let view = controller
        .select_dashboard(Some(template_id), days)
        .map_err(api_error)?;

    match (&view, format) {
        (DashboardView::UnknownTemplate { template_id }, _) => {
            bail!("unknown template '{template_id}' (see `lifetrack templates list`)")
        }
        (DashboardView::Empty, _) => Ok(()),
        (_, OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
        (DashboardView::Ready { cards, charts, .. }, OutputFormat::Csv) => {
            print_dashboard_csv(cards, charts);
            Ok(())
        }
        (
            DashboardView::Ready {
                template_name,
                days,
                cards,
                charts,
                ..
            },
            OutputFormat::Table,
        ) => {
            print_dashboard_table(template_name, *days, cards, charts);
            Ok(())
        }
    }
}

fn print_dashboard_table(template_name: &str, days: u32, cards: &[StatCard], charts: &[ChartSeries]) {
    println!(
        "{}",
        format!("{template_name} — Last {days} Days").bold().cyan()
    );
    println!("{}", "=".repeat(60));

    if cards.is_empty() {
        println!("  {}", "No measurements in this range.".yellow());
    } else {
        println!(
            "  {:<20} {:>10} {:<8} {:>18} {:>6}",
            "Value", "Average", "Unit", "Range", "Count"
        );
        println!("  {}", "-".repeat(66));
        for card in cards {
            println!(
                "  {:<20} {:>10} {:<8} {:>18} {:>6}",
                truncate(&card.title, 20),
                card.average.bold(),
                truncate(&card.unit, 8),
                card.range,
                card.count
            );
        }
    }

    let plotted: Vec<&ChartSeries> = charts.iter().filter(|c| !c.points.is_empty()).collect();
    if !plotted.is_empty() {
        println!();
        println!("{}", "Trends".bold().cyan());
        for chart in plotted {
            println!(
                "  {:<28} {} {}",
                truncate(&chart.title, 28),
                sparkline(&chart.values()).green(),
                format!("({} points)", chart.points.len()).dimmed()
            );
        }
    }
}

fn print_dashboard_csv(cards: &[StatCard], charts: &[ChartSeries]) {
    println!("definition,average,unit,range,count");
    for card in cards {
        println!(
            "{},{},{},{},{}",
            csv_field(&card.definition_name),
            card.average,
            csv_field(&card.unit),
            csv_field(&card.range),
            card.count
        );
    }
    println!();
    println!("definition,measured_at,value");
    for chart in charts {
        for point in &chart.points {
            println!(
                "{},{},{}",
                csv_field(&chart.definition_name),
                point.measured_at.to_rfc3339(),
                point.value
            );
        }
    }
}

// ---------------------------------------------------------------------------
// lifetrack health
// ---------------------------------------------------------------------------

/// Check config, stored credential, API reachability and the activity log.
pub fn run_health(cfg: &LifetrackConfig) -> Result<()> {
    println!("{}", "lifetrack Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.lifetrack/config.toml found"
        } else {
            "not found (run `lifetrack config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".lifetrack.toml found"
        } else {
            "none (optional)"
        },
    );
    print_health_item("API base URL", true, &cfg.api.base_url);

    let client = ApiClient::from_config(cfg)?;
    let logged_in = session::guard(client.credentials()).is_ok();
    print_health_item(
        "Credential",
        logged_in,
        &if logged_in {
            format!("stored at {}", client.credentials().path().display())
        } else {
            "none (run `lifetrack login`)".to_string()
        },
    );

    if logged_in {
        let (ok, detail) = match client.current_user() {
            Ok(user) => (true, format!("reachable, logged in as {}", user.username)),
            Err(ApiError::NotAuthenticated) => {
                (false, "credential rejected, log in again".to_string())
            }
            Err(ApiError::Transport { .. }) => {
                (false, "not reachable (is the API server running?)".to_string())
            }
            Err(e) => (false, e.to_string()),
        };
        print_health_item("API", ok, &detail);
    }

    let (name, ok, detail) = activity_health(cfg.logging.activity_log, client.activity().path());
    print_health_item(name, ok, &detail);

    Ok(())
}

/// Health line for the activity log: the last week's summary, or why there
/// is none. A log turned off in config is not a failure.
fn activity_health(enabled: bool, path: Option<&Path>) -> (&'static str, bool, String) {
    if !enabled {
        return ("Activity log", true, "disabled in config".to_string());
    }
    match path.filter(|p| p.exists()) {
        Some(path) => {
            let entries = activity::read_entries_since_days(path, Some(7));
            let summary = activity::summarize(&entries);
            (
                "Activity (7 days)",
                summary.failures == 0,
                format!(
                    "{} calls, {} failed, avg {}ms",
                    format_number(summary.calls),
                    summary.failures,
                    summary.avg_latency_ms
                ),
            )
        }
        None => ("Activity log", false, "no log file yet".to_string()),
    }
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<20} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// lifetrack config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective lifetrack Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    if global_exists {
        println!("  {} {}", "✓".green(), "~/.lifetrack/config.toml".dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            "~/.lifetrack/config.toml (not found)".dimmed()
        );
    }
    if project_exists {
        println!("  {} {}", "✓".green(), ".lifetrack.toml".dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), ".lifetrack.toml (not found)".dimmed());
    }
    println!(
        "  {} {}",
        "·".dimmed(),
        "LIFETRACK_* environment variables".dimmed()
    );

    Ok(())
}

/// Initialize a default config file at `~/.lifetrack/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

fn local_minute(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Render `values` as a one-line bar chart, scaled between their min and max.
fn sparkline(values: &[f64]) -> String {
    const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                BARS[BARS.len() / 2]
            } else {
                let level = ((v - min) / span * (BARS.len() - 1) as f64).round() as usize;
                BARS[level.min(BARS.len() - 1)]
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("Blutdruck über", 10), "Blutdruck…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_sparkline_scales_between_extremes() {
        assert_eq!(sparkline(&[120.0, 130.0, 125.0]), "▁█▅");
        assert_eq!(sparkline(&[70.0, 70.0]), "▅▅");
        assert_eq!(sparkline(&[]), "");
    }

    #[test]
    fn test_activity_health_respects_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("activity.jsonl");

        let (name, ok, detail) = activity_health(false, None);
        assert_eq!(name, "Activity log");
        assert!(ok);
        assert_eq!(detail, "disabled in config");

        let (_, ok, detail) = activity_health(true, Some(path.as_path()));
        assert!(!ok);
        assert_eq!(detail, "no log file yet");

        activity::ActivityLog::at(&path).record("GET", "/templates", Some(200), 12);
        let (name, ok, detail) = activity_health(true, Some(path.as_path()));
        assert_eq!(name, "Activity (7 days)");
        assert!(ok);
        assert!(detail.starts_with("1 calls, 0 failed"), "{detail}");
    }

    #[test]
    fn test_not_authenticated_points_at_login() {
        let err = api_error(ApiError::NotAuthenticated);
        assert!(err.to_string().contains("lifetrack login"));
    }

    #[test]
    fn test_status_error_includes_detail() {
        let err = api_error(ApiError::Status {
            status: 422,
            detail: Some("name taken".to_string()),
        });
        assert_eq!(err.to_string(), "API error: 422 (name taken)");
    }
}
