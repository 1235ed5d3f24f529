use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lifetrack::cli::{self, OutputFormat};
use lifetrack::config::{self, LifetrackConfig};
use lifetrack::web;

#[derive(Debug, Parser)]
#[command(name = "lifetrack")]
#[command(about = "Track measurements against your own templates")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Log in and store the access token
    Login {
        username: String,
        /// Password (read from stdin when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored access token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List, inspect or create templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// List or inspect measurements
    Measurements {
        #[command(subcommand)]
        action: MeasurementAction,
    },
    /// Record a measurement
    Record {
        /// Template id
        #[arg(long)]
        template: String,
        /// Value as `name=value`; repeat once per value definition
        #[arg(long = "value", value_name = "NAME=VALUE")]
        values: Vec<String>,
        /// Local time of the measurement, `YYYY-MM-DDTHH:MM` (default: now)
        #[arg(long)]
        at: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Show statistics and trends for a template
    Dashboard {
        /// Template id
        #[arg(long)]
        template: String,
        /// Lookback in days (one of the configured time ranges)
        #[arg(long)]
        days: Option<u32>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Serve the web dashboard
    Web {
        /// Address to bind (default: web.bind from config)
        #[arg(long)]
        bind: Option<String>,
        /// Do not open a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Check config, credential and API reachability
    Health,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum TemplateAction {
    /// List all templates
    List {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one template with its value definitions
    Show {
        id: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Create a template
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Value definition as `name:display:unit:unit_display[:min[:max[:unit_description]]]`
        #[arg(long = "value", value_name = "SPEC", required = true)]
        values: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
enum MeasurementAction {
    /// List measurements (default: the last 30 days)
    List {
        /// Only this template id
        #[arg(long)]
        template: Option<String>,
        /// First local date, `YYYY-MM-DD`
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last local date (inclusive), `YYYY-MM-DD`
        #[arg(long)]
        to: Option<NaiveDate>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one measurement
    Show {
        id: String,
        #[arg(long, default_value = "table")]
        format: String,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write a default config file to ~/.lifetrack/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `api.base_url`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

/// Diagnostics go to stderr: `LIFETRACK_LOG` wins over `logging.level`.
fn init_tracing(cfg: &LifetrackConfig) {
    let filter = EnvFilter::try_from_env("LIFETRACK_LOG")
        .or_else(|_| EnvFilter::try_new(&cfg.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();
    init_tracing(&cfg);

    match app.command {
        Commands::Login { username, password } => cli::run_login(&cfg, &username, password),
        Commands::Logout => cli::run_logout(&cfg),
        Commands::Whoami => cli::run_whoami(&cfg),
        Commands::Templates { action } => match action {
            TemplateAction::List { format } => {
                cli::run_templates_list(&cfg, OutputFormat::from_str_opt(Some(&format)))
            }
            TemplateAction::Show { id, format } => {
                cli::run_templates_show(&cfg, &id, OutputFormat::from_str_opt(Some(&format)))
            }
            TemplateAction::Create {
                name,
                description,
                values,
            } => cli::run_templates_create(&cfg, &name, description.as_deref(), &values),
        },
        Commands::Measurements { action } => match action {
            MeasurementAction::List {
                template,
                from,
                to,
                format,
            } => {
                let fmt = OutputFormat::from_str_opt(Some(&format));
                cli::run_measurements_list(&cfg, template.as_deref(), from, to, fmt)
            }
            MeasurementAction::Show { id, format } => {
                cli::run_measurements_show(&cfg, &id, OutputFormat::from_str_opt(Some(&format)))
            }
        },
        Commands::Record {
            template,
            values,
            at,
            notes,
        } => cli::run_record(&cfg, &template, at.as_deref(), &values, notes.as_deref()),
        Commands::Dashboard {
            template,
            days,
            format,
        } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_dashboard(&cfg, &template, days, fmt)
        }
        Commands::Web { bind, no_open } => {
            let open = cfg.web.open_browser && !no_open;
            web::serve(&cfg, bind.as_deref(), open).context("web dashboard failed")
        }
        Commands::Health => cli::run_health(&cfg),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
