/// Configuration system for lifetrack.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults** — [`schema::LifetrackConfig::default()`]
/// 2. **User global config** — `~/.lifetrack/config.toml`
/// 3. **Project local config** — `.lifetrack.toml` in the current directory
/// 4. **Environment variables** — `LIFETRACK_*` overrides (highest precedence)
///
/// File layers are merged key by key, so a project file that only sets
/// `api.base_url` keeps everything else from the global file.
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::LifetrackConfig;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Merges defaults → global TOML → project TOML → env vars. Malformed files
/// are skipped with a warning rather than aborting the command.
pub fn load() -> LifetrackConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut config);
    config
}

/// Merge the given TOML files, in order, on top of the defaults.
pub fn load_layers<'a>(paths: impl IntoIterator<Item = &'a Path>) -> LifetrackConfig {
    let mut merged = toml::Value::Table(toml::map::Map::new());

    for path in paths {
        let Ok(content) = fs::read_to_string(path) else {
            continue;
        };
        match toml::from_str::<toml::Value>(&content) {
            Ok(layer) => merge_values(&mut merged, layer),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "ignoring malformed config"),
        }
    }

    merged.try_into().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config layers do not match schema, using defaults");
        LifetrackConfig::default()
    })
}

/// Recursively overlay `overlay` onto `base`. Tables merge, everything else
/// replaces.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.lifetrack/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lifetrack").join("config.toml"))
}

/// Path to the project local config: `.lifetrack.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".lifetrack.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `LIFETRACK_API_URL` — API base URL
/// - `LIFETRACK_API_TIMEOUT_MS` — request timeout
/// - `LIFETRACK_CREDENTIALS` — credential file path
/// - `LIFETRACK_DEFAULT_DAYS` — dashboard lookback without a preset
/// - `LIFETRACK_WEB_BIND` — local dashboard address
/// - `LIFETRACK_ACTIVITY_LOG` — activity log on/off
fn apply_env_overrides(config: &mut LifetrackConfig) {
    if let Ok(val) = std::env::var("LIFETRACK_API_URL")
        && !val.is_empty()
    {
        config.api.base_url = val;
    }
    if let Ok(val) = std::env::var("LIFETRACK_API_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.api.timeout_ms = ms;
    }
    if let Ok(val) = std::env::var("LIFETRACK_CREDENTIALS")
        && !val.is_empty()
    {
        config.session.credentials_file = val;
    }
    if let Ok(val) = std::env::var("LIFETRACK_DEFAULT_DAYS")
        && let Ok(days) = val.parse::<u32>()
        && days > 0
    {
        config.dashboard.default_days = days;
    }
    if let Ok(val) = std::env::var("LIFETRACK_WEB_BIND")
        && !val.is_empty()
    {
        config.web.bind = val;
    }
    if let Ok(val) = std::env::var("LIFETRACK_ACTIVITY_LOG") {
        config.logging.activity_log = is_truthy(&val);
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.lifetrack/config.toml`.
///
/// Fails if the file already exists unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;
    write_default_config(&path, force)?;
    Ok(path)
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    fs::write(path, LifetrackConfig::default_toml()).context("failed to write config file")
}

/// Set a single dotted key (e.g. `api.base_url`) in the global config file.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;
    set_config_value_at(&path, key, value)
}

/// Set a dotted key in the config file at `path`, creating it from defaults
/// when missing.
pub fn set_config_value_at(path: &Path, key: &str, value: &str) -> Result<()> {
    let content = if path.exists() {
        fs::read_to_string(path).context("failed to read config file")?
    } else {
        toml::to_string_pretty(&LifetrackConfig::default())
            .context("failed to serialize default config")?
    };

    let mut root: toml::Value =
        toml::from_str(&content).context("failed to parse config as TOML value")?;
    set_toml_value(&mut root, key, value)?;

    // Reject values the schema cannot hold before touching the file.
    let _: LifetrackConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(path, output).context("failed to write config file")
}

/// Set a value in a TOML tree using a dotted key path, parsing the raw string
/// according to the type already stored at that key.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<()> {
    let (section_path, leaf) = match key.rsplit_once('.') {
        Some((sections, leaf)) => (Some(sections), leaf),
        None => (None, key),
    };
    if leaf.is_empty() {
        anyhow::bail!("empty config key");
    }

    let mut current = root;
    for part in section_path.into_iter().flat_map(|s| s.split('.')) {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected table at '{}'", section_path.unwrap_or("")))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Array(_)) => {
            // Day presets are the only arrays; parse as comma-separated integers.
            let items = raw_value
                .split(',')
                .map(|s| {
                    s.trim()
                        .parse::<i64>()
                        .map(toml::Value::Integer)
                        .with_context(|| format!("expected integers for '{key}', got '{s}'"))
                })
                .collect::<Result<Vec<_>>>()?;
            toml::Value::Array(items)
        }
        Some(_) => toml::Value::String(raw_value.to_string()),
        None => anyhow::bail!("unknown config key '{key}'"),
    };

    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Reset the global config to defaults (overwrite the file).
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    toml::to_string_pretty(&load()).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
