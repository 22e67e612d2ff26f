// Colorful Logger - platform/config.rs
//
// Platform-specific configuration directory resolution and config.toml
// loading with startup validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::core::search::{SearchMode, SearchOptions};
use crate::core::tags::TagRegistry;
use crate::platform::serial::{self, SerialSettings};
use crate::util::constants;
use crate::util::error::{ConfigError, TagError};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Resolved platform paths for Colorful Logger configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/colorfullogger/ or %APPDATA%\ColorfulLogger\config\)
    pub config_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to current directory if platform dirs cannot be determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            tracing::debug!(config = %config_dir.display(), "Platform paths resolved");
            Self { config_dir }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
            }
        }
    }

    /// Default location of config.toml.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are silently ignored for forward compatibility.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub matcher: MatcherSection,
    pub search: SearchSection,
    pub store: StoreSection,
    pub serial: SerialSection,
    pub source: SourceSection,
    pub logging: LoggingSection,
    /// `[[tags]]` entries appended after the built-in tag table.
    pub tags: Vec<TagEntry>,
}

/// `[matcher]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct MatcherSection {
    /// Number of leading characters scanned for a tag.
    pub header_window: Option<usize>,
}

/// `[search]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SearchSection {
    pub whole_word: Option<bool>,
    pub ignore_case: Option<bool>,
}

/// `[store]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Maximum lines kept (0 = unbounded).
    pub max_lines: Option<usize>,
}

/// `[serial]` config section. Values are the labels a settings form shows.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SerialSection {
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub parity: Option<String>,
    pub stop_bits: Option<String>,
    pub data_bits: Option<u8>,
}

/// `[source]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SourceSection {
    /// Capacity of the line hand-off queue.
    pub queue_capacity: Option<usize>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: Option<String>,
}

/// One `[[tags]]` entry.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TagEntry {
    pub name: String,
    pub color: String,
}

/// Validated application configuration derived from `config.toml`.
///
/// Invalid values produce actionable warnings and fall back to defaults.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub header_window: usize,
    pub search: SearchOptions,
    /// 0 = unbounded.
    pub max_lines: usize,
    pub serial: SerialSettings,
    pub queue_capacity: usize,
    /// Logging level string (for init before tracing is available).
    pub log_level: Option<String>,
    /// User tags, already validated against the built-in table.
    pub extra_tags: Vec<(String, String)>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            header_window: constants::DEFAULT_HEADER_WINDOW,
            search: SearchOptions::default(),
            max_lines: constants::DEFAULT_MAX_LINES,
            serial: SerialSettings::default(),
            queue_capacity: constants::DEFAULT_LINE_QUEUE_CAPACITY,
            log_level: None,
            extra_tags: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Registry of the built-in tags plus the configured extras.
    pub fn tag_registry(&self) -> Result<TagRegistry, TagError> {
        TagRegistry::with_extra_tags(&self.extra_tags)
    }
}

/// Read and parse config.toml without validating values.
fn read_raw_config(config_path: &Path) -> Result<RawConfig, ConfigError> {
    let content = std::fs::read_to_string(config_path).map_err(|e| ConfigError::Io {
        path: config_path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
        path: config_path.to_path_buf(),
        source: e,
    })
}

/// Load and validate `config.toml` at `config_path`.
///
/// Returns `AppConfig` with validated values and a list of non-fatal warnings.
/// If the file does not exist, returns defaults with no warnings (first run).
/// If the file is unreadable or unparseable, returns defaults with a warning:
/// the application still starts but the user is informed.
pub fn load_config(config_path: &Path) -> (AppConfig, Vec<String>) {
    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    match read_raw_config(config_path) {
        Ok(raw) => validated(config_path, raw),
        Err(err) => {
            tracing::warn!(error = %err, "Could not load config file");
            (AppConfig::default(), vec![format!("{err}. Using defaults.")])
        }
    }
}

/// Load a config file the user named explicitly.
///
/// Unlike `load_config`, a missing, unreadable or unparseable file is an
/// error. Out-of-range values still fall back with warnings.
pub fn load_config_file(config_path: &Path) -> Result<(AppConfig, Vec<String>), ConfigError> {
    let raw = read_raw_config(config_path)?;
    Ok(validated(config_path, raw))
}

fn validated(config_path: &Path, raw: RawConfig) -> (AppConfig, Vec<String>) {
    let (config, warnings) = validate(raw);
    if warnings.is_empty() {
        tracing::info!(path = %config_path.display(), "Loaded config.toml");
    } else {
        tracing::warn!(
            path = %config_path.display(),
            count = warnings.len(),
            "Config validation produced warnings"
        );
    }
    (config, warnings)
}

fn out_of_range(field: &str, value: impl ToString, expected: impl ToString) -> String {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.to_string(),
    }
    .to_string()
        + ". Using default."
}

/// Validate a parsed config. Every field is checked independently so a
/// single bad value never discards the rest of the file.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let mut config = AppConfig::default();

    if let Some(window) = raw.matcher.header_window {
        if (1..=constants::MAX_HEADER_WINDOW).contains(&window) {
            config.header_window = window;
        } else {
            warnings.push(out_of_range(
                "matcher.header_window",
                window,
                format!("1-{}", constants::MAX_HEADER_WINDOW),
            ));
        }
    }

    if raw.search.whole_word == Some(true) {
        config.search.mode = SearchMode::WholeWord;
    }
    if let Some(ignore_case) = raw.search.ignore_case {
        config.search.ignore_case = ignore_case;
    }

    if let Some(max) = raw.store.max_lines {
        if max == 0 || (constants::MIN_MAX_LINES..=constants::ABSOLUTE_MAX_LINES).contains(&max) {
            config.max_lines = max;
        } else {
            warnings.push(out_of_range(
                "store.max_lines",
                max,
                format!(
                    "0 (unbounded) or {}-{}",
                    constants::MIN_MAX_LINES,
                    constants::ABSOLUTE_MAX_LINES
                ),
            ));
        }
    }

    // -- Serial: labels go through the same parsers as the command line --
    if let Some(port) = raw.serial.port {
        if port.trim().is_empty() {
            warnings.push(out_of_range("serial.port", "", "a device name"));
        } else {
            config.serial.port = port;
        }
    }
    if let Some(rate) = raw.serial.baud_rate {
        match serial::parse_baud_rate(&rate.to_string()) {
            Ok(rate) => config.serial.baud_rate = rate,
            Err(e) => warnings.push(format!("{e}. Using default.")),
        }
    }
    if let Some(ref parity) = raw.serial.parity {
        match serial::parse_parity(parity) {
            Ok(p) => config.serial.parity = p,
            Err(e) => warnings.push(format!("{e}. Using default.")),
        }
    }
    if let Some(ref stop_bits) = raw.serial.stop_bits {
        match serial::parse_stop_bits(stop_bits) {
            Ok(s) => config.serial.stop_bits = s,
            Err(e) => warnings.push(format!("{e}. Using default.")),
        }
    }
    if let Some(bits) = raw.serial.data_bits {
        match serial::parse_data_bits(&bits.to_string()) {
            Ok(b) => config.serial.data_bits = b,
            Err(e) => warnings.push(format!("{e}. Using default.")),
        }
    }

    if let Some(cap) = raw.source.queue_capacity {
        if (constants::MIN_LINE_QUEUE_CAPACITY..=constants::MAX_LINE_QUEUE_CAPACITY).contains(&cap)
        {
            config.queue_capacity = cap;
        } else {
            warnings.push(out_of_range(
                "source.queue_capacity",
                cap,
                format!(
                    "{}-{}",
                    constants::MIN_LINE_QUEUE_CAPACITY,
                    constants::MAX_LINE_QUEUE_CAPACITY
                ),
            ));
        }
    }

    if let Some(ref level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level.clone());
        } else {
            warnings.push(out_of_range(
                "logging.level",
                level,
                "error, warn, info, debug or trace",
            ));
        }
    }

    // -- Tags: all or nothing, so ranks never depend on which entries failed --
    if !raw.tags.is_empty() {
        let extra: Vec<(String, String)> = raw
            .tags
            .into_iter()
            .map(|t| (t.name, t.color))
            .collect();
        match TagRegistry::with_extra_tags(&extra) {
            Ok(_) => config.extra_tags = extra,
            Err(e) => warnings.push(format!(
                "[[tags]] rejected: {e}. Using the built-in tag table only."
            )),
        }
    }

    (config, warnings)
}
