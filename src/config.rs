//! Probe configuration parsing, defaults, and validation.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! yields the stock run: the release server binary, the four reference
//! cities, and the invalid-location probe.
//!
//! Precedence, lowest first: built-in defaults, the TOML file, then
//! [`ConfigOverrides`] from the command line. Validation runs after each
//! layer is applied, so a bad flag is reported the same way as a bad file.
//!
//! # Example
//!
//! ```toml
//! strict = true
//!
//! [server]
//! dir = "../yr-weather-mcp"
//!
//! [timeouts]
//! response_ms = 10000
//!
//! [[cities]]
//! name = "Oslo"
//! latitude = 59.9139
//! longitude = 10.7522
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{AppError, Result};

// ── Server ───────────────────────────────────────────────────────────────────

/// How to locate and launch the server under test.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    /// Directory holding the server crate; the child process starts here.
    #[serde(default = "default_server_dir")]
    pub dir: PathBuf,
    /// Binary name looked up under `target/release/`.
    #[serde(default = "default_binary_name")]
    pub binary_name: String,
    /// Explicit command; bypasses release-binary and cargo resolution.
    #[serde(default)]
    pub command: Option<String>,
    /// Arguments for the explicit command.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            dir: default_server_dir(),
            binary_name: default_binary_name(),
            command: None,
            args: Vec::new(),
        }
    }
}

fn default_server_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_binary_name() -> String {
    "yr-weather-mcp".into()
}

// ── Timeouts ─────────────────────────────────────────────────────────────────

/// Bounded waits (milliseconds) used across a run.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TimeoutConfig {
    /// Sleep after launch before the first request; 0 disables it.
    #[serde(default = "default_startup_grace_ms")]
    pub startup_grace_ms: u64,
    /// Upper bound on the `initialize` exchange, which doubles as the
    /// readiness probe.
    #[serde(default = "default_startup_ms")]
    pub startup_ms: u64,
    /// Upper bound on every other request/response exchange.
    #[serde(default = "default_response_ms")]
    pub response_ms: u64,
    /// Time the server gets to exit after SIGTERM before it is killed.
    #[serde(default = "default_shutdown_ms")]
    pub shutdown_ms: u64,
    /// Pause after each city probe to respect the upstream API rate limit.
    #[serde(default = "default_rate_limit_pause_ms")]
    pub rate_limit_pause_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            startup_grace_ms: default_startup_grace_ms(),
            startup_ms: default_startup_ms(),
            response_ms: default_response_ms(),
            shutdown_ms: default_shutdown_ms(),
            rate_limit_pause_ms: default_rate_limit_pause_ms(),
        }
    }
}

impl TimeoutConfig {
    /// Grace period slept after launch.
    #[must_use]
    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }

    /// Bound on the first (`initialize`) exchange.
    #[must_use]
    pub fn startup(&self) -> Duration {
        Duration::from_millis(self.startup_ms)
    }

    /// Bound on ordinary exchanges.
    #[must_use]
    pub fn response(&self) -> Duration {
        Duration::from_millis(self.response_ms)
    }

    /// Bound on graceful termination.
    #[must_use]
    pub fn shutdown(&self) -> Duration {
        Duration::from_millis(self.shutdown_ms)
    }

    /// Pause between city probes.
    #[must_use]
    pub fn rate_limit_pause(&self) -> Duration {
        Duration::from_millis(self.rate_limit_pause_ms)
    }
}

fn default_startup_grace_ms() -> u64 {
    2_000
}

fn default_startup_ms() -> u64 {
    300_000
}

fn default_response_ms() -> u64 {
    30_000
}

fn default_shutdown_ms() -> u64 {
    5_000
}

fn default_rate_limit_pause_ms() -> u64 {
    1_000
}

// ── Client identity ──────────────────────────────────────────────────────────

/// Identity and protocol version announced in `initialize`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Echoed as `protocolVersion`.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Echoed as `clientInfo.name`.
    #[serde(default = "default_client_name")]
    pub name: String,
    /// Echoed as `clientInfo.version`.
    #[serde(default = "default_client_version")]
    pub version: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol_version: default_protocol_version(),
            name: default_client_name(),
            version: default_client_version(),
        }
    }
}

fn default_protocol_version() -> String {
    "0.1.0".into()
}

fn default_client_name() -> String {
    "test-client".into()
}

fn default_client_version() -> String {
    "1.0.0".into()
}

// ── Locations ────────────────────────────────────────────────────────────────

/// A named location passed to the `get_weather` tool.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CityConfig {
    /// Display name sent as `location_name`.
    pub name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl CityConfig {
    /// Build a city entry.
    #[must_use]
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

fn default_cities() -> Vec<CityConfig> {
    vec![
        CityConfig::new("Seoul", 37.5665, 126.9780),
        CityConfig::new("Tokyo", 35.6762, 139.6503),
        CityConfig::new("New York", 40.7128, -74.0060),
        CityConfig::new("London", 51.5074, -0.1278),
    ]
}

fn default_invalid_probe() -> CityConfig {
    CityConfig::new("InvalidCityName123", 37.5665, 126.9780)
}

/// Forecast window requested from the `get_weather` tool.
#[derive(Debug, Copy, Clone, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ForecastType {
    /// Conditions right now.
    Current,
    /// Next day summary.
    Tomorrow,
    /// Seven-day outlook.
    Weekly,
}

impl ForecastType {
    /// Wire value for the `forecast_type` tool argument.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Tomorrow => "tomorrow",
            Self::Weekly => "weekly",
        }
    }
}

// ── Command-line overrides ───────────────────────────────────────────────────

/// Values taken from the command line.
///
/// `None`, `false` and an empty `args` leave the file value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Replaces `server.dir`.
    pub server_dir: Option<PathBuf>,
    /// Replaces `server.command`, together with `server.args`.
    pub command: Option<String>,
    /// Arguments for `command`; rejected without it.
    pub args: Vec<String>,
    /// Turns `strict` on.
    pub strict: bool,
    /// Replaces `forecast_type`.
    pub forecast_type: Option<ForecastType>,
    /// Sets `timeouts.startup_grace_ms` to 0.
    pub no_grace: bool,
}

// ── Probe configuration ──────────────────────────────────────────────────────

/// Complete probe configuration parsed from `probe.toml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct ProbeConfig {
    /// Server location and launch command.
    #[serde(default)]
    pub server: ServerConfig,
    /// Bounded waits.
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    /// Client identity for the handshake.
    #[serde(default)]
    pub client: ClientConfig,
    /// Cities probed in order.
    #[serde(default = "default_cities")]
    pub cities: Vec<CityConfig>,
    /// Location expected to make the server answer with an error.
    #[serde(default = "default_invalid_probe")]
    pub invalid_probe: CityConfig,
    /// When set, failed weather probes also fail the run.
    #[serde(default)]
    pub strict: bool,
    /// Optional `forecast_type` argument; omitted from the call when unset.
    #[serde(default)]
    pub forecast_type: Option<ForecastType>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            timeouts: TimeoutConfig::default(),
            client: ClientConfig::default(),
            cities: default_cities(),
            invalid_probe: default_invalid_probe(),
            strict: false,
            forecast_type: None,
        }
    }
}

impl ProbeConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer command-line values over this configuration, then validate
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when `args` are given without `command`
    /// or the merged configuration fails [`Self::validate`].
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        let ConfigOverrides {
            server_dir,
            command,
            args,
            strict,
            forecast_type,
            no_grace,
        } = overrides;

        if let Some(dir) = server_dir {
            self.server.dir = dir;
        }
        if let Some(command) = command {
            self.server.command = Some(command);
            self.server.args = args;
        } else if !args.is_empty() {
            return Err(AppError::Config(
                "arguments after `--` require --command".into(),
            ));
        }
        if strict {
            self.strict = true;
        }
        if forecast_type.is_some() {
            self.forecast_type = forecast_type;
        }
        if no_grace {
            self.timeouts.startup_grace_ms = 0;
        }

        self.validate()
    }

    /// Check cross-field constraints. Called again after CLI overrides.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` describing the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.cities.is_empty() {
            return Err(AppError::Config("cities must not be empty".into()));
        }

        for city in &self.cities {
            if city.name.trim().is_empty() {
                return Err(AppError::Config("city name must not be blank".into()));
            }
            if !(-90.0..=90.0).contains(&city.latitude) {
                return Err(AppError::Config(format!(
                    "latitude for {} out of range: {}",
                    city.name, city.latitude
                )));
            }
            if !(-180.0..=180.0).contains(&city.longitude) {
                return Err(AppError::Config(format!(
                    "longitude for {} out of range: {}",
                    city.name, city.longitude
                )));
            }
        }

        // The invalid probe may use nonsense coordinates on purpose.
        if self.invalid_probe.name.trim().is_empty() {
            return Err(AppError::Config(
                "invalid_probe name must not be blank".into(),
            ));
        }

        if self.server.binary_name.trim().is_empty() {
            return Err(AppError::Config("server.binary_name must not be blank".into()));
        }

        if let Some(command) = &self.server.command {
            if command.trim().is_empty() {
                return Err(AppError::Config("server.command must not be blank".into()));
            }
        }

        let timeouts = &self.timeouts;
        for (name, value) in [
            ("startup_ms", timeouts.startup_ms),
            ("response_ms", timeouts.response_ms),
            ("shutdown_ms", timeouts.shutdown_ms),
        ] {
            if value == 0 {
                return Err(AppError::Config(format!(
                    "timeouts.{name} must be greater than zero"
                )));
            }
        }

        Ok(())
    }
}
