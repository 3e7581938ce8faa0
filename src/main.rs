#![forbid(unsafe_code)]

//! `yr-weather-probe`: integration test run against the YR weather MCP server.
//!
//! Bootstraps configuration, launches the server over stdio, runs the probe
//! suite, prints the report, and exits 0 on success or 1 on failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use yr_weather_probe::config::{ConfigOverrides, ForecastType};
use yr_weather_probe::suite::SuiteReport;
use yr_weather_probe::{runner, AppError, ProbeConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "yr-weather-probe",
    about = "YR weather MCP server test suite",
    version,
    long_about = None
)]
struct Cli {
    /// Path to a TOML configuration file; built-in defaults apply without one.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the server crate.
    #[arg(long)]
    server_dir: Option<PathBuf>,

    /// Explicit server command; arguments follow `--`.
    #[arg(long)]
    command: Option<String>,

    /// Arguments for `--command`.
    #[arg(last = true)]
    args: Vec<String>,

    /// Fail the run when any weather probe fails.
    #[arg(long)]
    strict: bool,

    /// Forecast window requested from `get_weather`.
    #[arg(long, value_enum)]
    forecast_type: Option<ForecastType>,

    /// Skip the start-up grace sleep.
    #[arg(long)]
    no_grace: bool,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

const BANNER: &str = r"
+------------------------------------------+
|     YR Weather MCP Server Test Suite     |
+------------------------------------------+
";

fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("yr-weather-probe: {err}");
        return ExitCode::FAILURE;
    }

    println!("{BANNER}");

    match execute(args) {
        Ok(report) => {
            print!("{report}");
            if report.passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!(%err, "probe run failed");
            println!("Test failed with error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Cli) -> Result<SuiteReport> {
    let config = load_config(args)?;
    info!(
        cities = config.cities.len(),
        strict = config.strict,
        "configuration loaded"
    );

    // Requests are strictly sequential; one thread is enough.
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(runner::run(&config))
}

fn load_config(args: Cli) -> Result<ProbeConfig> {
    let mut config = match &args.config {
        Some(path) => ProbeConfig::load_from_path(path)?,
        None => ProbeConfig::default(),
    };

    config.apply_overrides(ConfigOverrides {
        server_dir: args.server_dir,
        command: args.command,
        args: args.args,
        strict: args.strict,
        forecast_type: args.forecast_type,
        no_grace: args.no_grace,
    })?;
    Ok(config)
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // stdout carries the report; logs go to stderr.
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
