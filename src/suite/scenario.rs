//! The fixed probe sequence run against the server.
//!
//! 1. `initialize` (bounded by the startup timeout, so it doubles as the
//!    readiness probe);
//! 2. `initialized`;
//! 3. `tools/list`;
//! 4. `get_weather` for each configured city, pausing between calls;
//! 5. `get_weather` for a location the server should reject.
//!
//! Steps 1–3 abort the run on failure. Steps 4–5 are recorded and the run
//! continues. Channel faults (I/O, malformed replies, timeouts) stop the
//! sequence wherever they happen, because the stream can no longer be
//! trusted to stay in step.

use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{error, info, info_span, warn, Instrument};

use crate::config::{CityConfig, ProbeConfig};
use crate::protocol::tool::GET_WEATHER_TOOL;
use crate::protocol::{CallToolParams, CallToolResult, InitializeParams, Response, ToolList};
use crate::suite::report::{StepKind, StepOutcome, StepStatus, SuiteReport};
use crate::transport::RpcClient;
use crate::{AppError, Result};

/// Runs the probe sequence described by a [`ProbeConfig`].
#[derive(Debug, Clone, Copy)]
pub struct ProbeSuite<'a> {
    config: &'a ProbeConfig,
}

impl<'a> ProbeSuite<'a> {
    /// Suite bound to `config`.
    #[must_use]
    pub fn new(config: &'a ProbeConfig) -> Self {
        Self { config }
    }

    /// Run every step and return the report. Never fails: a fault is
    /// recorded in the report and turns the verdict into a failure.
    pub async fn run<W, R>(&self, client: &mut RpcClient<W, R>) -> SuiteReport
    where
        W: AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
    {
        let mut report = SuiteReport::new(self.config.strict);

        let outcome = self
            .run_steps(client, &mut report)
            .instrument(info_span!("probe_suite"))
            .await;

        if let Err(err) = outcome {
            error!(%err, "probe run stopped by fault");
            report.record_fault(err.to_string());
        }

        report
    }

    async fn run_steps<W, R>(
        &self,
        client: &mut RpcClient<W, R>,
        report: &mut SuiteReport,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
    {
        let timeouts = &self.config.timeouts;

        // 1. initialize
        let id = client.next_id();
        let response = client
            .call(
                "initialize",
                &InitializeParams::from_config(&self.config.client),
                timeouts.startup(),
            )
            .await?;
        if !record_handshake(report, StepKind::Initialize, id, response.as_ref()) {
            return Ok(());
        }

        // 2. initialized
        let id = client.next_id();
        let response = client.send_request("initialized", Some(empty_object())).await?;
        if !record_handshake(report, StepKind::Initialized, id, response.as_ref()) {
            return Ok(());
        }

        // 3. tools/list
        let id = client.next_id();
        let response = client.send_request("tools/list", Some(empty_object())).await?;
        if let Some(result) = response.as_ref().and_then(Response::result) {
            let tools = ToolList::from_result(result);
            if !tools.contains(GET_WEATHER_TOOL) {
                warn!(tools = ?tools.names(), "server does not advertise {GET_WEATHER_TOOL}");
            }
            report.set_tools(tools.names());
        }
        if !record_handshake(report, StepKind::ToolsList, id, response.as_ref()) {
            return Ok(());
        }

        // 4. weather per city
        for city in &self.config.cities {
            let id = client.next_id();
            let response = self.get_weather(client, city).await?;
            let status = StepStatus::expect_success(response.as_ref());
            let detail = match response.map(Response::into_result) {
                Some(Ok(result)) => {
                    info!(city = %city.name, "weather request succeeded");
                    weather_text(&result)
                }
                Some(Err(err)) => {
                    warn!(city = %city.name, %err, "weather request failed");
                    None
                }
                None => {
                    warn!(city = %city.name, "weather request got no response");
                    None
                }
            };
            report.record(StepOutcome {
                kind: StepKind::Weather {
                    city: city.name.clone(),
                },
                request_id: id,
                status,
                detail,
            });

            let pause = timeouts.rate_limit_pause();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        // 5. invalid location
        let probe = &self.config.invalid_probe;
        let id = client.next_id();
        let response = self.get_weather(client, probe).await?;
        let status = StepStatus::expect_error(response.as_ref());
        let detail = match response.map(Response::into_result) {
            Some(Err(AppError::Rpc { code, message })) => {
                info!(location = %probe.name, code, "invalid location handled correctly");
                Some(message)
            }
            _ => {
                warn!(location = %probe.name, ?status, "invalid location should return an error");
                None
            }
        };
        report.record(StepOutcome {
            kind: StepKind::InvalidLocation {
                location: probe.name.clone(),
            },
            request_id: id,
            status,
            detail,
        });

        Ok(())
    }

    /// `tools/call` of `get_weather` for `city`.
    async fn get_weather<W, R>(
        &self,
        client: &mut RpcClient<W, R>,
        city: &CityConfig,
    ) -> Result<Option<Response>>
    where
        W: AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
    {
        let params = CallToolParams::get_weather(city, self.config.forecast_type);
        client
            .call("tools/call", &params, self.config.timeouts.response())
            .await
    }
}

/// Record a handshake step; returns `false` when the run must stop.
fn record_handshake(
    report: &mut SuiteReport,
    kind: StepKind,
    request_id: u64,
    response: Option<&Response>,
) -> bool {
    let status = StepStatus::expect_success(response);
    let passed = status.is_passed();
    if !passed {
        error!(step = %kind, ?status, "handshake step failed");
    }
    report.record(StepOutcome {
        kind,
        request_id,
        status,
        detail: None,
    });
    passed
}

/// First text block of a successful `tools/call` result.
fn weather_text(result: &Value) -> Option<String> {
    let result = CallToolResult::from_result(result);
    if result.is_error {
        warn!("tool result flagged isError");
    }
    result.first_text().map(str::to_owned)
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}
