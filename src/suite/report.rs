//! Per-step outcomes and the overall verdict of a probe run.

use std::fmt::{Display, Formatter};

use crate::protocol::Response;

/// Which scenario step an outcome belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepKind {
    /// `initialize` handshake request.
    Initialize,
    /// `initialized` follow-up.
    Initialized,
    /// `tools/list` discovery.
    ToolsList,
    /// `get_weather` for a real city.
    Weather {
        /// Location name sent to the tool.
        city: String,
    },
    /// `get_weather` for a location that should be rejected.
    InvalidLocation {
        /// Location name sent to the tool.
        location: String,
    },
}

impl StepKind {
    /// JSON-RPC method the step sends.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "initialized",
            Self::ToolsList => "tools/list",
            Self::Weather { .. } | Self::InvalidLocation { .. } => "tools/call",
        }
    }

    /// `true` for the three steps that gate the verdict.
    #[must_use]
    pub fn is_handshake(&self) -> bool {
        matches!(self, Self::Initialize | Self::Initialized | Self::ToolsList)
    }
}

impl Display for StepKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initialize => f.write_str("initialize"),
            Self::Initialized => f.write_str("initialized"),
            Self::ToolsList => f.write_str("tools/list"),
            Self::Weather { city } => write!(f, "get_weather {city}"),
            Self::InvalidLocation { location } => write!(f, "invalid location {location}"),
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step behaved as expected.
    Passed,
    /// The step failed; the reason is shown to the operator.
    Failed(String),
    /// Unexpected but tolerated behaviour.
    Warned(String),
}

impl StepStatus {
    /// Status of an ordinary step: any response without an error passes.
    #[must_use]
    pub fn expect_success(response: Option<&Response>) -> Self {
        match response {
            None => Self::Failed("no response".into()),
            Some(Response::Failure { error, .. }) => {
                Self::Failed(format!("error {}: {}", error.code, error.message))
            }
            Some(Response::Success { .. }) => Self::Passed,
        }
    }

    /// Status of the invalid-location step: an error response passes.
    #[must_use]
    pub fn expect_error(response: Option<&Response>) -> Self {
        match response {
            None => Self::Warned("no response".into()),
            Some(Response::Failure { .. }) => Self::Passed,
            Some(Response::Success { .. }) => {
                Self::Warned("invalid location should return an error".into())
            }
        }
    }

    /// `true` for [`StepStatus::Passed`].
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Step identity.
    pub kind: StepKind,
    /// Id the request carried.
    pub request_id: u64,
    /// Verdict for the step.
    pub status: StepStatus,
    /// Text worth showing (weather report, error message).
    pub detail: Option<String>,
}

/// Everything a run observed, plus the verdict policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    steps: Vec<StepOutcome>,
    tools: Vec<String>,
    strict: bool,
    aborted: bool,
    fault: Option<String>,
    termination: Option<String>,
}

impl SuiteReport {
    /// Empty report. With `strict`, weather probes count toward the verdict.
    #[must_use]
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            ..Self::default()
        }
    }

    /// Append a step outcome. A failed handshake step marks the run aborted.
    pub fn record(&mut self, outcome: StepOutcome) {
        if outcome.kind.is_handshake() && !outcome.status.is_passed() {
            self.aborted = true;
        }
        self.steps.push(outcome);
    }

    /// Remember the tools advertised by `tools/list`.
    pub fn set_tools(&mut self, tools: Vec<String>) {
        self.tools = tools;
    }

    /// Record an error that stopped the sequence.
    pub fn record_fault(&mut self, fault: impl Into<String>) {
        self.fault = Some(fault.into());
    }

    /// Record how the server process ended.
    pub fn set_termination(&mut self, termination: impl Into<String>) {
        self.termination = Some(termination.into());
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[StepOutcome] {
        &self.steps
    }

    /// Tools advertised by the server.
    #[must_use]
    pub fn tools(&self) -> &[String] {
        &self.tools
    }

    /// Fault that stopped the sequence, if any.
    #[must_use]
    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// How the server process ended, once cleanup ran.
    #[must_use]
    pub fn termination(&self) -> Option<&str> {
        self.termination.as_deref()
    }

    /// `true` when a handshake step failed and the probes were skipped.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// `true` when all three handshake steps passed.
    #[must_use]
    pub fn handshake_passed(&self) -> bool {
        [StepKind::Initialize, StepKind::Initialized, StepKind::ToolsList]
            .iter()
            .all(|kind| {
                self.steps
                    .iter()
                    .any(|s| &s.kind == kind && s.status.is_passed())
            })
    }

    /// `true` when every weather and invalid-location step passed.
    #[must_use]
    pub fn probes_passed(&self) -> bool {
        self.steps
            .iter()
            .filter(|s| !s.kind.is_handshake())
            .all(|s| s.status.is_passed())
    }

    /// Overall verdict.
    ///
    /// Without `strict`, only the handshake decides; weather probes are
    /// observational.
    #[must_use]
    pub fn passed(&self) -> bool {
        if self.fault.is_some() || self.aborted || !self.handshake_passed() {
            return false;
        }
        !self.strict || self.probes_passed()
    }
}

const RULE: &str = "==================================================";
const THIN_RULE: &str = "----------------------------------------";

impl Display for SuiteReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for step in &self.steps {
            let (tag, reason) = match &step.status {
                StepStatus::Passed => ("PASS", None),
                StepStatus::Failed(reason) => ("FAIL", Some(reason)),
                StepStatus::Warned(reason) => ("WARN", Some(reason)),
            };
            match reason {
                Some(reason) => writeln!(
                    f,
                    "[{tag}] {} (id {}): {reason}",
                    step.kind, step.request_id
                )?,
                None => writeln!(f, "[{tag}] {} (id {})", step.kind, step.request_id)?,
            }

            if step.kind == StepKind::ToolsList && !self.tools.is_empty() {
                writeln!(f, "       tools: {}", self.tools.join(", "))?;
            }

            if let (StepKind::Weather { .. }, Some(text)) = (&step.kind, &step.detail) {
                writeln!(f, "{THIN_RULE}")?;
                writeln!(f, "{}", text.trim_end())?;
                writeln!(f, "{THIN_RULE}")?;
            }
        }

        if let Some(fault) = &self.fault {
            writeln!(f, "Test failed with error: {fault}")?;
        }
        if let Some(termination) = &self.termination {
            writeln!(f, "Server {termination}")?;
        }

        writeln!(f, "{RULE}")?;
        if self.passed() {
            writeln!(f, "All tests completed successfully!")?;
        } else {
            writeln!(f, "Test run failed")?;
        }
        writeln!(f, "{RULE}")
    }
}
