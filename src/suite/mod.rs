//! Probe scenarios and their reporting.

pub mod report;
pub mod scenario;

pub use report::{StepKind, StepOutcome, StepStatus, SuiteReport};
pub use scenario::ProbeSuite;
