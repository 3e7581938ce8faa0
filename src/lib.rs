#![forbid(unsafe_code)]

//! Integration-test driver for the YR weather MCP server.
//!
//! Launches the server over stdio, walks it through the MCP handshake,
//! lists its tools, and probes `get_weather` for a set of cities plus one
//! location it should reject.

pub mod config;
pub mod errors;
pub mod protocol;
pub mod runner;
pub mod suite;
pub mod transport;

pub use config::ProbeConfig;
pub use errors::{AppError, Result};
