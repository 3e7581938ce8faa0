//! Error types shared across the probe.

use std::fmt::{Display, Formatter};

/// Shared probe result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Probe error enumeration covering every failure mode of a run.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing or validation failure.
    Config(String),
    /// Server process could not be launched or its pipes captured.
    Spawn(String),
    /// Read, write, or wait failure on the server's stdio.
    Io(String),
    /// Malformed or unexpected JSON-RPC traffic from the server.
    Protocol(String),
    /// A bounded wait elapsed before the server answered.
    Timeout(String),
    /// The server answered with a JSON-RPC error object.
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Human-readable error message reported by the server.
        message: String,
    },
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Spawn(msg) => write!(f, "spawn: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Rpc { code, message } => write!(f, "rpc: {message} (code {code})"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("malformed json: {err}"))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
