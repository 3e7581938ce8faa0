//! JSON-RPC 2.0 request and response envelopes.
//!
//! Responses are validated when parsed: the `jsonrpc` tag must be `"2.0"`
//! and exactly one of `result` / `error` must be present. Call sites match
//! on [`Response`] instead of probing optional keys.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AppError, Result};

/// Protocol tag carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// Outbound JSON-RPC request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Always [`JSONRPC_VERSION`].
    pub jsonrpc: String,
    /// Correlation id assigned by the client.
    pub id: u64,
    /// Method name, e.g. `tools/call`.
    pub method: String,
    /// Parameter object; `{}` when the caller supplies none.
    pub params: Value,
}

impl Request {
    /// Build a request, substituting an empty object for missing params.
    #[must_use]
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            id,
            method: method.into(),
            params: params.unwrap_or_else(|| Value::Object(Map::new())),
        }
    }

    /// Serialise to a single compact JSON line without the trailing newline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` if serialisation fails.
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// JSON-RPC error object carried by a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    /// Numeric error code (e.g. `-32601` method not found).
    pub code: i64,
    /// Human-readable message.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Inbound JSON-RPC response, validated at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// The response carried a `result` member.
    Success {
        /// Echoed request id.
        id: u64,
        /// Method-specific result payload.
        result: Value,
    },
    /// The response carried an `error` member.
    Failure {
        /// Echoed request id; `None` when the server could not read it.
        id: Option<u64>,
        /// Error reported by the server.
        error: RpcError,
    },
}

impl Response {
    /// Parse one line read from the server.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` for invalid JSON or a shape that is not a
    /// JSON-RPC 2.0 response.
    pub fn parse_line(line: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(line)?;
        Self::from_value(value)
    }

    /// Validate an already-decoded JSON value as a response.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Protocol` if the value is not an object, has the
    /// wrong `jsonrpc` tag, a non-integer id, or not exactly one non-null
    /// `result` / `error` member.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut obj) = value else {
            return Err(AppError::Protocol("response is not a JSON object".into()));
        };

        match obj.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            Some(other) => {
                return Err(AppError::Protocol(format!(
                    "unsupported jsonrpc version: {other}"
                )));
            }
            None => return Err(AppError::Protocol("missing jsonrpc tag".into())),
        }

        let id = match obj.remove("id") {
            None | Some(Value::Null) => None,
            Some(raw) => Some(
                raw.as_u64()
                    .ok_or_else(|| AppError::Protocol(format!("unexpected response id: {raw}")))?,
            ),
        };

        // A null `error` is ignored; a null `result` yields to a present error.
        match (obj.remove("result"), obj.remove("error")) {
            (None | Some(Value::Null), Some(error)) if !error.is_null() => {
                let error: RpcError = serde_json::from_value(error)
                    .map_err(|e| AppError::Protocol(format!("malformed error object: {e}")))?;
                Ok(Self::Failure { id, error })
            }
            (Some(result), None | Some(Value::Null)) => {
                let id = id.ok_or_else(|| {
                    AppError::Protocol("success response without id".into())
                })?;
                Ok(Self::Success { id, result })
            }
            (Some(_), Some(_)) => Err(AppError::Protocol(
                "response carries both result and error".into(),
            )),
            (None, _) => Err(AppError::Protocol(
                "response carries neither result nor error".into(),
            )),
        }
    }

    /// Echoed request id, if any.
    #[must_use]
    pub fn id(&self) -> Option<u64> {
        match self {
            Self::Success { id, .. } => Some(*id),
            Self::Failure { id, .. } => *id,
        }
    }

    /// `true` when the server answered with an error object.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Borrow the result payload of a successful response.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::Failure { .. } => None,
        }
    }

    /// Borrow the error object of a failed response.
    #[must_use]
    pub fn error(&self) -> Option<&RpcError> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error, .. } => Some(error),
        }
    }

    /// Convert into the result payload, turning an error object into
    /// [`AppError::Rpc`].
    ///
    /// # Errors
    ///
    /// Returns `AppError::Rpc` for a `Failure` response.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Self::Success { result, .. } => Ok(result),
            Self::Failure { error, .. } => Err(AppError::Rpc {
                code: error.code,
                message: error.message,
            }),
        }
    }
}
