//! Synchronous-style JSON-RPC client over a pair of byte streams.
//!
//! Each call writes one request line, flushes, and reads exactly one
//! response line before returning; nothing is pipelined. Request ids come
//! from a per-client counter starting at 1, so every response can be
//! checked against the request it answers.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{ChildStdin, ChildStdout};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::protocol::{Request, Response};
use crate::transport::codec::ProbeCodec;
use crate::{AppError, Result};

/// Client bound to a spawned server's stdio.
pub type ServerClient = RpcClient<ChildStdin, ChildStdout>;

/// Line-oriented JSON-RPC client.
#[derive(Debug)]
pub struct RpcClient<W, R> {
    writer: FramedWrite<W, ProbeCodec>,
    reader: FramedRead<R, ProbeCodec>,
    next_id: u64,
    timeout: Duration,
    methods_sent: Vec<String>,
}

impl<W, R> RpcClient<W, R>
where
    W: AsyncWrite + Unpin,
    R: AsyncRead + Unpin,
{
    /// Wrap `writer` (server stdin) and `reader` (server stdout).
    ///
    /// `timeout` bounds each exchange made through [`Self::send_request`].
    #[must_use]
    pub fn new(writer: W, reader: R, timeout: Duration) -> Self {
        Self {
            writer: FramedWrite::new(writer, ProbeCodec::new()),
            reader: FramedRead::new(reader, ProbeCodec::new()),
            next_id: 1,
            timeout,
            methods_sent: Vec::new(),
        }
    }

    /// Id the next request will carry.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Methods written so far, in order.
    #[must_use]
    pub fn methods_sent(&self) -> &[String] {
        &self.methods_sent
    }

    /// Send a request and wait for its response within the default timeout.
    ///
    /// Returns `Ok(None)` when the server closed its stdout or answered with
    /// an empty line.
    ///
    /// # Errors
    ///
    /// - `AppError::Io`: writing the request or reading the reply failed.
    /// - `AppError::Protocol`: the reply is not a valid response, or its id
    ///   does not match the request.
    /// - `AppError::Timeout`: no line arrived in time.
    pub async fn send_request(
        &mut self,
        method: &str,
        params: Option<Value>,
    ) -> Result<Option<Response>> {
        let limit = self.timeout;
        self.send_request_within(method, params, limit).await
    }

    /// Serialise typed `params` and send them as `method`.
    ///
    /// # Errors
    ///
    /// As [`Self::send_request_within`], plus `AppError::Protocol` if
    /// `params` cannot be serialised.
    pub async fn call<P: Serialize>(
        &mut self,
        method: &str,
        params: &P,
        limit: Duration,
    ) -> Result<Option<Response>> {
        let params = serde_json::to_value(params)?;
        self.send_request_within(method, Some(params), limit).await
    }

    /// Send a request and wait at most `limit` for its response.
    ///
    /// # Errors
    ///
    /// See [`Self::send_request`].
    pub async fn send_request_within(
        &mut self,
        method: &str,
        params: Option<Value>,
        limit: Duration,
    ) -> Result<Option<Response>> {
        let id = self.next_id;
        self.next_id += 1;

        let line = Request::new(id, method, params).to_line()?;
        info!(method, id, "sending request");
        debug!(method, id, raw = %line, "request line");

        // `send` flushes, so the server sees the line immediately.
        self.writer.send(line).await.map_err(|err| {
            warn!(method, id, %err, "write to server stdin failed");
            err
        })?;
        self.methods_sent.push(method.to_owned());

        let next = tokio::time::timeout(limit, self.reader.next())
            .await
            .map_err(|_| {
                AppError::Timeout(format!(
                    "no response to {method} (id {id}) within {limit:?}"
                ))
            })?;

        let line = match next {
            None => {
                warn!(method, id, "server closed stdout before responding");
                return Ok(None);
            }
            Some(Err(err)) => return Err(err),
            Some(Ok(line)) => line,
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            warn!(method, id, "server answered with an empty line");
            return Ok(None);
        }

        debug!(method, id, raw = trimmed, "response line");
        let response = Response::parse_line(trimmed)?;

        if let Some(echoed) = response.id() {
            if echoed != id {
                return Err(AppError::Protocol(format!(
                    "response id {echoed} does not match request id {id} ({method})"
                )));
            }
        }

        info!(method, id, is_error = response.is_error(), "received response");
        Ok(Some(response))
    }
}
