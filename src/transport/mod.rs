//! Stdio transport to the server under test.
//!
//! - `codec`: [`LinesCodec`](tokio_util::codec::LinesCodec)-based NDJSON framing.
//! - `spawner`: command resolution and process launch with captured stdio.
//! - `shutdown`: SIGTERM, bounded wait, kill.
//! - `client`: one-request/one-response exchange with id correlation.

pub mod client;
pub mod codec;
pub mod shutdown;
pub mod spawner;

pub use client::{RpcClient, ServerClient};
pub use spawner::{ServerCommand, ServerHandle, ServerProcess};
