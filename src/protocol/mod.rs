//! JSON-RPC 2.0 message types exchanged with the server under test.
//!
//! - `message`: request envelope and the typed response enum, validated at
//!   the parse boundary.
//! - `tool`: MCP-specific parameter and result shapes (`initialize`,
//!   `tools/list`, `tools/call`).

pub mod message;
pub mod tool;

pub use message::{Request, Response, RpcError, JSONRPC_VERSION};
pub use tool::{
    CallToolParams, CallToolResult, ClientInfo, ContentBlock, InitializeParams, ToolDescriptor,
    ToolList, WeatherArguments,
};
