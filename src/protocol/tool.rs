//! MCP parameter and result shapes used by the probe.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{CityConfig, ClientConfig, ForecastType};

/// Name of the weather tool exposed by the server.
pub const GET_WEATHER_TOOL: &str = "get_weather";

/// `initialize` params.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// Version string echoed to the server.
    pub protocol_version: String,
    /// Client capabilities; the probe advertises none.
    pub capabilities: Value,
    /// Client identity.
    pub client_info: ClientInfo,
}

impl InitializeParams {
    /// Build handshake params from the client section of the config.
    #[must_use]
    pub fn from_config(client: &ClientConfig) -> Self {
        Self {
            protocol_version: client.protocol_version.clone(),
            capabilities: Value::Object(serde_json::Map::new()),
            client_info: ClientInfo {
                name: client.name.clone(),
                version: client.version.clone(),
            },
        }
    }
}

/// Client identity sent during `initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

/// `tools/call` params.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallToolParams<A> {
    /// Tool name.
    pub name: String,
    /// Tool-specific arguments.
    pub arguments: A,
}

/// Arguments of the `get_weather` tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherArguments {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// Display name of the location.
    pub location_name: String,
    /// Forecast window; omitted so the server applies its own default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forecast_type: Option<&'static str>,
}

impl CallToolParams<WeatherArguments> {
    /// `get_weather` call for one city.
    #[must_use]
    pub fn get_weather(city: &CityConfig, forecast: Option<ForecastType>) -> Self {
        Self {
            name: GET_WEATHER_TOOL.to_owned(),
            arguments: WeatherArguments {
                latitude: city.latitude,
                longitude: city.longitude,
                location_name: city.name.clone(),
                forecast_type: forecast.map(ForecastType::as_str),
            },
        }
    }
}

/// `tools/list` result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToolList {
    /// Advertised tools.
    #[serde(default)]
    pub tools: Vec<ToolDescriptor>,
}

impl ToolList {
    /// Lenient view over a `tools/list` result.
    ///
    /// Entries without a string `name` are skipped one by one; a missing or
    /// non-array `tools` member reads as an empty list.
    #[must_use]
    pub fn from_result(result: &Value) -> Self {
        let tools = result
            .get("tools")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| ToolDescriptor::deserialize(entry).ok())
                    .collect()
            })
            .unwrap_or_default();
        Self { tools }
    }

    /// Names of the advertised tools in server order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    /// Whether a tool with `name` is advertised.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }
}

/// One entry of a `tools/list` result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

/// `tools/call` result.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CallToolResult {
    /// Ordered content blocks.
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    /// MCP tool-level error flag.
    #[serde(default, rename = "isError")]
    pub is_error: bool,
}

/// One block of tool output.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    /// Block type, usually `text`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// Text payload for text blocks.
    #[serde(default)]
    pub text: Option<String>,
}

impl CallToolResult {
    /// Lenient view over a `tools/call` result; malformed payloads read as
    /// empty output.
    #[must_use]
    pub fn from_result(result: &Value) -> Self {
        Self::deserialize(result).unwrap_or_default()
    }

    /// Text of the first content block, if it has one.
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().and_then(|block| block.text.as_deref())
    }
}
