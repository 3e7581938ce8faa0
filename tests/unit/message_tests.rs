//! Unit tests for JSON-RPC request serialisation and response validation.

use serde_json::{json, Value};

use yr_weather_probe::protocol::{Request, Response, RpcError};
use yr_weather_probe::AppError;

#[test]
fn request_without_params_sends_empty_object() {
    let request = Request::new(1, "initialized", None);
    let value: Value = serde_json::from_str(&request.to_line().unwrap()).unwrap();

    assert_eq!(
        value,
        json!({"jsonrpc": "2.0", "id": 1, "method": "initialized", "params": {}})
    );
}

#[test]
fn request_line_is_single_line() {
    let params = json!({"text": "multi\nline"});
    let line = Request::new(4, "tools/call", Some(params)).to_line().unwrap();
    assert!(!line.contains('\n'), "newlines inside strings must be escaped");
}

#[test]
fn success_response_parses() {
    let resp = Response::parse_line(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]}}"#).unwrap();

    assert_eq!(resp.id(), Some(3));
    assert!(!resp.is_error());
    assert_eq!(resp.result(), Some(&json!({"tools": []})));
    assert!(resp.error().is_none());
}

#[test]
fn error_response_parses() {
    let resp = Response::parse_line(
        r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32603,"message":"Failed to get weather"}}"#,
    )
    .unwrap();

    assert!(resp.is_error());
    assert_eq!(
        resp.error(),
        Some(&RpcError {
            code: -32603,
            message: "Failed to get weather".into(),
            data: None,
        })
    );
    assert!(resp.result().is_none());
}

#[test]
fn error_response_with_null_id_is_accepted() {
    let resp = Response::parse_line(
        r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#,
    )
    .unwrap();
    assert_eq!(resp.id(), None);
    assert!(resp.is_error());
}

#[test]
fn success_without_id_is_rejected() {
    let err = Response::parse_line(r#"{"jsonrpc":"2.0","result":{}}"#).unwrap_err();
    assert!(matches!(err, AppError::Protocol(_)), "got: {err:?}");
}

#[test]
fn both_result_and_error_is_rejected() {
    let err = Response::parse_line(
        r#"{"jsonrpc":"2.0","id":1,"result":{},"error":{"code":1,"message":"x"}}"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("both"), "got: {err}");
}

#[test]
fn neither_result_nor_error_is_rejected() {
    let err = Response::parse_line(r#"{"jsonrpc":"2.0","id":1}"#).unwrap_err();
    assert!(err.to_string().contains("neither"), "got: {err}");
}

#[test]
fn wrong_version_is_rejected() {
    let err = Response::parse_line(r#"{"jsonrpc":"1.0","id":1,"result":{}}"#).unwrap_err();
    assert!(err.to_string().contains("unsupported jsonrpc version"), "got: {err}");
}

#[test]
fn missing_version_is_rejected() {
    assert!(Response::parse_line(r#"{"id":1,"result":{}}"#).is_err());
}

#[test]
fn non_object_is_rejected() {
    let err = Response::parse_line("[1,2,3]").unwrap_err();
    assert!(err.to_string().contains("not a JSON object"), "got: {err}");
}

#[test]
fn string_id_is_rejected() {
    let err = Response::parse_line(r#"{"jsonrpc":"2.0","id":"abc","result":{}}"#).unwrap_err();
    assert!(err.to_string().contains("unexpected response id"), "got: {err}");
}

#[test]
fn malformed_json_is_protocol_error() {
    let err = Response::parse_line("not-valid-json{{{").unwrap_err();
    assert!(
        matches!(&err, AppError::Protocol(msg) if msg.contains("malformed json")),
        "got: {err:?}"
    );
}

#[test]
fn malformed_error_object_is_rejected() {
    let err = Response::parse_line(r#"{"jsonrpc":"2.0","id":1,"error":"boom"}"#).unwrap_err();
    assert!(err.to_string().contains("malformed error object"), "got: {err}");
}

#[test]
fn into_result_maps_failure_to_rpc_error() {
    let resp = Response::Failure {
        id: Some(2),
        error: RpcError {
            code: -32601,
            message: "Method not found: initialized".into(),
            data: None,
        },
    };

    match resp.into_result() {
        Err(AppError::Rpc { code, message }) => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found: initialized");
        }
        other => panic!("expected Err(AppError::Rpc), got: {other:?}"),
    }
}

#[test]
fn into_result_returns_payload_on_success() {
    let resp = Response::Success {
        id: 1,
        result: json!({"protocolVersion": "2025-06-18"}),
    };
    assert_eq!(
        resp.into_result().unwrap(),
        json!({"protocolVersion": "2025-06-18"})
    );
}

#[test]
fn null_result_beside_error_is_a_failure() {
    let resp = Response::parse_line(
        r#"{"jsonrpc":"2.0","id":8,"result":null,"error":{"code":-32603,"message":"location not found"}}"#,
    )
    .unwrap();

    assert!(resp.is_error());
    assert_eq!(resp.id(), Some(8));
    assert_eq!(resp.error().unwrap().message, "location not found");
}

#[test]
fn null_error_beside_result_is_a_success() {
    let resp =
        Response::parse_line(r#"{"jsonrpc":"2.0","id":3,"result":{"tools":[]},"error":null}"#)
            .unwrap();

    assert!(!resp.is_error());
    assert_eq!(resp.result(), Some(&json!({"tools": []})));
}

#[test]
fn null_error_alone_is_rejected() {
    let err = Response::parse_line(r#"{"jsonrpc":"2.0","id":3,"error":null}"#).unwrap_err();
    assert!(err.to_string().contains("neither"), "got: {err}");
}
