//! Integration tests for the request/response exchange of `RpcClient`.

use serde_json::json;
use yr_weather_probe::AppError;

use super::test_helpers::{fake_server, result_reply, weather_server, Reply};

#[tokio::test]
async fn each_request_is_one_line_with_increasing_ids() {
    let (mut client, log) = fake_server(weather_server, 1_000);

    assert_eq!(client.next_id(), 1);
    let first = client.send_request("tools/list", None).await.unwrap();
    let second = client.send_request("tools/list", None).await.unwrap();

    assert_eq!(first.unwrap().id(), Some(1));
    assert_eq!(second.unwrap().id(), Some(2));
    assert_eq!(client.next_id(), 3);

    let requests = log.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["jsonrpc"], "2.0");
    assert_eq!(requests[0]["params"], json!({}));
    assert_eq!(requests[1]["id"], 2);
}

#[tokio::test]
async fn methods_sent_tracks_written_requests() {
    let (mut client, _log) = fake_server(weather_server, 1_000);

    client.send_request("initialize", None).await.unwrap();
    client.send_request("initialized", None).await.unwrap();

    assert_eq!(client.methods_sent(), ["initialize", "initialized"]);
}

#[tokio::test]
async fn closed_stream_yields_no_response() {
    let (mut client, _log) = fake_server(|_| Reply::Close, 1_000);

    let response = client.send_request("initialize", None).await.unwrap();
    assert!(response.is_none());
}

#[tokio::test]
async fn empty_line_yields_no_response() {
    let (mut client, _log) = fake_server(|_| Reply::Raw("\n".into()), 1_000);

    let response = client.send_request("initialize", None).await.unwrap();
    assert!(response.is_none());
}

#[tokio::test]
async fn error_response_is_returned_not_raised() {
    let (mut client, _log) = fake_server(weather_server, 1_000);

    let response = client
        .send_request("resources/list", None)
        .await
        .unwrap()
        .unwrap();
    assert!(response.is_error());
    assert_eq!(response.error().unwrap().code, -32601);
}

#[tokio::test]
async fn mismatched_id_is_protocol_error() {
    let (mut client, _log) = fake_server(
        |_| Reply::Json(json!({"jsonrpc": "2.0", "id": 99, "result": {}})),
        1_000,
    );

    let err = client.send_request("tools/list", None).await.unwrap_err();
    assert!(
        matches!(&err, AppError::Protocol(msg) if msg.contains("does not match request id 1")),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn malformed_line_is_protocol_error() {
    let (mut client, _log) = fake_server(|_| Reply::Raw("not-valid-json{{{\n".into()), 1_000);

    let err = client.send_request("tools/list", None).await.unwrap_err();
    assert!(matches!(err, AppError::Protocol(_)), "got: {err:?}");
}

#[tokio::test]
async fn silent_server_times_out() {
    let (mut client, _log) = fake_server(|_| Reply::Nothing, 100);

    let err = client.send_request("tools/call", None).await.unwrap_err();
    assert!(
        matches!(
            &err,
            AppError::Timeout(msg) if msg.contains("tools/call") && msg.contains("id 1")
        ),
        "got: {err:?}"
    );
}

#[tokio::test]
async fn call_uses_its_own_limit() {
    let (mut client, _log) = fake_server(|_| Reply::Nothing, 60_000);

    let err = client
        .call("initialize", &json!({}), std::time::Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Timeout(_)), "got: {err:?}");
}

#[tokio::test]
async fn error_with_null_id_is_accepted() {
    let (mut client, _log) = fake_server(
        |_| {
            Reply::Json(json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": {"code": -32700, "message": "Parse error"}
            }))
        },
        1_000,
    );

    let response = client.send_request("tools/list", None).await.unwrap().unwrap();
    assert_eq!(response.id(), None);
    assert!(response.is_error());
}

#[tokio::test]
async fn call_serialises_typed_params() {
    let (mut client, log) = fake_server(|req| result_reply(req, json!({})), 1_000);

    client
        .call(
            "initialize",
            &json!({"protocolVersion": "0.1.0"}),
            std::time::Duration::from_secs(1),
        )
        .await
        .unwrap();

    let requests = log.lock().unwrap().clone();
    assert_eq!(requests[0]["params"]["protocolVersion"], "0.1.0");
}
