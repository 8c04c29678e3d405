//! End-to-end test: a client connects over SSE and calls the `hello` tool

#![cfg(feature = "sse")]

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use hello_mcp::{default_registry, serve_sse, McpServer, ServerInfo, ServerSettings};
use serde_json::json;
use tokio::net::TcpListener;

struct SseEvent {
    event: String,
    data: String,
}

/// Pull the next named event off the stream, skipping keep-alive comments
async fn next_event<S, B>(stream: &mut S, buf: &mut String) -> SseEvent
where
    S: Stream<Item = reqwest::Result<B>> + Unpin,
    B: AsRef<[u8]>,
{
    loop {
        if let Some(pos) = buf.find("\n\n") {
            let block: String = buf.drain(..pos + 2).collect();
            let mut event = None;
            let mut data = Vec::new();
            for line in block.lines() {
                if let Some(v) = line.strip_prefix("event:") {
                    event = Some(v.trim().to_string());
                } else if let Some(v) = line.strip_prefix("data:") {
                    data.push(v.trim_start().to_string());
                }
            }
            if let Some(event) = event {
                return SseEvent {
                    event,
                    data: data.join("\n"),
                };
            }
            continue;
        }

        let chunk = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for SSE event")
            .expect("SSE stream ended")
            .expect("SSE stream error");
        buf.push_str(std::str::from_utf8(chunk.as_ref()).unwrap());
    }
}

#[tokio::test]
async fn test_client_calls_hello_over_sse() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = McpServer::new(ServerInfo::new("Demo"), default_registry().unwrap());
    let settings = ServerSettings::default();
    let handle =
        tokio::spawn(async move { serve_sse(listener, Arc::new(server), &settings).await });

    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    let response = client.get(format!("{}/sse", base)).send().await.unwrap();
    assert!(response.status().is_success());
    let mut events = response.bytes_stream();
    let mut buf = String::new();

    let endpoint = next_event(&mut events, &mut buf).await;
    assert_eq!(endpoint.event, "endpoint");
    assert!(endpoint.data.starts_with("/messages/?session_id="));
    let message_url = format!("{}{}", base, endpoint.data);

    let post = |body: serde_json::Value| {
        let client = client.clone();
        let url = message_url.clone();
        async move {
            let response = client.post(url).json(&body).send().await.unwrap();
            assert_eq!(response.status().as_u16(), 202);
        }
    };

    post(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "e2e", "version": "0.0.0"}
        }
    }))
    .await;
    let init = next_event(&mut events, &mut buf).await;
    assert_eq!(init.event, "message");
    let init: serde_json::Value = serde_json::from_str(&init.data).unwrap();
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "Demo");

    post(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})).await;

    post(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).await;
    let list = next_event(&mut events, &mut buf).await;
    let list: serde_json::Value = serde_json::from_str(&list.data).unwrap();
    assert_eq!(list["id"], 2);
    assert_eq!(list["result"]["tools"][0]["name"], "hello");

    post(json!({
        "jsonrpc": "2.0",
        "id": 3,
        "method": "tools/call",
        "params": {"name": "hello", "arguments": {"name": "Ada"}}
    }))
    .await;
    let call = next_event(&mut events, &mut buf).await;
    let call: serde_json::Value = serde_json::from_str(&call.data).unwrap();
    assert_eq!(call["id"], 3);
    assert_eq!(call["result"]["isError"], false);
    assert_eq!(call["result"]["content"][0]["text"], "Hello, Ada!");

    handle.abort();
}

#[tokio::test]
async fn test_health_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = McpServer::new(ServerInfo::new("Demo"), default_registry().unwrap());
    let settings = ServerSettings::default();
    let handle =
        tokio::spawn(async move { serve_sse(listener, Arc::new(server), &settings).await });

    let body: serde_json::Value = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");

    handle.abort();
}
