//! SSE transport for MCP server
//!
//! Clients open an event stream on the SSE path and receive an `endpoint`
//! event naming the URL to POST JSON-RPC messages to. Responses to those
//! messages are delivered on the same stream as `message` events.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::limit::RequestBodyLimitLayer;
use ulid::Ulid;

use crate::config::ServerSettings;
use crate::transport::{JsonRpcRequest, JsonRpcResponse};
use crate::McpServer;

/// Maximum request body size (1MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Messages buffered per session before senders wait
const SESSION_BUFFER: usize = 100;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// SSE transport state
pub struct SseState {
    server: Arc<McpServer>,
    settings: ServerSettings,
    sessions: Mutex<HashMap<String, mpsc::Sender<String>>>,
}

impl SseState {
    pub fn new(server: Arc<McpServer>, settings: ServerSettings) -> Self {
        Self {
            server,
            settings,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of open event streams
    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    /// Each critical section is one map operation, so a poisoned map is still consistent
    fn sessions(&self) -> MutexGuard<'_, HashMap<String, mpsc::Sender<String>>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_session(&self) -> (String, mpsc::Receiver<String>) {
        let id = Ulid::new().to_string();
        let (tx, rx) = mpsc::channel(SESSION_BUFFER);
        self.sessions().insert(id.clone(), tx);
        (id, rx)
    }

    fn session(&self, id: &str) -> Option<mpsc::Sender<String>> {
        self.sessions().get(id).cloned()
    }

    fn close_session(&self, id: &str) {
        if self.sessions().remove(id).is_some() {
            tracing::debug!("SSE session {} closed", id);
        }
    }
}

/// Removes its session when the event stream is dropped
struct SessionGuard {
    state: Arc<SseState>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.close_session(&self.id);
    }
}

/// Create the SSE router around shared state
pub fn router(state: Arc<SseState>) -> Router {
    let sse_path = state.settings.sse_path.clone();
    let message_path = state.settings.message_path.clone();

    Router::new()
        .route(&sse_path, get(sse_handler))
        .route(&message_path, post(message_handler))
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
}

/// Create the SSE router
pub fn create_sse_router(server: Arc<McpServer>, settings: &ServerSettings) -> Router {
    router(Arc::new(SseState::new(server, settings.clone())))
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<SseState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "server": state.server.info().name,
        "version": state.server.info().version
    }))
}

/// SSE endpoint for server-to-client events
async fn sse_handler(
    State(state): State<Arc<SseState>>,
) -> Sse<impl Stream<Item = Result<Event, std::convert::Infallible>>> {
    let (session_id, mut rx) = state.open_session();
    let endpoint = format!("{}?session_id={}", state.settings.message_path, session_id);
    tracing::debug!("SSE session {} opened", session_id);

    let guard = SessionGuard {
        state: state.clone(),
        id: session_id,
    };

    let stream = async_stream::stream! {
        let _guard = guard;

        yield Ok(Event::default().event("endpoint").data(endpoint));

        while let Some(msg) = rx.recv().await {
            yield Ok(Event::default().event("message").data(msg));
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL))
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    session_id: Option<String>,
}

/// Message endpoint for client requests on an open session
async fn message_handler(
    State(state): State<Arc<SseState>>,
    Query(query): Query<MessageQuery>,
    body: String,
) -> Response {
    let Some(session_id) = query.session_id else {
        return (StatusCode::BAD_REQUEST, "session_id is required").into_response();
    };

    let Some(tx) = state.session(&session_id) else {
        tracing::warn!("Message for unknown session {}", session_id);
        return (StatusCode::NOT_FOUND, "Could not find session").into_response();
    };

    let request = match JsonRpcRequest::parse(&body) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Failed to parse message: {}", e);
            return (StatusCode::BAD_REQUEST, "Could not parse message").into_response();
        }
    };

    tracing::debug!("Received SSE request: {:?}", request.method);

    if let Some(response) = state.server.handle_request(request) {
        match serde_json::to_string(&response) {
            Ok(json) => {
                if tx.send(json).await.is_err() {
                    tracing::warn!("SSE session {} went away before its response", session_id);
                    state.close_session(&session_id);
                }
            }
            Err(e) => tracing::error!("Failed to serialize response: {}", e),
        }
    }

    (StatusCode::ACCEPTED, "Accepted").into_response()
}

/// Stateless endpoint: the response is returned in the HTTP body
async fn mcp_handler(State(state): State<Arc<SseState>>, body: String) -> Response {
    let request = match JsonRpcRequest::parse(&body) {
        Ok(r) => r,
        Err(e) => {
            let response = JsonRpcResponse::from_error(serde_json::Value::Null, &e);
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    match state.server.handle_request(request) {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Serve the SSE router on an already bound listener
pub async fn serve_sse(
    listener: TcpListener,
    server: Arc<McpServer>,
    settings: &ServerSettings,
) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    let router = create_sse_router(server, settings);

    tracing::info!("MCP SSE server listening on {}", addr);
    tracing::info!("  SSE endpoint: http://{}{}", addr, settings.sse_path);
    tracing::info!("  Message endpoint: http://{}{}", addr, settings.message_path);
    tracing::info!("  Health check: http://{}/health", addr);

    axum::serve(listener, router).await?;

    Ok(())
}

/// Run the SSE server
pub async fn run_sse_server(
    server: Arc<McpServer>,
    settings: &ServerSettings,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(settings.bind_addr()).await?;
    serve_sse(listener, server, settings).await
}
