//! Process bootstrap for the SSE server

use async_trait::async_trait;

use crate::config::ServerSettings;

/// Bind address covering every network interface
pub const ALL_INTERFACES: &str = "0.0.0.0";

/// A server run loop that owns the process until it stops or fails
#[async_trait]
pub trait ServerLoop: Send + Sync {
    async fn run(&self, settings: &ServerSettings) -> anyhow::Result<()>;
}

/// Bind to all interfaces and run `server_loop` to completion.
///
/// An error escaping the loop is logged once and returned unchanged.
pub async fn run_mcp_server<L>(mut settings: ServerSettings, server_loop: &L) -> anyhow::Result<()>
where
    L: ServerLoop + ?Sized,
{
    settings.host = ALL_INTERFACES.to_string();
    tracing::info!(
        "Running MCP server with SSE transport on {}:{}",
        settings.host,
        settings.port
    );

    if let Err(e) = server_loop.run(&settings).await {
        tracing::error!("Error initializing MCP server: {}", e);
        return Err(e);
    }

    Ok(())
}

#[cfg(feature = "sse")]
pub use self::sse_loop::SseServerLoop;

#[cfg(feature = "sse")]
mod sse_loop {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::ServerLoop;
    use crate::config::ServerSettings;
    use crate::sse::run_sse_server;
    use crate::McpServer;

    /// Serves an [`McpServer`] over SSE
    pub struct SseServerLoop {
        server: Arc<McpServer>,
    }

    impl SseServerLoop {
        pub fn new(server: Arc<McpServer>) -> Self {
            Self { server }
        }
    }

    #[async_trait]
    impl ServerLoop for SseServerLoop {
        async fn run(&self, settings: &ServerSettings) -> anyhow::Result<()> {
            run_sse_server(self.server.clone(), settings).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    /// Records the settings it was started with
    struct RecordingLoop {
        seen: Mutex<Option<ServerSettings>>,
        fail_with: Option<&'static str>,
    }

    impl RecordingLoop {
        fn new(fail_with: Option<&'static str>) -> Self {
            Self {
                seen: Mutex::new(None),
                fail_with,
            }
        }
    }

    #[async_trait]
    impl ServerLoop for RecordingLoop {
        async fn run(&self, settings: &ServerSettings) -> anyhow::Result<()> {
            *self.seen.lock().unwrap() = Some(settings.clone());
            match self.fail_with {
                Some(msg) => anyhow::bail!(msg),
                None => Ok(()),
            }
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs(buffer: &LogBuffer) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    #[tokio::test]
    async fn test_binds_all_interfaces_before_running() {
        let logs = LogBuffer::default();
        let _guard = capture_logs(&logs);

        let server_loop = RecordingLoop::new(None);
        let settings = ServerSettings::default().with_port(9123);
        assert_eq!(settings.host, "127.0.0.1");

        run_mcp_server(settings, &server_loop).await.unwrap();

        let seen = server_loop.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.host, "0.0.0.0");
        assert_eq!(seen.port, 9123);
        assert!(logs
            .contents()
            .contains("Running MCP server with SSE transport on 0.0.0.0:9123"));
    }

    #[tokio::test]
    async fn test_run_failure_is_logged_and_propagated() {
        let logs = LogBuffer::default();
        let _guard = capture_logs(&logs);

        let server_loop = RecordingLoop::new(Some("address already in use"));
        let err = run_mcp_server(ServerSettings::default(), &server_loop)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "address already in use");
        let output = logs.contents();
        assert!(output.contains("ERROR"));
        assert!(output.contains("Error initializing MCP server: address already in use"));
    }

    #[cfg(feature = "sse")]
    #[tokio::test]
    async fn test_sse_loop_reports_bind_failure() {
        use crate::server::{McpServer, ServerInfo};
        use crate::tools::default_registry;

        let occupied = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = McpServer::new(ServerInfo::new("Demo"), default_registry().unwrap());
        let server_loop = SseServerLoop::new(Arc::new(server));
        let result = run_mcp_server(ServerSettings::default().with_port(port), &server_loop).await;
        assert!(result.is_err());
    }
}
