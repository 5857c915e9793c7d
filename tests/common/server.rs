//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server wired to its own mock upstream.

use super::constants::*;
use super::fixtures::install_default_mocks;
use httpmock::MockServer;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use videoportal_server::catalog::{CatalogService, CrmMediaSource};
use videoportal_server::config::{CrmSettings, VideoHostSettings};
use videoportal_server::crm::{CrmOAuthClient, CrmQueryClient};
use videoportal_server::server::{server::make_app, RequestsLoggingLevel, ServerConfig};
use videoportal_server::user::{CrmHistorySource, HistorySource};
use videoportal_server::videohost::YouTubeClient;

/// Test server instance with an isolated mock upstream
///
/// The same mock server answers for the CRM and the video host; tests can
/// install additional mocks on `upstream` (httpmock matches newest first).
/// When dropped, the portal server shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The mock CRM / video host
    pub upstream: MockServer,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server with the full happy-path upstream mock set
    pub async fn spawn() -> Self {
        let server = Self::spawn_bare().await;
        install_default_mocks(&server.upstream).await;
        server
    }

    /// Spawns a test server whose upstream answers nothing yet
    ///
    /// Use this for failure-mode tests; install only the mocks the scenario
    /// needs. Unmatched upstream calls answer 404, which the portal maps to
    /// an upstream failure.
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server does not become ready
    /// within the timeout.
    pub async fn spawn_bare() -> Self {
        let upstream = MockServer::start_async().await;

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let crm = CrmSettings {
            authorize_url: upstream.url("/services/oauth2/authorize"),
            token_url: upstream.url("/services/oauth2/token"),
            callback_url: format!("{}/oauth/api/request", base_url),
            client_id: "portal-key".to_string(),
            client_secret: "portal-secret".to_string(),
            application_token_url: upstream.url("/services/oauth2/apptoken"),
            application_client_id: "app-key".to_string(),
            application_client_secret: "app-secret".to_string(),
            api_version: "v61.0".to_string(),
            default_user_id: TEST_USER_ID.to_string(),
            timeout_sec: 5,
        };
        let video_host = VideoHostSettings {
            api_base_url: upstream.url("/youtube/v3"),
            api_key: "yt-key".to_string(),
            timeout_sec: 5,
        };

        let oauth = Arc::new(CrmOAuthClient::new(crm.clone()).expect("Failed to build OAuth client"));
        let query = Arc::new(
            CrmQueryClient::new(&crm.api_version, crm.timeout_sec)
                .expect("Failed to build query client"),
        );
        let catalog = Arc::new(CatalogService::new(
            Arc::new(CrmMediaSource::new(oauth.clone(), query.clone())),
            Arc::new(YouTubeClient::new(&video_host).expect("Failed to build host client")),
            "/images/thumbnails/default.png",
        ));
        let history: Arc<dyn HistorySource> = Arc::new(CrmHistorySource::new(query));

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0, // make_app never binds the metrics port
            content_cache_age_sec: TEST_CACHE_AGE_SEC,
            frontend_dir_path: None,
            default_user_id: TEST_USER_ID.to_string(),
            session_override: None,
        };

        let app = make_app(config, oauth, catalog, history).expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstream,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the stats endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => {
                    return;
                }
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
