//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all portal endpoints.
//!
//! Redirects are never followed so tests can assert on the redirect
//! responses themselves; cookies are still recorded from them.

use super::constants::*;
use reqwest::Response;
use std::time::Duration;

/// HTTP test client with cookie-based session management
pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    /// Creates a new client without a session
    ///
    /// Use this for testing the login flow and anonymous access.
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .cookie_store(true) // Automatically handle session cookies
            .redirect(reqwest::redirect::Policy::none())
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    /// Creates a client holding a session, by running the OAuth callback
    /// with the code the mock CRM accepts
    ///
    /// # Panics
    ///
    /// Panics if the code exchange fails (indicates test infrastructure
    /// problem).
    pub async fn authenticated(base_url: String) -> Self {
        let client = Self::new(base_url);

        let response = client.callback(TEST_AUTH_CODE, Some("portal_auth")).await;
        assert_eq!(
            response.status(),
            reqwest::StatusCode::SEE_OTHER,
            "Test session setup failed: {:?}",
            response.text().await
        );

        client
    }

    // ========================================================================
    // Authentication Endpoints
    // ========================================================================

    /// GET /login
    pub async fn login(&self) -> Response {
        self.client
            .get(format!("{}/login", self.base_url))
            .send()
            .await
            .expect("Login request failed")
    }

    /// GET /logout
    pub async fn logout(&self) -> Response {
        self.client
            .get(format!("{}/logout", self.base_url))
            .send()
            .await
            .expect("Logout request failed")
    }

    /// GET /oauth/api/request with optional code and state
    pub async fn callback(&self, code: &str, state: Option<&str>) -> Response {
        let mut query: Vec<(&str, &str)> = vec![("code", code)];
        if let Some(state) = state {
            query.push(("state", state));
        }
        self.client
            .get(format!("{}/oauth/api/request", self.base_url))
            .query(&query)
            .send()
            .await
            .expect("Callback request failed")
    }

    /// GET /oauth/api/request without any parameters
    pub async fn callback_without_code(&self) -> Response {
        self.client
            .get(format!("{}/oauth/api/request", self.base_url))
            .send()
            .await
            .expect("Callback request failed")
    }

    /// GET /connect
    pub async fn connect(&self) -> Response {
        self.client
            .get(format!("{}/connect", self.base_url))
            .send()
            .await
            .expect("Connect request failed")
    }

    /// GET /introspect
    pub async fn introspect(&self) -> Response {
        self.client
            .get(format!("{}/introspect", self.base_url))
            .send()
            .await
            .expect("Introspect request failed")
    }

    // ========================================================================
    // Catalog Endpoints
    // ========================================================================

    /// GET /v1/catalog/videos
    pub async fn get_videos(&self) -> Response {
        self.client
            .get(format!("{}/v1/catalog/videos", self.base_url))
            .send()
            .await
            .expect("Get videos request failed")
    }

    /// GET /v1/catalog/videos/{id}
    pub async fn get_video(&self, id: &str) -> Response {
        self.client
            .get(format!("{}/v1/catalog/videos/{}", self.base_url, id))
            .send()
            .await
            .expect("Get video request failed")
    }

    /// POST /v1/catalog/refresh
    pub async fn refresh_catalog(&self) -> Response {
        self.client
            .post(format!("{}/v1/catalog/refresh", self.base_url))
            .send()
            .await
            .expect("Refresh catalog request failed")
    }

    // ========================================================================
    // User Endpoints
    // ========================================================================

    /// GET /v1/user/history
    pub async fn get_history(&self) -> Response {
        self.client
            .get(format!("{}/v1/user/history", self.base_url))
            .send()
            .await
            .expect("Get history request failed")
    }

    // ========================================================================
    // Shell / System Endpoints
    // ========================================================================

    /// GET /v1/shell
    pub async fn get_shell(&self) -> Response {
        self.client
            .get(format!("{}/v1/shell", self.base_url))
            .send()
            .await
            .expect("Get shell request failed")
    }

    /// GET /
    pub async fn get_stats(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Get stats request failed")
    }
}
