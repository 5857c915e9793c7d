//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestClient, TestServer, VIDEO_PUBLIC_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_video() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated(server.base_url.clone()).await;
//!
//!     let response = client.get_video(VIDEO_PUBLIC_ID).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;

// Payload builders for tests that install their own upstream mocks
#[allow(unused_imports)]
pub use fixtures::{
    app_token_body, install_auth_mocks, install_catalog_mocks, install_history_mocks,
    media_records_body, purchased_query, session_token_body, watched_query, youtube_videos_body,
};
