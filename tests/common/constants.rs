//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When test data changes (tokens, record ids, etc.), update only this file.

// ============================================================================
// OAuth Test Data
// ============================================================================

/// Authorization code the mock CRM accepts
pub const TEST_AUTH_CODE: &str = "test-auth-code";

/// Access token minted for the browser session
pub const SESSION_TOKEN: &str = "sess-tok-1";

/// Access token minted for the application (client credentials grant)
pub const APP_TOKEN: &str = "app-tok-1";

/// CRM user id the portal reads history for
pub const TEST_USER_ID: &str = "005VC00000ET8LZ";

// ============================================================================
// Test Catalog Records
// ============================================================================

/// Media record id of the public video
pub const VIDEO_PUBLIC_ID: &str = "a0X10000000pub1";

/// Media record id of the login-only video
pub const VIDEO_PRIVATE_ID: &str = "a0X10000000prv1";

/// Name of the public video
pub const VIDEO_PUBLIC_NAME: &str = "Intro to the Platform";

/// Name of the login-only video
pub const VIDEO_PRIVATE_NAME: &str = "Members Briefing";

/// Hosted video id joined to the public record
pub const RESOURCE_PUBLIC: &str = "ytPub01";

/// Hosted video id joined to the private record
pub const RESOURCE_PRIVATE: &str = "ytPriv01";

/// Thumbnail the public video ends up with (largest rendition wins)
pub const PUBLIC_THUMBNAIL_URL: &str = "https://img.example/pub-high.jpg";

/// Duration of the public video (PT15M33S)
pub const PUBLIC_DURATION_SEC: u64 = 933;

/// Duration of the private video (PT1H2M3S)
pub const PRIVATE_DURATION_SEC: u64 = 3723;

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

/// Cache age the test server is configured with (seconds)
pub const TEST_CACHE_AGE_SEC: usize = 300;
