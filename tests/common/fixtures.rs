//! Mock upstream payloads and installers
//!
//! One httpmock server plays both upstreams: the CRM (token grants, SOQL
//! queries, introspection) and the video host. `TestServer::spawn()` installs
//! the whole happy-path set; failure-mode tests start from
//! `TestServer::spawn_bare()` and install their own subset.

use super::constants::*;
use httpmock::prelude::*;
use serde_json::{json, Value};
use videoportal_server::catalog::MEDIA_QUERY;

/// SOQL the portal sends for the watched feed of `user_id`
pub fn watched_query(user_id: &str) -> String {
    format!(
        "SELECT ResourceID__c, Timestamp__c FROM WatchedVideo__c \
         WHERE User__c = '{}' ORDER BY Timestamp__c DESC",
        user_id
    )
}

/// SOQL the portal sends for the purchased feed of `user_id`
pub fn purchased_query(user_id: &str) -> String {
    format!(
        "SELECT ResourceID__c, Timestamp__c FROM MediaPurchase__c \
         WHERE User__c = '{}' ORDER BY Timestamp__c DESC",
        user_id
    )
}

/// Token grant for the browser session, pointing back at the mock instance
pub fn session_token_body(upstream: &MockServer) -> Value {
    json!({
        "access_token": SESSION_TOKEN,
        "instance_url": upstream.base_url(),
        "id_token": "idt-1",
        "token_type": "Bearer",
        "issued_at": "1730000000000"
    })
}

/// Token grant for the application, pointing back at the mock instance
pub fn app_token_body(upstream: &MockServer) -> Value {
    json!({
        "access_token": APP_TOKEN,
        "instance_url": upstream.base_url(),
        "token_type": "Bearer",
        "scope": "api"
    })
}

/// The media query response: one public video, one login-only video and one
/// record without an Id that the parser must skip.
pub fn media_records_body() -> Value {
    json!({
        "totalSize": 3,
        "done": true,
        "records": [
            {
                "Id": VIDEO_PUBLIC_ID,
                "Name": VIDEO_PUBLIC_NAME,
                "Description__c": "Opening walkthrough of the portal",
                "Event__c": "evt-1",
                "Event__r": {"Name": "Spring Summit 2024", "Start_Date__c": "2024-05-12"},
                "Speakers__c": "Ada Lovelace; Grace Hopper",
                "ResourceId__c": RESOURCE_PUBLIC,
                "Date__c": "2024-05-13",
                "Published__c": true,
                "IsPublic__c": true
            },
            {
                "Id": VIDEO_PRIVATE_ID,
                "Name": VIDEO_PRIVATE_NAME,
                "ResourceId__c": RESOURCE_PRIVATE,
                "Published__c": true,
                "IsPublic__c": false
            },
            {
                "Name": "Broken record"
            }
        ]
    })
}

/// Host metadata for both hosted videos
pub fn youtube_videos_body() -> Value {
    json!({
        "items": [
            {
                "id": RESOURCE_PUBLIC,
                "snippet": {"thumbnails": {
                    "default": {"url": "https://img.example/pub-default.jpg", "width": 120, "height": 90},
                    "high": {"url": PUBLIC_THUMBNAIL_URL, "width": 480, "height": 360}
                }},
                "contentDetails": {"duration": "PT15M33S"}
            },
            {
                "id": RESOURCE_PRIVATE,
                "snippet": {"thumbnails": {
                    "default": {"url": "https://img.example/priv-default.jpg", "width": 120, "height": 90}
                }},
                "contentDetails": {"duration": "PT1H2M3S"}
            }
        ]
    })
}

/// Mocks for the OAuth endpoints: code exchange, application grant and
/// introspection.
pub async fn install_auth_mocks(upstream: &MockServer) {
    let session_body = session_token_body(upstream);
    upstream
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/services/oauth2/token")
                .form_urlencoded_tuple("grant_type", "authorization_code")
                .form_urlencoded_tuple("code", TEST_AUTH_CODE);
            then.status(200).json_body(session_body.clone());
        })
        .await;

    let app_body = app_token_body(upstream);
    upstream
        .mock_async(move |when, then| {
            when.method(POST)
                .path("/services/oauth2/apptoken")
                .form_urlencoded_tuple("grant_type", "client_credentials");
            then.status(200).json_body(app_body.clone());
        })
        .await;

    upstream
        .mock_async(|when, then| {
            when.method(POST)
                .path("/services/oauth2/introspect")
                .form_urlencoded_tuple("token", SESSION_TOKEN);
            then.status(200).json_body(json!({
                "active": true,
                "scope": "api id",
                "username": "portal.user@example.com"
            }));
        })
        .await;
}

/// Mocks for the catalog upstreams: the media query and the video host.
pub async fn install_catalog_mocks(upstream: &MockServer) {
    upstream
        .mock_async(|when, then| {
            when.method(GET)
                .path("/services/data/v61.0/query")
                .query_param("q", MEDIA_QUERY)
                .header("authorization", format!("Bearer {}", APP_TOKEN));
            then.status(200).json_body(media_records_body());
        })
        .await;

    upstream
        .mock_async(|when, then| {
            when.method(GET)
                .path("/youtube/v3/videos")
                .query_param("id", format!("{},{}", RESOURCE_PUBLIC, RESOURCE_PRIVATE));
            then.status(200).json_body(youtube_videos_body());
        })
        .await;
}

/// Mocks for both history feeds of the default test user.
pub async fn install_history_mocks(upstream: &MockServer) {
    upstream
        .mock_async(|when, then| {
            when.method(GET)
                .path("/services/data/v61.0/query")
                .query_param("q", watched_query(TEST_USER_ID))
                .header("authorization", format!("Bearer {}", SESSION_TOKEN));
            then.status(200).json_body(json!({
                "totalSize": 1,
                "done": true,
                "records": [
                    {"ResourceID__c": RESOURCE_PUBLIC, "Timestamp__c": "2024-03-05T18:22:41.000+0000"}
                ]
            }));
        })
        .await;

    upstream
        .mock_async(|when, then| {
            when.method(GET)
                .path("/services/data/v61.0/query")
                .query_param("q", purchased_query(TEST_USER_ID))
                .header("authorization", format!("Bearer {}", SESSION_TOKEN));
            then.status(200).json_body(json!({
                "totalSize": 1,
                "done": true,
                "records": [
                    {"ResourceID__c": RESOURCE_PRIVATE, "Timestamp__c": "2024-04-01T09:00:00.000+0000"}
                ]
            }));
        })
        .await;
}

/// The full happy-path mock set used by `TestServer::spawn()`.
pub async fn install_default_mocks(upstream: &MockServer) {
    install_auth_mocks(upstream).await;
    install_catalog_mocks(upstream).await;
    install_history_mocks(upstream).await;
}
