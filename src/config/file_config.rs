use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,
    pub frontend_dir_path: Option<String>,

    // Upstream sections
    pub crm: Option<CrmConfig>,
    pub video_host: Option<VideoHostConfig>,
    pub catalog: Option<CatalogConfig>,
    pub session_override: Option<SessionOverrideConfig>,
}

/// OAuth client settings for the CRM. Two connected apps are supported: the
/// session app drives the user login flow, the application app obtains the
/// client-credentials token used for catalog queries. The application fields
/// fall back to the session app when omitted.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CrmConfig {
    pub authorize_url: Option<String>,
    pub token_url: Option<String>,
    pub callback_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,

    pub application_token_url: Option<String>,
    pub application_client_id: Option<String>,
    pub application_client_secret: Option<String>,

    pub api_version: Option<String>,
    pub default_user_id: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct VideoHostConfig {
    pub api_base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_sec: Option<u64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct CatalogConfig {
    /// Thumbnail URL assigned to videos the host returns no image for.
    pub default_thumbnail_url: Option<String>,
}

/// Fixed CRM credentials substituted for the session cookies. Only honored
/// when the crate is built with the `session-override` feature.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SessionOverrideConfig {
    pub access_token: Option<String>,
    pub instance_url: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
