mod file_config;

pub use file_config::{
    CatalogConfig, CrmConfig, FileConfig, SessionOverrideConfig, VideoHostConfig,
};

use crate::server::RequestsLoggingLevel;
use anyhow::{bail, Result};
use clap::ValueEnum;

pub const DEFAULT_VIDEO_HOST_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_CRM_API_VERSION: &str = "v61.0";
pub const DEFAULT_THUMBNAIL_URL: &str = "/images/thumbnails/default.png";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Core settings
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,

    // Upstream settings
    pub crm: CrmSettings,
    pub video_host: VideoHostSettings,
    pub catalog: CatalogSettings,

    /// Populated only in `session-override` builds; resolution refuses the
    /// section otherwise, so a production binary can never carry one.
    pub session_override: Option<SessionOverrideSettings>,
}

#[derive(Debug, Clone)]
pub struct CrmSettings {
    pub authorize_url: String,
    pub token_url: String,
    pub callback_url: String,
    pub client_id: String,
    pub client_secret: String,

    pub application_token_url: String,
    pub application_client_id: String,
    pub application_client_secret: String,

    pub api_version: String,
    pub default_user_id: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct VideoHostSettings {
    pub api_base_url: String,
    pub api_key: String,
    pub timeout_sec: u64,
}

#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub default_thumbnail_url: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            default_thumbnail_url: DEFAULT_THUMBNAIL_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOverrideSettings {
    pub access_token: String,
    pub instance_url: String,
}

fn require(value: Option<String>, name: &str) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("crm.{} must be set in the config file", name),
    }
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let frontend_dir_path = file
            .frontend_dir_path
            .or_else(|| cli.frontend_dir_path.clone());

        // CRM OAuth clients live in the file only; secrets have no CLI flags.
        let crm_file = match file.crm {
            Some(crm) => crm,
            None => bail!("[crm] section with the OAuth client settings is required"),
        };

        let token_url = require(crm_file.token_url, "token_url")?;
        let client_id = require(crm_file.client_id, "client_id")?;
        let client_secret = require(crm_file.client_secret, "client_secret")?;

        let crm = CrmSettings {
            authorize_url: require(crm_file.authorize_url, "authorize_url")?,
            callback_url: require(crm_file.callback_url, "callback_url")?,
            application_token_url: crm_file
                .application_token_url
                .unwrap_or_else(|| token_url.clone()),
            application_client_id: crm_file
                .application_client_id
                .unwrap_or_else(|| client_id.clone()),
            application_client_secret: crm_file
                .application_client_secret
                .unwrap_or_else(|| client_secret.clone()),
            token_url,
            client_id,
            client_secret,
            api_version: crm_file
                .api_version
                .unwrap_or_else(|| DEFAULT_CRM_API_VERSION.to_string()),
            default_user_id: crm_file.default_user_id.unwrap_or_default(),
            timeout_sec: crm_file.timeout_sec.unwrap_or(10),
        };

        let vh_file = file.video_host.unwrap_or_default();
        let video_host = VideoHostSettings {
            api_base_url: vh_file
                .api_base_url
                .unwrap_or_else(|| DEFAULT_VIDEO_HOST_API_BASE.to_string()),
            api_key: match vh_file.api_key {
                Some(key) if !key.trim().is_empty() => key,
                _ => bail!("video_host.api_key must be set in the config file"),
            },
            timeout_sec: vh_file.timeout_sec.unwrap_or(10),
        };

        let catalog_file = file.catalog.unwrap_or_default();
        let catalog = CatalogSettings {
            default_thumbnail_url: catalog_file
                .default_thumbnail_url
                .unwrap_or_else(|| DEFAULT_THUMBNAIL_URL.to_string()),
        };

        let session_override = resolve_session_override(file.session_override)?;

        Ok(Self {
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            frontend_dir_path,
            crm,
            video_host,
            catalog,
            session_override,
        })
    }
}

/// The `[session_override]` section is a local-development escape hatch; a
/// binary built without the feature refuses to start when it is present so
/// the override can never ride a forgotten config into production.
fn resolve_session_override(
    section: Option<SessionOverrideConfig>,
) -> Result<Option<SessionOverrideSettings>> {
    let Some(section) = section else {
        return Ok(None);
    };

    if !cfg!(feature = "session-override") {
        bail!(
            "[session_override] is present but this build does not support it \
             (rebuild with --features session-override for local development)"
        );
    }

    match (section.access_token, section.instance_url) {
        (Some(token), Some(url)) if !token.trim().is_empty() && !url.trim().is_empty() => {
            Ok(Some(SessionOverrideSettings {
                access_token: token,
                instance_url: url,
            }))
        }
        _ => bail!("[session_override] requires both access_token and instance_url"),
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
