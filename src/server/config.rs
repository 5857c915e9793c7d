use super::RequestsLoggingLevel;
use crate::config::SessionOverrideSettings;

#[derive(Clone)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub content_cache_age_sec: usize,
    pub frontend_dir_path: Option<String>,
    /// CRM user whose history the portal serves.
    pub default_user_id: String,
    /// Fixed session for local work. Only ever populated in builds with the
    /// `session-override` feature; config resolution refuses it otherwise.
    pub session_override: Option<SessionOverrideSettings>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 8080,
            metrics_port: 9091,
            content_cache_age_sec: 300,
            frontend_dir_path: None,
            default_user_id: String::new(),
            session_override: None,
        }
    }
}
