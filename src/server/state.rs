use axum::extract::FromRef;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;
use crate::catalog::CatalogService;
use crate::crm::CrmOAuthClient;
use crate::user::HistorySource;

pub type GuardedOAuthClient = Arc<CrmOAuthClient>;
pub type GuardedCatalogService = Arc<CatalogService>;
pub type GuardedHistorySource = Arc<dyn HistorySource>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub oauth: GuardedOAuthClient,
    pub catalog: GuardedCatalogService,
    pub history: GuardedHistorySource,
    pub hash: String,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for GuardedOAuthClient {
    fn from_ref(input: &ServerState) -> Self {
        input.oauth.clone()
    }
}

impl FromRef<ServerState> for GuardedCatalogService {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog.clone()
    }
}

impl FromRef<ServerState> for GuardedHistorySource {
    fn from_ref(input: &ServerState) -> Self {
        input.history.clone()
    }
}
