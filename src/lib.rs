//! Video Portal Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod catalog;
pub mod config;
pub mod crm;
pub mod error;
pub mod server;
pub mod user;
pub mod videohost;

// Re-export commonly used types for convenience
pub use catalog::{CatalogService, CrmMediaSource, Video};
pub use crm::{CrmOAuthClient, CrmQueryClient};
pub use error::{PortalError, PortalResult};
pub use server::{run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{CrmHistorySource, HistorySource};
pub use videohost::{VideoMetadataSource, YouTubeClient};
