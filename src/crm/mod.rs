//! Clients for the CRM's REST surface.
//!
//! The CRM speaks the Salesforce dialect: OAuth2 token grants carry an
//! `instance_url` rider, data queries are SOQL strings sent to
//! `/services/data/{version}/query`, and token introspection lives under the
//! instance URL rather than the login host.

mod oauth;
mod query;

pub use oauth::{CrmOAuthClient, TokenResponse};
pub use query::{CrmQueryClient, QueryResponse};
