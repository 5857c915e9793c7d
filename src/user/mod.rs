//! Per-user state pulled from the CRM: which videos were watched and which
//! media items were purchased. Both feeds join back to the catalog through
//! the host resource id.

mod history;
mod models;

pub use history::{CrmHistorySource, HistorySource};
pub use models::{parse_crm_datetime, HistoryEntry, UserHistory};
