mod cache;
mod models;
mod parser;
mod service;
mod source;

pub use cache::MetadataCache;
pub use models::{EventRef, MediaRecord, Thumbnail, ThumbnailSet, Video};
pub use parser::VideoDataParser;
pub use service::{CatalogService, CatalogSnapshot, MediaRecordSource, MEDIA_QUERY};
pub use source::CrmMediaSource;
