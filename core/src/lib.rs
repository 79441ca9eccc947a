//! Document records for project cost tracking, with file ingestion into a managed
//! storage tree.

pub mod document;
pub mod storage;

pub use document::Document;
