//! Provides the managed storage tree that document files are copied into.
//!
//! Ingesting a document takes an arbitrary file supplied by the caller and copies it
//! into a directory hierarchy owned by the application. The copy is named after the
//! document, not after the source file, so that two documents can never collide.
//!
//! # Layout
//!
//! Every managed file lives at
//!
//! ```text
//! <storage-root>/projects/<project-id>/<document-id><extension>
//! ```
//!
//! *   **Storage root:** resolved at call time through a [`Host`]. [`SystemHost`] uses
//!     a configured directory, or the process working directory when none is given.
//! *   **Relative path:** documents only ever record the part below the root, always
//!     with forward slashes and a leading `/` (e.g. `/projects/p1/3f2a….pdf`). Moving
//!     or reconfiguring the root therefore never invalidates stored paths.
//! *   **Extension:** taken verbatim from the final segment of the source path,
//!     including the dot. Files without a dot are stored without an extension.
//!
//! # Overwrite Protection
//!
//! The destination is created with create-new semantics. If a file already exists at
//! the computed path, ingestion fails with [`IngestionError::DestinationExists`] and
//! the existing file is left untouched. Given unique document ids this never happens
//! in normal operation, so hitting it indicates a corrupted storage tree.
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use docket_core::storage::{ingest_file, SystemHost};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = SystemHost::with_root("/var/lib/docket");
//!     let relative = ingest_file(&host, "/tmp/invoice.pdf".as_ref(), "proj-42", "doc-1")?;
//!     assert_eq!(relative, "/projects/proj-42/doc-1.pdf");
//!     Ok(())
//! }
//! ```

pub use self::file::ManagedFile;
pub use self::host::{Host, SystemHost};
pub use self::ingest::{file_extension, ingest_file, managed_path, resolve};

mod file;
mod host;
mod ingest;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the top-level directory below the storage root.
pub const PROJECTS_DIR: &str = "projects";

/// Errors raised while copying a source file into the managed storage tree.
///
/// Any of these aborts the construction of the document that requested the copy.
#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("Source file cannot be read: {path}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination directory cannot be created: {path}")]
    DirectoryUncreatable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination file cannot be written: {path}")]
    DestinationUnwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination file already exists: {0}")]
    DestinationExists(PathBuf),

    #[error("Invalid {kind} for a storage path: {value:?}")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("Storage root cannot be resolved")]
    StorageRoot(#[source] std::io::Error),
}

/// Errors raised when opening a stored document with the system's default handler.
///
/// A missing file is not an error; see [`crate::document::Document::open`].
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("Default handler could not be launched for {path}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage root cannot be resolved")]
    StorageRoot(#[source] std::io::Error),
}
