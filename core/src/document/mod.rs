//! The document record: metadata describing one file filed against a project.
//!
//! A [`Document`] is created in exactly one of three ways:
//!
//! *   [`Document::new`] for a record without a file. The storage path is absent.
//! *   [`Document::ingest`] for a record backed by a caller-supplied file, which is
//!     copied into the managed storage tree before the record is returned.
//! *   [`Document::rehydrate`] (or [`Document::from_json`]) to rebuild a record from
//!     persisted values. Nothing is generated and no file is touched.
//!
//! The id, project, user and date are fixed once the record exists. Name,
//! description, cost and storage path can be changed through setters.

pub use self::metadata::{DocumentMetadata, MetadataError};

mod metadata;

use std::fmt;
use std::io;
use std::path::Path;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::storage::{self, Host, IngestionError, ManagedFile, OpenError};

/// Format used for dates in every textual form of a document.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    id: String,
    name: String,
    description: String,
    project_id: String,
    user_id: String,
    total_cost: Decimal,
    date: NaiveDate,
    // Relative to the storage root, `None` until a file is ingested
    storage_path: Option<String>,
}

impl Document {
    /// Creates a new document without a stored file, dated today.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        total_cost: Decimal,
    ) -> Self {
        Document {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            total_cost,
            date: Local::now().date_naive(),
            storage_path: None,
        }
    }

    /// Creates a new document, dated today, and copies `source` into managed storage.
    ///
    /// The stored copy is named after the project and the new document id, keeping the
    /// source's extension.
    ///
    /// # Errors
    ///
    /// Returns an [`IngestionError`] if the source cannot be read or the copy cannot be
    /// written. No document is produced in that case.
    #[instrument(skip_all, fields(source = %source.as_ref().display()))]
    pub fn ingest<H: Host + ?Sized>(
        name: impl Into<String>,
        description: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        total_cost: Decimal,
        source: impl AsRef<Path>,
        host: &H,
    ) -> Result<Self, IngestionError> {
        let mut doc = Document::new(name, description, project_id, user_id, total_cost);
        let path = storage::ingest_file(host, source.as_ref(), &doc.project_id, &doc.id)?;
        debug!(id = %doc.id, "Document created with stored file {}", path);
        doc.storage_path = Some(path);
        Ok(doc)
    }

    /// Rebuilds a document from previously persisted values.
    ///
    /// Values are taken as given; nothing is generated, validated or read from disk.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        name: impl Into<String>,
        description: impl Into<String>,
        project_id: impl Into<String>,
        user_id: impl Into<String>,
        total_cost: Decimal,
        id: impl Into<String>,
        date: NaiveDate,
        storage_path: Option<String>,
    ) -> Self {
        Document {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            project_id: project_id.into(),
            user_id: user_id.into(),
            total_cost,
            date,
            storage_path,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn total_cost(&self) -> Decimal {
        self.total_cost
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the stored file's path relative to the storage root, if there is one.
    pub fn storage_path(&self) -> Option<&str> {
        self.storage_path.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_total_cost(&mut self, total_cost: Decimal) {
        self.total_cost = total_cost;
    }

    pub fn set_storage_path(&mut self, storage_path: Option<String>) {
        self.storage_path = storage_path;
    }

    /// Resolves the stored file against the host's storage root.
    ///
    /// Returns `Ok(None)` without consulting the host when the document has no file.
    pub fn managed_file<H: Host + ?Sized>(&self, host: &H) -> io::Result<Option<ManagedFile>> {
        match &self.storage_path {
            Some(relative) => {
                let root = host.storage_root()?;
                Ok(Some(ManagedFile::new(&root, relative)))
            }
            None => Ok(None),
        }
    }

    /// Opens the stored file with the operating system's default handler.
    ///
    /// Returns `Ok(false)` if the document has no stored file or the file is missing
    /// from the storage tree, and `Ok(true)` once the handler has been launched.
    ///
    /// # Errors
    ///
    /// Returns [`OpenError::Launch`] if the file exists but the handler cannot be
    /// launched.
    #[instrument(skip_all, fields(id = %self.id))]
    pub fn open<H: Host + ?Sized>(&self, host: &H) -> Result<bool, OpenError> {
        let Some(file) = self.managed_file(host).map_err(OpenError::StorageRoot)? else {
            debug!("Document has no stored file");
            return Ok(false);
        };

        if !file.exists() {
            debug!("Stored file not found at {}", file.path().display());
            return Ok(false);
        }

        host.launch_default(file.path()).map_err(|e| OpenError::Launch {
            path: file.path().to_path_buf(),
            source: e,
        })?;
        debug!("Opened {}", file.path().display());
        Ok(true)
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "id: {}|documentName:{}|documentDescription:{}|projectID:{}|userID:{}|totalCost:{}|filePath:{}|date:{}",
            self.id,
            self.name,
            self.description,
            self.project_id,
            self.user_id,
            self.total_cost,
            self.storage_path.as_deref().unwrap_or(""),
            self.date.format(DATE_FORMAT),
        )
    }
}
