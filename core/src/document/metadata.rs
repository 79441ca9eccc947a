use std::io::Write;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{DATE_FORMAT, Document};

/// Serialized form of a [`Document`], the contract shared with persistence layers.
///
/// Every value is a string. The cost keeps its exact decimal digits and the date is
/// written as `YYYY-MM-DD`. `filePath` is `null` for documents without a stored file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub id: String,
    #[serde(rename = "totalCost")]
    pub total_cost: String,
    #[serde(rename = "documentDescription")]
    pub description: String,
    #[serde(rename = "projectID")]
    pub project_id: String,
    pub date: String,
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "documentName")]
    pub name: String,
    #[serde(rename = "filePath", default)]
    pub storage_path: Option<String>,
}

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Metadata serialization/deserialization error")]
    Json(#[from] serde_json::Error),

    #[error("Invalid total cost: {value}")]
    InvalidCost {
        value: String,
        #[source]
        source: rust_decimal::Error,
    },

    #[error("Invalid date, expected YYYY-MM-DD: {value}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

impl From<&Document> for DocumentMetadata {
    fn from(doc: &Document) -> Self {
        DocumentMetadata {
            id: doc.id.clone(),
            total_cost: doc.total_cost.to_string(),
            description: doc.description.clone(),
            project_id: doc.project_id.clone(),
            date: doc.date.format(DATE_FORMAT).to_string(),
            user_id: doc.user_id.clone(),
            name: doc.name.clone(),
            storage_path: doc.storage_path.clone(),
        }
    }
}

impl TryFrom<DocumentMetadata> for Document {
    type Error = MetadataError;

    fn try_from(metadata: DocumentMetadata) -> Result<Self, Self::Error> {
        let total_cost = Decimal::from_str(&metadata.total_cost).map_err(|e| {
            MetadataError::InvalidCost { value: metadata.total_cost.clone(), source: e }
        })?;
        let date = NaiveDate::parse_from_str(&metadata.date, DATE_FORMAT).map_err(|e| {
            MetadataError::InvalidDate { value: metadata.date.clone(), source: e }
        })?;

        Ok(Document::rehydrate(
            metadata.name,
            metadata.description,
            metadata.project_id,
            metadata.user_id,
            total_cost,
            metadata.id,
            date,
            metadata.storage_path,
        ))
    }
}

impl Document {
    /// Returns the serialized metadata of this document.
    pub fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata::from(self)
    }

    /// Serializes the document to compact JSON.
    pub fn to_json(&self) -> String {
        // A struct of plain strings always serializes
        serde_json::to_string(&self.metadata()).expect("Internal error: metadata not serializable")
    }

    /// Serializes the document to indented JSON.
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.metadata())
            .expect("Internal error: metadata not serializable")
    }

    /// Writes the document as compact JSON to `writer`.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<(), MetadataError> {
        serde_json::to_writer(writer, &self.metadata())?;
        Ok(())
    }

    /// Parses a document previously produced by [`Document::to_json`].
    ///
    /// Like [`Document::rehydrate`], this performs no file I/O.
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        let metadata: DocumentMetadata = serde_json::from_str(json)?;
        Document::try_from(metadata)
    }
}
