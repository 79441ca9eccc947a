use std::path::{Path, PathBuf};

use crate::AppContext;
use crate::cli::{CreateArgs, ImportArgs, OpenArgs, ShowArgs};
use anyhow::{Context, Result};
use docket_core::Document;
use docket_core::storage::IngestionError;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

// --- Handler Functions ---

pub fn handle_create(args: CreateArgs) -> Result<()> {
    let record = args.record;
    let doc =
        Document::new(args.name, record.description, record.project, record.user, record.cost);
    info!(id = %doc.id(), "Created document without file");
    println!("{}", doc.to_json());
    Ok(())
}

/// Ingests every path on tokio's blocking pool and prints the documents in input order.
///
/// Each file gets its own document id, so the copies never touch the same destination.
pub async fn handle_import(args: ImportArgs, cx: &AppContext) -> Result<()> {
    let record = args.record;
    let total = args.paths.len();
    let mut tasks = JoinSet::new();

    for (idx, path) in args.paths.into_iter().enumerate() {
        let host = cx.host.clone();
        let name = args.name.clone().unwrap_or_else(|| default_name(&path));
        let description = record.description.clone();
        let project = record.project.clone();
        let user = record.user.clone();
        let cost = record.cost;

        tasks.spawn_blocking(move || {
            let result = Document::ingest(name, description, project, user, cost, &path, &*host);
            (idx, path, result)
        });
    }

    let mut results: Vec<Option<(PathBuf, Result<Document, IngestionError>)>> =
        (0..total).map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        let (idx, path, result) = joined.context("Import task panicked")?;
        results[idx] = Some((path, result));
    }

    let mut failures = 0;
    for (path, result) in results.into_iter().flatten() {
        match result {
            Ok(doc) => {
                debug!(id = %doc.id(), "Imported {}", path.display());
                println!("{}", doc.to_json());
            }
            Err(e) => {
                failures += 1;
                let e = anyhow::Error::from(e);
                error!("Failed to import {}: {:#}", path.display(), e);
                eprintln!("  Failed: {}: {:#}", path.display(), e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} imports failed", failures, total);
    }
    Ok(())
}

pub fn handle_show(args: ShowArgs) -> Result<()> {
    let doc = load_document(&args.record)?;
    if args.json {
        println!("{}", doc.to_json_pretty());
    } else {
        print!("{}", doc);
    }
    Ok(())
}

pub fn handle_open(args: OpenArgs, cx: &AppContext) -> Result<()> {
    let doc = load_document(&args.record)?;
    if doc.open(&*cx.host)? {
        println!("  Opened document {}", doc.id());
    } else {
        println!("  No stored file for document {}", doc.id());
    }
    Ok(())
}

/// Reads a document serialized with [`Document::to_json`] from `path`.
pub fn load_document(path: &Path) -> Result<Document> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let doc = Document::from_json(&json)
        .with_context(|| format!("Failed to parse document in {}", path.display()))?;
    Ok(doc)
}

fn default_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "untitled".to_string())
}
