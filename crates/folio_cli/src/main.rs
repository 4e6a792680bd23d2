//! Folio command-line entry point.
//!
//! # Responsibility
//! - Seed the local document store from JSON exports.
//! - Print grouped/filtered collection views as JSON for quick inspection.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use folio_core::db::open_db;
use folio_core::{
    default_log_level, init_logging, CatalogService, CollectionDefaults, DefaultsTable,
    RefreshOutcome, SqliteDocumentStore, ViewSelector, ViewState, ALL_SELECTOR,
};
use log::info;
use serde_json::{json, Value};

/// Command-line arguments for folio
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Portfolio content store and view inspector")]
#[command(version)]
struct Args {
    /// SQLite document store file
    #[arg(long, default_value = "folio.db", env = "FOLIO_DB")]
    db: PathBuf,

    /// JSON collection defaults overriding the built-in table
    #[arg(long, env = "FOLIO_DEFAULTS")]
    defaults: Option<PathBuf>,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "FOLIO_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// trace|debug|info|warn|error
    #[arg(long, env = "FOLIO_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a JSON array of documents into a collection
    Import {
        collection: String,
        file: PathBuf,
    },
    /// Print the grouped view of a collection
    Show {
        collection: String,
        #[arg(long, default_value = ALL_SELECTOR)]
        category: String,
        #[arg(long, default_value = ALL_SELECTOR)]
        domain: String,
    },
    /// Print category and domain selector values of a collection
    Selectors { collection: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(log_dir) = &args.log_dir {
        let level = args
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| anyhow!("log directory must be valid UTF-8"))?;
        init_logging(&level, log_dir).context("failed to initialize logging")?;
    }

    let table = match &args.defaults {
        Some(path) => DefaultsTable::load(path)
            .with_context(|| format!("failed to load defaults from {}", path.display()))?,
        None => DefaultsTable::builtin(),
    };

    let conn = open_db(&args.db)
        .with_context(|| format!("failed to open document store {}", args.db.display()))?;
    let store = SqliteDocumentStore::new(&conn);

    let output = match args.command {
        Command::Import { collection, file } => import(&store, &collection, &file)?,
        Command::Show {
            collection,
            category,
            domain,
        } => {
            let mut catalog = load_catalog(&store, &table, &collection)?;
            show(&mut catalog, ViewSelector { category, domain })
        }
        Command::Selectors { collection } => {
            let catalog = load_catalog(&store, &table, &collection)?;
            json!({
                "collection": collection,
                "categories": catalog.categories(),
                "domains": catalog.domains(),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn import(store: &SqliteDocumentStore<'_>, collection: &str, file: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let documents: Vec<Value> = serde_json::from_str(&raw)
        .with_context(|| format!("{} must contain a JSON array", file.display()))?;

    let report = store.import_documents(collection, &documents)?;
    info!(
        "event=cli_import module=cli status=ok collection={} written={} skipped={}",
        collection, report.written, report.skipped
    );
    Ok(json!({
        "collection": collection,
        "written": report.written,
        "skipped": report.skipped,
    }))
}

fn load_catalog<'a>(
    store: &'a SqliteDocumentStore<'a>,
    table: &DefaultsTable,
    collection: &str,
) -> Result<CatalogService<&'a SqliteDocumentStore<'a>>> {
    let defaults: CollectionDefaults = table
        .get(collection)
        .cloned()
        .ok_or_else(|| anyhow!("no defaults configured for collection `{collection}`"))?;

    let mut catalog = CatalogService::new(store, defaults);
    match catalog.refresh() {
        RefreshOutcome::Applied { .. } => Ok(catalog),
        RefreshOutcome::Failed | RefreshOutcome::Stale => match catalog.view(&ViewSelector::all())
        {
            ViewState::Failed { message } => bail!("failed to load `{collection}`: {message}"),
            _ => bail!("failed to load `{collection}`"),
        },
    }
}

fn show(catalog: &mut CatalogService<&SqliteDocumentStore<'_>>, selector: ViewSelector) -> Value {
    let snapshot = catalog.snapshot();
    let (state, groups) = match catalog.view(&selector) {
        ViewState::Ready(groups) => ("ready", json!(groups)),
        ViewState::Empty => ("empty", json!([])),
        ViewState::Loading => ("loading", json!([])),
        ViewState::Failed { message } => ("failed", json!({ "message": message })),
    };

    json!({
        "collection": catalog.collection(),
        "version": snapshot.as_ref().map(|snapshot| snapshot.version),
        "skipped": snapshot.as_ref().map(|snapshot| snapshot.skipped),
        "category": selector.category,
        "domain": selector.domain,
        "state": state,
        "groups": groups,
    })
}
