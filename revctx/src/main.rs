//! revctx: show the source lines around review comments.
//!
//! Comments are stored per repository in a WAL-mode SQLite database
//! (`revctx-core::db`). `show` resolves the context of every stored comment
//! against the repository's object database on a pool of worker threads;
//! `context` resolves a single ad-hoc comment.
//!
//! stdout carries only command output. Logs go to stderr, filtered by
//! `RUST_LOG` or the config file's `log` key.

mod cli;
mod config;
mod render;

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use revctx_core::db::{self, Connection};
use revctx_core::{Comment, ContextLoader, GitStore, ParallelContextLoader, StoreSource};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{AnchorArgs, Args, Command};

/// Installs the stderr fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter`; an invalid filter falls back to `info`.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::load();
    init_tracing(&config.log);

    let repo = args
        .repo
        .canonicalize()
        .with_context(|| format!("repository path {:?}", args.repo))?;
    let db_path = args.db.clone().unwrap_or_else(|| config.db_path.clone());

    match args.command {
        Command::Add { rev, path, body, anchor } => {
            add(&repo, &db_path, &rev, path, body, anchor).await
        }
        Command::Show { padding, workers } => {
            let padding = padding.unwrap_or(config.context_padding);
            let workers = workers.unwrap_or(config.workers);
            show(repo, &db_path, padding, workers).await
        }
        Command::Context { rev, path, anchor, padding } => {
            let padding = padding.unwrap_or(config.context_padding);
            context(repo, rev, path, anchor, padding).await
        }
    }
}

/// Opens the comment database, creating its directory first.
async fn open_comment_db(db_path: &Path) -> anyhow::Result<Connection> {
    if let Some(dir) = db_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {:?}", dir))?;
    }
    let path = db_path.to_string_lossy();
    db::open_db(&path).await.with_context(|| format!("opening database {path}"))
}

async fn add(
    repo: &Path,
    db_path: &Path,
    rev: &str,
    path: String,
    body: String,
    anchor: AnchorArgs,
) -> anyhow::Result<()> {
    let commit_id = GitStore::open(repo)?
        .resolve_spec(rev)
        .with_context(|| format!("resolving revision `{rev}`"))?;
    let comment = anchor.apply(Comment::new(commit_id, path).with_body(body));

    let conn = open_comment_db(db_path).await?;
    let session = db::detect_or_create_session(&conn, &repo.to_string_lossy()).await?;
    db::add_comment(&conn, &session.id, &comment).await?;
    info!(session = %session.id, comment = %comment.id, "stored comment");

    println!("{}", comment.id);
    Ok(())
}

async fn show(repo: PathBuf, db_path: &Path, padding: u32, workers: usize) -> anyhow::Result<()> {
    let conn = open_comment_db(db_path).await?;
    let Some(session) = db::find_session(&conn, &repo.to_string_lossy()).await? else {
        info!(repo = %repo.display(), "no comments stored for repository");
        return Ok(());
    };
    let comments = db::load_comments(&conn, &session.id).await?;
    info!(session = %session.id, comments = comments.len(), "loaded comments");

    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let loader = ParallelContextLoader::new(|| GitStore::open(&repo).map(StoreSource::new))
            .workers(workers)
            .with_padding(padding);
        let contexts = loader.get_context(&comments)?;
        render::write_all(&mut std::io::stdout().lock(), &comments, &contexts)?;
        Ok(())
    })
    .await??;

    db::update_session_timestamp(&conn, &session.id).await?;
    Ok(())
}

async fn context(
    repo: PathBuf,
    rev: String,
    path: String,
    anchor: AnchorArgs,
    padding: u32,
) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let store = GitStore::open(&repo)?;
        let commit_id = store
            .resolve_spec(&rev)
            .with_context(|| format!("resolving revision `{rev}`"))?;
        let comment = anchor.apply(Comment::new(commit_id, path));

        let loader = ContextLoader::new(StoreSource::new(store)).with_padding(padding);
        let contexts = loader.get_context([&comment])?;
        render::write_all(&mut std::io::stdout().lock(), std::slice::from_ref(&comment), &contexts)?;
        Ok(())
    })
    .await?
}

