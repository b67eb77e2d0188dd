//! Persistent review comments in a WAL-mode SQLite database.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use git2::Oid;
use rusqlite::types::Type;
use rusqlite::OptionalExtension;
pub use tokio_rusqlite::Connection;

use crate::types::{Comment, CommentRange, Session};

/// Opens (or creates) the SQLite database at `path`, configures WAL mode,
/// and applies schema migrations via the `schema_version` table.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the file cannot be opened, WAL configuration
/// fails, or schema DDL fails.
pub async fn open_db(path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let conn = Connection::open(path).await?;

    conn.call(|db| {
        db.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )?;
        // busy_timeout via Connection method (not PRAGMA string).
        db.busy_timeout(Duration::from_secs(5))?;
        crate::schema::migrate(db)?;
        Ok(())
    })
    .await?;

    Ok(conn)
}

/// Returns the current Unix timestamp in seconds.
fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// The most recently used session of `repo_path`, if any.
fn latest_session(db: &rusqlite::Connection, repo_path: &str) -> rusqlite::Result<Option<Session>> {
    db.query_row(
        "SELECT id, repo_path, created_at, updated_at
         FROM sessions
         WHERE repo_path = ?1
         ORDER BY updated_at DESC
         LIMIT 1",
        rusqlite::params![repo_path],
        |r| {
            Ok(Session {
                id: r.get(0)?,
                repo_path: r.get(1)?,
                created_at: r.get(2)?,
                updated_at: r.get(3)?,
            })
        },
    )
    .optional()
}

/// Looks up the most recent session for `repo_path` without creating or
/// touching one.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails.
pub async fn find_session(
    conn: &Connection,
    repo_path: &str,
) -> Result<Option<Session>, tokio_rusqlite::Error> {
    let repo_path = repo_path.to_owned();
    conn.call(move |db| latest_session(db, &repo_path)).await
}

/// Finds the most recent session for `repo_path`, or creates one.
///
/// On resume: updates `updated_at` to the current time via `BEGIN IMMEDIATE`.
/// On create: generates a new UUID v4, inserts the session via `BEGIN IMMEDIATE`.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query or write transaction fails.
pub async fn detect_or_create_session(
    conn: &Connection,
    repo_path: &str,
) -> Result<Session, tokio_rusqlite::Error> {
    let repo_path = repo_path.to_owned();

    conn.call(move |db| {
        let existing = latest_session(db, &repo_path)?;

        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        let session = match existing {
            Some(session) => {
                tx.execute(
                    "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
                    rusqlite::params![now, &session.id],
                )?;
                Session { updated_at: now, ..session }
            }
            None => {
                let id = uuid::Uuid::new_v4().to_string();
                tx.execute(
                    "INSERT INTO sessions (id, repo_path, created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?3)",
                    rusqlite::params![&id, &repo_path, now],
                )?;
                Session { id, repo_path, created_at: now, updated_at: now }
            }
        };
        tx.commit()?;
        Ok(session)
    })
    .await
}

/// Stores `comment` in `session_id`.
///
/// Range comments store all four range columns; other comments store NULLs.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the insert fails, including when a
/// comment with the same id already exists.
pub async fn add_comment(
    conn: &Connection,
    session_id: &str,
    comment: &Comment,
) -> Result<(), tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();
    let comment = comment.clone();

    conn.call(move |db| {
        let range = comment.range;
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "INSERT INTO comments (id, session_id, commit_id, file_path, line_number,
                                   start_line, start_char, end_line, end_char,
                                   body, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            rusqlite::params![
                &comment.id,
                &session_id,
                comment.commit_id.to_string(),
                &comment.file_path,
                comment.line_number,
                range.map(|r| r.start_line),
                range.map(|r| r.start_char),
                range.map(|r| r.end_line),
                range.map(|r| r.end_char),
                &comment.body,
                now_secs(),
            ],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}

/// Loads every comment of `session_id`, oldest first.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the query fails or a stored commit id
/// is not valid hex.
pub async fn load_comments(
    conn: &Connection,
    session_id: &str,
) -> Result<Vec<Comment>, tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();

    conn.call(move |db| {
        let mut stmt = db.prepare(
            "SELECT id, commit_id, file_path, line_number,
                    start_line, start_char, end_line, end_char, body
             FROM comments
             WHERE session_id = ?1
             ORDER BY created_at, rowid",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![&session_id], comment_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    })
    .await
}

fn comment_from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Comment> {
    let commit_hex: String = r.get(1)?;
    let commit_id = Oid::from_str(&commit_hex)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let range = match (r.get::<_, Option<u32>>(4)?, r.get::<_, Option<u32>>(6)?) {
        (Some(start_line), Some(end_line)) => Some(CommentRange {
            start_line,
            start_char: r.get::<_, Option<u32>>(5)?.unwrap_or(0),
            end_line,
            end_char: r.get::<_, Option<u32>>(7)?.unwrap_or(0),
        }),
        _ => None,
    };

    Ok(Comment {
        id: r.get(0)?,
        commit_id,
        file_path: r.get(2)?,
        line_number: r.get(3)?,
        range,
        body: r.get(8)?,
    })
}

/// Updates the `updated_at` timestamp for `session_id` to the current time.
///
/// # Errors
///
/// Returns `tokio_rusqlite::Error` if the `BEGIN IMMEDIATE` transaction fails.
pub async fn update_session_timestamp(
    conn: &Connection,
    session_id: &str,
) -> Result<(), tokio_rusqlite::Error> {
    let session_id = session_id.to_owned();

    conn.call(move |db| {
        let now = now_secs();
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute(
            "UPDATE sessions SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![now, &session_id],
        )?;
        tx.commit()?;
        Ok(())
    })
    .await
}
