/// One row per applied migration; the highest `version` is the schema level.
pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    ) STRICT;
";

/// DDL for the full v1 schema.
///
/// Contains two tables:
/// - `sessions`: one row per reviewed repository, keyed by UUID v4 text.
/// - `comments`: review comments anchored to a commit id and a path
///   (a tree path or one of the `/COMMIT_MSG`, `/MERGE_LIST` pseudo-paths).
///   A comment with `start_line` set is a range comment; the four range
///   columns are either all set or all NULL.
///
/// All tables use `STRICT` mode for type enforcement.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS sessions (
        id          TEXT    PRIMARY KEY,
        repo_path   TEXT    NOT NULL,
        created_at  INTEGER NOT NULL,
        updated_at  INTEGER NOT NULL
    ) STRICT;

    CREATE TABLE IF NOT EXISTS comments (
        id           TEXT    PRIMARY KEY,
        session_id   TEXT    NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
        commit_id    TEXT    NOT NULL CHECK(length(commit_id) = 40),
        file_path    TEXT    NOT NULL,
        line_number  INTEGER CHECK(line_number IS NULL OR line_number >= 0),
        start_line   INTEGER,
        start_char   INTEGER,
        end_line     INTEGER,
        end_char     INTEGER,
        body         TEXT    NOT NULL,
        created_at   INTEGER NOT NULL,
        CHECK((start_line IS NULL) = (end_line IS NULL))
    ) STRICT;

    CREATE INDEX IF NOT EXISTS comments_by_session
        ON comments(session_id, created_at);
";

/// Migrations in version order: entry `i` brings the schema to version
/// `i + 1`. Version 1 is the initial sessions + comments layout.
const MIGRATIONS: &[&str] = &[SCHEMA_V1_SQL];

/// Brings the comment database up to the latest schema version.
///
/// Each pending migration runs in its own `BEGIN IMMEDIATE` transaction
/// together with its `schema_version` row, so a crash leaves the database at
/// a whole version.
///
/// # Errors
///
/// Returns `rusqlite::Error` if a migration fails or the version cannot be read.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let current: i64 = db.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    for (version, sql) in (1_i64..).zip(MIGRATIONS) {
        if version <= current {
            continue;
        }
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrate_is_idempotent() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        migrate(&mut db).unwrap();

        let versions: Vec<i64> = db
            .prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(versions.len(), MIGRATIONS.len());
        assert_eq!(versions.last().copied(), Some(MIGRATIONS.len() as i64));
    }

    #[test]
    fn half_range_is_rejected() {
        let mut db = rusqlite::Connection::open_in_memory().unwrap();
        migrate(&mut db).unwrap();
        db.execute(
            "INSERT INTO sessions (id, repo_path, created_at, updated_at) VALUES ('s', '/r', 0, 0)",
            [],
        )
        .unwrap();

        let result = db.execute(
            "INSERT INTO comments (id, session_id, commit_id, file_path, start_line, body, created_at)
             VALUES ('c', 's', ?1, 'a.txt', 3, '', 0)",
            ["a94a8fe5ccb19ba61c4c0873d391e987982fbbd3"],
        );
        assert!(result.is_err());
    }
}
