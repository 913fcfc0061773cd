//! Index persistence.
//!
//! Owns schema creation (a full reset per run, never an incremental
//! migration) and the idempotent row writes the build pipeline uses. All
//! rows for one commit are written inside a single transaction; see
//! [`crate::builder`].

use std::path::{Path, PathBuf};

use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, SqliteConnection, Transaction};

use crate::db;
use crate::error::IndexError;
use crate::models::{ChangeRecord, CommitMeta, Symbol};

/// DDL for the index schema, one statement per entry. The database file is
/// recreated from scratch on every build, so nothing here is conditional.
const SCHEMA_SQL: &[&str] = &[
    r#"
    CREATE TABLE commits (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hash TEXT UNIQUE NOT NULL,
        parents TEXT,
        author_name TEXT,
        author_email TEXT,
        authored_at TEXT,
        committer_name TEXT,
        committer_email TEXT,
        committed_at TEXT,
        subject TEXT,
        body TEXT,
        change_summary TEXT
    )
    "#,
    r#"
    CREATE TABLE files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        path TEXT UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE commit_files (
        commit_id INTEGER NOT NULL,
        file_id INTEGER NOT NULL,
        change_type TEXT,
        old_path TEXT,
        additions INTEGER,
        deletions INTEGER,
        PRIMARY KEY (commit_id, file_id),
        FOREIGN KEY (commit_id) REFERENCES commits(id),
        FOREIGN KEY (file_id) REFERENCES files(id)
    )
    "#,
    r#"
    CREATE TABLE commit_symbols (
        commit_id INTEGER NOT NULL,
        file_id INTEGER NOT NULL,
        symbol_name TEXT NOT NULL,
        symbol_kind TEXT,
        PRIMARY KEY (commit_id, file_id, symbol_name, symbol_kind),
        FOREIGN KEY (commit_id) REFERENCES commits(id),
        FOREIGN KEY (file_id) REFERENCES files(id)
    )
    "#,
    // Free-form annotation notes, attachable to a commit and/or file.
    // Passive storage: nothing in the build pipeline writes these.
    r#"
    CREATE TABLE analysis_notes (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        commit_id INTEGER,
        file_id INTEGER,
        note_type TEXT,
        note TEXT NOT NULL,
        tags TEXT,
        created_at TEXT DEFAULT (datetime('now')),
        FOREIGN KEY (commit_id) REFERENCES commits(id),
        FOREIGN KEY (file_id) REFERENCES files(id)
    )
    "#,
    // Named change-set grouping with an ordered changelog of actions.
    // Also passive storage.
    r#"
    CREATE TABLE change_sets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT UNIQUE NOT NULL,
        description TEXT,
        status TEXT,
        created_at TEXT DEFAULT (datetime('now')),
        updated_at TEXT
    )
    "#,
    r#"
    CREATE TABLE change_set_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        change_set_id INTEGER,
        commit_id INTEGER,
        file_id INTEGER,
        action TEXT NOT NULL,
        details TEXT,
        created_at TEXT DEFAULT (datetime('now')),
        FOREIGN KEY (change_set_id) REFERENCES change_sets(id),
        FOREIGN KEY (commit_id) REFERENCES commits(id),
        FOREIGN KEY (file_id) REFERENCES files(id)
    )
    "#,
    "CREATE INDEX idx_commit_files_commit ON commit_files (commit_id)",
    "CREATE INDEX idx_commit_files_file ON commit_files (file_id)",
    "CREATE INDEX idx_commit_symbols_commit ON commit_symbols (commit_id)",
    "CREATE INDEX idx_commit_symbols_file ON commit_symbols (file_id)",
    "CREATE INDEX idx_commit_symbols_name ON commit_symbols (symbol_name)",
    "CREATE INDEX idx_analysis_notes_commit ON analysis_notes (commit_id)",
    "CREATE INDEX idx_analysis_notes_file ON analysis_notes (file_id)",
    "CREATE INDEX idx_change_sets_name ON change_sets (name)",
    "CREATE INDEX idx_change_set_log_set ON change_set_log (change_set_id)",
    "CREATE INDEX idx_change_set_log_commit ON change_set_log (commit_id)",
    "CREATE INDEX idx_change_set_log_file ON change_set_log (file_id)",
];

pub struct IndexStore {
    pool: SqlitePool,
}

impl IndexStore {
    /// Destroy any previous database at `path` and create a fresh schema.
    /// Every build is a full rebuild; there is no incremental path.
    pub async fn create(path: &Path) -> Result<Self, IndexError> {
        remove_if_present(path)?;
        // Stale WAL sidecars would otherwise replay old pages into the
        // fresh database.
        for suffix in ["-wal", "-shm"] {
            remove_if_present(&sidecar_path(path, suffix))?;
        }

        let pool = db::connect(path).await?;
        for statement in SCHEMA_SQL {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Start the transaction that will hold one commit's rows.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, IndexError> {
        Ok(self.pool.begin().await?)
    }

    /// Get-or-create the surrogate id for a path. Stable for the run's
    /// lifetime; the UNIQUE constraint on `files.path` is only a backstop
    /// behind the builder's identity map.
    pub async fn upsert_file(
        &self,
        tx: &mut SqliteConnection,
        path: &str,
    ) -> Result<i64, IndexError> {
        let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM files WHERE path = ?")
            .bind(path)
            .fetch_optional(&mut *tx)
            .await?;
        if let Some(id) = existing {
            return Ok(id);
        }

        let result = sqlx::query("INSERT INTO files (path) VALUES (?)")
            .bind(path)
            .execute(&mut *tx)
            .await?;
        Ok(result.last_insert_rowid())
    }

    /// Insert one commit row. The hash is unique; a duplicate is an
    /// `Integrity` error and aborts the run: a de-duplicated commit listing
    /// should make that impossible, so hitting it signals a real defect.
    pub async fn record_commit(
        &self,
        tx: &mut SqliteConnection,
        meta: &CommitMeta,
    ) -> Result<i64, IndexError> {
        let result = sqlx::query(
            r#"
            INSERT INTO commits (
                hash, parents, author_name, author_email, authored_at,
                committer_name, committer_email, committed_at, subject, body,
                change_summary
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            "#,
        )
        .bind(&meta.hash)
        .bind(&meta.parents)
        .bind(&meta.author_name)
        .bind(&meta.author_email)
        .bind(&meta.authored_at)
        .bind(&meta.committer_name)
        .bind(&meta.committer_email)
        .bind(&meta.committed_at)
        .bind(&meta.subject)
        .bind(&meta.body)
        .execute(&mut *tx)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                IndexError::Integrity {
                    detail: format!("duplicate commit hash {}", meta.hash),
                }
            }
            _ => IndexError::Db(err),
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Upsert-replace keyed by (commit, file); the last write wins.
    pub async fn record_file_change(
        &self,
        tx: &mut SqliteConnection,
        commit_id: i64,
        file_id: i64,
        change: &ChangeRecord,
    ) -> Result<(), IndexError> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO commit_files (
                commit_id, file_id, change_type, old_path, additions, deletions
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(commit_id)
        .bind(file_id)
        .bind(&change.status_raw)
        .bind(&change.old_path)
        .bind(change.additions)
        .bind(change.deletions)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }

    /// Insert-or-ignore keyed by all four fields; duplicates are no-ops.
    pub async fn record_symbol(
        &self,
        tx: &mut SqliteConnection,
        commit_id: i64,
        file_id: i64,
        symbol: &Symbol,
    ) -> Result<(), IndexError> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO commit_symbols (
                commit_id, file_id, symbol_name, symbol_kind
            ) VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(commit_id)
        .bind(file_id)
        .bind(&symbol.name)
        .bind(symbol.kind)
        .execute(&mut *tx)
        .await?;
        Ok(())
    }

    /// Fill in the derived summary once all of the commit's files are
    /// processed.
    pub async fn finalize_commit_summary(
        &self,
        tx: &mut SqliteConnection,
        commit_id: i64,
        summary_json: &str,
    ) -> Result<(), IndexError> {
        sqlx::query("UPDATE commits SET change_summary = ? WHERE id = ?")
            .bind(summary_json)
            .bind(commit_id)
            .execute(&mut *tx)
            .await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn remove_if_present(path: &Path) -> Result<(), IndexError> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

fn sidecar_path(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(suffix);
    PathBuf::from(os)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChangeRecord, Symbol};

    fn sample_meta(hash: &str) -> CommitMeta {
        CommitMeta {
            hash: hash.to_string(),
            parents: String::new(),
            author_name: "Alice".to_string(),
            author_email: "alice@example.com".to_string(),
            authored_at: "2024-01-01T00:00:00+00:00".to_string(),
            committer_name: "Alice".to_string(),
            committer_email: "alice@example.com".to_string(),
            committed_at: "2024-01-01T00:00:00+00:00".to_string(),
            subject: "initial".to_string(),
            body: String::new(),
        }
    }

    fn sample_change(path: &str) -> ChangeRecord {
        ChangeRecord {
            code: 'A',
            status_raw: "A".to_string(),
            file_path: path.to_string(),
            path: path.to_string(),
            old_path: None,
            additions: Some(1),
            deletions: Some(0),
        }
    }

    async fn fresh_store(tmp: &tempfile::TempDir) -> IndexStore {
        IndexStore::create(&tmp.path().join("index.db")).await.unwrap()
    }

    #[tokio::test]
    async fn create_resets_prior_content() {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("index.db");

        let store = IndexStore::create(&db_path).await.unwrap();
        let mut tx = store.begin().await.unwrap();
        store.record_commit(&mut tx, &sample_meta("aaa")).await.unwrap();
        tx.commit().await.unwrap();
        store.close().await;

        // A second create starts from zero rows.
        let store = IndexStore::create(&db_path).await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commits")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
        store.close().await;
    }

    #[tokio::test]
    async fn duplicate_commit_hash_is_integrity_error() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh_store(&tmp).await;

        let mut tx = store.begin().await.unwrap();
        store.record_commit(&mut tx, &sample_meta("aaa")).await.unwrap();
        let err = store
            .record_commit(&mut tx, &sample_meta("aaa"))
            .await
            .unwrap_err();
        assert!(matches!(err, IndexError::Integrity { .. }));
        assert!(err.to_string().contains("aaa"));
    }

    #[tokio::test]
    async fn upsert_file_is_stable_for_a_path() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh_store(&tmp).await;

        let mut tx = store.begin().await.unwrap();
        let first = store.upsert_file(&mut tx, "src/main.rs").await.unwrap();
        let second = store.upsert_file(&mut tx, "src/main.rs").await.unwrap();
        let other = store.upsert_file(&mut tx, "src/lib.rs").await.unwrap();
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[tokio::test]
    async fn record_file_change_last_write_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh_store(&tmp).await;

        let mut tx = store.begin().await.unwrap();
        let commit_id = store.record_commit(&mut tx, &sample_meta("aaa")).await.unwrap();
        let file_id = store.upsert_file(&mut tx, "a.go").await.unwrap();

        store
            .record_file_change(&mut tx, commit_id, file_id, &sample_change("a.go"))
            .await
            .unwrap();
        let mut replacement = sample_change("a.go");
        replacement.status_raw = "M".to_string();
        replacement.additions = Some(7);
        store
            .record_file_change(&mut tx, commit_id, file_id, &replacement)
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let (change_type, additions): (String, Option<i64>) = sqlx::query_as(
            "SELECT change_type, additions FROM commit_files WHERE commit_id = ? AND file_id = ?",
        )
        .bind(commit_id)
        .bind(file_id)
        .fetch_one(&store.pool)
        .await
        .unwrap();
        assert_eq!(change_type, "M");
        assert_eq!(additions, Some(7));
    }

    #[tokio::test]
    async fn record_symbol_duplicates_are_no_ops() {
        let tmp = tempfile::tempdir().unwrap();
        let store = fresh_store(&tmp).await;

        let mut tx = store.begin().await.unwrap();
        let commit_id = store.record_commit(&mut tx, &sample_meta("aaa")).await.unwrap();
        let file_id = store.upsert_file(&mut tx, "a.go").await.unwrap();
        let symbol = Symbol {
            name: "Foo".to_string(),
            kind: "func",
        };
        store.record_symbol(&mut tx, commit_id, file_id, &symbol).await.unwrap();
        store.record_symbol(&mut tx, commit_id, file_id, &symbol).await.unwrap();
        tx.commit().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commit_symbols")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }
}
