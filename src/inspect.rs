//! Read-only index inspection.
//!
//! Thin query wrappers over an already-built index: list commits, show one
//! commit in full, trace a file's history, look up a symbol name, and print
//! database stats. Nothing here writes; every run of `cidx build` replaces
//! the database these commands read.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;

async fn open(config: &Config) -> Result<SqlitePool> {
    if !config.db.path.exists() {
        bail!(
            "index not found at {} (run `cidx build` first)",
            config.db.path.display()
        );
    }
    Ok(db::connect(&config.db.path).await?)
}

/// `cidx commits`: newest-first listing.
pub async fn run_commits(config: &Config, limit: i64) -> Result<()> {
    let pool = open(config).await?;

    let rows = sqlx::query(
        r#"
        SELECT hash, authored_at, author_name, subject
        FROM commits
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(&pool)
    .await?;

    for row in &rows {
        let hash: String = row.get("hash");
        let authored_at: String = row.get("authored_at");
        let author: String = row.get("author_name");
        let subject: String = row.get("subject");
        println!(
            "{}  {}  {:<20}  {}",
            short_hash(&hash),
            authored_at,
            author,
            subject
        );
    }

    pool.close().await;
    Ok(())
}

/// `cidx show <hash>`: one commit's metadata, summary, change records, and
/// symbols. Accepts an unambiguous hash prefix.
pub async fn run_show(config: &Config, hash: &str) -> Result<()> {
    let pool = open(config).await?;

    let commit_rows = sqlx::query(
        r#"
        SELECT id, hash, parents, author_name, author_email, authored_at,
               committer_name, committer_email, committed_at, subject, body,
               change_summary
        FROM commits
        WHERE hash LIKE ?
        ORDER BY id
        "#,
    )
    .bind(format!("{}%", hash))
    .fetch_all(&pool)
    .await?;

    let commit = match commit_rows.as_slice() {
        [] => {
            pool.close().await;
            bail!("no commit matching '{}'", hash);
        }
        [row] => row,
        _ => {
            pool.close().await;
            bail!("'{}' is ambiguous: {} commits match", hash, commit_rows.len());
        }
    };

    let commit_id: i64 = commit.get("id");
    let full_hash: String = commit.get("hash");
    let parents: String = commit.get("parents");
    let body: String = commit.get("body");

    println!("--- Commit ---");
    println!("hash:         {}", full_hash);
    if !parents.is_empty() {
        println!("parents:      {}", parents);
    }
    println!(
        "author:       {} <{}>",
        commit.get::<String, _>("author_name"),
        commit.get::<String, _>("author_email")
    );
    println!("authored_at:  {}", commit.get::<String, _>("authored_at"));
    println!(
        "committer:    {} <{}>",
        commit.get::<String, _>("committer_name"),
        commit.get::<String, _>("committer_email")
    );
    println!("committed_at: {}", commit.get::<String, _>("committed_at"));
    println!("subject:      {}", commit.get::<String, _>("subject"));
    if !body.is_empty() {
        println!();
        println!("{}", body);
    }

    if let Some(summary) = commit.get::<Option<String>, _>("change_summary") {
        println!();
        println!("--- Summary ---");
        println!("{}", summary);
    }

    let change_rows = sqlx::query(
        r#"
        SELECT f.path, cf.change_type, cf.old_path, cf.additions, cf.deletions
        FROM commit_files cf
        JOIN files f ON f.id = cf.file_id
        WHERE cf.commit_id = ?
        ORDER BY f.path
        "#,
    )
    .bind(commit_id)
    .fetch_all(&pool)
    .await?;

    println!();
    println!("--- Changes ({}) ---", change_rows.len());
    for row in &change_rows {
        let path: String = row.get("path");
        let change_type: String = row.get("change_type");
        let old_path: Option<String> = row.get("old_path");
        let additions: Option<i64> = row.get("additions");
        let deletions: Option<i64> = row.get("deletions");

        let origin = match (&old_path, change_type.starts_with('D')) {
            (Some(old), false) => format!("  (from {})", old),
            _ => String::new(),
        };
        println!(
            "{:<4} +{:<6} -{:<6} {}{}",
            change_type,
            count_display(additions),
            count_display(deletions),
            path,
            origin
        );
    }

    let symbol_rows = sqlx::query(
        r#"
        SELECT f.path, cs.symbol_name, cs.symbol_kind
        FROM commit_symbols cs
        JOIN files f ON f.id = cs.file_id
        WHERE cs.commit_id = ?
        ORDER BY f.path, cs.symbol_name
        "#,
    )
    .bind(commit_id)
    .fetch_all(&pool)
    .await?;

    if !symbol_rows.is_empty() {
        println!();
        println!("--- Symbols ({}) ---", symbol_rows.len());
        for row in &symbol_rows {
            println!(
                "{:<8} {:<30} {}",
                row.get::<String, _>("symbol_kind"),
                row.get::<String, _>("symbol_name"),
                row.get::<String, _>("path")
            );
        }
    }

    pool.close().await;
    Ok(())
}

/// `cidx file-history <path>`: commits that touched a path, oldest first.
pub async fn run_file_history(config: &Config, path: &str) -> Result<()> {
    let pool = open(config).await?;

    let rows = sqlx::query(
        r#"
        SELECT c.hash, c.authored_at, c.subject, cf.change_type,
               cf.additions, cf.deletions
        FROM commit_files cf
        JOIN files f ON f.id = cf.file_id
        JOIN commits c ON c.id = cf.commit_id
        WHERE f.path = ?
        ORDER BY c.id
        "#,
    )
    .bind(path)
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        pool.close().await;
        bail!("no history for '{}'", path);
    }

    for row in &rows {
        let hash: String = row.get("hash");
        println!(
            "{}  {:<4} +{:<6} -{:<6} {}  {}",
            short_hash(&hash),
            row.get::<String, _>("change_type"),
            count_display(row.get("additions")),
            count_display(row.get("deletions")),
            row.get::<String, _>("authored_at"),
            row.get::<String, _>("subject")
        );
    }

    pool.close().await;
    Ok(())
}

/// `cidx symbol <name>`: commits and files declaring a symbol name.
pub async fn run_symbol(config: &Config, name: &str) -> Result<()> {
    let pool = open(config).await?;

    let rows = sqlx::query(
        r#"
        SELECT c.hash, f.path, cs.symbol_kind
        FROM commit_symbols cs
        JOIN files f ON f.id = cs.file_id
        JOIN commits c ON c.id = cs.commit_id
        WHERE cs.symbol_name = ?
        ORDER BY c.id, f.path
        "#,
    )
    .bind(name)
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        pool.close().await;
        bail!("no symbol named '{}'", name);
    }

    for row in &rows {
        let hash: String = row.get("hash");
        println!(
            "{}  {:<8} {}",
            short_hash(&hash),
            row.get::<String, _>("symbol_kind"),
            row.get::<String, _>("path")
        );
    }

    pool.close().await;
    Ok(())
}

/// `cidx stats`: row counts and database size.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = open(config).await?;

    let commits: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commits")
        .fetch_one(&pool)
        .await?;
    let files: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files")
        .fetch_one(&pool)
        .await?;
    let changes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commit_files")
        .fetch_one(&pool)
        .await?;
    let symbols: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM commit_symbols")
        .fetch_one(&pool)
        .await?;
    let distinct_symbols: i64 =
        sqlx::query_scalar("SELECT COUNT(DISTINCT symbol_name) FROM commit_symbols")
            .fetch_one(&pool)
            .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Commit Index — Database Stats");
    println!("=============================");
    println!();
    println!("  Database:        {}", config.db.path.display());
    println!("  Size:            {}", format_bytes(db_size));
    println!();
    println!("  Commits:         {}", commits);
    println!("  Files:           {}", files);
    println!("  Change records:  {}", changes);
    println!("  Symbol records:  {}", symbols);
    println!("  Distinct names:  {}", distinct_symbols);
    println!();

    pool.close().await;
    Ok(())
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(12)]
}

/// Render an addition/deletion count; `-` marks "not applicable" (binary).
fn count_display(count: Option<i64>) -> String {
    match count {
        Some(n) => n.to_string(),
        None => "-".to_string(),
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_truncates_long_hashes() {
        assert_eq!(short_hash("0123456789abcdef0123"), "0123456789ab");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn count_display_distinguishes_binary_from_zero() {
        assert_eq!(count_display(Some(0)), "0");
        assert_eq!(count_display(None), "-");
    }

    #[test]
    fn format_bytes_scales() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
    }
}
