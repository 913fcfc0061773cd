//! Core data types used throughout Commit Index.
//!
//! These types represent the commit metadata, change records, and symbols
//! that flow from the repository reader through the parser into the store.

use serde::Serialize;

/// Fixed-field commit metadata decoded from the backend's NUL-separated
/// record. Timestamps are RFC 3339 UTC strings, or the raw field verbatim
/// when it was not numeric.
#[derive(Debug, Clone)]
pub struct CommitMeta {
    pub hash: String,
    /// Space-joined parent hashes, empty for a root commit.
    pub parents: String,
    pub author_name: String,
    pub author_email: String,
    pub authored_at: String,
    pub committer_name: String,
    pub committer_email: String,
    pub committed_at: String,
    pub subject: String,
    pub body: String,
}

/// One record from the NUL-delimited `--name-status` stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Single-letter status classification (A, M, D, R, C, T, ...).
    pub code: char,
    /// Similarity score suffix for rename/copy codes, empty otherwise.
    pub score: String,
    /// The full status token as emitted, e.g. `R100`.
    pub status_raw: String,
    /// Resulting path of the change.
    pub path: String,
    /// Original path for renames and copies. For deletions this is the
    /// deleted path itself, the only path still meaningful afterwards.
    pub old_path: Option<String>,
}

/// Numeric change stats for one resulting path. `None` counts mean the
/// backend reported the file as binary; that is distinct from zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumstatEntry {
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
    pub old_path: Option<String>,
}

/// A status entry joined with its numstat counts; one row of `commit_files`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub code: char,
    /// Raw status token persisted as the change type (may carry a score).
    pub status_raw: String,
    /// The path that identifies the file entity for this record: the
    /// original path for deletions, the resulting path for everything else.
    pub file_path: String,
    /// Resulting path as reported by the status stream.
    pub path: String,
    pub old_path: Option<String>,
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
}

/// A declared symbol found by the heuristic scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub kind: &'static str,
}

/// A `{from, to}` pair for renamed or copied paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenamePair {
    pub from: String,
    pub to: String,
}

/// Per-commit change summary persisted as JSON on the commit row once all of
/// the commit's files are processed. Declaration order is the serialized key
/// order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeSummary {
    pub added: Vec<String>,
    pub copied: Vec<RenamePair>,
    pub deleted: Vec<String>,
    pub modified: Vec<String>,
    pub renamed: Vec<RenamePair>,
}

impl ChangeSummary {
    /// Fold one change record into the summary. Codes outside A/M/D/R/C do
    /// not contribute.
    pub fn record(&mut self, change: &ChangeRecord) {
        match change.code {
            'A' => self.added.push(change.path.clone()),
            'M' => self.modified.push(change.path.clone()),
            'D' => self.deleted.push(change.file_path.clone()),
            'R' => self.renamed.push(RenamePair {
                from: change.old_path.clone().unwrap_or_default(),
                to: change.path.clone(),
            }),
            'C' => self.copied.push(RenamePair {
                from: change.old_path.clone().unwrap_or_default(),
                to: change.path.clone(),
            }),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(code: char, path: &str, old_path: Option<&str>) -> ChangeRecord {
        let file_path = match code {
            'D' => old_path.unwrap_or(path).to_string(),
            _ => path.to_string(),
        };
        ChangeRecord {
            code,
            status_raw: code.to_string(),
            file_path,
            path: path.to_string(),
            old_path: old_path.map(str::to_string),
            additions: None,
            deletions: None,
        }
    }

    #[test]
    fn summary_buckets_by_code() {
        let mut summary = ChangeSummary::default();
        summary.record(&change('A', "new.go", None));
        summary.record(&change('M', "lib.go", None));
        summary.record(&change('D', "gone.ts", Some("gone.ts")));
        summary.record(&change('R', "new.py", Some("old.py")));
        summary.record(&change('T', "link", None));

        assert_eq!(summary.added, vec!["new.go"]);
        assert_eq!(summary.modified, vec!["lib.go"]);
        assert_eq!(summary.deleted, vec!["gone.ts"]);
        assert_eq!(
            summary.renamed,
            vec![RenamePair {
                from: "old.py".to_string(),
                to: "new.py".to_string()
            }]
        );
        assert!(summary.copied.is_empty());
    }

    #[test]
    fn summary_serializes_with_sorted_keys() {
        let mut summary = ChangeSummary::default();
        summary.record(&change('A', "a.go", None));
        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(
            json,
            r#"{"added":["a.go"],"copied":[],"deleted":[],"modified":[],"renamed":[]}"#
        );
    }
}
