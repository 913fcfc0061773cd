//! Git repository reader.
//!
//! Issues git invocations and returns the raw structured records the build
//! pipeline consumes: commit list, per-commit metadata, the NUL-delimited
//! status and numstat streams, and file content at a revision. The backend
//! is a black box; everything here goes through `git` subprocesses.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use crate::changeset;
use crate::error::IndexError;
use crate::models::{CommitMeta, NumstatEntry, StatusEntry};

/// Format handed to `git show` for commit metadata. Fields are NUL-separated
/// so subjects and bodies cannot collide with the delimiter.
const METADATA_FORMAT: &str = "%H%x00%P%x00%an%x00%ae%x00%at%x00%cn%x00%ce%x00%ct%x00%s%x00%b";

/// Shared flags for both diff forms: diff the root commit against the empty
/// tree, recurse, NUL-delimit, and detect renames and copies. Status and
/// numstat must use the same detection threshold or their join keys drift.
const DIFF_FLAGS: &[&str] = &["--root", "--no-commit-id", "-r", "-z", "-M", "-C"];

pub struct GitRepo {
    root: PathBuf,
}

impl GitRepo {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Run a git subcommand and return raw stdout. Non-zero exit becomes an
    /// `Execution` error carrying the trimmed stderr and the commit (or ref)
    /// being examined.
    fn run(&self, args: &[&str], context: &str) -> Result<Vec<u8>, IndexError> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.root)
            .output()?;

        if !output.status.success() {
            return Err(IndexError::Execution {
                command: args.first().copied().unwrap_or("git").to_string(),
                context: context.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    /// Full ancestry of the current head, oldest first.
    pub fn list_commits(&self) -> Result<Vec<String>, IndexError> {
        let out = self.run(&["rev-list", "--reverse", "HEAD"], "HEAD")?;
        Ok(String::from_utf8_lossy(&out)
            .lines()
            .map(|line| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    pub fn commit_metadata(&self, hash: &str) -> Result<CommitMeta, IndexError> {
        let format_arg = format!("--format={}", METADATA_FORMAT);
        let out = self.run(&["show", "-s", &format_arg, hash], hash)?;
        decode_metadata(hash, &out)
    }

    /// Ordered change entries from the `--name-status` form of the diff.
    pub fn status_entries(&self, hash: &str) -> Result<Vec<StatusEntry>, IndexError> {
        let mut args = vec!["diff-tree"];
        args.extend_from_slice(DIFF_FLAGS);
        args.push("--name-status");
        args.push(hash);
        let raw = self.run(&args, hash)?;
        changeset::parse_status(hash, &raw)
    }

    /// Numeric change stats from the `--numstat` form of the same diff,
    /// keyed by resulting path.
    pub fn numstat_entries(
        &self,
        hash: &str,
    ) -> Result<HashMap<String, NumstatEntry>, IndexError> {
        let mut args = vec!["diff-tree"];
        args.extend_from_slice(DIFF_FLAGS);
        args.push("--numstat");
        args.push(hash);
        let raw = self.run(&args, hash)?;
        changeset::parse_numstat(hash, &raw)
    }

    /// File content at a revision. Both failure modes, a path that does not
    /// exist at that revision (`Execution`) and bytes that are not valid
    /// text (`Decode`), are non-fatal for the caller: they skip symbol
    /// extraction for that file, not the build.
    pub fn file_content_at(&self, hash: &str, path: &str) -> Result<String, IndexError> {
        let target = format!("{}:{}", hash, path);
        let out = self.run(&["show", &target], hash)?;
        String::from_utf8(out).map_err(|_| IndexError::Decode {
            hash: hash.to_string(),
            path: path.to_string(),
        })
    }
}

/// Decode the NUL-separated metadata record. Subject and body are the last
/// two fields, so the body keeps any stray NULs via the bounded split.
pub fn decode_metadata(hash: &str, raw: &[u8]) -> Result<CommitMeta, IndexError> {
    let text = String::from_utf8_lossy(raw);
    let fields: Vec<&str> = text.splitn(10, '\0').collect();
    if fields.len() < 10 {
        return Err(IndexError::MalformedRecord {
            hash: hash.to_string(),
            detail: format!("metadata record has {} of 10 fields", fields.len()),
        });
    }

    Ok(CommitMeta {
        hash: fields[0].to_string(),
        parents: fields[1].trim().to_string(),
        author_name: fields[2].to_string(),
        author_email: fields[3].to_string(),
        authored_at: timestamp_to_utc(fields[4]),
        committer_name: fields[5].to_string(),
        committer_email: fields[6].to_string(),
        committed_at: timestamp_to_utc(fields[7]),
        subject: fields[8].to_string(),
        body: fields[9].trim().to_string(),
    })
}

/// Epoch seconds to RFC 3339 UTC. A non-numeric field passes through
/// unconverted rather than failing.
fn timestamp_to_utc(raw: &str) -> String {
    match raw.trim().parse::<i64>() {
        Ok(secs) => chrono::DateTime::from_timestamp(secs, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| raw.to_string()),
        Err(_) => raw.to_string(),
    }
}
