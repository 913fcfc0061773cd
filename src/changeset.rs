//! Change-report parsing.
//!
//! Decodes the NUL-delimited `--name-status` and `--numstat` streams into
//! typed entries and merges them into per-path change records. The
//! token-count-by-code rule (rename/copy records consume two path tokens,
//! everything else one) lives here and nowhere else.

use std::collections::{HashMap, VecDeque};

use tracing::warn;

use crate::error::IndexError;
use crate::models::{ChangeRecord, NumstatEntry, StatusEntry};

/// How many path tokens a status code consumes from the stream.
fn path_tokens_for(code: char) -> usize {
    match code {
        'R' | 'C' => 2,
        _ => 1,
    }
}

fn tokens(raw: &[u8]) -> VecDeque<&[u8]> {
    raw.split(|b| *b == 0).filter(|t| !t.is_empty()).collect()
}

fn lossy(token: &[u8]) -> String {
    String::from_utf8_lossy(token).into_owned()
}

fn malformed(hash: &str, detail: impl Into<String>) -> IndexError {
    IndexError::MalformedRecord {
        hash: hash.to_string(),
        detail: detail.into(),
    }
}

/// Parse the `--name-status` stream. Entry order is preserved. A record
/// whose path tokens are missing aborts the commit with a descriptive error
/// rather than silently dropping data.
pub fn parse_status(hash: &str, raw: &[u8]) -> Result<Vec<StatusEntry>, IndexError> {
    let mut queue = tokens(raw);
    let mut entries = Vec::new();

    while let Some(token) = queue.pop_front() {
        let status_raw = lossy(token);
        let mut chars = status_raw.chars();
        let code = match chars.next() {
            Some(c) => c,
            None => continue,
        };
        let score = chars.as_str().to_string();

        if path_tokens_for(code) == 2 {
            let old_path = queue.pop_front().ok_or_else(|| {
                malformed(hash, format!("status '{}' missing original path", status_raw))
            })?;
            let path = queue.pop_front().ok_or_else(|| {
                malformed(hash, format!("status '{}' missing resulting path", status_raw))
            })?;
            entries.push(StatusEntry {
                code,
                score,
                status_raw,
                path: lossy(path),
                old_path: Some(lossy(old_path)),
            });
        } else {
            let path = queue.pop_front().ok_or_else(|| {
                malformed(hash, format!("status '{}' missing path", status_raw))
            })?;
            let path = lossy(path);
            // A deletion's only path token is the deleted (original) path.
            let old_path = (code == 'D').then(|| path.clone());
            entries.push(StatusEntry {
                code,
                score,
                status_raw,
                path,
                old_path,
            });
        }
    }

    Ok(entries)
}

/// Parse the `--numstat` stream into a map keyed by resulting path.
///
/// Plain records carry the path in their third tab field; rename/copy
/// records leave it empty and encode (original, resulting) in the next two
/// tokens. A `-` count marks a binary file and maps to `None`, never zero.
pub fn parse_numstat(
    hash: &str,
    raw: &[u8],
) -> Result<HashMap<String, NumstatEntry>, IndexError> {
    let mut queue = tokens(raw);
    let mut stats = HashMap::new();

    while let Some(token) = queue.pop_front() {
        let record = lossy(token);
        let mut fields = record.splitn(3, '\t');
        let (Some(add_str), Some(del_str)) = (fields.next(), fields.next()) else {
            continue;
        };
        let additions = parse_count(hash, &record, add_str)?;
        let deletions = parse_count(hash, &record, del_str)?;

        match fields.next() {
            Some(path) if !path.is_empty() => {
                stats.insert(
                    path.to_string(),
                    NumstatEntry {
                        additions,
                        deletions,
                        old_path: None,
                    },
                );
            }
            _ => {
                let old_path = queue.pop_front().ok_or_else(|| {
                    malformed(hash, format!("numstat '{}' missing original path", record))
                })?;
                let path = queue.pop_front().ok_or_else(|| {
                    malformed(hash, format!("numstat '{}' missing resulting path", record))
                })?;
                stats.insert(
                    lossy(path),
                    NumstatEntry {
                        additions,
                        deletions,
                        old_path: Some(lossy(old_path)),
                    },
                );
            }
        }
    }

    Ok(stats)
}

fn parse_count(hash: &str, record: &str, field: &str) -> Result<Option<i64>, IndexError> {
    if field == "-" {
        return Ok(None);
    }
    field
        .parse::<i64>()
        .map(Some)
        .map_err(|_| malformed(hash, format!("numstat '{}' has non-numeric count", record)))
}

/// Join status entries with numstat counts by resulting path.
///
/// A status entry with no numstat counterpart keeps "not applicable" counts;
/// the mismatch is logged because it usually points at a rename-threshold
/// asymmetry between the two streams rather than expected data.
pub fn merge_changes(
    hash: &str,
    statuses: Vec<StatusEntry>,
    numstats: &HashMap<String, NumstatEntry>,
) -> Vec<ChangeRecord> {
    statuses
        .into_iter()
        .map(|entry| {
            let (additions, deletions) = match numstats.get(&entry.path) {
                Some(stats) => (stats.additions, stats.deletions),
                None => {
                    warn!(
                        commit = %hash,
                        path = %entry.path,
                        status = %entry.status_raw,
                        "status entry has no numstat counterpart"
                    );
                    (None, None)
                }
            };
            let file_path = match entry.code {
                'D' => entry.old_path.clone().unwrap_or_else(|| entry.path.clone()),
                _ => entry.path.clone(),
            };
            ChangeRecord {
                code: entry.code,
                status_raw: entry.status_raw,
                file_path,
                path: entry.path,
                old_path: entry.old_path,
                additions,
                deletions,
            }
        })
        .collect()
}
