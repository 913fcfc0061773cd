//! Build orchestration.
//!
//! Walks the full ancestry oldest-first and persists each commit's rows as a
//! single transaction: the commit itself, its change records and symbols,
//! then the derived summary. A failure aborts the build; commits already
//! committed stay valid, so crash recovery has single-commit granularity.

use std::collections::HashMap;

use tracing::debug;

use crate::changeset;
use crate::error::IndexError;
use crate::models::ChangeSummary;
use crate::progress::{BuildProgressEvent, BuildProgressReporter};
use crate::repo::GitRepo;
use crate::store::IndexStore;
use crate::symbols::extract_symbols;

/// One progress report per this many commits, plus one at completion.
const PROGRESS_EVERY: usize = 25;

/// Totals from one completed build, for the final report.
#[derive(Debug, Clone, Copy)]
pub struct BuildReport {
    pub commits: usize,
    pub files: usize,
    pub changes: u64,
    pub symbols: u64,
}

/// Run the full build: the store must be freshly created, the walk is
/// strictly sequential oldest→newest.
pub async fn run_build(
    repo: &GitRepo,
    store: &IndexStore,
    reporter: &dyn BuildProgressReporter,
) -> Result<BuildReport, IndexError> {
    let hashes = repo.list_commits()?;
    let total = hashes.len();
    reporter.report(BuildProgressEvent::Listed { total });

    // Path → surrogate id for the lifetime of this run. The identity map is
    // the primary coordination mechanism; the UNIQUE constraint in the store
    // is only a backstop.
    let mut file_ids: HashMap<String, i64> = HashMap::new();
    let mut changes_written = 0u64;
    let mut symbols_written = 0u64;

    for (idx, hash) in hashes.iter().enumerate() {
        let meta = repo.commit_metadata(hash)?;
        let statuses = repo.status_entries(hash)?;
        let numstats = repo.numstat_entries(hash)?;
        let changes = changeset::merge_changes(hash, statuses, &numstats);

        let mut tx = store.begin().await?;
        let commit_id = store.record_commit(&mut tx, &meta).await?;
        let mut summary = ChangeSummary::default();

        for change in &changes {
            let file_id = match file_ids.get(change.file_path.as_str()) {
                Some(id) => *id,
                None => {
                    let id = store.upsert_file(&mut tx, &change.file_path).await?;
                    file_ids.insert(change.file_path.clone(), id);
                    id
                }
            };

            store
                .record_file_change(&mut tx, commit_id, file_id, change)
                .await?;
            changes_written += 1;
            summary.record(change);

            // Symbol extraction only for files still present in this commit.
            if change.code != 'D' {
                match repo.file_content_at(hash, &change.path) {
                    Ok(content) => {
                        for symbol in extract_symbols(&change.path, &content) {
                            store
                                .record_symbol(&mut tx, commit_id, file_id, &symbol)
                                .await?;
                            symbols_written += 1;
                        }
                    }
                    // Content that is gone or not text just means no symbols
                    // for this file at this commit.
                    Err(IndexError::Execution { .. }) | Err(IndexError::Decode { .. }) => {
                        debug!(
                            commit = %hash,
                            path = %change.path,
                            "content unavailable, skipping symbol scan"
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        let summary_json = serde_json::to_string(&summary)?;
        store
            .finalize_commit_summary(&mut tx, commit_id, &summary_json)
            .await?;
        tx.commit().await?;

        let done = idx + 1;
        if done % PROGRESS_EVERY == 0 || done == total {
            reporter.report(BuildProgressEvent::Processed { done, total });
        }
    }

    if total == 0 {
        reporter.report(BuildProgressEvent::Processed { done: 0, total: 0 });
    }

    Ok(BuildReport {
        commits: total,
        files: file_ids.len(),
        changes: changes_written,
        symbols: symbols_written,
    })
}
