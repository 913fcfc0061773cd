//! Typed errors for the index build pipeline.
//!
//! Every variant that concerns a specific commit carries its hash so a
//! failed build names the offending commit.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexError {
    /// A git invocation exited non-zero. Fatal everywhere except single-file
    /// content fetches, where the builder skips symbol extraction instead.
    #[error("git {command} failed for {context}: {stderr}")]
    Execution {
        command: String,
        context: String,
        stderr: String,
    },

    /// Fetched bytes were not valid UTF-8 where text was required. Tolerated
    /// the same way as `Execution` for content fetches.
    #[error("content of '{path}' at commit {hash} is not valid UTF-8")]
    Decode { hash: String, path: String },

    /// A uniqueness constraint was violated unexpectedly. Always fatal:
    /// it signals a real defect, never a condition to absorb.
    #[error("integrity violation: {detail}")]
    Integrity { detail: String },

    /// A status/numstat record lacked the path tokens its code requires.
    #[error("malformed change record at commit {hash}: {detail}")]
    MalformedRecord { hash: String, detail: String },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("failed to encode change summary: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
