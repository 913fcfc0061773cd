//! Build progress reporting.
//!
//! Reports observable progress during `cidx build` so users watching a long
//! history rebuild can see how much is left. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts; the cadence is fixed
//! in the builder (every 25 commits, and unconditionally at completion).

use std::io::Write;

/// A single progress event for the build.
#[derive(Clone, Debug)]
pub enum BuildProgressEvent {
    /// Ancestry listed; the total commit count is known.
    Listed { total: usize },
    /// `done` commits out of `total` are fully committed to the index.
    Processed { done: usize, total: usize },
}

/// Reports build progress. Implementations write to stderr (human or JSON).
pub trait BuildProgressReporter: Send + Sync {
    fn report(&self, event: BuildProgressEvent);
}

/// Human-friendly progress on stderr: "Processed 125/640 commits".
pub struct StderrProgress;

impl BuildProgressReporter for StderrProgress {
    fn report(&self, event: BuildProgressEvent) {
        let line = match &event {
            BuildProgressEvent::Listed { total } => {
                format!("indexing {} commits\n", total)
            }
            BuildProgressEvent::Processed { done, total } => {
                format!("Processed {}/{} commits\n", done, total)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl BuildProgressReporter for JsonProgress {
    fn report(&self, event: BuildProgressEvent) {
        let obj = match &event {
            BuildProgressEvent::Listed { total } => serde_json::json!({
                "event": "progress",
                "phase": "listed",
                "total": total
            }),
            BuildProgressEvent::Processed { done, total } => serde_json::json!({
                "event": "progress",
                "phase": "processed",
                "done": done,
                "total": total
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl BuildProgressReporter for NoProgress {
    fn report(&self, _event: BuildProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Resolve a `--progress` flag value. `auto` means human when stderr is
    /// a TTY, otherwise off.
    pub fn from_flag(flag: &str) -> Result<Self, String> {
        match flag {
            "auto" => Ok(Self::default_for_tty()),
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => Err(format!(
                "invalid progress mode '{}': expected auto, off, human, or json",
                other
            )),
        }
    }

    fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. The builder takes it by reference.
    pub fn reporter(&self) -> Box<dyn BuildProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
