//! # Crash recorder: best-effort persistent failure log.
//!
//! [`CrashRecorder`] appends structured, human-readable entries to a
//! per-user, date-keyed log file. It is invoked automatically by the
//! lifecycle controller and the transport bridge, and is public so plugin
//! code can report failures manually.
//!
//! ## Rules
//! - Recording **never fails and never panics**: every I/O error on the
//!   crash path is swallowed (a debug-level trace is the only witness).
//! - The destination directory is created on first use if absent.
//! - One entry per failure, append-only; the format is human-readable
//!   text with no compatibility guarantee beyond append-only growth.
//!
//! ## Entry format
//! ```text
//! [2026-08-23T10:15:42.123+00:00] worker=sensor-7 context="main loop" cause="decode failed"
//!     caused by: unexpected end of input
//! ```

use std::error::Error as StdError;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use directories::ProjectDirs;

/// Appends failure reports to a persistent per-user log location.
///
/// Cheap to clone; all clones share the worker identity and destination.
#[derive(Clone, Debug)]
pub struct CrashRecorder {
    worker: Arc<str>,
    dir: PathBuf,
}

impl CrashRecorder {
    /// Creates a recorder writing to the per-user default location
    /// (`<user data dir>/comet/crash`, falling back to the system temp
    /// directory when no home is resolvable).
    pub fn new(worker: impl Into<Arc<str>>) -> Self {
        Self {
            worker: worker.into(),
            dir: default_crash_dir(),
        }
    }

    /// Creates a recorder writing to an explicit directory.
    pub fn with_dir(worker: impl Into<Arc<str>>, dir: impl Into<PathBuf>) -> Self {
        Self {
            worker: worker.into(),
            dir: dir.into(),
        }
    }

    /// Directory entries are appended under.
    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    /// Records a failure with its full causal chain.
    ///
    /// `context` names the stage that failed ("startup hook", "main
    /// loop", "outbound send", ...). Never fails; a write error is
    /// swallowed.
    pub fn record(&self, context: &str, cause: &(dyn StdError + 'static)) {
        let mut entry = self.header(context, &cause.to_string());
        let mut source = cause.source();
        while let Some(err) = source {
            let _ = writeln!(entry, "    caused by: {err}");
            source = err.source();
        }
        self.append(&entry);
    }

    /// Records a failure described by a plain message (panics, manual
    /// plugin reports). Never fails.
    pub fn record_message(&self, context: &str, detail: &str) {
        let entry = self.header(context, detail);
        self.append(&entry);
    }

    fn header(&self, context: &str, cause: &str) -> String {
        let at = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        format!(
            "[{at}] worker={} context={context:?} cause={cause:?}\n",
            self.worker
        )
    }

    /// Best-effort append; the crash handler must never crash.
    fn append(&self, entry: &str) {
        let date = Utc::now().format("%Y-%m-%d");
        let path = self.dir.join(format!("crash-{date}.log"));
        let written = std::fs::create_dir_all(&self.dir)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path))
            .and_then(|mut f| f.write_all(entry.as_bytes()));
        if let Err(e) = written {
            tracing::debug!(error = %e, path = %path.display(), "crash entry dropped");
        }
    }
}

fn default_crash_dir() -> PathBuf {
    ProjectDirs::from("io", "comet", "comet").map_or_else(
        || std::env::temp_dir().join("comet-crash"),
        |dirs| dirs.data_local_dir().join("crash"),
    )
}
