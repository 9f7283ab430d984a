use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::models::event::CaseOpeningEvent;
use crate::models::summary::CaseOpeningSummary;

/// Paths written for one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFiles {
    pub report: PathBuf,
    pub snapshot: PathBuf,
}

/// Per-account results on disk.
///
/// Layout under `dir`:
/// - `<account>_case_opening_results.txt`: rendered summary and event list
/// - `<account>_cache.json`: the event snapshot read back by `load`
///
/// Both files are replaced atomically (temp sibling, then rename).
pub struct ResultsStore {
    dir: PathBuf,
}

impl ResultsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn report_path(&self, account: &str) -> PathBuf {
        self.dir.join(format!("{account}_case_opening_results.txt"))
    }

    pub fn snapshot_path(&self, account: &str) -> PathBuf {
        self.dir.join(format!("{account}_cache.json"))
    }

    /// Cached events for `account`; empty when no snapshot exists yet.
    pub async fn load(&self, account: &str) -> Result<Vec<CaseOpeningEvent>, CoreError> {
        let path = self.snapshot_path(account);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no cached events yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        let events: Vec<CaseOpeningEvent> = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Deserialization(format!("invalid snapshot {}: {e}", path.display()))
        })?;
        tracing::info!(account, events = events.len(), "loaded cached events");
        Ok(events)
    }

    /// Write the report and the snapshot for `account`.
    pub async fn save(
        &self,
        account: &str,
        events: &[CaseOpeningEvent],
        summary: &CaseOpeningSummary,
    ) -> Result<SavedFiles, CoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let snapshot = serde_json::to_string_pretty(events)
            .map_err(|e| CoreError::Serialization(format!("failed to serialize events: {e}")))?;
        let files = SavedFiles {
            report: self.report_path(account),
            snapshot: self.snapshot_path(account),
        };

        write_atomic(&files.report, render_report(events, summary).as_bytes()).await?;
        write_atomic(&files.snapshot, snapshot.as_bytes()).await?;

        tracing::info!(
            report = %files.report.display(),
            snapshot = %files.snapshot.display(),
            "results saved"
        );
        Ok(files)
    }
}

/// Text report: the summary followed by one line per event.
pub fn render_report(events: &[CaseOpeningEvent], summary: &CaseOpeningSummary) -> String {
    let mut out = summary.to_string();
    out.push_str("\n\nDetailed Case Opening Events:\n");
    for event in events {
        out.push_str(&event.to_string());
        out.push('\n');
    }
    out
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), CoreError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, contents).await?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(CoreError::FileIO(format!(
            "failed to replace {}: {e}",
            path.display()
        )));
    }
    Ok(())
}
