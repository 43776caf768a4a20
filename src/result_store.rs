use crate::error::ServiceError;
use crate::model::AnalysisResult;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Filesystem-backed store for analysis result records
///
/// One pretty-printed JSON file per record, named `{image_id}.json`.
/// This store is the single source of truth for idempotency: the
/// analysis engine keeps no in-memory cache, so multiple server
/// processes sharing the same directory stay consistent. Records are
/// immutable once written and never deleted here.
pub struct FsResultStore {
    analysis_dir: PathBuf,
}

impl FsResultStore {
    /// Create a result store rooted at the given directory
    pub fn new(analysis_dir: impl Into<PathBuf>) -> Self {
        Self {
            analysis_dir: analysis_dir.into(),
        }
    }

    /// Load the cached result for an identifier, if any
    ///
    /// A missing file means no cached result. An unreadable or corrupt
    /// record is also reported as absent (with a warning) rather than
    /// as an error, so the engine can safely re-derive and overwrite it.
    pub async fn get(&self, image_id: &str) -> Option<AnalysisResult> {
        let path = self.record_path(image_id);

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(
                    image_id = %image_id,
                    error = %e,
                    "Failed to read analysis record, treating as absent"
                );
                return None;
            }
        };

        match serde_json::from_slice(&content) {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(
                    image_id = %image_id,
                    error = %e,
                    "Corrupt analysis record, treating as absent"
                );
                None
            }
        }
    }

    /// Persist a result record
    ///
    /// Write failures are surfaced to the caller: silently skipping the
    /// write would break the durability side of idempotency.
    pub async fn put(&self, image_id: &str, result: &AnalysisResult) -> Result<(), ServiceError> {
        tokio::fs::create_dir_all(&self.analysis_dir)
            .await
            .map_err(|e| ServiceError::storage("create analysis directory", e))?;

        let content = serde_json::to_vec_pretty(result)
            .map_err(|e| anyhow::Error::from(e).context("serialize analysis result"))?;

        let path = self.record_path(image_id);
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| ServiceError::storage("write analysis record", e))?;

        debug!(image_id = %image_id, path = %path.display(), "Analysis record written");
        Ok(())
    }

    fn record_path(&self, image_id: &str) -> PathBuf {
        let safe_id: String = image_id
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        self.analysis_dir.join(format!("{}.json", safe_id))
    }

    /// Root directory of this store
    pub fn analysis_dir(&self) -> &Path {
        &self.analysis_dir
    }
}
