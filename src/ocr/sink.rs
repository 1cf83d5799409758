//! Optional persistence of combined results

use std::path::{Path, PathBuf};

use super::task::Task;
use super::types::RecognitionError;

/// Where combined results are written
#[derive(Debug, Clone, Default)]
pub enum ResultSink {
    /// Results are only returned to the caller
    #[default]
    Disabled,
    /// Results are also written to `{dir}/{stem}_{task}_result.md`
    Directory(PathBuf),
}

impl ResultSink {
    pub fn from_option(dir: Option<PathBuf>) -> Self {
        dir.map(Self::Directory).unwrap_or(Self::Disabled)
    }

    /// Target file for a given input and task, if enabled
    pub fn result_path(&self, input: &Path, task: Task) -> Option<PathBuf> {
        match self {
            Self::Disabled => None,
            Self::Directory(dir) => {
                let stem = input
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "result".to_string());
                Some(dir.join(format!("{}_{}_result.md", stem, task)))
            }
        }
    }

    /// Write the combined result. Returns the written path.
    pub async fn write(
        &self,
        input: &Path,
        task: Task,
        text: &str,
    ) -> Result<Option<PathBuf>, RecognitionError> {
        let Some(target) = self.result_path(input, task) else {
            return Ok(None);
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RecognitionError::Output(format!("{}: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&target, text.as_bytes())
            .await
            .map_err(|e| RecognitionError::Output(format!("{}: {}", target.display(), e)))?;

        tracing::info!("Result saved to: {}", target.display());
        Ok(Some(target))
    }
}
