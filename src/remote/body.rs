//! Request bodies staged on disk for the CLI's `--body @file` flag.

use crate::errors::RemoteError;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// A JSON body written to a temporary file for the lifetime of one call.
///
/// The file is removed when the guard is dropped, whether the call succeeded
/// or not.
pub(crate) struct StagedBody {
    path: PathBuf,
}

impl StagedBody {
    pub(crate) fn write(dir: &Path, file_name: &str, body: &Value) -> Result<Self, RemoteError> {
        let path = dir.join(file_name);
        let content = serde_json::to_vec(body)?;
        std::fs::write(&path, content).map_err(|source| RemoteError::BodyStaging {
            path: path.clone(),
            source,
        })?;
        Ok(Self { path })
    }

    #[cfg(test)]
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Argument form expected by `sf api request rest --body`.
    pub(crate) fn cli_arg(&self) -> String {
        format!("@{}", self.path.display())
    }
}

impl Drop for StagedBody {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::debug!(
                path = %self.path.display(),
                error = %e,
                "failed to remove staged body"
            );
        }
    }
}
