use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("failed to open {}: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error("Please open a PDF first")]
    NoDocument,

    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl ViewerError {
    pub(crate) fn open(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::Open {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}
