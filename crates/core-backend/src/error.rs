use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{op} failed for {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("binary file: {0}")]
    NotText(PathBuf),
    #[error("save where? no location given")]
    NoLocation,
    #[error("not implemented: {0}")]
    Unsupported(&'static str),
    #[error("spawn failed: {0}")]
    Spawn(String),
    #[error("pty error: {0}")]
    Pty(String),
    #[error("process wait panicked: {0}")]
    WaitPanicked(String),
}

impl BackendError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
