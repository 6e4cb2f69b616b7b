use std::path::PathBuf;

/// Failures the library surfaces to the binaries. Only the binaries decide whether a failure
/// ends the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The activity store couldn't be created, read or written.
    #[error("activity store at {path:?} is unavailable: {source}")]
    StorageUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The foreground window couldn't be inspected. The poller recovers from this locally.
    #[error("failed to read the foreground window: {0:#}")]
    WindowReadFailure(anyhow::Error),

    #[error("GOOGLE_API_KEY is not set. Put it into the environment or a .env file")]
    SummarizationUnavailable,

    #[error("summarization failed: {0}")]
    SummarizationFailed(String),
}

impl Error {
    pub(crate) fn storage(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.into();
        move |source| Error::StorageUnavailable { path, source }
    }
}
