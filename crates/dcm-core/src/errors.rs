/// Boxed cause carried by transport and storage failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Core error type for the mirror pipeline.
///
/// Adapter crates map their library errors into this type so the pipeline
/// fails fast with a uniform shape: an operation tag plus the underlying
/// cause. No variant is retried or recovered; every error aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    /// Remote platform failure (fetch, send, pin, upload, download).
    #[error("{op}: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    /// Embedded store failure (open, commit, iterate).
    #[error("{op}: {source}")]
    Storage {
        op: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed stored record on read-back. The pipeline is the sole
    /// writer, so this is data corruption, not a recoverable input problem.
    #[error("record decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl Error {
    pub fn transport(op: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            op,
            source: source.into(),
        }
    }

    pub fn storage(op: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Storage {
            op,
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
