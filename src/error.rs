// Error types for Kura
use thiserror::Error;

/// Failure reported by a remote collaborator (listing, identity, content).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("drive api returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Recoverable outcome of a session operation. Never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrowseError {
    #[error("fetch failed: {0}")]
    TransientFetch(String),
    #[error("no previous state to restore")]
    NoPreviousState,
}

impl From<FetchError> for BrowseError {
    fn from(err: FetchError) -> Self {
        BrowseError::TransientFetch(err.to_string())
    }
}

/// Errors that prevent a session from being created at all.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("could not read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid {what}: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("startup fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("terminal error: {0}")]
    Terminal(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_becomes_transient() {
        let err = FetchError::Api {
            status: 503,
            message: "backend unavailable".to_string(),
        };
        let browse: BrowseError = err.into();
        assert_eq!(
            browse,
            BrowseError::TransientFetch("drive api returned 503: backend unavailable".to_string())
        );
    }
}
