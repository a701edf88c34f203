use thiserror::Error;

/// Failure of a single street data request
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("server responded with HTTP {status}")]
    Status { status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    ///
    /// Connection failures, timeouts and 5xx responses are transient; client
    /// errors (4xx, including 429) and unparseable bodies are fatal.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Status { status } => (500..600).contains(status),
            Self::Malformed(_) => false,
        }
    }
}
