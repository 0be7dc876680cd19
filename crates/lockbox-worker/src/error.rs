use thiserror::Error;

/// Failure surfaced to callers of [`crate::BatchDecryptor::submit`].
///
/// Per-item decryption problems never appear here; they come back as
/// sentinel values inside the results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("decrypt worker failed: {0}")]
    WorkerTransport(String),

    #[error("could not start decrypt worker: {0}")]
    Spawn(String),

    #[error("worker protocol error: {0}")]
    Protocol(String),

    #[error("key provider failed: {0}")]
    KeyProvider(String),
}

/// Failure inside the worker while handling one message.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("malformed batch request: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("could not encode batch response: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not build decrypt thread pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
