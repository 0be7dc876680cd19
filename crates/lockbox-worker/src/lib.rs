//! lockbox-worker: off-thread batch decryption of vault items
//!
//! - [`WorkerExecutor`]: decrypts one [`BatchRequest`] into a [`BatchResponse`]
//!   on a rayon pool, routing each item to its personal or organization key.
//! - [`ThreadWorker`]: isolated thread that runs the executor over JSON messages.
//! - [`BatchDecryptor`]: caller-side orchestrator. One pooled worker, created
//!   lazily, torn down after an idle TTL; requests correlated by `requestId`.
//! - [`KeyProvider`]: where the orchestrator gets keys from.

pub mod error;
pub mod executor;
pub mod keys;
pub mod orchestrator;
pub mod protocol;
pub mod thread;

pub use error::{BatchError, ExecutorError};
pub use executor::WorkerExecutor;
pub use keys::{KeyProvider, StaticKeyProvider};
pub use orchestrator::{BatchDecryptor, PoolOptions};
pub use protocol::{BatchRequest, BatchResponse, KeySet, RequestId, ScopedKeys};
pub use thread::{ThreadWorker, ThreadWorkerFactory, Worker, WorkerEvent, WorkerFactory};
