//! Worker shell: an isolated OS thread that exchanges JSON strings
//!
//! ```text
//! BatchDecryptor ──post_message(json)──► [lockbox-worker thread] ──► WorkerExecutor
//!        ▲                                         │
//!        └──────── WorkerEvent::Message(json) ◄────┘
//! ```
//!
//! The executor (and its rayon pool) is built lazily when the first message
//! arrives. A panic while handling a message is reported as
//! [`WorkerEvent::Error`] and ends the thread.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;

use lockbox_crypto::EncryptService;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::BatchError;
use crate::executor::WorkerExecutor;

/// Message from a worker back to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    /// A serialized [`crate::BatchResponse`]
    Message(String),
    /// The worker failed and will not process further messages
    Error(String),
}

/// Handle to an isolated execution context.
pub trait Worker: Send {
    fn post_message(&self, message: String) -> Result<(), BatchError>;

    /// Stop accepting messages. Work in progress is abandoned.
    fn terminate(&mut self);
}

/// Creates workers wired to an event channel.
pub trait WorkerFactory: Send + Sync {
    fn create(&self, events: mpsc::UnboundedSender<WorkerEvent>)
        -> Result<Box<dyn Worker>, BatchError>;
}

pub struct ThreadWorker {
    inbox: Option<std_mpsc::Sender<String>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadWorker {
    pub fn spawn(
        service: EncryptService,
        threads: usize,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<Self, BatchError> {
        let (inbox, messages) = std_mpsc::channel::<String>();
        let handle = std::thread::Builder::new()
            .name("lockbox-worker".into())
            .spawn(move || run(service, threads, messages, events))
            .map_err(|e| BatchError::Spawn(e.to_string()))?;
        Ok(Self {
            inbox: Some(inbox),
            handle: Some(handle),
        })
    }
}

impl Worker for ThreadWorker {
    fn post_message(&self, message: String) -> Result<(), BatchError> {
        let inbox = self
            .inbox
            .as_ref()
            .ok_or_else(|| BatchError::WorkerTransport("worker terminated".into()))?;
        inbox
            .send(message)
            .map_err(|_| BatchError::WorkerTransport("worker thread exited".into()))
    }

    fn terminate(&mut self) {
        // closing the inbox ends the thread's receive loop
        self.inbox.take();
        // detach: a batch in progress finishes on its own and its reply is dropped
        self.handle.take();
    }
}

impl Drop for ThreadWorker {
    fn drop(&mut self) {
        self.terminate();
    }
}

fn run(
    service: EncryptService,
    threads: usize,
    messages: std_mpsc::Receiver<String>,
    events: mpsc::UnboundedSender<WorkerEvent>,
) {
    let mut executor: Option<WorkerExecutor> = None;

    for message in messages {
        if executor.is_none() {
            match WorkerExecutor::new(service.clone(), threads) {
                Ok(built) => executor = Some(built),
                Err(e) => {
                    error!(error = %e, "decrypt worker bootstrap failed");
                    let _ = events.send(WorkerEvent::Error(e.to_string()));
                    return;
                }
            }
        }
        let Some(exec) = executor.as_ref() else {
            return;
        };

        let event = match catch_unwind(AssertUnwindSafe(|| exec.handle_message(&message))) {
            Ok(Ok(reply)) => WorkerEvent::Message(reply),
            Ok(Err(e)) => WorkerEvent::Error(e.to_string()),
            Err(_) => WorkerEvent::Error("decrypt worker panicked".into()),
        };
        let fatal = matches!(event, WorkerEvent::Error(_));
        if events.send(event).is_err() || fatal {
            break;
        }
    }
    debug!("decrypt worker thread exiting");
}

/// Spawns a [`ThreadWorker`] per call.
#[derive(Clone)]
pub struct ThreadWorkerFactory {
    service: EncryptService,
    threads: usize,
}

impl ThreadWorkerFactory {
    pub fn new(service: EncryptService, threads: usize) -> Self {
        Self { service, threads }
    }
}

impl WorkerFactory for ThreadWorkerFactory {
    fn create(
        &self,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<Box<dyn Worker>, BatchError> {
        let worker = ThreadWorker::spawn(self.service.clone(), self.threads, events)?;
        Ok(Box::new(worker))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{BatchRequest, BatchResponse, KeySet};
    use lockbox_crypto::SymmetricKey;
    use lockbox_models::{DecryptableItem, Folder};

    #[tokio::test]
    async fn test_thread_worker_roundtrip() {
        let svc = EncryptService::default();
        let key = SymmetricKey::generate();
        let request = BatchRequest {
            request_id: "r1".into(),
            items: vec![DecryptableItem::Folder(Folder {
                id: "f1".into(),
                name: Some(svc.encrypt("Inbox", &key).unwrap()),
                revision_date: None,
            })],
            keys: KeySet::Single(key),
        };

        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = ThreadWorkerFactory::new(svc, 1).create(tx).unwrap();
        worker
            .post_message(serde_json::to_string(&request).unwrap())
            .unwrap();

        let WorkerEvent::Message(raw) = rx.recv().await.unwrap() else {
            panic!("expected a message event");
        };
        let response: BatchResponse = serde_json::from_str(&raw).unwrap();
        assert_eq!(response.request_id, "r1");
        assert_eq!(response.results[0].name(), Some("Inbox"));
    }

    #[tokio::test]
    async fn test_garbage_message_reports_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut worker = ThreadWorker::spawn(EncryptService::default(), 1, tx).unwrap();
        worker.post_message("{{{".into()).unwrap();

        assert!(matches!(rx.recv().await, Some(WorkerEvent::Error(_))));
        // thread exits after a fatal error, closing the event channel
        assert_eq!(rx.recv().await, None);

        worker.terminate();
        assert!(matches!(
            worker.post_message("x".into()),
            Err(BatchError::WorkerTransport(_))
        ));
    }
}
