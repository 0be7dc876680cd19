//! Batch decryption orchestrator
//!
//! Owns at most one worker and the table of in-flight requests.
//!
//! ```text
//!            submit                    idle TTL, nothing pending
//!   Idle ───────────────► Active ────────────────────────────────► Idle
//!     ▲                    │  │ submit: reuse worker, reset TTL
//!     │  terminate_all     │  │ response: resolve pending[requestId]
//!     └────────────────────┘  │ worker error: reject all pending
//! ```
//!
//! Each worker instance carries a generation number. Listener and timer
//! tasks only act while their generation is still the active one, so
//! anything arriving from a torn-down worker is ignored.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use lockbox_core::config::WorkerConfig;
use lockbox_crypto::EncryptService;
use lockbox_models::{DecryptableItem, DecryptedView};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::error::BatchError;
use crate::executor::WorkerExecutor;
use crate::keys::KeyProvider;
use crate::protocol::{BatchRequest, BatchResponse, KeySet, RequestId};
use crate::thread::{ThreadWorkerFactory, Worker, WorkerEvent, WorkerFactory};

type Completion = oneshot::Sender<Result<Vec<DecryptedView>, BatchError>>;

#[derive(Debug, Clone)]
pub struct PoolOptions {
    /// Tear the worker down after this long with nothing submitted (default: 3 min)
    pub idle_ttl: Duration,
    /// Batches smaller than this are decrypted inline instead of on the worker
    pub min_items_for_worker: usize,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(180),
            min_items_for_worker: 1,
        }
    }
}

impl From<&WorkerConfig> for PoolOptions {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            idle_ttl: config.idle_ttl(),
            min_items_for_worker: config.min_items_for_worker,
        }
    }
}

/// Decrypts batches of items on a pooled, lazily created worker.
///
/// Cheap to clone; clones share the same worker and request table.
#[derive(Clone)]
pub struct BatchDecryptor {
    inner: Arc<Inner>,
}

struct Inner {
    factory: Arc<dyn WorkerFactory>,
    service: EncryptService,
    options: PoolOptions,
    state: Mutex<PoolState>,
    workers_created: AtomicUsize,
}

#[derive(Default)]
struct PoolState {
    active: Option<ActiveWorker>,
    pending: HashMap<RequestId, Completion>,
    generation: u64,
}

struct ActiveWorker {
    worker: Box<dyn Worker>,
    generation: u64,
    listener: JoinHandle<()>,
    idle_timer: Option<JoinHandle<()>>,
}

impl ActiveWorker {
    fn shutdown(mut self) {
        self.worker.terminate();
        self.listener.abort();
        if let Some(timer) = self.idle_timer.take() {
            timer.abort();
        }
    }
}

impl BatchDecryptor {
    pub fn new(
        factory: Arc<dyn WorkerFactory>,
        service: EncryptService,
        options: PoolOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                factory,
                service,
                options,
                state: Mutex::new(PoolState::default()),
                workers_created: AtomicUsize::new(0),
            }),
        }
    }

    /// Thread-backed decryptor configured from `[worker]`.
    pub fn from_config(config: &WorkerConfig, service: EncryptService) -> Self {
        let factory = ThreadWorkerFactory::new(service.clone(), config.decrypt_threads);
        Self::new(Arc::new(factory), service, PoolOptions::from(config))
    }

    /// Decrypt `items` on the worker.
    ///
    /// Resolves with one view per item, in input order. Items that cannot be
    /// decrypted come back as sentinel views; only a worker failure makes
    /// this return `Err`. Resolves with an empty list if [`Self::terminate_all`]
    /// runs first.
    pub async fn submit(
        &self,
        items: Vec<DecryptableItem>,
        keys: KeySet,
    ) -> Result<Vec<DecryptedView>, BatchError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let request = BatchRequest {
            request_id: Uuid::new_v4().to_string(),
            items,
            keys,
        };

        if request.items.len() < self.inner.options.min_items_for_worker {
            return self.decrypt_inline(request).await;
        }

        let request_id = request.request_id.clone();
        let payload =
            serde_json::to_string(&request).map_err(|e| BatchError::Protocol(e.to_string()))?;
        let items = request.items.len();

        let completion = self.inner.dispatch(request_id.clone(), payload)?;
        debug!(request_id = %request_id, items, "batch submitted");

        completion
            .await
            .map_err(|_| BatchError::WorkerTransport("request dropped".into()))?
    }

    /// Fetch keys from `provider`, then [`Self::submit`].
    pub async fn decrypt_items(
        &self,
        provider: &dyn KeyProvider,
        items: Vec<DecryptableItem>,
    ) -> Result<Vec<DecryptedView>, BatchError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let user_key = provider
            .personal_key()
            .await
            .map_err(|e| BatchError::KeyProvider(format!("{e:#}")))?;
        let org_keys = provider
            .organization_keys()
            .await
            .map_err(|e| BatchError::KeyProvider(format!("{e:#}")))?;
        self.submit(items, KeySet::scoped(user_key, org_keys)).await
    }

    /// Resolve every pending request with an empty result and discard the worker.
    pub fn terminate_all(&self) {
        let (pending, active) = {
            let mut state = self.inner.lock();
            (std::mem::take(&mut state.pending), state.active.take())
        };
        if let Some(active) = active {
            info!(generation = active.generation, "decrypt worker terminated");
            active.shutdown();
        }
        if !pending.is_empty() {
            debug!(count = pending.len(), "resolving pending batches with empty results");
        }
        for (_, completion) in pending {
            let _ = completion.send(Ok(Vec::new()));
        }
    }

    /// Whether a worker currently exists.
    pub fn is_active(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    pub fn pending_requests(&self) -> usize {
        self.inner.lock().pending.len()
    }

    /// Number of workers created over this decryptor's lifetime.
    pub fn workers_created(&self) -> usize {
        self.inner.workers_created.load(Ordering::SeqCst)
    }

    async fn decrypt_inline(&self, request: BatchRequest) -> Result<Vec<DecryptedView>, BatchError> {
        let service = self.inner.service.clone();
        let response = tokio::task::spawn_blocking(move || {
            WorkerExecutor::inline(service).handle(request)
        })
        .await
        .map_err(|e| BatchError::WorkerTransport(e.to_string()))?;
        Ok(response.results)
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register the request, make sure a worker exists, post, reset the TTL.
    fn dispatch(
        self: &Arc<Self>,
        request_id: RequestId,
        payload: String,
    ) -> Result<oneshot::Receiver<Result<Vec<DecryptedView>, BatchError>>, BatchError> {
        let mut state = self.lock();

        if state.active.is_none() {
            let active = self.start_worker(&mut state)?;
            state.active = Some(active);
        }

        let (tx, rx) = oneshot::channel();
        state.pending.insert(request_id.clone(), tx);

        let posted = match state.active.as_ref() {
            Some(active) => active.worker.post_message(payload),
            None => Err(BatchError::WorkerTransport("no active worker".into())),
        };
        if let Err(e) = posted {
            state.pending.remove(&request_id);
            if let Some(active) = state.active.take() {
                active.shutdown();
            }
            warn!(request_id = %request_id, error = %e, "could not post batch to worker");
            return Err(e);
        }

        if let Some(active) = state.active.as_mut() {
            self.restart_idle_timer(active);
        }
        Ok(rx)
    }

    fn start_worker(self: &Arc<Self>, state: &mut PoolState) -> Result<ActiveWorker, BatchError> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let worker = self.factory.create(events_tx)?;

        state.generation += 1;
        let generation = state.generation;
        self.workers_created.fetch_add(1, Ordering::SeqCst);
        info!(generation, "decrypt worker created");

        let listener = tokio::spawn(listen(Arc::downgrade(self), generation, events_rx));
        Ok(ActiveWorker {
            worker,
            generation,
            listener,
            idle_timer: None,
        })
    }

    fn restart_idle_timer(self: &Arc<Self>, active: &mut ActiveWorker) {
        if let Some(timer) = active.idle_timer.take() {
            timer.abort();
        }
        let inner = Arc::downgrade(self);
        let ttl = self.options.idle_ttl;
        let generation = active.generation;
        active.idle_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = inner.upgrade() {
                inner.on_idle(generation);
            }
        }));
    }

    fn on_idle(self: &Arc<Self>, generation: u64) {
        let mut state = self.lock();
        let current = state.active.as_ref().map(|a| a.generation);
        if current != Some(generation) {
            return;
        }

        if state.pending.is_empty() {
            if let Some(mut active) = state.active.take() {
                // this task is the timer; don't abort it from inside
                active.idle_timer.take();
                info!(generation, "idle TTL elapsed, decrypt worker torn down");
                active.shutdown();
            }
            return;
        }

        let pending = state.pending.len();
        if let Some(active) = state.active.as_mut() {
            debug!(generation, pending, "idle TTL elapsed with work in flight, re-arming");
            active.idle_timer.take();
            self.restart_idle_timer(active);
        }
    }

    fn on_response(&self, generation: u64, raw: &str) {
        let response: BatchResponse = match serde_json::from_str(raw) {
            Ok(response) => response,
            Err(e) => {
                warn!(generation, error = %e, "discarding unreadable worker response");
                return;
            }
        };

        let completion = {
            let mut state = self.lock();
            if state.active.as_ref().map(|a| a.generation) != Some(generation) {
                debug!(request_id = %response.request_id, generation, "discarding response from retired worker");
                return;
            }
            state.pending.remove(&response.request_id)
        };

        let Some(completion) = completion else {
            debug!(request_id = %response.request_id, "discarding response for unknown request");
            return;
        };

        let outcome = match response.error {
            Some(reason) => Err(BatchError::Protocol(reason)),
            None => Ok(response.results),
        };
        if completion.send(outcome).is_err() {
            debug!(request_id = %response.request_id, "caller went away before batch completed");
        }
    }

    fn on_worker_error(&self, generation: u64, reason: String) {
        let (pending, active) = {
            let mut state = self.lock();
            if state.active.as_ref().map(|a| a.generation) != Some(generation) {
                return;
            }
            (std::mem::take(&mut state.pending), state.active.take())
        };

        error!(generation, reason = %reason, pending = pending.len(), "decrypt worker failed");
        if let Some(active) = active {
            active.shutdown();
        }
        for (_, completion) in pending {
            let _ = completion.send(Err(BatchError::WorkerTransport(reason.clone())));
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self
            .state
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(active) = state.active.take() {
            active.shutdown();
        }
    }
}

async fn listen(
    pool: Weak<Inner>,
    generation: u64,
    mut events: mpsc::UnboundedReceiver<WorkerEvent>,
) {
    while let Some(event) = events.recv().await {
        let Some(inner) = pool.upgrade() else {
            return;
        };
        match event {
            WorkerEvent::Message(raw) => inner.on_response(generation, &raw),
            WorkerEvent::Error(reason) => {
                inner.on_worker_error(generation, reason);
                return;
            }
        }
    }

    // the worker dropped its event sender without reporting an error
    if let Some(inner) = pool.upgrade() {
        inner.on_worker_error(generation, "worker exited".into());
    }
}
