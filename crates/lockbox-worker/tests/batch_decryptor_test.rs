//! Orchestrator behaviour: pooling, idle teardown, cancellation, stale
//! responses, and worker failure.
//!
//! Tests that need to control timing use a manual worker whose replies are
//! sent by the test itself; the rest run the real thread-backed worker.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lockbox_crypto::{EncString, EncryptService, SymmetricKey, DECRYPT_ERROR};
use lockbox_models::{Cipher, CipherType, DecryptableItem, DecryptedView, Folder, Login};
use lockbox_worker::{
    BatchDecryptor, BatchError, BatchRequest, BatchResponse, KeySet, PoolOptions,
    StaticKeyProvider, ThreadWorkerFactory, Worker, WorkerEvent, WorkerFactory,
};
use tokio::sync::mpsc;

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn login(svc: &EncryptService, key: &SymmetricKey, id: &str, org: Option<&str>) -> DecryptableItem {
    DecryptableItem::Cipher(Cipher {
        id: id.into(),
        organization_id: org.map(str::to_string),
        folder_id: None,
        cipher_type: CipherType::Login,
        name: Some(svc.encrypt(format!("name-{id}"), key).unwrap()),
        notes: None,
        favorite: false,
        reprompt: 0,
        login: Some(Login {
            username: Some(svc.encrypt("user", key).unwrap()),
            password: Some(svc.encrypt("hunter2", key).unwrap()),
            ..Default::default()
        }),
        card: None,
        identity: None,
        secure_note: None,
        fields: vec![],
        attachments: vec![],
        password_history: vec![],
        revision_date: None,
        deleted_date: None,
    })
}

fn folder(svc: &EncryptService, key: &SymmetricKey, id: &str) -> DecryptableItem {
    DecryptableItem::Folder(Folder {
        id: id.into(),
        name: Some(svc.encrypt(format!("folder-{id}"), key).unwrap()),
        revision_date: None,
    })
}

fn folder_view(id: &str) -> DecryptedView {
    DecryptedView::FolderView(lockbox_models::FolderView {
        id: id.into(),
        name: Some(format!("folder-{id}")),
        revision_date: None,
    })
}

fn options(idle_ttl: Duration) -> PoolOptions {
    PoolOptions {
        idle_ttl,
        ..PoolOptions::default()
    }
}

/// Thread-backed factory that counts how many workers it created.
struct CountingFactory {
    inner: ThreadWorkerFactory,
    created: AtomicUsize,
}

impl WorkerFactory for CountingFactory {
    fn create(
        &self,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<Box<dyn Worker>, BatchError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        self.inner.create(events)
    }
}

/// A worker driven by the test: it records posted messages and the test
/// replies through the captured event sender.
#[derive(Default)]
struct ManualFactory {
    workers: Mutex<Vec<ManualHandle>>,
}

#[derive(Clone)]
struct ManualHandle {
    events: mpsc::UnboundedSender<WorkerEvent>,
    posted: Arc<Mutex<Vec<String>>>,
    terminated: Arc<AtomicBool>,
}

struct ManualWorker {
    posted: Arc<Mutex<Vec<String>>>,
    terminated: Arc<AtomicBool>,
}

impl Worker for ManualWorker {
    fn post_message(&self, message: String) -> Result<(), BatchError> {
        self.posted.lock().unwrap().push(message);
        Ok(())
    }

    fn terminate(&mut self) {
        self.terminated.store(true, Ordering::SeqCst);
    }
}

impl WorkerFactory for ManualFactory {
    fn create(
        &self,
        events: mpsc::UnboundedSender<WorkerEvent>,
    ) -> Result<Box<dyn Worker>, BatchError> {
        let handle = ManualHandle {
            events,
            posted: Arc::default(),
            terminated: Arc::default(),
        };
        let worker = ManualWorker {
            posted: handle.posted.clone(),
            terminated: handle.terminated.clone(),
        };
        self.workers.lock().unwrap().push(handle);
        Ok(Box::new(worker))
    }
}

impl ManualFactory {
    fn worker(&self, index: usize) -> ManualHandle {
        self.workers.lock().unwrap()[index].clone()
    }

    fn count(&self) -> usize {
        self.workers.lock().unwrap().len()
    }
}

impl ManualHandle {
    fn request_ids(&self) -> Vec<String> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .map(|raw| serde_json::from_str::<BatchRequest>(raw).unwrap().request_id)
            .collect()
    }

    fn reply(&self, request_id: &str, results: Vec<DecryptedView>) -> bool {
        let response = BatchResponse {
            request_id: request_id.into(),
            results,
            error: None,
        };
        self.events
            .send(WorkerEvent::Message(serde_json::to_string(&response).unwrap()))
            .is_ok()
    }
}

async fn wait_for_posts(factory: &ManualFactory, worker: usize, count: usize) -> Vec<String> {
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if factory.count() > worker {
                let ids = factory.worker(worker).request_ids();
                if ids.len() >= count {
                    return ids;
                }
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("worker never received the expected requests")
}

// ── Thread-backed worker ─────────────────────────────────────────────────────

#[tokio::test]
async fn corrupted_item_degrades_alone() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let decryptor = BatchDecryptor::new(
        Arc::new(ThreadWorkerFactory::new(svc.clone(), 2)),
        svc.clone(),
        PoolOptions::default(),
    );

    let mut items: Vec<_> = (0..8).map(|i| login(&svc, &key, &format!("c{i}"), None)).collect();
    if let DecryptableItem::Cipher(c) = &mut items[5] {
        let name = c.name.as_ref().unwrap();
        c.name = Some(EncString::from_parts(
            name.scheme().unwrap(),
            name.data().unwrap(),
            name.iv(),
            Some("AAAA"),
        ));
    }

    let views = decryptor.submit(items, KeySet::Single(key)).await.unwrap();
    assert_eq!(views.len(), 8);
    let sentinels: Vec<_> = views.iter().filter(|v| v.is_undecryptable()).collect();
    assert_eq!(sentinels.len(), 1);
    assert_eq!(sentinels[0].id(), "c5");

    decryptor.terminate_all();
}

#[tokio::test]
async fn organization_items_use_their_own_keys() {
    let svc = EncryptService::default();
    let user_key = SymmetricKey::generate();
    let org_a = SymmetricKey::generate();
    let org_b = SymmetricKey::generate();
    let decryptor = BatchDecryptor::new(
        Arc::new(ThreadWorkerFactory::new(svc.clone(), 1)),
        svc.clone(),
        PoolOptions::default(),
    );

    let items = vec![
        login(&svc, &user_key, "mine", None),
        login(&svc, &org_a, "a", Some("orgA")),
        login(&svc, &org_b, "b", Some("orgB")),
    ];
    let provider = StaticKeyProvider::new(Some(user_key)).with_organization("orgA", org_a);

    let views = decryptor.decrypt_items(&provider, items).await.unwrap();
    let names: Vec<_> = views.iter().map(|v| v.name()).collect();
    assert_eq!(names, vec![Some("name-mine"), Some("name-a"), Some(DECRYPT_ERROR)]);

    let org_b_login = views[2].as_cipher().unwrap().login.as_ref().unwrap();
    assert_eq!(org_b_login.password.as_deref(), Some(DECRYPT_ERROR));

    decryptor.terminate_all();
}

#[tokio::test]
async fn concurrent_submissions_share_one_worker() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(CountingFactory {
        inner: ThreadWorkerFactory::new(svc.clone(), 1),
        created: AtomicUsize::new(0),
    });
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), PoolOptions::default());

    let first = decryptor.submit(vec![folder(&svc, &key, "1")], KeySet::Single(key.clone()));
    let second = decryptor.submit(vec![folder(&svc, &key, "2")], KeySet::Single(key.clone()));
    let (first, second) = tokio::join!(first, second);

    assert_eq!(first.unwrap(), vec![folder_view("1")]);
    assert_eq!(second.unwrap(), vec![folder_view("2")]);
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
    assert_eq!(decryptor.pending_requests(), 0);

    decryptor.terminate_all();
}

#[tokio::test]
async fn idle_worker_is_torn_down_and_recreated() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(CountingFactory {
        inner: ThreadWorkerFactory::new(svc.clone(), 1),
        created: AtomicUsize::new(0),
    });
    let decryptor = BatchDecryptor::new(
        factory.clone(),
        svc.clone(),
        options(Duration::from_millis(100)),
    );

    decryptor
        .submit(vec![folder(&svc, &key, "1")], KeySet::Single(key.clone()))
        .await
        .unwrap();
    assert!(decryptor.is_active());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(!decryptor.is_active(), "worker should be gone after the TTL");

    decryptor
        .submit(vec![folder(&svc, &key, "2")], KeySet::Single(key.clone()))
        .await
        .unwrap();
    assert_eq!(factory.created.load(Ordering::SeqCst), 2);
    assert_eq!(decryptor.workers_created(), 2);

    decryptor.terminate_all();
}

#[tokio::test]
async fn submissions_within_ttl_reuse_worker() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let decryptor = BatchDecryptor::new(
        Arc::new(ThreadWorkerFactory::new(svc.clone(), 1)),
        svc.clone(),
        options(Duration::from_secs(30)),
    );

    for i in 0..3 {
        decryptor
            .submit(vec![folder(&svc, &key, &i.to_string())], KeySet::Single(key.clone()))
            .await
            .unwrap();
    }
    assert_eq!(decryptor.workers_created(), 1);

    decryptor.terminate_all();
    assert!(!decryptor.is_active());
}

#[tokio::test]
async fn empty_batch_never_starts_a_worker() {
    let decryptor = BatchDecryptor::new(
        Arc::new(ManualFactory::default()),
        EncryptService::default(),
        PoolOptions::default(),
    );
    let views = decryptor
        .submit(vec![], KeySet::Single(SymmetricKey::generate()))
        .await
        .unwrap();
    assert!(views.is_empty());
    assert_eq!(decryptor.workers_created(), 0);
}

#[tokio::test]
async fn small_batches_can_bypass_the_worker() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let decryptor = BatchDecryptor::new(
        factory.clone(),
        svc.clone(),
        PoolOptions {
            min_items_for_worker: 5,
            ..PoolOptions::default()
        },
    );

    let views = decryptor
        .submit(vec![folder(&svc, &key, "1")], KeySet::Single(key))
        .await
        .unwrap();
    assert_eq!(views, vec![folder_view("1")]);
    assert_eq!(factory.count(), 0);
}

// ── Manual worker ────────────────────────────────────────────────────────────

#[tokio::test]
async fn terminate_all_resolves_pending_with_empty_results() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), PoolOptions::default());

    let first = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "1")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    let second = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "2")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });

    let ids = wait_for_posts(&factory, 0, 2).await;
    assert_eq!(decryptor.pending_requests(), 2);

    decryptor.terminate_all();
    assert!(first.await.unwrap().unwrap().is_empty());
    assert!(second.await.unwrap().unwrap().is_empty());
    assert!(factory.worker(0).terminated.load(Ordering::SeqCst));
    assert!(!decryptor.is_active());

    // late replies from the retired worker go nowhere
    let old = factory.worker(0);
    for id in &ids {
        let _ = old.reply(id, vec![folder_view("late")]);
    }
    assert_eq!(decryptor.pending_requests(), 0);
}

#[tokio::test]
async fn each_submission_resets_the_idle_ttl() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let ttl = Duration::from_millis(400);
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), options(ttl));
    let start = tokio::time::Instant::now();

    for (round, at) in [(1, Duration::ZERO), (2, ttl * 7 / 10)] {
        tokio::time::sleep_until(start + at).await;
        let pending = tokio::spawn({
            let decryptor = decryptor.clone();
            let items = vec![folder(&svc, &key, &round.to_string())];
            let keys = KeySet::Single(key.clone());
            async move { decryptor.submit(items, keys).await }
        });
        let ids = wait_for_posts(&factory, 0, round).await;
        factory.worker(0).reply(&ids[round - 1], vec![folder_view(&round.to_string())]);
        assert_eq!(pending.await.unwrap().unwrap(), vec![folder_view(&round.to_string())]);
    }

    // past the first submission's deadline, inside the second's
    tokio::time::sleep_until(start + ttl * 13 / 10).await;
    assert!(decryptor.is_active());
    assert!(!factory.worker(0).terminated.load(Ordering::SeqCst));
    assert_eq!(factory.count(), 1);

    tokio::time::sleep(ttl * 2).await;
    assert!(!decryptor.is_active());
    assert!(factory.worker(0).terminated.load(Ordering::SeqCst));
}

#[tokio::test]
async fn idle_ttl_never_tears_down_a_worker_with_work_in_flight() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let ttl = Duration::from_millis(100);
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), options(ttl));

    let slow = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "1")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    let ids = wait_for_posts(&factory, 0, 1).await;

    tokio::time::sleep(ttl * 4).await;
    assert!(decryptor.is_active());
    assert_eq!(decryptor.pending_requests(), 1);
    assert!(!factory.worker(0).terminated.load(Ordering::SeqCst));

    assert!(factory.worker(0).reply(&ids[0], vec![folder_view("1")]));
    assert_eq!(slow.await.unwrap().unwrap(), vec![folder_view("1")]);
    assert_eq!(decryptor.workers_created(), 1);

    // once nothing is pending the next expiry retires it
    tokio::time::sleep(ttl * 4).await;
    assert!(!decryptor.is_active());
}

#[tokio::test]
async fn stale_request_ids_are_discarded() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), PoolOptions::default());

    let pending = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "1")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    let ids = wait_for_posts(&factory, 0, 1).await;
    decryptor.terminate_all();
    assert!(pending.await.unwrap().unwrap().is_empty());

    // a fresh worker serves the next request
    let next = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "2")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    let new_ids = wait_for_posts(&factory, 1, 1).await;
    let worker = factory.worker(1);

    // the old id, replayed on the new worker, matches nothing
    assert!(worker.reply(&ids[0], vec![folder_view("stale")]));
    assert!(worker.reply(&new_ids[0], vec![folder_view("2")]));

    assert_eq!(next.await.unwrap().unwrap(), vec![folder_view("2")]);
    assert_eq!(decryptor.workers_created(), 2);

    decryptor.terminate_all();
}

#[tokio::test]
async fn worker_failure_rejects_pending_and_allows_a_fresh_worker() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), PoolOptions::default());

    let doomed = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "1")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    wait_for_posts(&factory, 0, 1).await;

    factory
        .worker(0)
        .events
        .send(WorkerEvent::Error("boom".into()))
        .unwrap();

    assert_eq!(
        doomed.await.unwrap(),
        Err(BatchError::WorkerTransport("boom".into()))
    );
    assert!(factory.worker(0).terminated.load(Ordering::SeqCst));

    let retry = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "1")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    let ids = wait_for_posts(&factory, 1, 1).await;
    factory.worker(1).reply(&ids[0], vec![folder_view("1")]);
    assert_eq!(retry.await.unwrap().unwrap(), vec![folder_view("1")]);

    decryptor.terminate_all();
}

#[tokio::test]
async fn error_response_surfaces_as_protocol_error() {
    let svc = EncryptService::default();
    let key = SymmetricKey::generate();
    let factory = Arc::new(ManualFactory::default());
    let decryptor = BatchDecryptor::new(factory.clone(), svc.clone(), PoolOptions::default());

    let pending = tokio::spawn({
        let decryptor = decryptor.clone();
        let items = vec![folder(&svc, &key, "1")];
        let keys = KeySet::Single(key.clone());
        async move { decryptor.submit(items, keys).await }
    });
    let ids = wait_for_posts(&factory, 0, 1).await;

    let response = BatchResponse {
        request_id: ids[0].clone(),
        results: vec![],
        error: Some("malformed batch request".into()),
    };
    factory
        .worker(0)
        .events
        .send(WorkerEvent::Message(serde_json::to_string(&response).unwrap()))
        .unwrap();

    assert!(matches!(
        pending.await.unwrap(),
        Err(BatchError::Protocol(_))
    ));
    assert!(decryptor.is_active(), "a per-request error keeps the worker");

    decryptor.terminate_all();
}
