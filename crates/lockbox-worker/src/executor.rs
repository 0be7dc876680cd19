//! Worker-side batch decryption
//!
//! Independent of any transport: [`WorkerExecutor::handle`] maps a request
//! to a response, [`WorkerExecutor::handle_message`] does the same over JSON
//! text. The thread shell in [`crate::thread`] only moves strings.

use lockbox_crypto::EncryptService;
use lockbox_models::{DecryptableItem, DecryptedView};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::ExecutorError;
use crate::protocol::{BatchRequest, BatchResponse, KeySet};

pub struct WorkerExecutor {
    service: EncryptService,
    pool: Option<rayon::ThreadPool>,
}

impl WorkerExecutor {
    /// Executor that decrypts each batch on a dedicated rayon pool
    /// (`threads == 0` uses the CPU count).
    pub fn new(service: EncryptService, threads: usize) -> Result<Self, ExecutorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("lockbox-decrypt-{i}"))
            .build()?;
        debug!(threads = pool.current_num_threads(), "decrypt executor ready");
        Ok(Self {
            service,
            pool: Some(pool),
        })
    }

    /// Executor that decrypts on the calling thread.
    pub fn inline(service: EncryptService) -> Self {
        Self {
            service,
            pool: None,
        }
    }

    pub fn handle(&self, request: BatchRequest) -> BatchResponse {
        let BatchRequest {
            request_id,
            items,
            keys,
        } = request;

        let results: Vec<DecryptedView> = match &self.pool {
            Some(pool) => pool.install(|| {
                items
                    .par_iter()
                    .map(|item| self.decrypt_item(item, &keys))
                    .collect()
            }),
            None => items
                .iter()
                .map(|item| self.decrypt_item(item, &keys))
                .collect(),
        };

        debug!(request_id = %request_id, items = items.len(), "batch decrypted");
        BatchResponse {
            request_id,
            results,
            error: None,
        }
    }

    /// Decode a JSON request, handle it, encode the response.
    ///
    /// A request that does not decode but still carries a readable
    /// `requestId` is answered with an error response so its caller is not
    /// left waiting.
    pub fn handle_message(&self, raw: &str) -> Result<String, ExecutorError> {
        let response = match serde_json::from_str::<BatchRequest>(raw) {
            Ok(request) => self.handle(request),
            Err(e) => {
                let request_id = request_id_of(raw).ok_or(ExecutorError::Decode(e))?;
                warn!(request_id = %request_id, "undecodable batch request");
                BatchResponse {
                    request_id,
                    results: Vec::new(),
                    error: Some("malformed batch request".into()),
                }
            }
        };
        serde_json::to_string(&response).map_err(ExecutorError::Encode)
    }

    fn decrypt_item(&self, item: &DecryptableItem, keys: &KeySet) -> DecryptedView {
        let org_id = item.organization_id();
        let key = keys.resolve(org_id);
        if key.is_none() {
            warn!(
                item_id = item.id(),
                org_id = org_id.unwrap_or("personal"),
                "no key for item, returning undecryptable view"
            );
        }
        item.decrypt(&self.service, key)
    }
}

fn request_id_of(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    value.get("requestId")?.as_str().map(str::to_string)
}
