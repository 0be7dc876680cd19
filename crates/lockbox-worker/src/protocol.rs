//! JSON messages exchanged with the decrypt worker
//!
//! ```text
//! request:  {"requestId": "...", "items": [{"typeTag": "Cipher", ...}], "keys": <KeySet>}
//! response: {"requestId": "...", "results": [{"typeTag": "CipherView", ...}]}
//! ```

use std::collections::BTreeMap;

use lockbox_crypto::SymmetricKey;
use lockbox_models::{DecryptableItem, DecryptedView};
use serde::{Deserialize, Serialize};

pub type RequestId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRequest {
    pub request_id: RequestId,
    pub items: Vec<DecryptableItem>,
    pub keys: KeySet,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    pub request_id: RequestId,
    pub results: Vec<DecryptedView>,
    /// Set when the worker could not process the request at all
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Keys shipped with a batch.
///
/// Wire forms, tried in order:
/// - `{"keyB64": ...}`: one key for every item
/// - `{"userKey": ..., "orgKeys": {"<orgId>": {...}}}`: personal plus organization keys
/// - `{"<orgId>": {...}}`: organization keys only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeySet {
    Single(SymmetricKey),
    Scoped(ScopedKeys),
    Organizations(BTreeMap<String, SymmetricKey>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScopedKeys {
    pub user_key: Option<SymmetricKey>,
    pub org_keys: BTreeMap<String, SymmetricKey>,
}

impl KeySet {
    pub fn scoped(
        user_key: Option<SymmetricKey>,
        org_keys: BTreeMap<String, SymmetricKey>,
    ) -> Self {
        Self::Scoped(ScopedKeys { user_key, org_keys })
    }

    /// Key for an item owned by `organization_id` (`None` = personal).
    pub fn resolve(&self, organization_id: Option<&str>) -> Option<&SymmetricKey> {
        match (self, organization_id) {
            (Self::Single(key), _) => Some(key),
            (Self::Scoped(keys), None) => keys.user_key.as_ref(),
            (Self::Scoped(keys), Some(org)) => keys.org_keys.get(org),
            (Self::Organizations(_), None) => None,
            (Self::Organizations(keys), Some(org)) => keys.get(org),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_keyset_wire_forms() {
        let key = SymmetricKey::generate();
        let b64 = key.to_b64();

        let single: KeySet = serde_json::from_value(json!({"keyB64": b64})).unwrap();
        assert!(matches!(single, KeySet::Single(_)));
        assert_eq!(single.resolve(Some("any-org")), Some(&key));

        let scoped: KeySet = serde_json::from_value(json!({
            "userKey": {"keyB64": b64},
            "orgKeys": {"org-a": {"keyB64": b64}}
        }))
        .unwrap();
        assert!(matches!(scoped, KeySet::Scoped(_)));
        assert_eq!(scoped.resolve(None), Some(&key));
        assert_eq!(scoped.resolve(Some("org-a")), Some(&key));
        assert_eq!(scoped.resolve(Some("org-b")), None);

        let orgs: KeySet = serde_json::from_value(json!({"org-a": {"keyB64": b64}})).unwrap();
        assert!(matches!(orgs, KeySet::Organizations(_)));
        assert_eq!(orgs.resolve(None), None);
        assert_eq!(orgs.resolve(Some("org-a")), Some(&key));
    }

    #[test]
    fn test_response_omits_empty_error() {
        let response = BatchResponse {
            request_id: "r1".into(),
            results: vec![],
            error: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json, json!({"requestId": "r1", "results": []}));
    }
}
