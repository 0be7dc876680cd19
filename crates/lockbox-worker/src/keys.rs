//! Key-retrieval collaborators consumed before each batch

use std::collections::BTreeMap;

use async_trait::async_trait;
use lockbox_crypto::SymmetricKey;

/// Supplies the keys a batch needs. Where keys come from (local encrypted
/// storage, an OS keychain, a passphrase prompt) is up to the implementor.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    /// Key for items with no organization. `None` when locked.
    async fn personal_key(&self) -> anyhow::Result<Option<SymmetricKey>>;

    /// Keys for every organization the user belongs to.
    async fn organization_keys(&self) -> anyhow::Result<BTreeMap<String, SymmetricKey>>;
}

/// Keys already held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    personal: Option<SymmetricKey>,
    organizations: BTreeMap<String, SymmetricKey>,
}

impl StaticKeyProvider {
    pub fn new(personal: Option<SymmetricKey>) -> Self {
        Self {
            personal,
            organizations: BTreeMap::new(),
        }
    }

    pub fn with_organization(mut self, org_id: impl Into<String>, key: SymmetricKey) -> Self {
        self.organizations.insert(org_id.into(), key);
        self
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn personal_key(&self) -> anyhow::Result<Option<SymmetricKey>> {
        Ok(self.personal.clone())
    }

    async fn organization_keys(&self) -> anyhow::Result<BTreeMap<String, SymmetricKey>> {
        Ok(self.organizations.clone())
    }
}
