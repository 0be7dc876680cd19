//! Personal key from the account passphrase

use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use lockbox_crypto::{derive_master_key, KdfParams, SymmetricKey};
use lockbox_worker::KeyProvider;
use secrecy::SecretString;
use tracing::debug;

/// Derives the personal key with Argon2id on every request.
///
/// The passphrase comes from `LOCKBOX_PASSPHRASE` when set, otherwise from
/// an interactive prompt.
pub struct PassphraseKeyProvider {
    email: String,
    params: KdfParams,
    passphrase: Option<SecretString>,
    organizations: BTreeMap<String, SymmetricKey>,
}

impl PassphraseKeyProvider {
    pub fn new(email: impl Into<String>, params: KdfParams, passphrase: Option<SecretString>) -> Self {
        Self {
            email: email.into(),
            params,
            passphrase,
            organizations: BTreeMap::new(),
        }
    }

    pub fn with_organizations(mut self, organizations: BTreeMap<String, SymmetricKey>) -> Self {
        self.organizations = organizations;
        self
    }

    fn passphrase(&self) -> anyhow::Result<SecretString> {
        match &self.passphrase {
            Some(passphrase) => Ok(passphrase.clone()),
            None => {
                let entered = rpassword::prompt_password(format!("Passphrase for {}: ", self.email))
                    .context("reading passphrase")?;
                Ok(SecretString::from(entered))
            }
        }
    }
}

#[async_trait]
impl KeyProvider for PassphraseKeyProvider {
    async fn personal_key(&self) -> anyhow::Result<Option<SymmetricKey>> {
        let passphrase = self.passphrase()?;
        let email = self.email.clone();
        let params = self.params.clone();

        let key = tokio::task::spawn_blocking(move || {
            derive_master_key(&passphrase, &email, &params)?.stretch()
        })
        .await
        .context("key derivation task")??;

        debug!(email = %self.email, "personal key derived");
        Ok(Some(key))
    }

    async fn organization_keys(&self) -> anyhow::Result<BTreeMap<String, SymmetricKey>> {
        Ok(self.organizations.clone())
    }
}
