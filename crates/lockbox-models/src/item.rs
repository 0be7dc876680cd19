//! Closed registry of decryptable item kinds
//!
//! Items cross the worker boundary as plain JSON with an embedded `typeTag`.
//! Reconstruction is serde's tagged-enum dispatch, so every kind is known at
//! compile time and an unregistered tag fails deserialization.
//!
//! ```text
//! {"typeTag":"Cipher", "id":..., "organizationId":..., "name":"2.iv|ct|mac", ...}
//!        │ decrypt(key)
//!        ▼
//! {"typeTag":"CipherView", "id":..., "name":"plaintext", ...}
//! ```

use lockbox_crypto::{EncString, EncryptService, SymmetricKey, DECRYPT_ERROR};
use serde::{Deserialize, Serialize};

use crate::cipher::Cipher;
use crate::folder::Folder;
use crate::view::{CipherView, FolderView};
use crate::ModelError;

/// An encrypted item as it crosses the worker boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "typeTag")]
pub enum DecryptableItem {
    Cipher(Cipher),
    Folder(Folder),
}

/// The plaintext counterpart of [`DecryptableItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "typeTag")]
pub enum DecryptedView {
    CipherView(CipherView),
    FolderView(FolderView),
}

impl DecryptableItem {
    pub fn id(&self) -> &str {
        match self {
            Self::Cipher(c) => &c.id,
            Self::Folder(f) => &f.id,
        }
    }

    /// Owning organization. `None` means the personal key applies.
    pub fn organization_id(&self) -> Option<&str> {
        match self {
            Self::Cipher(c) => c.organization_id.as_deref(),
            Self::Folder(_) => None,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Cipher(_) => "Cipher",
            Self::Folder(_) => "Folder",
        }
    }

    /// Decrypt into a view. Never fails: fields that cannot be decrypted
    /// (including every field when `key` is `None`) become the sentinel.
    pub fn decrypt(&self, service: &EncryptService, key: Option<&SymmetricKey>) -> DecryptedView {
        match self {
            Self::Cipher(c) => DecryptedView::CipherView(c.decrypt(service, key)),
            Self::Folder(f) => DecryptedView::FolderView(f.decrypt(service, key)),
        }
    }

    /// Rebuild an item from its plain JSON form.
    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(ModelError::Reconstruct)
    }
}

impl From<Cipher> for DecryptableItem {
    fn from(value: Cipher) -> Self {
        Self::Cipher(value)
    }
}

impl From<Folder> for DecryptableItem {
    fn from(value: Folder) -> Self {
        Self::Folder(value)
    }
}

impl DecryptedView {
    pub fn id(&self) -> &str {
        match self {
            Self::CipherView(c) => &c.id,
            Self::FolderView(f) => &f.id,
        }
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::CipherView(_) => "CipherView",
            Self::FolderView(_) => "FolderView",
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::CipherView(c) => c.name.as_deref(),
            Self::FolderView(f) => f.name.as_deref(),
        }
    }

    /// True when the item's name decrypted to the sentinel.
    pub fn is_undecryptable(&self) -> bool {
        self.name() == Some(DECRYPT_ERROR)
    }

    pub fn as_cipher(&self) -> Option<&CipherView> {
        match self {
            Self::CipherView(c) => Some(c),
            Self::FolderView(_) => None,
        }
    }

    pub fn from_json(value: serde_json::Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(ModelError::Reconstruct)
    }
}

/// Per-item decryption context: one service, one optional key.
pub(crate) struct FieldDecryptor<'a> {
    service: &'a EncryptService,
    key: Option<&'a SymmetricKey>,
}

impl<'a> FieldDecryptor<'a> {
    pub(crate) fn new(service: &'a EncryptService, key: Option<&'a SymmetricKey>) -> Self {
        Self { service, key }
    }

    pub(crate) fn text(&self, value: Option<&EncString>) -> Option<String> {
        let value = value?;
        Some(match self.key {
            Some(key) => value.decrypt(self.service, key).to_string(),
            None => DECRYPT_ERROR.to_string(),
        })
    }

    /// Unwrap an encrypted key.
    pub(crate) fn key(&self, wrapped: &EncString) -> Result<SymmetricKey, ModelError> {
        let key = self.key.ok_or(ModelError::MissingKey)?;
        let bytes = self
            .service
            .decrypt_to_bytes(wrapped, key)
            .map_err(ModelError::Decrypt)?;
        Ok(SymmetricKey::new(bytes, None)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{Attachment, Card, Field, Login};
    use crate::enums::{CipherType, FieldType, LinkedId};
    use serde_json::json;

    fn encrypt(svc: &EncryptService, key: &SymmetricKey, text: &str) -> Option<EncString> {
        Some(svc.encrypt(text, key).unwrap())
    }

    fn login_cipher(svc: &EncryptService, key: &SymmetricKey, org: Option<&str>) -> Cipher {
        Cipher {
            id: "cipher-1".into(),
            organization_id: org.map(str::to_string),
            folder_id: None,
            cipher_type: CipherType::Login,
            name: encrypt(svc, key, "Example"),
            notes: None,
            favorite: true,
            reprompt: 0,
            login: Some(Login {
                username: encrypt(svc, key, "alice"),
                password: encrypt(svc, key, "s3cret"),
                totp: None,
                uris: vec![],
            }),
            card: None,
            identity: None,
            secure_note: None,
            fields: vec![Field {
                name: encrypt(svc, key, "pin"),
                value: None,
                field_type: FieldType::Linked,
                linked_id: Some(LinkedId::LoginPassword),
            }],
            attachments: vec![],
            password_history: vec![],
            revision_date: Some("2024-01-01T00:00:00Z".into()),
            deleted_date: None,
        }
    }

    #[test]
    fn test_decrypt_cipher() {
        let svc = EncryptService::default();
        let key = SymmetricKey::generate();
        let item = DecryptableItem::from(login_cipher(&svc, &key, None));

        let view = item.decrypt(&svc, Some(&key));
        let cipher = view.as_cipher().unwrap();
        assert_eq!(cipher.name.as_deref(), Some("Example"));
        assert!(cipher.favorite);
        let login = cipher.login.as_ref().unwrap();
        assert_eq!(login.username.as_deref(), Some("alice"));
        assert_eq!(cipher.fields[0].name.as_deref(), Some("pin"));
        assert_eq!(cipher.linked_field_value(LinkedId::LoginPassword), Some("s3cret"));
    }

    #[test]
    fn test_missing_key_degrades_every_field() {
        let svc = EncryptService::default();
        let key = SymmetricKey::generate();
        let item = DecryptableItem::from(login_cipher(&svc, &key, Some("org-a")));

        let view = item.decrypt(&svc, None);
        assert!(view.is_undecryptable());
        let cipher = view.as_cipher().unwrap();
        assert_eq!(
            cipher.login.as_ref().unwrap().password.as_deref(),
            Some(DECRYPT_ERROR)
        );
        assert_eq!(cipher.notes, None, "absent fields stay absent");
    }

    #[test]
    fn test_wrong_key_degrades_without_touching_ciphertext() {
        let svc = EncryptService::new(std::sync::Arc::new(lockbox_crypto::RustCryptoFunctions), false);
        let key = SymmetricKey::generate();
        let cipher = login_cipher(&svc, &key, None);
        let stored = cipher.name.clone();
        let item = DecryptableItem::from(cipher);

        let view = item.decrypt(&svc, Some(&SymmetricKey::generate()));
        assert!(view.is_undecryptable());
        match &item {
            DecryptableItem::Cipher(c) => assert_eq!(c.name, stored),
            DecryptableItem::Folder(_) => unreachable!(),
        }
    }

    #[test]
    fn test_attachment_key_unwrap() {
        let svc = EncryptService::default();
        let key = SymmetricKey::generate();
        let attachment_key = SymmetricKey::generate();
        let wrapped = svc.encrypt(attachment_key.as_bytes(), &key).unwrap();

        let mut cipher = login_cipher(&svc, &key, None);
        cipher.attachments = vec![
            Attachment {
                id: Some("a1".into()),
                url: None,
                size: Some("10".into()),
                size_name: Some("10 Bytes".into()),
                file_name: encrypt(&svc, &key, "photo.png"),
                key: Some(wrapped),
            },
            Attachment {
                id: Some("a2".into()),
                url: None,
                size: None,
                size_name: None,
                file_name: None,
                key: Some(EncString::parse("2.bad|data")),
            },
        ];

        let view = cipher.decrypt(&svc, Some(&key));
        assert_eq!(view.attachments[0].file_name.as_deref(), Some("photo.png"));
        assert_eq!(view.attachments[0].key.as_ref(), Some(&attachment_key));
        assert_eq!(view.attachments[1].key, None);
    }

    #[test]
    fn test_registry_roundtrip_through_json() {
        let svc = EncryptService::default();
        let key = SymmetricKey::generate();
        let mut cipher = login_cipher(&svc, &key, Some("org-a"));
        cipher.cipher_type = CipherType::Card;
        cipher.card = Some(Card {
            number: encrypt(&svc, &key, "4111111111111111"),
            ..Default::default()
        });
        let item = DecryptableItem::from(cipher);

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["typeTag"], "Cipher");
        assert_eq!(json["organizationId"], "org-a");
        assert_eq!(json["type"], 3);

        let rebuilt = DecryptableItem::from_json(json).unwrap();
        assert_eq!(rebuilt, item);
        assert_eq!(rebuilt.organization_id(), Some("org-a"));

        let view = rebuilt.decrypt(&svc, Some(&key));
        let view_json = serde_json::to_value(&view).unwrap();
        assert_eq!(view_json["typeTag"], "CipherView");
        assert_eq!(DecryptedView::from_json(view_json).unwrap(), view);
    }

    #[test]
    fn test_folder_is_personal() {
        let item = DecryptableItem::from_json(json!({
            "typeTag": "Folder",
            "id": "f1",
            "name": "2.AAAA|AAAA|AAAA",
            "revisionDate": null
        }))
        .unwrap();
        assert_eq!(item.type_tag(), "Folder");
        assert_eq!(item.organization_id(), None);
    }

    #[test]
    fn test_unknown_type_tag_rejected() {
        let err = DecryptableItem::from_json(json!({"typeTag": "Send", "id": "s1"}));
        assert!(matches!(err, Err(ModelError::Reconstruct(_))));
    }
}
