//! Encrypted cipher item as stored and synced

use lockbox_crypto::{EncString, EncryptService, SymmetricKey};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::enums::{CipherType, FieldType, LinkedId};
use crate::item::FieldDecryptor;
use crate::view::{
    AttachmentView, CardView, CipherView, FieldView, IdentityView, LoginUriView, LoginView,
    PasswordHistoryView, SecureNoteView,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cipher {
    pub id: String,
    pub organization_id: Option<String>,
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub cipher_type: CipherType,
    pub name: Option<EncString>,
    pub notes: Option<EncString>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub reprompt: u8,
    pub login: Option<Login>,
    pub card: Option<Card>,
    pub identity: Option<Identity>,
    pub secure_note: Option<SecureNote>,
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub password_history: Vec<PasswordHistory>,
    pub revision_date: Option<String>,
    pub deleted_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    pub username: Option<EncString>,
    pub password: Option<EncString>,
    pub totp: Option<EncString>,
    #[serde(default)]
    pub uris: Vec<LoginUri>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginUri {
    pub uri: Option<EncString>,
    #[serde(rename = "match")]
    pub match_type: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub cardholder_name: Option<EncString>,
    pub brand: Option<EncString>,
    pub number: Option<EncString>,
    pub exp_month: Option<EncString>,
    pub exp_year: Option<EncString>,
    pub code: Option<EncString>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub title: Option<EncString>,
    pub first_name: Option<EncString>,
    pub middle_name: Option<EncString>,
    pub last_name: Option<EncString>,
    pub address1: Option<EncString>,
    pub address2: Option<EncString>,
    pub address3: Option<EncString>,
    pub city: Option<EncString>,
    pub state: Option<EncString>,
    pub postal_code: Option<EncString>,
    pub country: Option<EncString>,
    pub company: Option<EncString>,
    pub email: Option<EncString>,
    pub phone: Option<EncString>,
    pub ssn: Option<EncString>,
    pub username: Option<EncString>,
    pub passport_number: Option<EncString>,
    pub license_number: Option<EncString>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecureNote {
    #[serde(rename = "type", default)]
    pub note_type: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: Option<EncString>,
    pub value: Option<EncString>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    pub linked_id: Option<LinkedId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: Option<String>,
    pub url: Option<String>,
    pub size: Option<String>,
    pub size_name: Option<String>,
    pub file_name: Option<EncString>,
    /// Wrapped per-attachment key
    pub key: Option<EncString>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHistory {
    pub password: Option<EncString>,
    pub last_used_date: Option<String>,
}

impl Cipher {
    /// Decrypt every encrypted field. A `None` key degrades every field to
    /// the error sentinel; the stored ciphertext is left untouched.
    pub fn decrypt(&self, service: &EncryptService, key: Option<&SymmetricKey>) -> CipherView {
        let dec = FieldDecryptor::new(service, key);

        CipherView {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            folder_id: self.folder_id.clone(),
            cipher_type: self.cipher_type,
            name: dec.text(self.name.as_ref()),
            notes: dec.text(self.notes.as_ref()),
            favorite: self.favorite,
            reprompt: self.reprompt,
            login: self.login.as_ref().map(|l| l.decrypt(&dec)),
            card: self.card.as_ref().map(|c| c.decrypt(&dec)),
            identity: self.identity.as_ref().map(|i| i.decrypt(&dec)),
            secure_note: self.secure_note.as_ref().map(|n| SecureNoteView {
                note_type: n.note_type,
            }),
            fields: self.fields.iter().map(|f| f.decrypt(&dec)).collect(),
            attachments: self
                .attachments
                .iter()
                .map(|a| a.decrypt(&dec, &self.id))
                .collect(),
            password_history: self
                .password_history
                .iter()
                .map(|p| PasswordHistoryView {
                    password: dec.text(p.password.as_ref()),
                    last_used_date: p.last_used_date.clone(),
                })
                .collect(),
            revision_date: self.revision_date.clone(),
            deleted_date: self.deleted_date.clone(),
        }
    }
}

impl Login {
    fn decrypt(&self, dec: &FieldDecryptor<'_>) -> LoginView {
        LoginView {
            username: dec.text(self.username.as_ref()),
            password: dec.text(self.password.as_ref()),
            totp: dec.text(self.totp.as_ref()),
            uris: self
                .uris
                .iter()
                .map(|u| LoginUriView {
                    uri: dec.text(u.uri.as_ref()),
                    match_type: u.match_type,
                })
                .collect(),
        }
    }
}

impl Card {
    fn decrypt(&self, dec: &FieldDecryptor<'_>) -> CardView {
        CardView {
            cardholder_name: dec.text(self.cardholder_name.as_ref()),
            brand: dec.text(self.brand.as_ref()),
            number: dec.text(self.number.as_ref()),
            exp_month: dec.text(self.exp_month.as_ref()),
            exp_year: dec.text(self.exp_year.as_ref()),
            code: dec.text(self.code.as_ref()),
        }
    }
}

impl Identity {
    fn decrypt(&self, dec: &FieldDecryptor<'_>) -> IdentityView {
        IdentityView {
            title: dec.text(self.title.as_ref()),
            first_name: dec.text(self.first_name.as_ref()),
            middle_name: dec.text(self.middle_name.as_ref()),
            last_name: dec.text(self.last_name.as_ref()),
            address1: dec.text(self.address1.as_ref()),
            address2: dec.text(self.address2.as_ref()),
            address3: dec.text(self.address3.as_ref()),
            city: dec.text(self.city.as_ref()),
            state: dec.text(self.state.as_ref()),
            postal_code: dec.text(self.postal_code.as_ref()),
            country: dec.text(self.country.as_ref()),
            company: dec.text(self.company.as_ref()),
            email: dec.text(self.email.as_ref()),
            phone: dec.text(self.phone.as_ref()),
            ssn: dec.text(self.ssn.as_ref()),
            username: dec.text(self.username.as_ref()),
            passport_number: dec.text(self.passport_number.as_ref()),
            license_number: dec.text(self.license_number.as_ref()),
            full_name: None,
        }
        .with_full_name()
    }
}

impl Field {
    fn decrypt(&self, dec: &FieldDecryptor<'_>) -> FieldView {
        FieldView {
            name: dec.text(self.name.as_ref()),
            value: dec.text(self.value.as_ref()),
            field_type: self.field_type,
            linked_id: self.linked_id,
        }
    }
}

impl Attachment {
    fn decrypt(&self, dec: &FieldDecryptor<'_>, cipher_id: &str) -> AttachmentView {
        let key = self.key.as_ref().and_then(|wrapped| match dec.key(wrapped) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    cipher_id,
                    attachment_id = ?self.id,
                    error = %e,
                    "attachment key could not be unwrapped"
                );
                None
            }
        });

        AttachmentView {
            id: self.id.clone(),
            url: self.url.clone(),
            size: self.size.clone(),
            size_name: self.size_name.clone(),
            file_name: dec.text(self.file_name.as_ref()),
            key,
        }
    }
}
