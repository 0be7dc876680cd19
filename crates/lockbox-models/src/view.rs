//! Decrypted (plaintext) views of vault items

use lockbox_crypto::{SymmetricKey, DECRYPT_ERROR};
use serde::{Deserialize, Serialize};

use crate::enums::{CipherType, FieldType, LinkedId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CipherView {
    pub id: String,
    pub organization_id: Option<String>,
    pub folder_id: Option<String>,
    #[serde(rename = "type")]
    pub cipher_type: CipherType,
    pub name: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub reprompt: u8,
    pub login: Option<LoginView>,
    pub card: Option<CardView>,
    pub identity: Option<IdentityView>,
    pub secure_note: Option<SecureNoteView>,
    #[serde(default)]
    pub fields: Vec<FieldView>,
    #[serde(default)]
    pub attachments: Vec<AttachmentView>,
    #[serde(default)]
    pub password_history: Vec<PasswordHistoryView>,
    pub revision_date: Option<String>,
    pub deleted_date: Option<String>,
}

impl CipherView {
    /// True when the item name could not be decrypted.
    pub fn is_undecryptable(&self) -> bool {
        self.name.as_deref() == Some(DECRYPT_ERROR)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_date.is_some()
    }

    /// Resolve the plaintext a linked custom field points at.
    pub fn linked_field_value(&self, id: LinkedId) -> Option<&str> {
        use LinkedId::*;
        match id {
            LoginUsername => self.login.as_ref()?.username.as_deref(),
            LoginPassword => self.login.as_ref()?.password.as_deref(),

            CardCardholderName => self.card.as_ref()?.cardholder_name.as_deref(),
            CardExpMonth => self.card.as_ref()?.exp_month.as_deref(),
            CardExpYear => self.card.as_ref()?.exp_year.as_deref(),
            CardCode => self.card.as_ref()?.code.as_deref(),
            CardBrand => self.card.as_ref()?.brand.as_deref(),
            CardNumber => self.card.as_ref()?.number.as_deref(),

            IdentityTitle => self.identity.as_ref()?.title.as_deref(),
            IdentityMiddleName => self.identity.as_ref()?.middle_name.as_deref(),
            IdentityAddress1 => self.identity.as_ref()?.address1.as_deref(),
            IdentityAddress2 => self.identity.as_ref()?.address2.as_deref(),
            IdentityAddress3 => self.identity.as_ref()?.address3.as_deref(),
            IdentityCity => self.identity.as_ref()?.city.as_deref(),
            IdentityState => self.identity.as_ref()?.state.as_deref(),
            IdentityPostalCode => self.identity.as_ref()?.postal_code.as_deref(),
            IdentityCountry => self.identity.as_ref()?.country.as_deref(),
            IdentityCompany => self.identity.as_ref()?.company.as_deref(),
            IdentityEmail => self.identity.as_ref()?.email.as_deref(),
            IdentityPhone => self.identity.as_ref()?.phone.as_deref(),
            IdentitySsn => self.identity.as_ref()?.ssn.as_deref(),
            IdentityUsername => self.identity.as_ref()?.username.as_deref(),
            IdentityPassportNumber => self.identity.as_ref()?.passport_number.as_deref(),
            IdentityLicenseNumber => self.identity.as_ref()?.license_number.as_deref(),
            IdentityFirstName => self.identity.as_ref()?.first_name.as_deref(),
            IdentityLastName => self.identity.as_ref()?.last_name.as_deref(),
            IdentityFullName => self.identity.as_ref()?.full_name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginView {
    pub username: Option<String>,
    pub password: Option<String>,
    pub totp: Option<String>,
    #[serde(default)]
    pub uris: Vec<LoginUriView>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoginUriView {
    pub uri: Option<String>,
    #[serde(rename = "match")]
    pub match_type: Option<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub cardholder_name: Option<String>,
    pub brand: Option<String>,
    pub number: Option<String>,
    pub exp_month: Option<String>,
    pub exp_year: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub title: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub address3: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub company: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub ssn: Option<String>,
    pub username: Option<String>,
    pub passport_number: Option<String>,
    pub license_number: Option<String>,
    /// "Title First Middle Last", skipping absent parts
    pub full_name: Option<String>,
}

impl IdentityView {
    /// Fill in `full_name` from the individual name parts.
    pub(crate) fn with_full_name(mut self) -> Self {
        let parts: Vec<&str> = [
            &self.title,
            &self.first_name,
            &self.middle_name,
            &self.last_name,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect();
        self.full_name = (!parts.is_empty()).then(|| parts.join(" "));
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecureNoteView {
    #[serde(rename = "type", default)]
    pub note_type: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    pub name: Option<String>,
    pub value: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    pub linked_id: Option<LinkedId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentView {
    pub id: Option<String>,
    pub url: Option<String>,
    pub size: Option<String>,
    pub size_name: Option<String>,
    pub file_name: Option<String>,
    /// Per-attachment content key, absent when it could not be unwrapped
    pub key: Option<SymmetricKey>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordHistoryView {
    pub password: Option<String>,
    pub last_used_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderView {
    pub id: String,
    pub name: Option<String>,
    pub revision_date: Option<String>,
}
