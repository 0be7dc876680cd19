use lockbox_crypto::{EncString, EncryptService, SymmetricKey};
use serde::{Deserialize, Serialize};

use crate::item::FieldDecryptor;
use crate::view::FolderView;

/// A personal folder. Folders never belong to an organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: Option<EncString>,
    pub revision_date: Option<String>,
}

impl Folder {
    pub fn decrypt(&self, service: &EncryptService, key: Option<&SymmetricKey>) -> FolderView {
        let dec = FieldDecryptor::new(service, key);
        FolderView {
            id: self.id.clone(),
            name: dec.text(self.name.as_ref()),
            revision_date: self.revision_date.clone(),
        }
    }
}
