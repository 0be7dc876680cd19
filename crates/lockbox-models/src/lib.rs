//! lockbox-models: vault items and their decrypted views
//!
//! Encrypted domain items (`Cipher`, `Folder`) hold `EncString` fields and
//! decrypt into plaintext views. [`DecryptableItem`] and [`DecryptedView`] are
//! the closed set of kinds that may cross the worker boundary.

pub mod cipher;
pub mod enums;
pub mod folder;
pub mod item;
pub mod view;

pub use cipher::{Attachment, Card, Cipher, Field, Identity, Login, LoginUri, PasswordHistory, SecureNote};
pub use enums::{CipherType, FieldType, LinkedId};
pub use folder::Folder;
pub use item::{DecryptableItem, DecryptedView};
pub use view::{
    AttachmentView, CardView, CipherView, FieldView, FolderView, IdentityView, LoginUriView,
    LoginView, PasswordHistoryView, SecureNoteView,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown {kind} value {value}")]
    UnknownEnumValue { kind: &'static str, value: u32 },

    #[error("could not rebuild item from plain data: {0}")]
    Reconstruct(#[source] serde_json::Error),

    #[error("no key available for item")]
    MissingKey,

    #[error(transparent)]
    Decrypt(#[from] lockbox_crypto::DecryptError),

    #[error(transparent)]
    Key(#[from] lockbox_crypto::KeyError),
}
