//! Fill-script generation entry point

use lockbox_core::config::AutofillConfig;
use lockbox_models::{CipherType, CipherView};
use tracing::debug;

use crate::card::fill_card;
use crate::fill::fill_custom_fields;
use crate::identity::fill_identity;
use crate::login::{fill_login, get_forms_with_password_fields, FormData};
use crate::page::PageDetails;
use crate::script::{FillScript, FilledFields};

/// Switches that narrow which page fields a fill may touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillOptions {
    pub only_visible_fields: bool,
    pub only_empty_fields: bool,
    pub skip_username_only_fill: bool,
    pub fill_new_password: bool,
}

impl From<&AutofillConfig> for FillOptions {
    fn from(config: &AutofillConfig) -> Self {
        Self {
            only_visible_fields: config.only_visible_fields,
            only_empty_fields: config.only_empty_fields,
            skip_username_only_fill: config.skip_username_only_fill,
            fill_new_password: config.fill_new_password,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AutofillService {
    options: FillOptions,
    delay_between_operations_ms: Option<u64>,
}

impl AutofillService {
    pub fn new(options: FillOptions) -> Self {
        Self {
            options,
            delay_between_operations_ms: None,
        }
    }

    pub fn from_config(config: &AutofillConfig) -> Self {
        Self {
            options: FillOptions::from(config),
            delay_between_operations_ms: Some(config.delay_between_operations_ms),
        }
    }

    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Build the fill script for `cipher` on `page`.
    ///
    /// Custom fields are matched first, then the type-specific fill runs
    /// over the fields they left. Returns `None` for secure notes and for
    /// items missing the data their type needs. The result depends only on
    /// the page's field order and the cipher's contents.
    pub fn generate_fill_script(&self, page: &PageDetails, cipher: &CipherView) -> Option<FillScript> {
        let mut script = FillScript::new(page.document_uuid.clone());
        script.properties.delay_between_operations = self.delay_between_operations_ms;
        let mut filled = FilledFields::default();

        fill_custom_fields(&mut script, &mut filled, page, cipher);

        match cipher.cipher_type {
            CipherType::Login => {
                let login = cipher.login.as_ref()?;
                fill_login(&mut script, &mut filled, page, login, &self.options);
            }
            CipherType::Card => {
                let card = cipher.card.as_ref()?;
                fill_card(&mut script, &mut filled, page, card);
            }
            CipherType::Identity => {
                let identity = cipher.identity.as_ref()?;
                fill_identity(&mut script, &mut filled, page, identity);
            }
            CipherType::SecureNote => return None,
        }

        debug!(
            cipher_id = %cipher.id,
            document = %page.document_uuid,
            operations = script.script.len(),
            "fill script generated"
        );
        Some(script)
    }

    /// Forms holding a password field, with their detected username field.
    pub fn forms_with_password_fields<'a>(&self, page: &'a PageDetails) -> Vec<FormData<'a>> {
        get_forms_with_password_fields(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_from_config() {
        let config = AutofillConfig {
            only_empty_fields: true,
            fill_new_password: true,
            ..Default::default()
        };
        let service = AutofillService::from_config(&config);
        assert!(service.options().only_empty_fields);
        assert!(service.options().fill_new_password);
        assert!(!service.options().only_visible_fields);
    }

    #[test]
    fn test_secure_note_has_no_script() {
        let cipher: CipherView = serde_json::from_value(serde_json::json!({
            "id": "n1",
            "type": 2,
            "name": "note",
            "secureNote": {"type": 0}
        }))
        .unwrap();
        let page = PageDetails::default();
        assert!(AutofillService::default()
            .generate_fill_script(&page, &cipher)
            .is_none());
    }
}
