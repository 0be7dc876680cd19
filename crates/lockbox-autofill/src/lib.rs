//! lockbox-autofill: turn a decrypted item and a page's form fields into a
//! fill script
//!
//! ```text
//! PageDetails + CipherView
//!   └── custom fields (name match, any viewable field or span)
//!   └── Login:    password fields → username before each → fuzzy username fallback
//!   └── Card:     classify fields into slots → expiry formatting, picklists
//!   └── Identity: classify fields into slots → ISO region codes, name/address synthesis
//!   ═► FillScript [click_on_opid, focus_by_opid, fill_by_opid, ...]
//! ```
//!
//! Generation is deterministic: the same page and item always produce the
//! same script.

mod card;
pub mod constants;
mod fill;
mod identity;
pub mod iso;
pub mod login;
pub mod matching;
pub mod page;
pub mod script;
pub mod service;

pub use login::{
    find_username_field, get_forms_with_password_fields, load_password_fields, FormData, SearchPass,
};
pub use matching::{
    field_is_fuzzy_match, find_matching_field_index, fuzzy_match, is_field_match, FieldMatcher,
};
pub use page::{AutofillField, AutofillForm, FieldAttribute, PageDetails, SelectInfo, SelectOption};
pub use script::{FillOperation, FillScript, ScriptProperties};
pub use service::{AutofillService, FillOptions};
