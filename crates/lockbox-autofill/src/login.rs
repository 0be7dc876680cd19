//! Login fills: password field detection and username search

use lockbox_models::LoginView;
use serde::Serialize;

use crate::constants::{PASSWORD_FIELD_IGNORE_LIST, USERNAME_FIELD_NAMES};
use crate::fill::usable;
use crate::matching::{field_is_fuzzy_match, FieldMatcher};
use crate::page::{AutofillField, AutofillForm, PageDetails};
use crate::script::{FillScript, FilledFields};
use crate::service::FillOptions;

/// Visibility constraints for one search pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchPass {
    pub can_be_hidden: bool,
    pub can_be_read_only: bool,
}

impl SearchPass {
    pub const VIEWABLE: Self = Self {
        can_be_hidden: false,
        can_be_read_only: false,
    };
    pub const FALLBACK: Self = Self {
        can_be_hidden: true,
        can_be_read_only: true,
    };

    fn admits(&self, field: &AutofillField) -> bool {
        !field.disabled
            && (self.can_be_read_only || !field.readonly)
            && (self.can_be_hidden || field.viewable)
    }
}

fn value_is_like_password(value: Option<&str>) -> bool {
    let Some(value) = value else {
        return false;
    };
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .collect();
    cleaned.contains("password")
        && !PASSWORD_FIELD_IGNORE_LIST
            .iter()
            .any(|ignored| cleaned.contains(ignored))
}

fn is_password_field(field: &AutofillField) -> bool {
    if field.is_type("password") {
        return true;
    }
    field.is_type("text")
        && (value_is_like_password(field.html_id.as_deref())
            || value_is_like_password(field.html_name.as_deref())
            || value_is_like_password(field.placeholder.as_deref()))
}

/// Password inputs on the page, in document order.
pub fn load_password_fields(
    page: &PageDetails,
    pass: SearchPass,
    must_be_empty: bool,
    fill_new_password: bool,
) -> Vec<&AutofillField> {
    page.fields
        .iter()
        .filter(|f| !f.is_span())
        .filter(|f| pass.admits(f) && is_password_field(f))
        .filter(|f| !must_be_empty || f.is_empty())
        .filter(|f| fill_new_password || f.auto_complete_type.as_deref() != Some("new-password"))
        .collect()
}

/// Closest text-like field before `password`. An exact username-name match
/// ends the search early; otherwise the last candidate wins.
pub fn find_username_field<'a>(
    page: &'a PageDetails,
    password: &AutofillField,
    pass: SearchPass,
    without_form: bool,
) -> Option<&'a AutofillField> {
    let usernames = FieldMatcher::new(USERNAME_FIELD_NAMES);
    let mut found = None;
    for field in page.fields.iter().filter(|f| !f.is_span()) {
        if field.element_number >= password.element_number {
            break;
        }
        if pass.admits(field)
            && (without_form || field.form == password.form)
            && field.is_text_like()
        {
            found = Some(field);
            if usernames.find(field).is_some() {
                break;
            }
        }
    }
    found
}

fn find_username_with_fallback<'a>(
    page: &'a PageDetails,
    password: &AutofillField,
    allow_hidden: bool,
    without_form: bool,
) -> Option<&'a AutofillField> {
    find_username_field(page, password, SearchPass::VIEWABLE, without_form).or_else(|| {
        allow_hidden
            .then(|| find_username_field(page, password, SearchPass::FALLBACK, without_form))
            .flatten()
    })
}

/// A form that holds a password field, for the save-login flow.
#[derive(Debug, Clone, Serialize)]
pub struct FormData<'a> {
    pub form: &'a AutofillForm,
    pub password: &'a AutofillField,
    pub username: Option<&'a AutofillField>,
    pub passwords: Vec<&'a AutofillField>,
}

/// Per form: its first password field and the username field before it.
pub fn get_forms_with_password_fields(page: &PageDetails) -> Vec<FormData<'_>> {
    let passwords = load_password_fields(page, SearchPass::FALLBACK, false, false);
    if passwords.is_empty() {
        return Vec::new();
    }

    page.forms
        .iter()
        .filter_map(|(form_id, form)| {
            let in_form: Vec<_> = passwords
                .iter()
                .copied()
                .filter(|p| p.form.as_deref() == Some(form_id.as_str()))
                .collect();
            let first = *in_form.first()?;
            Some(FormData {
                form,
                password: first,
                username: find_username_with_fallback(page, first, true, false),
                passwords: in_form,
            })
        })
        .collect()
}

pub(crate) fn fill_login<'a>(
    script: &mut FillScript,
    filled: &mut FilledFields<'a>,
    page: &'a PageDetails,
    login: &LoginView,
    options: &FillOptions,
) {
    let Some(password) = usable(login.password.as_deref()) else {
        // nothing but custom fields to fill
        script.focus_last(filled);
        return;
    };
    let username = usable(login.username.as_deref());

    let mut password_fields = load_password_fields(
        page,
        SearchPass::VIEWABLE,
        options.only_empty_fields,
        options.fill_new_password,
    );
    if password_fields.is_empty() && !options.only_visible_fields {
        password_fields = load_password_fields(
            page,
            SearchPass::FALLBACK,
            options.only_empty_fields,
            options.fill_new_password,
        );
    }

    let allow_hidden = !options.only_visible_fields;
    let mut passwords = Vec::new();
    let mut usernames = Vec::new();

    if !page.forms.is_empty() {
        for field in &password_fields {
            passwords.push(*field);
            if username.is_some() {
                usernames.extend(find_username_with_fallback(page, field, allow_hidden, false));
            }
        }
    } else if let Some(first) = password_fields.first() {
        // form-less page: first password field and whatever input precedes it
        passwords.push(*first);
        if username.is_some() && first.element_number > 0 {
            usernames.extend(find_username_with_fallback(page, first, allow_hidden, true));
        }
    }

    if password_fields.is_empty() && !options.skip_username_only_fill {
        usernames.extend(page.fields.iter().filter(|f| {
            f.viewable && f.is_text_like() && field_is_fuzzy_match(f, USERNAME_FIELD_NAMES)
        }));
    }

    if let Some(username) = username {
        for field in usernames {
            if !filled.contains(&field.opid) {
                filled.insert(field);
                script.fill_by_opid(field, username);
            }
        }
    }
    for field in passwords {
        if !filled.contains(&field.opid) {
            filled.insert(field);
            script.fill_by_opid(field, password);
        }
    }

    script.focus_last(filled);
}
