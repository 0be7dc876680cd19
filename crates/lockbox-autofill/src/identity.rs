//! Identity fills

use lockbox_models::IdentityView;

use crate::constants::identity::*;
use crate::fill::{classify, fill_with_value, has_value, usable, SlotRule};
use crate::iso;
use crate::page::PageDetails;
use crate::script::{FillScript, FilledFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IdentitySlot {
    FullName,
    FirstName,
    MiddleName,
    LastName,
    Title,
    Email,
    Address,
    Address1,
    Address2,
    Address3,
    PostalCode,
    City,
    State,
    Country,
    Phone,
    Username,
    Company,
}

const fn exact(slot: IdentitySlot, names: &'static [&'static str]) -> SlotRule<IdentitySlot> {
    SlotRule {
        slot,
        names,
        contains: None,
    }
}

const RULES: &[SlotRule<IdentitySlot>] = &[
    SlotRule {
        slot: IdentitySlot::FullName,
        names: FULL_NAME_NAMES,
        contains: Some(FULL_NAME_CONTAINS),
    },
    exact(IdentitySlot::FirstName, FIRST_NAME_NAMES),
    exact(IdentitySlot::MiddleName, MIDDLE_NAME_NAMES),
    exact(IdentitySlot::LastName, LAST_NAME_NAMES),
    exact(IdentitySlot::Title, TITLE_NAMES),
    exact(IdentitySlot::Email, EMAIL_NAMES),
    SlotRule {
        slot: IdentitySlot::Address,
        names: ADDRESS_NAMES,
        contains: Some(ADDRESS_CONTAINS),
    },
    exact(IdentitySlot::Address1, ADDRESS1_NAMES),
    exact(IdentitySlot::Address2, ADDRESS2_NAMES),
    exact(IdentitySlot::Address3, ADDRESS3_NAMES),
    exact(IdentitySlot::PostalCode, POSTAL_CODE_NAMES),
    exact(IdentitySlot::City, CITY_NAMES),
    exact(IdentitySlot::State, STATE_NAMES),
    exact(IdentitySlot::Country, COUNTRY_NAMES),
    exact(IdentitySlot::Phone, PHONE_NAMES),
    exact(IdentitySlot::Username, USERNAME_NAMES),
    exact(IdentitySlot::Company, COMPANY_NAMES),
];

pub(crate) fn fill_identity<'a>(
    script: &mut FillScript,
    filled: &mut FilledFields<'a>,
    page: &'a PageDetails,
    identity: &IdentityView,
) {
    let slots = classify(page, ATTRIBUTES, RULES);

    for (slot, value) in [
        (IdentitySlot::Title, &identity.title),
        (IdentitySlot::FirstName, &identity.first_name),
        (IdentitySlot::MiddleName, &identity.middle_name),
        (IdentitySlot::LastName, &identity.last_name),
        (IdentitySlot::Address1, &identity.address1),
        (IdentitySlot::Address2, &identity.address2),
        (IdentitySlot::Address3, &identity.address3),
        (IdentitySlot::City, &identity.city),
        (IdentitySlot::PostalCode, &identity.postal_code),
        (IdentitySlot::Company, &identity.company),
        (IdentitySlot::Email, &identity.email),
        (IdentitySlot::Phone, &identity.phone),
        (IdentitySlot::Username, &identity.username),
    ] {
        fill_with_value(script, filled, value.as_deref(), slots.get(slot));
    }

    let state = usable(identity.state.as_deref());
    let state = region_code(state, iso::state_code).or(state);
    fill_with_value(script, filled, state, slots.get(IdentitySlot::State));

    let country = usable(identity.country.as_deref());
    let country = region_code(country, iso::country_code).or(country);
    fill_with_value(script, filled, country, slots.get(IdentitySlot::Country));

    if let Some(field) = slots.get(IdentitySlot::FullName) {
        if has_value(identity.first_name.as_deref()) || has_value(identity.last_name.as_deref()) {
            let name = join_present(
                &[&identity.first_name, &identity.middle_name, &identity.last_name],
                " ",
            );
            fill_with_value(script, filled, Some(&name), Some(field));
        }
    }

    if let Some(field) = slots.get(IdentitySlot::Address) {
        if has_value(identity.address1.as_deref()) {
            let address = join_present(
                &[&identity.address1, &identity.address2, &identity.address3],
                ", ",
            );
            fill_with_value(script, filled, Some(&address), Some(field));
        }
    }
}

/// Full names of more than two letters are swapped for their ISO code.
fn region_code(
    value: Option<&str>,
    lookup: fn(&str) -> Option<&'static str>,
) -> Option<&'static str> {
    value
        .filter(|v| v.chars().count() > 2)
        .and_then(|v| lookup(&v.to_lowercase()))
}

fn join_present(parts: &[&Option<String>], separator: &str) -> String {
    parts
        .iter()
        .filter_map(|p| usable(p.as_deref()))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::AutofillField;

    fn field(opid: &str, name: &str) -> AutofillField {
        AutofillField {
            opid: opid.into(),
            viewable: true,
            field_type: Some("text".into()),
            html_name: Some(name.into()),
            ..Default::default()
        }
    }

    fn fill(page: &PageDetails, identity: &IdentityView) -> FillScript {
        let mut script = FillScript::new("doc");
        let mut filled = FilledFields::default();
        fill_identity(&mut script, &mut filled, page, identity);
        script
    }

    #[test]
    fn test_identity_slots() {
        let page = PageDetails {
            fields: vec![
                field("__0", "given-name"),
                field("__1", "family_name"),
                field("__2", "email"),
                field("__3", "postal-code"),
                field("__4", "state"),
                field("__5", "country"),
            ],
            ..Default::default()
        };
        let identity = IdentityView {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            email: Some("ada@example.com".into()),
            postal_code: Some("10001".into()),
            state: Some("New York".into()),
            country: Some("Atlantis".into()),
            ..Default::default()
        };

        let script = fill(&page, &identity);
        assert_eq!(script.fill_value("__0"), Some("Ada"));
        assert_eq!(script.fill_value("__1"), Some("Lovelace"));
        assert_eq!(script.fill_value("__2"), Some("ada@example.com"));
        assert_eq!(script.fill_value("__3"), Some("10001"));
        assert_eq!(script.fill_value("__4"), Some("NY"));
        // unknown names are filled as written
        assert_eq!(script.fill_value("__5"), Some("Atlantis"));
    }

    #[test]
    fn test_full_name_and_address_synthesis() {
        let page = PageDetails {
            fields: vec![field("__0", "full-name"), field("__1", "street-address")],
            ..Default::default()
        };
        let identity = IdentityView {
            title: Some("Dr".into()),
            first_name: Some("Grace".into()),
            middle_name: Some("Brewster".into()),
            last_name: Some("Hopper".into()),
            address1: Some("1 Main St".into()),
            address3: Some("Unit 4".into()),
            ..Default::default()
        };

        let script = fill(&page, &identity);
        assert_eq!(script.fill_value("__0"), Some("Grace Brewster Hopper"));
        assert_eq!(script.fill_value("__1"), Some("1 Main St, Unit 4"));
    }

    #[test]
    fn test_excluded_and_hidden_fields_skipped() {
        let mut hidden = field("__0", "email");
        hidden.viewable = false;
        let mut checkbox = field("__1", "email");
        checkbox.field_type = Some("checkbox".into());
        let page = PageDetails {
            fields: vec![hidden, checkbox],
            ..Default::default()
        };
        let identity = IdentityView {
            email: Some("a@b.c".into()),
            ..Default::default()
        };
        assert!(fill(&page, &identity).is_empty());
    }
}
