//! Shared pieces of the per-type fill generators

use lockbox_crypto::DECRYPT_ERROR;
use lockbox_models::{CipherView, FieldType};
use tracing::debug;

use crate::constants::EXCLUDED_AUTOFILL_TYPES;
use crate::matching::{is_field_match, FieldMatcher};
use crate::page::{AutofillField, FieldAttribute, PageDetails};
use crate::script::{FillScript, FilledFields};

/// A value worth filling: present, non-empty, and not the decrypt sentinel.
pub(crate) fn has_value(value: Option<&str>) -> bool {
    usable(value).is_some()
}

pub(crate) fn usable(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty() && *v != DECRYPT_ERROR)
}

/// One slot of a classification pass and the names that select it.
pub(crate) struct SlotRule<S> {
    pub slot: S,
    pub names: &'static [&'static str],
    pub contains: Option<&'static [&'static str]>,
}

/// Page fields assigned to slots, at most one field per slot.
pub(crate) struct SlotMap<'a, S> {
    assigned: Vec<(S, &'a AutofillField)>,
}

impl<'a, S: Copy + PartialEq> SlotMap<'a, S> {
    pub fn get(&self, slot: S) -> Option<&'a AutofillField> {
        self.assigned
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, field)| *field)
    }

    fn contains(&self, slot: S) -> bool {
        self.get(slot).is_some()
    }
}

/// Single pass over the page: each viewable field goes to the first rule
/// whose slot is still free and whose names match one of its attributes.
pub(crate) fn classify<'a, S: Copy + PartialEq>(
    page: &'a PageDetails,
    attributes: &[FieldAttribute],
    rules: &[SlotRule<S>],
) -> SlotMap<'a, S> {
    let mut slots = SlotMap {
        assigned: Vec::new(),
    };

    for field in &page.fields {
        if field.is_span() || !field.viewable {
            continue;
        }
        if field
            .field_type
            .as_deref()
            .is_some_and(|t| EXCLUDED_AUTOFILL_TYPES.contains(&t))
        {
            continue;
        }

        'attributes: for attr in attributes {
            let Some(value) = field.attribute(*attr) else {
                continue;
            };
            for rule in rules {
                if !slots.contains(rule.slot) && is_field_match(value, rule.names, rule.contains) {
                    slots.assigned.push((rule.slot, field));
                    break 'attributes;
                }
            }
        }
    }
    slots
}

/// Fill `value` into `field`. Picklists take the option whose text or value
/// equals `value` (case-insensitive) and are skipped when none does.
pub(crate) fn fill_with_value<'a>(
    script: &mut FillScript,
    filled: &mut FilledFields<'a>,
    value: Option<&str>,
    field: Option<&'a AutofillField>,
) {
    let (Some(value), Some(field)) = (usable(value), field) else {
        return;
    };

    let value = match field.select_options() {
        Some(options) if field.is_type("select-one") => {
            let picked = options.iter().find(|option| {
                option
                    .entries()
                    .any(|entry| !entry.is_empty() && entry.to_lowercase() == value.to_lowercase())
            });
            match picked {
                Some(option) if option.0.len() > 1 => option.value().unwrap_or(value),
                Some(_) => value,
                None => {
                    debug!(opid = %field.opid, "no picklist option matches, skipping field");
                    return;
                }
            }
        }
        _ => value,
    };

    filled.insert(field);
    script.fill_by_opid(field, value);
}

/// Custom cipher fields are matched by name against every viewable field
/// (and every span) before the type-specific pass runs.
pub(crate) fn fill_custom_fields<'a>(
    script: &mut FillScript,
    filled: &mut FilledFields<'a>,
    page: &'a PageDetails,
    cipher: &CipherView,
) {
    let named: Vec<_> = cipher
        .fields
        .iter()
        .filter_map(|f| usable(f.name.as_deref()).map(|name| (name, f)))
        .collect();
    if named.is_empty() {
        return;
    }
    let names: Vec<&str> = named.iter().map(|(name, _)| *name).collect();
    let matcher = FieldMatcher::new(&names);

    for field in &page.fields {
        if filled.contains(&field.opid) || (!field.viewable && !field.is_span()) {
            continue;
        }
        let Some(index) = matcher.find(field) else {
            continue;
        };

        let custom = named[index].1;
        let value = match custom.field_type {
            FieldType::Linked => custom.linked_id.and_then(|id| cipher.linked_field_value(id)),
            FieldType::Boolean => Some(custom.value.as_deref().unwrap_or("false")),
            FieldType::Text | FieldType::Hidden => custom.value.as_deref(),
        };
        let Some(value) = value.filter(|v| *v != DECRYPT_ERROR) else {
            continue;
        };

        filled.insert(field);
        script.fill_by_opid(field, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{SelectInfo, SelectOption};

    fn select(opid: &str, options: &[(&str, &str)]) -> AutofillField {
        AutofillField {
            opid: opid.into(),
            viewable: true,
            field_type: Some("select-one".into()),
            select_info: Some(SelectInfo {
                options: options
                    .iter()
                    .map(|(t, v)| SelectOption(vec![Some(t.to_string()), Some(v.to_string())]))
                    .collect(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_picklist_fills_option_value() {
        let field = select("__c", &[("Germany", "DE"), ("France", "FR")]);
        let mut script = FillScript::new("doc");
        let mut filled = FilledFields::default();

        fill_with_value(&mut script, &mut filled, Some("france"), Some(&field));
        assert_eq!(script.fill_value("__c"), Some("FR"));
        assert!(filled.contains("__c"));
    }

    #[test]
    fn test_picklist_without_match_is_skipped() {
        let field = select("__c", &[("Germany", "DE")]);
        let mut script = FillScript::new("doc");
        let mut filled = FilledFields::default();

        fill_with_value(&mut script, &mut filled, Some("Spain"), Some(&field));
        assert!(script.is_empty());
        assert!(!filled.contains("__c"));
    }

    #[test]
    fn test_sentinel_is_never_filled() {
        let field = AutofillField {
            opid: "__n".into(),
            viewable: true,
            ..Default::default()
        };
        let mut script = FillScript::new("doc");
        let mut filled = FilledFields::default();

        fill_with_value(&mut script, &mut filled, Some(DECRYPT_ERROR), Some(&field));
        fill_with_value(&mut script, &mut filled, Some(""), Some(&field));
        fill_with_value(&mut script, &mut filled, None, Some(&field));
        assert!(script.is_empty());
    }
}
