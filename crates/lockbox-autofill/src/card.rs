//! Card fills: slot classification and expiry formatting

use lockbox_models::CardView;

use crate::constants::card::*;
use crate::fill::{classify, fill_with_value, usable, SlotRule};
use crate::page::{AutofillField, PageDetails, SelectOption};
use crate::script::{FillScript, FilledFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CardSlot {
    CardholderName,
    Number,
    Expiry,
    ExpiryMonth,
    ExpiryYear,
    Code,
    Brand,
}

const RULES: &[SlotRule<CardSlot>] = &[
    SlotRule {
        slot: CardSlot::CardholderName,
        names: CARDHOLDER_NAMES,
        contains: Some(CARDHOLDER_CONTAINS),
    },
    SlotRule {
        slot: CardSlot::Number,
        names: NUMBER_NAMES,
        contains: Some(NUMBER_CONTAINS),
    },
    SlotRule {
        slot: CardSlot::Expiry,
        names: EXPIRY_NAMES,
        contains: Some(EXPIRY_CONTAINS),
    },
    SlotRule {
        slot: CardSlot::ExpiryMonth,
        names: EXPIRY_MONTH_NAMES,
        contains: None,
    },
    SlotRule {
        slot: CardSlot::ExpiryYear,
        names: EXPIRY_YEAR_NAMES,
        contains: None,
    },
    SlotRule {
        slot: CardSlot::Code,
        names: CVV_NAMES,
        contains: None,
    },
    SlotRule {
        slot: CardSlot::Brand,
        names: BRAND_NAMES,
        contains: None,
    },
];

pub(crate) fn fill_card<'a>(
    script: &mut FillScript,
    filled: &mut FilledFields<'a>,
    page: &'a PageDetails,
    card: &CardView,
) {
    let slots = classify(page, ATTRIBUTES, RULES);

    for (slot, value) in [
        (CardSlot::CardholderName, &card.cardholder_name),
        (CardSlot::Number, &card.number),
        (CardSlot::Code, &card.code),
        (CardSlot::Brand, &card.brand),
    ] {
        fill_with_value(script, filled, value.as_deref(), slots.get(slot));
    }

    let month = usable(card.exp_month.as_deref());
    let year = usable(card.exp_year.as_deref());

    if let (Some(field), Some(month)) = (slots.get(CardSlot::ExpiryMonth), month) {
        let value = match field.select_options() {
            Some(options) => month_from_select(options, month),
            None => pad_month(field, month),
        };
        filled.insert(field);
        script.fill_by_opid(field, &value);
    }

    if let (Some(field), Some(year)) = (slots.get(CardSlot::ExpiryYear), year) {
        let value = match field.select_options() {
            Some(options) => year_from_select(options, year),
            None => pad_year(field, year),
        };
        filled.insert(field);
        script.fill_by_opid(field, &value);
    }

    if let (Some(field), Some(month), Some(year)) = (slots.get(CardSlot::Expiry), month, year) {
        let value = combined_expiry(field, month, year);
        fill_with_value(script, filled, Some(&value), Some(field));
    }
}

/// Whether any card attribute of `field`, spaces removed, contains `needle`.
fn attributes_contain(field: &AutofillField, needle: &str) -> bool {
    ATTRIBUTES_EXTENDED
        .iter()
        .filter_map(|attr| field.attribute(*attr))
        .any(|value| value.replace(' ', "").to_lowercase().contains(needle))
}

/// Zero-pad a one-digit month when the field wants two digits.
pub(crate) fn pad_month(field: &AutofillField, month: &str) -> String {
    if (attributes_contain(field, "mm") || field.max_length == Some(2)) && month.len() == 1 {
        format!("0{month}")
    } else {
        month.to_string()
    }
}

/// Expand or shorten the year to the digits the field asks for.
pub(crate) fn pad_year(field: &AutofillField, year: &str) -> String {
    let wants_four = attributes_contain(field, "yyyy") || field.max_length == Some(4);
    let wants_two = attributes_contain(field, "yy") || field.max_length == Some(2);

    if wants_four {
        if year.len() == 2 {
            format!("20{year}")
        } else {
            year.to_string()
        }
    } else if wants_two && year.len() == 4 {
        year.get(2..).unwrap_or(year).to_string()
    } else {
        year.to_string()
    }
}

/// Month picklists of 12 entries are indexed from January; 13 entries carry
/// a placeholder option either first or last.
pub(crate) fn month_from_select(options: &[SelectOption], month: &str) -> String {
    let Ok(number) = month.trim().parse::<usize>() else {
        return month.to_string();
    };

    let index = match options.len() {
        12 => number.checked_sub(1),
        13 => {
            let leading_is_real = options[0].text().is_some_and(|t| !t.is_empty());
            let trailing_is_blank = options[12].text().map_or(true, str::is_empty);
            if leading_is_real && trailing_is_blank {
                number.checked_sub(1)
            } else {
                Some(number)
            }
        }
        _ => None,
    };

    index
        .and_then(|i| options.get(i))
        .filter(|option| option.0.len() > 1)
        .and_then(SelectOption::value)
        .unwrap_or(month)
        .to_string()
}

/// Year picklists may list `2027`, `27`, or `Year: 2027`.
pub(crate) fn year_from_select(options: &[SelectOption], year: &str) -> String {
    let short = (year.len() == 4).then(|| year.get(2..)).flatten();

    for option in options {
        let Some(value) = option.value() else {
            if option.text() == Some(year) {
                return year.to_string();
            }
            continue;
        };
        if option.text() == Some(year) || value == year {
            return value.to_string();
        }
        if value.len() == 2 && short == Some(value) {
            return value.to_string();
        }
        if let Some(colon) = value.find(':') {
            let labelled = value.get(colon + 2..).unwrap_or("");
            if !labelled.trim().is_empty() && labelled == year {
                return value.to_string();
            }
        }
    }
    year.to_string()
}

#[derive(Clone, Copy)]
enum Order {
    MonthFirst,
    YearFirst,
}

#[derive(Clone, Copy, PartialEq)]
enum YearForm {
    Long,
    Short,
}

/// Formats recognised in a combined expiry field's attributes, tried in
/// order. Long years come before short ones so "mm/yyyy" is not read as
/// "mm/yy".
const EXPIRY_FORMATS: &[(Order, &str, YearForm)] = &[
    (Order::MonthFirst, "/", YearForm::Long),
    (Order::MonthFirst, "/", YearForm::Short),
    (Order::YearFirst, "/", YearForm::Long),
    (Order::YearFirst, "/", YearForm::Short),
    (Order::MonthFirst, "-", YearForm::Long),
    (Order::MonthFirst, "-", YearForm::Short),
    (Order::YearFirst, "-", YearForm::Long),
    (Order::YearFirst, "-", YearForm::Short),
    (Order::YearFirst, "", YearForm::Long),
    (Order::YearFirst, "", YearForm::Short),
    (Order::MonthFirst, "", YearForm::Long),
    (Order::MonthFirst, "", YearForm::Short),
];

fn join(order: Order, month: &str, separator: &str, year: &str) -> String {
    match order {
        Order::MonthFirst => format!("{month}{separator}{year}"),
        Order::YearFirst => format!("{year}{separator}{month}"),
    }
}

/// Single-field expiry, formatted after the hint found in the field
/// (`mm/yy`, `yyyy-mm`, `mmyy`, ...). Defaults to `yyyy-mm`.
pub(crate) fn combined_expiry(field: &AutofillField, month: &str, year: &str) -> String {
    let padded = format!("0{month}");
    let full_month = padded.get(padded.len().saturating_sub(2)..).unwrap_or(&padded);

    let (full_year, short_year) = match year.len() {
        2 => (format!("20{year}"), Some(year)),
        4 => (year.to_string(), year.get(2..4)),
        _ => (year.to_string(), None),
    };

    for (i, month_abbr) in MONTH_ABBR.iter().enumerate() {
        for (order, separator, form) in EXPIRY_FORMATS {
            let (year_abbr, year_value) = match form {
                YearForm::Long => (YEAR_ABBR_LONG[i], Some(full_year.as_str())),
                YearForm::Short => (YEAR_ABBR_SHORT[i], short_year),
            };
            let Some(year_value) = year_value else {
                continue;
            };
            if attributes_contain(field, &join(*order, month_abbr, separator, year_abbr)) {
                return join(*order, full_month, separator, year_value);
            }
        }
    }
    format!("{full_year}-{full_month}")
}
