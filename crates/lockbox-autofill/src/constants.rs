//! Field-name heuristics
//!
//! Exact-match lists are compared after lowercasing and stripping non
//! alphanumerics from the page value (and hyphens from the entry). The
//! `*_CONTAINS` lists name the entries that may also match as a substring.

use crate::page::FieldAttribute;

pub const USERNAME_FIELD_NAMES: &[&str] = &[
    // English
    "username",
    "user name",
    "email",
    "email address",
    "e-mail",
    "e-mail address",
    "userid",
    "user id",
    "customer id",
    "login id",
    // German
    "benutzername",
    "benutzer name",
    "email adresse",
    "e-mail adresse",
    "benutzerid",
    "benutzer id",
];

/// Input types never considered for card or identity slots
pub const EXCLUDED_AUTOFILL_TYPES: &[&str] = &[
    "radio", "checkbox", "hidden", "file", "button", "image", "reset", "search",
];

/// Text inputs mentioning "password" that are not the account password
pub const PASSWORD_FIELD_IGNORE_LIST: &[&str] = &["onetimepassword", "captcha", "findanything"];

pub mod card {
    use super::FieldAttribute;

    pub const ATTRIBUTES: &[FieldAttribute] = &[
        FieldAttribute::AutoCompleteType,
        FieldAttribute::DataStripe,
        FieldAttribute::HtmlName,
        FieldAttribute::HtmlId,
        FieldAttribute::LabelTag,
        FieldAttribute::Placeholder,
        FieldAttribute::LabelLeft,
        FieldAttribute::LabelTop,
        FieldAttribute::DataRecurly,
    ];

    /// Attributes searched for format hints like "mm/yy"
    pub const ATTRIBUTES_EXTENDED: &[FieldAttribute] = &[
        FieldAttribute::AutoCompleteType,
        FieldAttribute::DataStripe,
        FieldAttribute::HtmlName,
        FieldAttribute::HtmlId,
        FieldAttribute::LabelTag,
        FieldAttribute::Placeholder,
        FieldAttribute::LabelLeft,
        FieldAttribute::LabelTop,
        FieldAttribute::DataRecurly,
        FieldAttribute::LabelRight,
    ];

    pub const CARDHOLDER_NAMES: &[&str] = &[
        "cc-name",
        "card-name",
        "cardholder-name",
        "cardholder",
        "name",
        "nameoncard",
    ];
    pub const CARDHOLDER_CONTAINS: &[&str] = &["cc-name", "card-name", "cardholder-name", "cardholder"];

    pub const NUMBER_NAMES: &[&str] = &[
        "cc-number",
        "cc-num",
        "card-number",
        "card-num",
        "number",
        "cc",
        "cc-no",
        "card-no",
        "credit-card",
        "numero-carte",
        "carte",
        "carte-credit",
        "num-carte",
        "cb-num",
    ];
    pub const NUMBER_CONTAINS: &[&str] = &[
        "cc-number",
        "cc-num",
        "card-number",
        "card-num",
        "cc-no",
        "card-no",
        "numero-carte",
        "num-carte",
        "cb-num",
    ];

    pub const EXPIRY_NAMES: &[&str] = &[
        "cc-exp",
        "card-exp",
        "cc-expiration",
        "card-expiration",
        "cc-ex",
        "card-ex",
        "card-expire",
        "card-expiry",
        "validite",
        "expiration",
        "expiry",
        "mm-yy",
        "mm-yyyy",
        "yy-mm",
        "yyyy-mm",
        "expiration-date",
        "payment-cc-date",
    ];
    pub const EXPIRY_CONTAINS: &[&str] = &[
        "mm-yy",
        "mm-yyyy",
        "yy-mm",
        "yyyy-mm",
        "expiration-date",
        "payment-cc-date",
    ];

    pub const EXPIRY_MONTH_NAMES: &[&str] = &[
        "exp-month",
        "cc-exp-month",
        "cc-month",
        "card-month",
        "cc-mo",
        "card-mo",
        "exp-mo",
        "card-exp-mo",
        "cc-exp-mo",
        "card-expiration-month",
        "expiration-month",
        "cc-mm",
        "cc-m",
        "card-mm",
        "card-m",
        "card-exp-mm",
        "cc-exp-mm",
        "exp-mm",
        "exp-m",
        "expire-month",
        "expire-mo",
        "expiry-month",
        "expiry-mo",
        "card-expire-month",
        "card-expire-mo",
        "card-expiry-month",
        "card-expiry-mo",
        "mois-validite",
        "mois-expiration",
        "m-validite",
        "m-expiration",
        "expiry-date-field-month",
        "expiration-date-month",
        "expiration-date-mm",
        "exp-mon",
        "validity-mo",
        "exp-date-mo",
        "cb-date-mois",
        "date-m",
    ];

    pub const EXPIRY_YEAR_NAMES: &[&str] = &[
        "exp-year",
        "cc-exp-year",
        "cc-year",
        "card-year",
        "cc-yr",
        "card-yr",
        "exp-yr",
        "card-exp-yr",
        "cc-exp-yr",
        "card-expiration-year",
        "expiration-year",
        "cc-yy",
        "cc-y",
        "card-yy",
        "card-y",
        "card-exp-yy",
        "cc-exp-yy",
        "exp-yy",
        "exp-y",
        "cc-yyyy",
        "card-yyyy",
        "card-exp-yyyy",
        "cc-exp-yyyy",
        "expire-year",
        "expire-yr",
        "expiry-year",
        "expiry-yr",
        "card-expire-year",
        "card-expire-yr",
        "card-expiry-year",
        "card-expiry-yr",
        "an-validite",
        "an-expiration",
        "annee-validite",
        "annee-expiration",
        "expiry-date-field-year",
        "expiration-date-year",
        "cb-date-ann",
        "expiration-date-yy",
        "expiration-date-yyyy",
        "validity-year",
        "exp-date-year",
        "date-y",
    ];

    pub const CVV_NAMES: &[&str] = &[
        "cvv",
        "cvc",
        "cvv2",
        "cc-csc",
        "cc-cvv",
        "card-csc",
        "card-cvv",
        "cvd",
        "cid",
        "cvc2",
        "cnv",
        "cvn2",
        "cc-code",
        "card-code",
        "code-securite",
        "security-code",
        "crypto",
        "card-verif",
        "verification-code",
        "csc",
        "ccv",
    ];

    pub const BRAND_NAMES: &[&str] = &["cc-type", "card-type", "card-brand", "cc-brand", "cb-type"];

    /// Month/short-year/long-year spellings, paired by index
    pub const MONTH_ABBR: &[&str] = &["mm", "mo"];
    pub const YEAR_ABBR_SHORT: &[&str] = &["yy", "yr"];
    pub const YEAR_ABBR_LONG: &[&str] = &["yyyy", "year"];
}

pub mod identity {
    use super::FieldAttribute;

    pub const ATTRIBUTES: &[FieldAttribute] = super::card::ATTRIBUTES;

    pub const FULL_NAME_NAMES: &[&str] = &["name", "full-name", "your-name"];
    pub const FULL_NAME_CONTAINS: &[&str] = &["full-name", "your-name"];

    pub const TITLE_NAMES: &[&str] = &["honorific-prefix", "prefix", "title"];
    pub const FIRST_NAME_NAMES: &[&str] = &["f-name", "first-name", "given-name", "first-n"];
    pub const MIDDLE_NAME_NAMES: &[&str] = &[
        "m-name",
        "middle-name",
        "additional-name",
        "middle-initial",
        "middle-n",
        "middle-i",
    ];
    pub const LAST_NAME_NAMES: &[&str] = &[
        "l-name",
        "last-name",
        "s-name",
        "surname",
        "family-name",
        "family-n",
        "last-n",
    ];
    pub const EMAIL_NAMES: &[&str] = &["e-mail", "email", "email-address"];

    pub const ADDRESS_NAMES: &[&str] = &[
        "street-address",
        "st-address",
        "addr",
        "address",
        "street",
        "mailing-addr",
        "billing-addr",
        "mail-addr",
        "bill-addr",
    ];
    pub const ADDRESS_CONTAINS: &[&str] =
        &["street-address", "st-address", "mailing-addr", "billing-addr", "mail-addr", "bill-addr"];

    pub const ADDRESS1_NAMES: &[&str] = &[
        "address-1",
        "address1",
        "addr-1",
        "addr1",
        "address-line-1",
        "address-line1",
        "line1",
    ];
    pub const ADDRESS2_NAMES: &[&str] = &[
        "address-2",
        "address2",
        "addr-2",
        "addr2",
        "address-line-2",
        "address-line2",
        "line2",
    ];
    pub const ADDRESS3_NAMES: &[&str] = &[
        "address-3",
        "address3",
        "addr-3",
        "addr3",
        "address-line-3",
        "address-line3",
        "line3",
    ];

    pub const POSTAL_CODE_NAMES: &[&str] = &[
        "postal",
        "zip",
        "zip2",
        "zip-code",
        "postal-code",
        "post-code",
        "address-zip",
        "address-postal",
        "address-code",
        "address-postal-code",
        "address-zip-code",
    ];
    pub const CITY_NAMES: &[&str] = &["city", "town", "address-level-2", "address-city", "address-town"];
    pub const STATE_NAMES: &[&str] = &[
        "state",
        "province",
        "provence",
        "address-level-1",
        "address-state",
        "address-province",
    ];
    pub const COUNTRY_NAMES: &[&str] = &[
        "country",
        "country-code",
        "country-name",
        "address-country",
        "address-country-name",
        "address-country-code",
    ];
    pub const PHONE_NAMES: &[&str] = &["phone", "mobile", "mobile-phone", "tel", "telephone", "phone-number"];
    pub const USERNAME_NAMES: &[&str] = &["user-name", "user-id", "screen-name"];
    pub const COMPANY_NAMES: &[&str] = &["company", "company-name", "organization", "organization-name"];
}
