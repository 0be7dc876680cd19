//! Matching page fields against candidate names
//!
//! Candidate forms accepted by [`find_matching_field_index`]:
//!
//! ```text
//! username            plain token, compared to id, name, labels, placeholder
//! id=login_email      restricted to one attribute (id | name | label | placeholder)
//! regex=^e-?mail$     case-insensitive regular expression
//! csv=email,login     any of a literal list
//! name=regex=^user    qualifiers compose
//! ```

use regex::{Regex, RegexBuilder};
use tracing::warn;

use crate::page::{AutofillField, FieldAttribute};

/// Attributes compared by exact matching, in priority order.
const EXACT_ATTRIBUTES: &[FieldAttribute] = &[
    FieldAttribute::HtmlId,
    FieldAttribute::HtmlName,
    FieldAttribute::LabelTag,
    FieldAttribute::LabelAria,
    FieldAttribute::Placeholder,
];

/// `prefix=` qualifiers and the attribute each restricts matching to.
const QUALIFIERS: &[(&str, FieldAttribute)] = &[
    ("id", FieldAttribute::HtmlId),
    ("name", FieldAttribute::HtmlName),
    ("label", FieldAttribute::LabelTag),
    ("label", FieldAttribute::LabelAria),
    ("placeholder", FieldAttribute::Placeholder),
];

/// Attributes searched by fuzzy matching.
const FUZZY_ATTRIBUTES: &[FieldAttribute] = &[
    FieldAttribute::HtmlId,
    FieldAttribute::HtmlName,
    FieldAttribute::LabelTag,
    FieldAttribute::Placeholder,
    FieldAttribute::LabelLeft,
    FieldAttribute::LabelTop,
    FieldAttribute::LabelAria,
];

/// A candidate list compiled once and tested against many fields.
#[derive(Debug)]
pub struct FieldMatcher {
    candidates: Vec<Candidate>,
}

#[derive(Debug)]
struct Candidate {
    /// Set when the candidate carries a recognized `prefix=` qualifier.
    qualified: Option<(String, Matcher)>,
    plain: Matcher,
}

#[derive(Debug)]
enum Matcher {
    /// `None` when the pattern failed to compile; never matches.
    Pattern(Option<Regex>),
    List(Vec<String>),
    Token(String),
}

impl FieldMatcher {
    pub fn new<S: AsRef<str>>(candidates: &[S]) -> Self {
        let candidates = candidates
            .iter()
            .map(|candidate| Candidate::parse(candidate.as_ref()))
            .collect();
        Self { candidates }
    }

    /// Index of the first candidate that matches any attribute of `field`.
    pub fn find(&self, field: &AutofillField) -> Option<usize> {
        self.candidates.iter().position(|c| c.matches(field))
    }
}

impl Candidate {
    fn parse(candidate: &str) -> Self {
        let qualified = candidate.split_once('=').and_then(|(prefix, rest)| {
            QUALIFIERS
                .iter()
                .any(|(name, _)| *name == prefix)
                .then(|| (prefix.to_string(), Matcher::parse(rest)))
        });
        Self {
            qualified,
            plain: Matcher::parse(candidate),
        }
    }

    fn matches(&self, field: &AutofillField) -> bool {
        let qualified = self.qualified.as_ref().is_some_and(|(prefix, matcher)| {
            QUALIFIERS
                .iter()
                .filter(|(name, _)| *name == prefix.as_str())
                .any(|(_, attr)| matcher.matches_attribute(field, *attr))
        });
        qualified
            || EXACT_ATTRIBUTES
                .iter()
                .any(|attr| self.plain.matches_attribute(field, *attr))
    }
}

impl Matcher {
    fn parse(candidate: &str) -> Self {
        if let Some(pattern) = candidate.strip_prefix("regex=") {
            let compiled = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| warn!(pattern, error = %e, "ignoring invalid field-match pattern"))
                .ok();
            return Self::Pattern(compiled);
        }
        if let Some(list) = candidate.strip_prefix("csv=") {
            return Self::List(list.split(',').map(|e| e.trim().to_lowercase()).collect());
        }
        Self::Token(normalize_token(candidate))
    }

    fn matches_attribute(&self, field: &AutofillField, attr: FieldAttribute) -> bool {
        let Some(raw) = field.attribute(attr) else {
            return false;
        };
        let value = strip_newlines(raw);
        let value = value.trim();

        match self {
            Self::Pattern(re) => re.as_ref().is_some_and(|re| re.is_match(value)),
            Self::List(entries) => {
                let value = value.to_lowercase();
                entries.iter().any(|entry| *entry == value)
            }
            Self::Token(token) => normalize_token(value) == *token,
        }
    }
}

/// Index of the first candidate that matches any attribute of `field`.
///
/// Compiles `candidates` on every call; build a [`FieldMatcher`] to test
/// many fields against the same list.
pub fn find_matching_field_index<S: AsRef<str>>(
    field: &AutofillField,
    candidates: &[S],
) -> Option<usize> {
    FieldMatcher::new(candidates).find(field)
}

/// Lowercase and drop whitespace and hyphens.
fn normalize_token(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn strip_newlines(value: &str) -> String {
    value.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// Case-insensitive substring test of `value` against heuristic tokens.
pub fn fuzzy_match<S: AsRef<str>>(tokens: &[S], value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    let value = strip_newlines(value).trim().to_lowercase();
    tokens
        .iter()
        .any(|token| value.contains(&token.as_ref().to_lowercase()))
}

/// [`fuzzy_match`] over a field's id, name, labels and placeholder.
pub fn field_is_fuzzy_match<S: AsRef<str>>(field: &AutofillField, tokens: &[S]) -> bool {
    FUZZY_ATTRIBUTES
        .iter()
        .filter_map(|attr| field.attribute(*attr))
        .any(|value| fuzzy_match(tokens, value))
}

/// Exact match of an attribute value against `options`, or substring match
/// for options also listed in `contains`. `None` lets every option match
/// as a substring.
pub fn is_field_match(value: &str, options: &[&str], contains: Option<&[&str]>) -> bool {
    let value: String = value
        .trim()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    options.iter().any(|option| {
        let substring_ok = contains.map_or(true, |list| list.contains(option));
        let option = option.to_lowercase().replace('-', "");
        value == option || (substring_ok && value.contains(&option))
    })
}
