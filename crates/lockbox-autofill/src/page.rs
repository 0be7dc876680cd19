//! Page model: the form fields a content script collected from a document

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Everything collected from one frame of a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDetails {
    #[serde(rename = "documentUUID")]
    pub document_uuid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    /// Forms keyed by their opid
    #[serde(default)]
    pub forms: BTreeMap<String, AutofillForm>,
    /// Fields in document order
    #[serde(default)]
    pub fields: Vec<AutofillField>,
    #[serde(default)]
    pub collected_timestamp: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutofillForm {
    pub opid: String,
    #[serde(rename = "htmlID")]
    pub html_id: Option<String>,
    pub html_name: Option<String>,
    pub html_action: Option<String>,
    pub html_method: Option<String>,
}

/// One input (or `span`) on the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AutofillField {
    pub opid: String,
    /// Position in the document; username search walks fields before the password
    pub element_number: u32,
    pub viewable: bool,
    #[serde(rename = "htmlID")]
    pub html_id: Option<String>,
    pub html_name: Option<String>,
    pub html_class: Option<String>,
    pub tab_index: Option<String>,
    pub title: Option<String>,
    pub tag_name: Option<String>,
    #[serde(rename = "label-tag")]
    pub label_tag: Option<String>,
    #[serde(rename = "label-aria")]
    pub label_aria: Option<String>,
    #[serde(rename = "label-data")]
    pub label_data: Option<String>,
    #[serde(rename = "label-left")]
    pub label_left: Option<String>,
    #[serde(rename = "label-right")]
    pub label_right: Option<String>,
    #[serde(rename = "label-top")]
    pub label_top: Option<String>,
    pub placeholder: Option<String>,
    pub rel: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub value: Option<String>,
    pub checked: bool,
    pub auto_complete_type: Option<String>,
    pub disabled: bool,
    pub readonly: bool,
    /// Opid of the containing form, if any
    pub form: Option<String>,
    pub select_info: Option<SelectInfo>,
    pub max_length: Option<u32>,
    #[serde(rename = "data-stripe")]
    pub data_stripe: Option<String>,
    #[serde(rename = "data-recurly")]
    pub data_recurly: Option<String>,
}

/// Options of a `select` element.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectInfo {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// `[text, value]` pair as collected; either side may be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectOption(pub Vec<Option<String>>);

impl SelectOption {
    pub fn text(&self) -> Option<&str> {
        self.0.first().and_then(|t| t.as_deref())
    }

    pub fn value(&self) -> Option<&str> {
        self.0.get(1).and_then(|v| v.as_deref())
    }

    /// Both entries, skipping nulls.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.0.iter().filter_map(|e| e.as_deref())
    }
}

/// Field attributes the matchers read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAttribute {
    HtmlId,
    HtmlName,
    LabelTag,
    LabelAria,
    LabelLeft,
    LabelRight,
    LabelTop,
    Placeholder,
    AutoCompleteType,
    DataStripe,
    DataRecurly,
}

impl AutofillField {
    /// Attribute value, `None` when absent or empty.
    pub fn attribute(&self, attr: FieldAttribute) -> Option<&str> {
        let value = match attr {
            FieldAttribute::HtmlId => &self.html_id,
            FieldAttribute::HtmlName => &self.html_name,
            FieldAttribute::LabelTag => &self.label_tag,
            FieldAttribute::LabelAria => &self.label_aria,
            FieldAttribute::LabelLeft => &self.label_left,
            FieldAttribute::LabelRight => &self.label_right,
            FieldAttribute::LabelTop => &self.label_top,
            FieldAttribute::Placeholder => &self.placeholder,
            FieldAttribute::AutoCompleteType => &self.auto_complete_type,
            FieldAttribute::DataStripe => &self.data_stripe,
            FieldAttribute::DataRecurly => &self.data_recurly,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_type(&self, field_type: &str) -> bool {
        self.field_type.as_deref() == Some(field_type)
    }

    /// `span` targets only take custom field values and get no click/focus.
    pub fn is_span(&self) -> bool {
        self.tag_name.as_deref() == Some("span")
    }

    /// Text-like inputs that can hold a username.
    pub fn is_text_like(&self) -> bool {
        matches!(self.field_type.as_deref(), Some("text" | "email" | "tel"))
    }

    pub fn is_empty(&self) -> bool {
        self.value.as_deref().map_or(true, |v| v.trim().is_empty())
    }

    pub fn select_options(&self) -> Option<&[SelectOption]> {
        self.select_info.as_ref().map(|s| s.options.as_slice())
    }
}

impl PageDetails {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_details_wire_names() {
        let raw = r#"{
            "documentUUID": "doc-1",
            "url": "https://example.com/login",
            "forms": {"__form0": {"opid": "__form0", "htmlID": "login"}},
            "fields": [{
                "opid": "__0",
                "elementNumber": 0,
                "viewable": true,
                "htmlID": "user",
                "label-tag": "Email",
                "type": "email",
                "form": "__form0",
                "maxLength": 64,
                "selectInfo": {"options": [["May", "05"], [null, "x"]]}
            }]
        }"#;
        let page = PageDetails::from_json(raw).unwrap();
        assert_eq!(page.document_uuid, "doc-1");
        assert_eq!(page.forms["__form0"].html_id.as_deref(), Some("login"));

        let field = &page.fields[0];
        assert_eq!(field.attribute(FieldAttribute::HtmlId), Some("user"));
        assert_eq!(field.attribute(FieldAttribute::LabelTag), Some("Email"));
        assert_eq!(field.attribute(FieldAttribute::Placeholder), None);
        assert!(field.is_text_like());
        assert_eq!(field.max_length, Some(64));

        let options = field.select_options().unwrap();
        assert_eq!(options[0].text(), Some("May"));
        assert_eq!(options[0].value(), Some("05"));
        assert_eq!(options[1].text(), None);
        assert_eq!(options[1].entries().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn test_empty_attribute_reads_as_absent() {
        let field = AutofillField {
            html_name: Some(String::new()),
            value: Some("   ".into()),
            ..Default::default()
        };
        assert_eq!(field.attribute(FieldAttribute::HtmlName), None);
        assert!(field.is_empty());
    }
}
