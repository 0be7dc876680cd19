//! Fill scripts: the ordered operations a page injector replays

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::page::AutofillField;

/// One primitive page operation, addressed by field opid.
///
/// Wire form is a JSON array: `["click_on_opid", id]`,
/// `["focus_by_opid", id]`, `["fill_by_opid", id, value]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillOperation {
    Click(String),
    Focus(String),
    Fill(String, String),
}

impl FillOperation {
    pub fn opid(&self) -> &str {
        match self {
            Self::Click(id) | Self::Focus(id) | Self::Fill(id, _) => id,
        }
    }
}

impl Serialize for FillOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Click(id) => ("click_on_opid", id).serialize(serializer),
            Self::Focus(id) => ("focus_by_opid", id).serialize(serializer),
            Self::Fill(id, value) => ("fill_by_opid", id, value).serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FillOperation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = Vec::<String>::deserialize(deserializer)?;
        match parts.as_slice() {
            [op, id] if op == "click_on_opid" => Ok(Self::Click(id.clone())),
            [op, id] if op == "focus_by_opid" => Ok(Self::Focus(id.clone())),
            [op, id, value] if op == "fill_by_opid" => Ok(Self::Fill(id.clone(), value.clone())),
            _ => Err(D::Error::custom(format!("unknown fill operation {parts:?}"))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptProperties {
    /// Milliseconds the injector waits between operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_between_operations: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillScript {
    #[serde(rename = "documentUUID")]
    pub document_uuid: String,
    #[serde(default)]
    pub properties: ScriptProperties,
    #[serde(default)]
    pub script: Vec<FillOperation>,
}

impl FillScript {
    pub fn new(document_uuid: impl Into<String>) -> Self {
        Self {
            document_uuid: document_uuid.into(),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }

    /// Values written by `fill_by_opid`, in order.
    pub fn fills(&self) -> impl Iterator<Item = (&str, &str)> {
        self.script.iter().filter_map(|op| match op {
            FillOperation::Fill(id, value) => Some((id.as_str(), value.as_str())),
            _ => None,
        })
    }

    /// Value filled into `opid`, if any.
    pub fn fill_value(&self, opid: &str) -> Option<&str> {
        self.fills().find(|(id, _)| *id == opid).map(|(_, v)| v)
    }

    /// Click, focus, then set the value. Spans only get the value.
    pub(crate) fn fill_by_opid(&mut self, field: &AutofillField, value: &str) {
        if !field.is_span() {
            self.script.push(FillOperation::Click(field.opid.clone()));
            self.script.push(FillOperation::Focus(field.opid.clone()));
        }
        self.script
            .push(FillOperation::Fill(field.opid.clone(), value.to_string()));
    }

    /// Focus the last filled viewable password field, else the last filled
    /// viewable field.
    pub(crate) fn focus_last(&mut self, filled: &FilledFields<'_>) {
        let viewable = filled.iter().filter(|f| f.viewable);
        let mut last = None;
        let mut last_password = None;
        for field in viewable {
            last = Some(field);
            if field.is_type("password") {
                last_password = Some(field);
            }
        }
        if let Some(target) = last_password.or(last) {
            self.script.push(FillOperation::Focus(target.opid.clone()));
        }
    }
}

/// Fields already written by this script, in first-fill order.
#[derive(Debug, Default)]
pub(crate) struct FilledFields<'a> {
    fields: Vec<&'a AutofillField>,
}

impl<'a> FilledFields<'a> {
    pub fn contains(&self, opid: &str) -> bool {
        self.fields.iter().any(|f| f.opid == opid)
    }

    pub fn insert(&mut self, field: &'a AutofillField) {
        if !self.contains(&field.opid) {
            self.fields.push(field);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a AutofillField> + '_ {
        self.fields.iter().copied()
    }
}
