//! JSON text encoding for list-valued columns (`participants`, `activities`,
//! `photos`). SQLite has no array type, so lists are stored as serialized JSON
//! and this module is the only place that encodes or decodes them.

use serde::{Deserialize, Serialize};

/// A list field as submitted by a client: either a real JSON array or a
/// string that is expected to already hold a serialized array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringListInput {
    List(Vec<String>),
    Encoded(String),
}

impl StringListInput {
    /// Canonical storage form. Encoded strings that parse as a JSON array are
    /// re-serialized; anything else is stored verbatim.
    pub fn to_storage(&self) -> String {
        match self {
            StringListInput::List(items) => encode(items),
            StringListInput::Encoded(raw) => match serde_json::from_str::<serde_json::Value>(raw) {
                Ok(value @ serde_json::Value::Array(_)) => value.to_string(),
                _ => raw.clone(),
            },
        }
    }
}

impl From<Vec<String>> for StringListInput {
    fn from(items: Vec<String>) -> Self {
        StringListInput::List(items)
    }
}

pub fn encode(items: &[String]) -> String {
    serde_json::Value::from(items.to_vec()).to_string()
}

/// Reads a stored value back as a list, `None` when it is not a JSON array of
/// strings.
pub fn decode(stored: &str) -> Option<Vec<String>> {
    serde_json::from_str(stored).ok()
}

pub fn normalize(input: Option<&StringListInput>) -> Option<String> {
    input.map(StringListInput::to_storage)
}
