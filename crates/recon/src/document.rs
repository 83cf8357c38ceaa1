//! JSON document shapes and the canonical codec.
//!
//! Bundle documents type only the keys the engine reads or writes: the
//! document `id`, `purpose` and `productOfferingsInGroup`, and each entry's
//! `id` and `expiredForSales`. Everything else stays raw JSON in a flattened
//! `extra` map, so explicit `null`s and unexpected shapes survive a rewrite.
//! Serialization sorts object keys and indents with four spaces; non-ASCII
//! text is written unescaped.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::normalize::normalize_str;

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// One line item of a bundle's `productOfferingsInGroup` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferingEntry {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub expired_for_sales: Option<Value>,
    /// `name`, `isBundle` and any other keys, untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OfferingEntry {
    /// Id as written in the document, used as the sort key.
    pub fn raw_id(&self) -> String {
        self.id.as_ref().map(raw_text).unwrap_or_default()
    }

    /// Normalized id used for membership checks.
    pub fn id_text(&self) -> String {
        normalize_str(&self.raw_id())
    }

    /// Only a literal `true` counts as expired.
    pub fn is_expired(&self) -> bool {
        matches!(self.expired_for_sales, Some(Value::Bool(true)))
    }

    pub fn expire(&mut self) {
        self.expired_for_sales = Some(Value::Bool(true));
    }

    /// First localized `name` value, if the entry has one.
    pub fn display_name(&self) -> Option<&str> {
        first_localized(self.extra.get("name")?)
    }
}

/// `value` of the first element of a localized list.
pub fn first_localized(value: &Value) -> Option<&str> {
    value.as_array()?.first()?.get("value")?.as_str()
}

/// Which bundle variant an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// `purpose = ["addOn"]`
    Service,
    /// `purpose = ["replaceOffer"]`
    Transition,
}

impl BundleKind {
    pub fn purpose(self) -> &'static str {
        match self {
            Self::Service => "addOn",
            Self::Transition => "replaceOffer",
        }
    }

    /// Context key naming an entry of this bundle kind.
    pub fn entry_key(self) -> &'static str {
        match self {
            Self::Service => "service_id",
            Self::Transition => "offer_id",
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Service => write!(f, "service bundle"),
            Self::Transition => write!(f, "transition bundle"),
        }
    }
}

/// A product offering group document (service or transition bundle).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDocument {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Value>,
    /// Outer `None`: key absent. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "present_list", skip_serializing_if = "Option::is_none")]
    pub product_offerings_in_group: Option<Option<Vec<OfferingEntry>>>,
    /// `name`, `localizedName`, `description`, `effective` and the rest.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl GroupDocument {
    /// Normalized document id, empty when missing.
    pub fn id_text(&self) -> String {
        normalize_str(&self.id.as_ref().map(raw_text).unwrap_or_default())
    }

    /// True only for the exact single-element purpose list of `kind`.
    pub fn has_purpose(&self, kind: BundleKind) -> bool {
        match &self.purpose {
            Some(Value::Array(items)) => {
                items.len() == 1 && items[0].as_str() == Some(kind.purpose())
            }
            _ => false,
        }
    }

    /// Entry list; absent and `null` both read as empty.
    pub fn entries(&self) -> &[OfferingEntry] {
        self.product_offerings_in_group
            .as_ref()
            .and_then(|list| list.as_deref())
            .unwrap_or(&[])
    }

    /// Existing entries for in-place edits. Never creates the list.
    pub fn entries_mut(&mut self) -> &mut [OfferingEntry] {
        self.product_offerings_in_group
            .as_mut()
            .and_then(|list| list.as_mut())
            .map(Vec::as_mut_slice)
            .unwrap_or_default()
    }

    /// Append an entry, creating the list when it is absent or `null`.
    pub fn push_entry(&mut self, entry: OfferingEntry) {
        self.product_offerings_in_group
            .get_or_insert(None)
            .get_or_insert_with(Vec::new)
            .push(entry);
    }

    /// Top-level key the engine does not model.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
}

/// Category assignment of one offer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDocument {
    pub id: String,
    pub category: Vec<String>,
    pub category_ref: Vec<CategoryRef>,
}

/// Keeps an explicit `null` distinguishable from an absent key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Like [`present`] for the entry list: `null` becomes `Some(None)`.
fn present_list<'de, D>(deserializer: D) -> Result<Option<Option<Vec<OfferingEntry>>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<OfferingEntry>>::deserialize(deserializer).map(Some)
}

/// Scalar text of a JSON value; `null` and containers yield "".
pub fn raw_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Codec
// ---------------------------------------------------------------------------

/// An archive entry that is not a readable document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentError {
    pub message: String,
}

impl fmt::Display for DocumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid document: {}", self.message)
    }
}

impl std::error::Error for DocumentError {}

/// Decode UTF-8 JSON into a document shape.
pub fn parse_document<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DocumentError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DocumentError {
        message: format!("not UTF-8: {e}"),
    })?;
    serde_json::from_str(text).map_err(|e| DocumentError {
        message: e.to_string(),
    })
}

/// Canonical bytes: sorted keys, 4-space indentation, unescaped non-ASCII.
pub fn serialize_document<T: Serialize>(doc: &T) -> Result<Vec<u8>, DocumentError> {
    let value = serde_json::to_value(doc).map_err(|e| DocumentError {
        message: e.to_string(),
    })?;
    let value = canonicalize(value);

    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser).map_err(|e| DocumentError {
        message: e.to_string(),
    })?;
    Ok(out)
}

/// Recursively order object keys lexicographically.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<(String, Value)> = map.into_iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(pairs.into_iter().map(|(k, v)| (k, canonicalize(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
