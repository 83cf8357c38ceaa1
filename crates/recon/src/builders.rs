//! Constructors for freshly generated documents.

use serde_json::{json, Map, Value};

use crate::document::{BundleKind, CategoryDocument, CategoryRef, GroupDocument, OfferingEntry};
use crate::normalize::{normalize_str, safe_name};

/// `[{"locale": .., "value": ..}]`
fn localized(locale: &str, value: &str) -> Value {
    json!([{ "locale": locale, "value": value }])
}

/// A non-bundle entry. An empty `name` is omitted.
pub fn make_offering_entry(id: &str, name: Option<&str>, locale: &str, expired: bool) -> OfferingEntry {
    let mut extra = Map::new();
    extra.insert("isBundle".into(), Value::Bool(false));
    if let Some(name) = name.filter(|n| !n.is_empty()) {
        extra.insert("name".into(), localized(locale, name));
    }
    OfferingEntry {
        id: Some(Value::String(id.to_string())),
        expired_for_sales: Some(Value::Bool(expired)),
        extra,
    }
}

/// Stable ascending sort on the raw id text.
pub fn sort_entries(entries: &mut [OfferingEntry]) {
    entries.sort_by_cached_key(|e| e.raw_id());
}

pub fn build_service_bundle(
    name: &str,
    id: &str,
    locale: &str,
    entries: Vec<OfferingEntry>,
) -> GroupDocument {
    build_bundle(BundleKind::Service, name, id, locale, entries)
}

/// Same shape as a service bundle plus a `description`.
pub fn build_transition_bundle(
    name: &str,
    id: &str,
    locale: &str,
    entries: Vec<OfferingEntry>,
) -> GroupDocument {
    build_bundle(BundleKind::Transition, name, id, locale, entries)
}

fn build_bundle(
    kind: BundleKind,
    name: &str,
    id: &str,
    locale: &str,
    mut entries: Vec<OfferingEntry>,
) -> GroupDocument {
    sort_entries(&mut entries);

    let mut extra = Map::new();
    extra.insert("name".into(), Value::String(safe_name(name)));
    extra.insert("localizedName".into(), localized(locale, name));
    if kind == BundleKind::Transition {
        extra.insert("description".into(), localized(locale, name));
    }
    extra.insert("effective".into(), Value::Bool(true));
    for key in ["externalId", "policy", "restriction"] {
        extra.insert(key.into(), Value::Array(Vec::new()));
    }

    GroupDocument {
        id: Some(Value::String(id.to_string())),
        purpose: Some(json!([kind.purpose()])),
        product_offerings_in_group: Some(Some(entries)),
        extra,
    }
}

/// Normalized, de-duplicated, sorted categories with a parallel ref list.
pub fn build_category_document<S: AsRef<str>>(offer_id: &str, category_ids: &[S]) -> CategoryDocument {
    let mut category: Vec<String> = category_ids
        .iter()
        .map(|c| normalize_str(c.as_ref()))
        .filter(|c| !c.is_empty())
        .collect();
    category.sort();
    category.dedup();

    let category_ref = category.iter().map(|id| CategoryRef { id: id.clone() }).collect();
    CategoryDocument {
        id: offer_id.to_string(),
        category,
        category_ref,
    }
}
