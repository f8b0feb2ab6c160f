//! Structured application-state strategy.
//!
//! Inertia-style apps serialize their page props into a `data-page`
//! attribute on the app root. When that blob is present it reflects
//! server-computed state rather than rendering artifacts, so it is
//! authoritative: the strategy extracts the delivery records, applies the
//! eligibility predicates, and wins the chain.

use super::{ExtractionStrategy, MenuItem, Signal};
use crate::config::Config;
use scraper::{Html, Selector};
use serde_json::Value;

pub struct StructuredStateStrategy;

impl ExtractionStrategy for StructuredStateStrategy {
    fn name(&self) -> &'static str {
        "structured-state"
    }

    fn probe(&self, doc: &Html, _cfg: &Config) -> Option<Signal> {
        let blob = find_state_blob(doc)?;
        let state: Value = serde_json::from_str(&blob).ok()?;
        let deliveries = find_deliveries(&state)?;

        let eligible: Vec<MenuItem> = deliveries
            .iter()
            .filter(|record| is_eligible(record))
            .filter_map(item_from_record)
            .collect();

        let mut names: Vec<&str> = eligible.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();

        Some(Signal {
            available: !eligible.is_empty(),
            content: names.join(" "),
            items: eligible,
            source: "structured-state",
        })
    }
}

/// Locate the serialized app-state attribute anywhere in the document.
fn find_state_blob(doc: &Html) -> Option<String> {
    let sel = Selector::parse("[data-page]").ok()?;
    doc.select(&sel)
        .filter_map(|el| el.value().attr("data-page"))
        .map(str::to_string)
        .next()
}

/// Find the delivery record array inside the state blob.
///
/// The exact nesting has shifted between app releases, so the array is
/// located by key rather than by path: the first `"deliveries"` array found
/// in a shallow walk of the props object.
fn find_deliveries(state: &Value) -> Option<&Vec<Value>> {
    let root = state.get("props").unwrap_or(state);
    find_array_by_key(root, "deliveries", 0)
}

fn find_array_by_key<'a>(value: &'a Value, key: &str, depth: u8) -> Option<&'a Vec<Value>> {
    if depth > 3 {
        return None;
    }
    let obj = value.as_object()?;
    if let Some(arr) = obj.get(key).and_then(Value::as_array) {
        return Some(arr);
    }
    obj.values()
        .find_map(|v| find_array_by_key(v, key, depth + 1))
}

/// Eligibility: the record is open, not cancelled, and the current user is
/// permitted to act on it. Unknown fields default permissive — only an
/// explicit negative disqualifies a record.
fn is_eligible(record: &Value) -> bool {
    let cancelled = record
        .get("cancelledAt")
        .is_some_and(|v| !v.is_null())
        || flag(record, "cancelled").unwrap_or(false)
        || record.get("state").and_then(Value::as_str) == Some("cancelled");
    if cancelled {
        return false;
    }

    let open = flag(record, "isOpen")
        .or_else(|| flag(record, "open"))
        .unwrap_or(true);
    if !open {
        return false;
    }

    flag(record, "canOrder")
        .or_else(|| flag(record, "userCanOrder"))
        .unwrap_or(true)
}

fn flag(record: &Value, key: &str) -> Option<bool> {
    record.get(key).and_then(Value::as_bool)
}

fn item_from_record(record: &Value) -> Option<MenuItem> {
    let name = record
        .get("restaurant")
        .and_then(|r| r.get("name"))
        .or_else(|| record.get("name"))
        .and_then(Value::as_str)?
        .trim()
        .to_string();
    if name.is_empty() {
        return None;
    }

    let link = record
        .get("url")
        .or_else(|| record.get("link"))
        .and_then(Value::as_str)
        .map(String::from);

    Some(MenuItem { name, link })
}
