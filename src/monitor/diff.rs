//! Change classification against persisted state.

use crate::extract::Snapshot;
use crate::store::PersistedState;
use chrono::NaiveDate;

/// One date-scoped page under monitoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPage {
    pub url: String,
    pub date: NaiveDate,
}

/// A meaningful transition for one tracked page. Derived, never stored.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub page: TrackedPage,
    /// Previously absent or unavailable, now available.
    pub newly_available: bool,
    /// Items present now that were not in the stored item set.
    pub items_added: Vec<String>,
    /// Still available, but the fingerprint moved.
    pub content_changed: bool,
}

/// Compare a fresh snapshot against the stored state for its page.
///
/// Flags a change when the page became available, or when it stayed
/// available with a different fingerprint. A page that remains unavailable,
/// or whose fingerprint is unchanged while available, produces no event.
pub fn classify(
    page: &TrackedPage,
    prev: Option<&PersistedState>,
    new: &Snapshot,
) -> Option<ChangeEvent> {
    let was_available = prev.is_some_and(|p| p.available);

    let newly_available = !was_available && new.available;
    let content_changed = was_available
        && new.available
        && prev.is_some_and(|p| p.fingerprint != new.fingerprint);

    if !newly_available && !content_changed {
        return None;
    }

    let previous_items: Vec<&str> = prev
        .map(|p| p.items.iter().map(String::as_str).collect())
        .unwrap_or_default();
    let items_added = new
        .items
        .iter()
        .map(|i| i.name.clone())
        .filter(|name| !previous_items.contains(&name.as_str()))
        .collect();

    Some(ChangeEvent {
        page: page.clone(),
        newly_available,
        items_added,
        content_changed,
    })
}
