//! Channel message formatting for run outcomes.

use super::diff::ChangeEvent;
use super::DateOutcome;
use crate::notify::{divider, section};
use serde_json::Value;

/// Message for accumulated change events.
pub fn change_message(events: &[ChangeEvent]) -> (String, Vec<Value>) {
    let text = format!(
        "{} future date(s) changed on the lunch calendar",
        events.len()
    );

    let mut blocks = vec![section("*New future dates available:*")];
    for event in events {
        blocks.push(section(describe_event(event)));
    }
    blocks.push(divider());

    (text, blocks)
}

fn describe_event(event: &ChangeEvent) -> String {
    let kind = if event.newly_available {
        "now available"
    } else {
        "menu lineup changed"
    };
    let mut line = format!(
        "• *{}* — <{}|view> ({kind})",
        event.page.date, event.page.url
    );
    if !event.items_added.is_empty() {
        line.push_str(&format!(": {}", event.items_added.join(", ")));
    }
    line
}

/// Point-in-time roll-up for summary mode.
pub fn summary_message(outcomes: &[DateOutcome]) -> (String, Vec<Value>) {
    let available = outcomes.iter().filter(|o| o.snapshot.available).count();
    let text = format!(
        "Lunch calendar summary: {available}/{} upcoming date(s) have menus",
        outcomes.len()
    );

    let mut blocks = vec![section("*Upcoming dates:*")];
    for outcome in outcomes {
        let line = if outcome.snapshot.available {
            let names: Vec<&str> = outcome
                .snapshot
                .items
                .iter()
                .map(|i| i.name.as_str())
                .collect();
            if names.is_empty() {
                format!("• *{}* — menus up (<{}|view>)", outcome.page.date, outcome.page.url)
            } else {
                format!(
                    "• *{}* — {} (<{}|view>)",
                    outcome.page.date,
                    names.join(", "),
                    outcome.page.url
                )
            }
        } else {
            format!("• *{}* — nothing scheduled", outcome.page.date)
        };
        blocks.push(section(line));
    }

    (text, blocks)
}

/// Heartbeat for a change-mode run that found nothing.
pub fn heartbeat_message(window_len: usize, errors: usize) -> String {
    if errors == 0 {
        format!("No changes across {window_len} upcoming date(s).")
    } else {
        format!(
            "No changes across {window_len} upcoming date(s); {errors} check(s) failed."
        )
    }
}

/// One-line report for a fatal login failure.
pub fn auth_failure_message(error: &str) -> String {
    format!("Monitor run aborted: {error}")
}
