//! Message and selector/text heuristics.
//!
//! Fallback strategies for when the page carries no structured state blob.
//! These read the rendered markup the way a person would: an explicit
//! "nothing scheduled" message, or a count of card-like elements and
//! call-to-action buttons.

use super::{ExtractionStrategy, MenuItem, Signal};
use crate::config::Config;
use crate::extract::fingerprint::normalize_text;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Call-to-action phrases that mark an orderable card.
fn cta_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(show|view)\s+menu\b").unwrap())
}

/// Normalized text of the main content region (`<main>`, else `<body>`).
pub(crate) fn main_text(doc: &Html) -> Option<String> {
    for selector in ["main", "body"] {
        let sel = Selector::parse(selector).ok()?;
        if let Some(el) = doc.select(&sel).next() {
            let text = normalize_text(&el.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// Explicit-message strategy: the app renders a fixed phrase on dates with
/// nothing scheduled. Phrase present means unavailable; phrase absent means
/// the date is showing something, even if we cannot name the items.
pub struct EmptyMessageStrategy;

impl ExtractionStrategy for EmptyMessageStrategy {
    fn name(&self) -> &'static str {
        "empty-message"
    }

    fn probe(&self, doc: &Html, cfg: &Config) -> Option<Signal> {
        if cfg.empty_phrase.trim().is_empty() {
            return None;
        }
        // Without readable main content the phrase's absence means nothing.
        let text = main_text(doc)?;
        let phrase = normalize_text(&cfg.empty_phrase).to_lowercase();
        let available = !text.to_lowercase().contains(&phrase);

        Some(Signal {
            available,
            items: Vec::new(),
            content: text,
            source: "empty-message",
        })
    }
}

/// Selector/text-heuristic strategy: count configured card selectors, else
/// call-to-action occurrences, and infer item names from the enclosing
/// card containers.
pub struct SelectorHeuristicStrategy;

impl ExtractionStrategy for SelectorHeuristicStrategy {
    fn name(&self) -> &'static str {
        "selector-heuristic"
    }

    fn probe(&self, doc: &Html, cfg: &Config) -> Option<Signal> {
        let mut count = 0usize;
        let mut card_texts: Vec<String> = Vec::new();
        let mut usable_selectors = 0usize;

        for raw in &cfg.card_selectors {
            // Selectors arrive from configuration and may use dialects the
            // parser does not know; an unusable selector contributes nothing.
            let Ok(sel) = Selector::parse(raw) else {
                tracing::debug!(selector = %raw, "unparseable card selector, skipping");
                continue;
            };
            usable_selectors += 1;
            for el in doc.select(&sel) {
                count += 1;
                let text = normalize_text(&el.text().collect::<String>());
                if !text.is_empty() {
                    card_texts.push(text);
                }
            }
        }

        if usable_selectors == 0 {
            // CTA fallback: count elements whose text is an action phrase.
            count = cta_elements(doc).count();
        }

        let available = count >= cfg.min_card_count;
        let items = if available { infer_items(doc) } else { Vec::new() };

        let content = if card_texts.is_empty() {
            main_text(doc).unwrap_or_default()
        } else {
            card_texts.sort_unstable();
            card_texts.dedup();
            card_texts.join(" ")
        };

        Some(Signal {
            available,
            items,
            content,
            source: "selector-heuristic",
        })
    }
}

fn cta_elements<'a>(doc: &'a Html) -> impl Iterator<Item = ElementRef<'a>> {
    static SEL: OnceLock<Selector> = OnceLock::new();
    let sel = SEL.get_or_init(|| Selector::parse("a, button, [role=button]").unwrap());
    doc.select(sel)
        .filter(|el| cta_regex().is_match(&el.text().collect::<String>()))
}

/// Infer item names by walking from each call-to-action control up to the
/// nearest card-like container, preferring a heading's text, else the first
/// line of container text that is not the action itself. When that finds
/// nothing, fall back to scanning heading elements document-wide.
fn infer_items(doc: &Html) -> Vec<MenuItem> {
    static HEADINGS: OnceLock<Selector> = OnceLock::new();
    let headings = HEADINGS.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

    let mut seen: HashSet<String> = HashSet::new();
    let mut items: Vec<MenuItem> = Vec::new();

    for cta in cta_elements(doc) {
        let Some(name) = card_name(cta, headings) else {
            continue;
        };
        if seen.insert(name.to_lowercase()) {
            let link = cta.value().attr("href").map(String::from);
            items.push(MenuItem { name, link });
        }
    }

    if items.is_empty() {
        for heading in doc.select(headings) {
            let text = normalize_text(&heading.text().collect::<String>());
            if text.is_empty() || text.len() > 60 || cta_regex().is_match(&text) {
                continue;
            }
            if seen.insert(text.to_lowercase()) {
                items.push(MenuItem::named(text));
            }
        }
    }

    items
}

/// Name for the card containing a call-to-action element.
fn card_name(cta: ElementRef<'_>, headings: &Selector) -> Option<String> {
    for ancestor in cta.ancestors().filter_map(ElementRef::wrap).take(4) {
        if let Some(heading) = ancestor.select(headings).next() {
            let text = normalize_text(&heading.text().collect::<String>());
            if !text.is_empty() && !cta_regex().is_match(&text) {
                return Some(text);
            }
        }
        // No heading: first container line that is not the action text.
        let container_text = ancestor.text().collect::<String>();
        for line in container_text.lines() {
            let line = normalize_text(line);
            if line.is_empty() || line.len() > 80 || cta_regex().is_match(&line) {
                continue;
            }
            return Some(line);
        }
    }
    None
}
