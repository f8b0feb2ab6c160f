//! Page snapshot extraction.
//!
//! Turns the serialized markup of a rendered per-date page into a normalized
//! [`Snapshot`] despite the target app's unstable DOM. Extraction runs a
//! prioritized chain of [`ExtractionStrategy`] implementations; the first
//! strategy that yields a signal wins, and every failure inside a strategy
//! degrades to "no signal" rather than an error.

pub mod fingerprint;
pub mod heuristic;
pub mod structured;

use crate::config::Config;
use scraper::Html;
use serde::{Deserialize, Serialize};

/// A named orderable entry on a date page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    /// Display name (restaurant / offer name).
    pub name: String,
    /// Direct action link, when the page exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl MenuItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: None,
        }
    }
}

/// Point-in-time extraction result for one tracked page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Whether the date shows at least one orderable item.
    pub available: bool,
    /// Items found on the page. May be empty even when available — some
    /// strategies only establish availability, not names.
    pub items: Vec<MenuItem>,
    /// Stable digest over normalized semantic content.
    pub fingerprint: String,
}

/// What a single strategy learned from the page.
#[derive(Debug, Clone)]
pub struct Signal {
    /// Availability verdict.
    pub available: bool,
    /// Named items, when the strategy can produce them.
    pub items: Vec<MenuItem>,
    /// Normalized text the fingerprint falls back to when `items` is empty.
    pub content: String,
    /// Which strategy produced the signal, for logging.
    pub source: &'static str,
}

/// One extraction approach. Returns `None` when the page gives this
/// strategy nothing trustworthy to work with.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn probe(&self, doc: &Html, cfg: &Config) -> Option<Signal>;
}

/// Prioritized extraction chain.
pub struct Extractor {
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl Extractor {
    /// Build the standard chain: structured app state, then the explicit
    /// empty-date message, then selector/text heuristics.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(structured::StructuredStateStrategy),
                Box::new(heuristic::EmptyMessageStrategy),
                Box::new(heuristic::SelectorHeuristicStrategy),
            ],
        }
    }

    /// Extract a snapshot from serialized page markup. Never fails: when no
    /// strategy yields a signal the page is treated as unavailable with no
    /// items.
    pub fn extract(&self, html: &str, cfg: &Config) -> Snapshot {
        let doc = Html::parse_document(html);

        for strategy in &self.strategies {
            if let Some(signal) = strategy.probe(&doc, cfg) {
                tracing::debug!(
                    strategy = signal.source,
                    available = signal.available,
                    items = signal.items.len(),
                    "extraction signal"
                );
                return snapshot_from(signal);
            }
        }

        tracing::debug!("no extraction strategy yielded a signal; defaulting to unavailable");
        snapshot_from(Signal {
            available: false,
            items: Vec::new(),
            content: String::new(),
            source: "default",
        })
    }
}

fn snapshot_from(signal: Signal) -> Snapshot {
    let fingerprint =
        fingerprint::compute(signal.available, &signal.items, &signal.content);
    Snapshot {
        available: signal.available,
        items: signal.items,
        fingerprint,
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    use std::path::PathBuf;
    Config {
        base_url: "https://austin.lunchdrop.com/app".into(),
        lookahead_days: 14,
        webhook_url: "https://hooks.slack.test/T000/B000".into(),
        email: "user@example.com".into(),
        password: "secret".into(),
        card_selectors: Vec::new(),
        min_card_count: 1,
        empty_phrase: "no deliveries scheduled".into(),
        timeout_ms: 25_000,
        headless: true,
        state_dir: PathBuf::from("/tmp/dw-state"),
        artifacts_dir: PathBuf::from("/tmp/dw-artifacts"),
        summary_only: false,
        heartbeat_on_no_change: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Markup carrying both a structured state blob and CTA cards. The blob
    /// must win regardless of what the heuristics would say.
    const MIXED_PAGE: &str = r#"<html><body>
        <div id="app" data-page='{"props":{"deliveries":[
            {"restaurant":{"name":"Taco Cart"},"isOpen":true,"canOrder":true},
            {"restaurant":{"name":"Closed Kitchen"},"isOpen":false}
        ]}}'></div>
        <main>
          <div class="card"><h3>Phantom Grill</h3><button>Show Menu</button></div>
          <div class="card"><h3>Phantom Deli</h3><button>Show Menu</button></div>
        </main>
    </body></html>"#;

    #[test]
    fn test_structured_strategy_takes_precedence() {
        let cfg = test_config();
        let snap = Extractor::new().extract(MIXED_PAGE, &cfg);
        assert!(snap.available);
        // The structured payload lists one eligible record; the two phantom
        // CTA cards must not leak into the result.
        assert_eq!(snap.items, vec![MenuItem::named("Taco Cart")]);
    }

    #[test]
    fn test_empty_page_defaults_to_unavailable() {
        let mut cfg = test_config();
        cfg.empty_phrase = String::new();
        let snap = Extractor::new().extract("", &cfg);
        assert!(!snap.available);
        assert!(snap.items.is_empty());
        assert!(!snap.fingerprint.is_empty());
    }

    #[test]
    fn test_empty_message_beats_heuristics() {
        let cfg = test_config();
        let html = r#"<html><body><main>
            <p>No deliveries scheduled yet. Check back soon!</p>
            <button>Show Menu</button>
        </main></body></html>"#;
        let snap = Extractor::new().extract(html, &cfg);
        assert!(!snap.available);
    }
}
