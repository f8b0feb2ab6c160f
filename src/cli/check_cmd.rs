//! `dropwatch check` — run one detection pass over the date window.

use crate::cli::output;
use crate::config::Config;
use crate::monitor::Monitor;
use crate::notify::SlackWebhook;
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{Context, Result};
use std::sync::Arc;

/// Run the check command.
pub async fn run(summary: bool, heartbeat: bool) -> Result<()> {
    let mut cfg = Config::from_env()?;
    if summary {
        cfg.summary_only = true;
    }
    if heartbeat {
        cfg.heartbeat_on_no_change = true;
    }

    let renderer: Arc<dyn Renderer> = Arc::new(
        ChromiumRenderer::new(cfg.headless)
            .await
            .context("browser launch failed")?,
    );
    let notifier = Arc::new(SlackWebhook::new(cfg.webhook_url.clone()));

    let monitor = Monitor::new(cfg, Arc::clone(&renderer), notifier)?;
    let today = chrono::Local::now().date_naive();

    let result = monitor.run(today).await;
    let _ = renderer.shutdown().await;
    let report = result.context("run aborted")?;

    if output::is_json() {
        output::print_json(&serde_json::json!({
            "window": report.window,
            "checked": report.outcomes.len(),
            "changes": report.events.len(),
            "errors": report.errors,
            "notified": report.notified,
        }));
        return Ok(());
    }

    output::say(format!(
        "Checked {}/{} date(s): {} change(s) detected",
        report.outcomes.len(),
        report.window.len(),
        report.events.len()
    ));
    for event in &report.events {
        let kind = if event.newly_available {
            "newly available"
        } else {
            "content changed"
        };
        output::say(format!("  {} — {kind}", event.page.date));
    }
    for error in &report.errors {
        output::say(format!("  [warn] {error}"));
    }

    Ok(())
}
