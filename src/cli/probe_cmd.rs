//! `dropwatch probe` — log in, visit one date page, save artifacts.
//!
//! A debugging aid for extraction misses: it reports what the extractor saw
//! on a single date and always leaves markup + screenshot artifacts behind.

use crate::artifacts::ArtifactSink;
use crate::auth::Authenticator;
use crate::cli::output;
use crate::config::Config;
use crate::extract::{Extractor, Snapshot};
use crate::notify::{Notifier, SlackWebhook};
use crate::renderer::chromium::ChromiumRenderer;
use crate::renderer::Renderer;
use anyhow::{Context, Result};

/// Run the probe command. `offset` is in days from today (0 = today).
pub async fn run(offset: i64) -> Result<()> {
    let cfg = Config::from_env()?;
    let date = chrono::Local::now().date_naive() + chrono::Duration::days(offset);
    let url = cfg.url_for(date);
    let notifier = SlackWebhook::new(cfg.webhook_url.clone());

    output::say(format!("Probing {date} → {url}"));

    match probe(&cfg, date, &url).await {
        Ok(snapshot) => {
            let names: Vec<&str> = snapshot.items.iter().map(|i| i.name.as_str()).collect();
            output::say(format!(
                "Available: {} ({} item(s))",
                snapshot.available,
                names.len()
            ));
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "date": date,
                    "url": url,
                    "available": snapshot.available,
                    "items": names,
                    "fingerprint": snapshot.fingerprint,
                }));
            }
            let ping = format!(
                "Probe ran for {date}: available={}, {} item(s)",
                snapshot.available,
                names.len()
            );
            if let Err(e) = notifier.send(&ping, None).await {
                tracing::warn!(error = %e, "probe ping not delivered");
            }
            Ok(())
        }
        Err(e) => {
            // The probe exists to diagnose problems, so its own failures go
            // to the channel too.
            let _ = notifier.send(&format!("Probe error: {e:#}"), None).await;
            Err(e)
        }
    }
}

async fn probe(cfg: &Config, date: chrono::NaiveDate, url: &str) -> Result<Snapshot> {
    let renderer = ChromiumRenderer::new(cfg.headless)
        .await
        .context("browser launch failed")?;
    let artifacts = ArtifactSink::new(&cfg.artifacts_dir);
    let auth = Authenticator::new(cfg, &artifacts);

    let mut ctx = renderer.new_context().await?;
    auth.restore_previous_session(ctx.as_mut()).await;
    auth.login(ctx.as_mut()).await?;

    // Revisit the date page post-auth and capture unconditionally.
    ctx.navigate(url, cfg.timeout_ms).await?;
    ctx.wait_for_idle(cfg.timeout_ms).await?;
    let html = ctx.html().await?;
    let snapshot = Extractor::new().extract(&html, cfg);

    artifacts.capture(&format!("probe-{date}"), &*ctx).await;
    output::say(format!("Artifacts saved under {}", artifacts.dir().display()));

    let _ = ctx.close().await;
    let _ = renderer.shutdown().await;
    Ok(snapshot)
}
