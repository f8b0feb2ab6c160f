//! Change detection orchestrator.
//!
//! Drives one run: `INIT → AUTH → (per date: LOAD → EXTRACT → DIFF →
//! PERSIST) → REPORT`. One browsing session is authenticated per run and
//! its cookies are shared across per-date contexts; dates are checked
//! strictly sequentially, each in its own isolated context. Per-date
//! failures are collected and skipped — only authentication failure aborts
//! the run, and even that still attempts one failure notification.

pub mod diff;
pub mod report;
pub mod window;

pub use diff::{ChangeEvent, TrackedPage};

use crate::artifacts::ArtifactSink;
use crate::auth::Authenticator;
use crate::config::Config;
use crate::error::MonitorError;
use crate::extract::{Extractor, Snapshot};
use crate::notify::Notifier;
use crate::renderer::{RenderContext, Renderer};
use crate::store::SnapshotStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of checking one date.
#[derive(Debug, Clone)]
pub struct DateOutcome {
    pub page: TrackedPage,
    pub snapshot: Snapshot,
}

/// What one run did.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Dates the run intended to check.
    pub window: Vec<NaiveDate>,
    /// Successful per-date outcomes.
    pub outcomes: Vec<DateOutcome>,
    /// Accumulated change events (empty in summary mode).
    pub events: Vec<ChangeEvent>,
    /// Non-fatal per-date errors.
    pub errors: Vec<String>,
    /// Whether a notification was sent.
    pub notified: bool,
}

/// The change-detection engine for one configured target.
pub struct Monitor {
    cfg: Config,
    renderer: Arc<dyn Renderer>,
    notifier: Arc<dyn Notifier>,
    store: SnapshotStore,
    extractor: Extractor,
    artifacts: ArtifactSink,
}

impl Monitor {
    pub fn new(
        cfg: Config,
        renderer: Arc<dyn Renderer>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, MonitorError> {
        let store = SnapshotStore::open(&cfg.state_dir)?;
        let artifacts = ArtifactSink::new(&cfg.artifacts_dir);
        Ok(Self {
            cfg,
            renderer,
            notifier,
            store,
            extractor: Extractor::new(),
            artifacts,
        })
    }

    /// Execute one full run for the window starting after `today`.
    pub async fn run(&self, today: NaiveDate) -> Result<RunReport, MonitorError> {
        let window = window::business_days_ahead(today, self.cfg.lookahead_days);
        if window.is_empty() {
            info!("window contains no business days; nothing to check");
            return Ok(RunReport::default());
        }

        let mut report = RunReport {
            window: window.clone(),
            ..RunReport::default()
        };

        // AUTH — fatal on failure, after one notification attempt.
        if let Err(e) = self.authenticate().await {
            warn!(error = %e, "authentication failed, aborting run");
            let text = report::auth_failure_message(&e.to_string());
            if let Err(ne) = self.notifier.send(&text, None).await {
                warn!(error = %ne, "failure notification not delivered");
            }
            return Err(e);
        }
        let session_blob = std::fs::read_to_string(Authenticator::session_path(&self.cfg)).ok();

        // Per-date checks, strictly sequential.
        for date in window {
            let page = TrackedPage {
                url: self.cfg.url_for(date),
                date,
            };
            info!(date = %date, url = %page.url, "checking date");

            match self.check_date(&page, session_blob.as_deref()).await {
                Ok(snapshot) => {
                    if !self.cfg.summary_only {
                        let prev = self.store.load(&page.url);
                        if let Some(event) = diff::classify(&page, prev.as_ref(), &snapshot) {
                            info!(
                                date = %date,
                                newly_available = event.newly_available,
                                content_changed = event.content_changed,
                                "change detected"
                            );
                            report.events.push(event);
                        }
                    }
                    if let Err(e) = self.store.save(&page.url, date, &snapshot) {
                        warn!(date = %date, error = %e, "state persist failed");
                        report.errors.push(format!("{date}: {e}"));
                    }
                    report.outcomes.push(DateOutcome { page, snapshot });
                }
                Err(e) => {
                    warn!(date = %date, error = %e, "date check failed, continuing");
                    report.errors.push(format!("{date}: {e}"));
                }
            }
        }

        self.send_report(&mut report).await;
        Ok(report)
    }

    async fn authenticate(&self) -> Result<(), MonitorError> {
        let auth = Authenticator::new(&self.cfg, &self.artifacts);
        let mut ctx = self
            .renderer
            .new_context()
            .await
            .map_err(|e| MonitorError::Authentication(format!("no browsing context: {e}")))?;

        auth.restore_previous_session(ctx.as_mut()).await;
        let result = auth.login(ctx.as_mut()).await;
        let _ = ctx.close().await;
        result
    }

    /// LOAD → EXTRACT for a single date, in an isolated context.
    async fn check_date(
        &self,
        page: &TrackedPage,
        session_blob: Option<&str>,
    ) -> Result<Snapshot, MonitorError> {
        let mut ctx = self.renderer.new_context().await.map_err(|e| {
            MonitorError::Navigation {
                url: page.url.clone(),
                reason: format!("no browsing context: {e}"),
            }
        })?;

        let result = self.check_date_in(ctx.as_mut(), page, session_blob).await;
        let _ = ctx.close().await;
        result
    }

    async fn check_date_in(
        &self,
        ctx: &mut dyn RenderContext,
        page: &TrackedPage,
        session_blob: Option<&str>,
    ) -> Result<Snapshot, MonitorError> {
        if let Some(blob) = session_blob {
            if let Err(e) = ctx.restore_session(blob).await {
                warn!(error = %e, "session restore failed for date context");
            }
        }

        ctx.navigate(&page.url, self.cfg.timeout_ms)
            .await
            .map_err(|e| navigation_error(&page.url, self.cfg.timeout_ms, e))?;
        ctx.wait_for_idle(self.cfg.timeout_ms)
            .await
            .map_err(|e| navigation_error(&page.url, self.cfg.timeout_ms, e))?;

        let html = ctx.html().await.map_err(|e| MonitorError::Navigation {
            url: page.url.clone(),
            reason: format!("markup capture failed: {e}"),
        })?;

        let snapshot = self.extractor.extract(&html, &self.cfg);

        if !snapshot.available {
            // Best-effort debugging aid for extraction misses.
            self.artifacts
                .capture(&page.date.to_string(), &*ctx)
                .await;
        }

        Ok(snapshot)
    }

    /// REPORT — send the mode-appropriate message. Delivery failures are
    /// logged only; all checks are already persisted.
    async fn send_report(&self, report: &mut RunReport) {
        let message = if self.cfg.summary_only {
            Some(report::summary_message(&report.outcomes))
        } else if !report.events.is_empty() {
            Some(report::change_message(&report.events))
        } else if self.cfg.heartbeat_on_no_change {
            Some((
                report::heartbeat_message(report.window.len(), report.errors.len()),
                Vec::new(),
            ))
        } else {
            None
        };

        let Some((text, blocks)) = message else {
            info!("no changes and heartbeat disabled; staying silent");
            return;
        };

        let blocks = if blocks.is_empty() { None } else { Some(blocks) };
        match self.notifier.send(&text, blocks).await {
            Ok(()) => {
                report.notified = true;
                info!("notification delivered");
            }
            Err(e) => warn!(error = %e, "notification delivery failed"),
        }
    }
}

fn navigation_error(url: &str, timeout_ms: u64, e: anyhow::Error) -> MonitorError {
    let reason = e.to_string();
    if reason.contains("timed out") || reason.contains("settle") {
        MonitorError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms,
        }
    } else {
        MonitorError::Navigation {
            url: url.to_string(),
            reason,
        }
    }
}
