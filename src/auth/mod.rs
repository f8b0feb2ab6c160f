//! Session authentication.
//!
//! Logs into the target app's sign-in surface, tolerating both one-step
//! forms and two-step flows where the password field is only revealed after
//! the username is submitted. The flow is an explicit state machine so
//! failures attribute to a phase instead of a swallowed exception:
//!
//! `AwaitingUsername → AwaitingPassword → Submitted → Verified`
//!
//! Authentication failure is the one fatal condition for a run.

use crate::artifacts::ArtifactSink;
use crate::config::Config;
use crate::error::MonitorError;
use crate::renderer::RenderContext;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Controls that indicate a username/email entry.
const USERNAME_SELECTORS: &[&str] = &[
    "input[type=email]",
    "input[name=email]",
    "input[name=username]",
];

/// Controls that indicate a password entry.
const PASSWORD_SELECTORS: &[&str] = &["input[type=password]", "input[name=password]"];

/// Generic submit controls, tried after labeled advance buttons.
const SUBMIT_SELECTOR: &str = "button[type=submit], input[type=submit]";

/// Labels of controls that advance a multi-step form.
const ADVANCE_LABELS: &[&str] = &["continue", "next", "sign in", "log in"];

/// How long to wait for a two-step flow to reveal its password field.
const PASSWORD_REVEAL_WAIT: Duration = Duration::from_millis(4_000);

/// Phases of the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPhase {
    AwaitingUsername,
    AwaitingPassword,
    Submitted,
    Verified,
}

/// Performs login and session persistence against a browsing context.
pub struct Authenticator<'a> {
    cfg: &'a Config,
    artifacts: &'a ArtifactSink,
}

impl<'a> Authenticator<'a> {
    pub fn new(cfg: &'a Config, artifacts: &'a ArtifactSink) -> Self {
        Self { cfg, artifacts }
    }

    /// Path of the serialized session blob.
    pub fn session_path(cfg: &Config) -> PathBuf {
        cfg.state_dir.join("session.json")
    }

    /// Fast-path: restore a session serialized by a previous run, if any.
    /// Restoration problems only cost us the fast-path, never the run.
    pub async fn restore_previous_session(&self, ctx: &mut dyn RenderContext) {
        let path = Self::session_path(self.cfg);
        let Ok(blob) = std::fs::read_to_string(&path) else {
            return;
        };
        match ctx.restore_session(&blob).await {
            Ok(()) => debug!("restored serialized session from previous run"),
            Err(e) => warn!(error = %e, "stale session blob ignored"),
        }
    }

    /// Ensure the context is authenticated.
    ///
    /// A page with no login-indicating controls means the existing session
    /// is valid and the whole step is a no-op.
    pub async fn login(&self, ctx: &mut dyn RenderContext) -> Result<(), MonitorError> {
        let signin = self.cfg.signin_url();
        ctx.navigate(signin, self.cfg.timeout_ms)
            .await
            .map_err(|e| MonitorError::Authentication(format!("cannot reach sign-in page: {e}")))?;
        let _ = ctx.wait_for_idle(self.cfg.timeout_ms).await;

        if !login_controls_present(ctx).await {
            debug!("no login controls present; existing session accepted");
            return self.finish(ctx).await;
        }

        let mut phase = LoginPhase::AwaitingUsername;
        info!(?phase, "login form detected, signing in");

        if let Some(sel) = first_present(ctx, USERNAME_SELECTORS).await {
            let _ = ctx.fill(sel, &self.cfg.email).await;
            self.advance(ctx).await;
        }
        phase = LoginPhase::AwaitingPassword;
        debug!(?phase, "username submitted");

        // A two-step form reveals the password field only after the first
        // advance; a one-step form has it on the page already. One bounded
        // wait covers both without a separate code path.
        let password_field = self.await_password_field(ctx).await;
        if let Some(sel) = password_field {
            let _ = ctx.fill(sel, &self.cfg.password).await;
            self.advance(ctx).await;
        }
        phase = LoginPhase::Submitted;
        debug!(?phase, "credentials submitted");
        let _ = ctx.wait_for_idle(self.cfg.timeout_ms).await;

        // Verify against the home surface: any remaining login control
        // means the credentials did not take.
        ctx.navigate(&self.cfg.base_url, self.cfg.timeout_ms)
            .await
            .map_err(|e| {
                MonitorError::Authentication(format!("cannot reach app after login: {e}"))
            })?;
        let _ = ctx.wait_for_idle(self.cfg.timeout_ms).await;

        if login_controls_present(ctx).await {
            self.artifacts.capture("auth-failure", ctx).await;
            return Err(MonitorError::Authentication(
                "login controls still present after sign-in attempt".into(),
            ));
        }

        phase = LoginPhase::Verified;
        info!(?phase, "login verified");
        self.finish(ctx).await
    }

    /// Advance the flow: labeled continue/next control, else a generic
    /// submit control, else default-key activation.
    async fn advance(&self, ctx: &mut dyn RenderContext) {
        for label in ADVANCE_LABELS {
            if ctx.click_labeled(label).await.unwrap_or(false) {
                debug!(label, "advanced via labeled control");
                return;
            }
        }
        if ctx.click(SUBMIT_SELECTOR).await.unwrap_or(false) {
            debug!("advanced via generic submit control");
            return;
        }
        if let Err(e) = ctx.press_enter().await {
            warn!(error = %e, "default-key activation failed");
        }
    }

    /// Bounded wait for a password control to be present.
    async fn await_password_field(&self, ctx: &mut dyn RenderContext) -> Option<&'static str> {
        let deadline = std::time::Instant::now()
            + PASSWORD_REVEAL_WAIT.min(Duration::from_millis(self.cfg.timeout_ms));
        loop {
            if let Some(sel) = first_present(ctx, PASSWORD_SELECTORS).await {
                return Some(sel);
            }
            if std::time::Instant::now() >= deadline {
                return None;
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    /// Serialize the session for reuse; failures only cost the fast-path.
    async fn finish(&self, ctx: &mut dyn RenderContext) -> Result<(), MonitorError> {
        match ctx.save_session().await {
            Ok(blob) => {
                let path = Self::session_path(self.cfg);
                if let Some(parent) = path.parent() {
                    let _ = std::fs::create_dir_all(parent);
                }
                if let Err(e) = std::fs::write(&path, blob) {
                    warn!(error = %e, "could not persist session blob");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize session"),
        }
        Ok(())
    }
}

/// Whether any login-indicating control is on the page.
async fn login_controls_present(ctx: &dyn RenderContext) -> bool {
    first_present(ctx, USERNAME_SELECTORS).await.is_some()
        || first_present(ctx, PASSWORD_SELECTORS).await.is_some()
}

async fn first_present<'s>(
    ctx: &dyn RenderContext,
    selectors: &[&'s str],
) -> Option<&'s str> {
    for sel in selectors {
        if ctx.count(sel).await.unwrap_or(0) > 0 {
            return Some(sel);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::NavigationResult;
    use anyhow::Result;
    use async_trait::async_trait;

    /// Scripted sign-in surface. Models a two-step flow: the password field
    /// only exists after the username has been advanced, and the login form
    /// disappears once valid credentials are submitted.
    struct FakeSignin {
        two_step: bool,
        username_filled: Option<String>,
        password_filled: Option<String>,
        advances: usize,
        logged_in: bool,
    }

    impl FakeSignin {
        fn new(two_step: bool) -> Self {
            Self {
                two_step,
                username_filled: None,
                password_filled: None,
                advances: 0,
                logged_in: false,
            }
        }

        fn password_visible(&self) -> bool {
            !self.two_step || self.advances >= 1
        }
    }

    #[async_trait]
    impl RenderContext for FakeSignin {
        async fn navigate(&mut self, url: &str, _timeout_ms: u64) -> Result<NavigationResult> {
            Ok(NavigationResult {
                final_url: url.to_string(),
                load_time_ms: 1,
            })
        }
        async fn wait_for_idle(&mut self, _timeout_ms: u64) -> Result<()> {
            Ok(())
        }
        async fn count(&self, selector: &str) -> Result<usize> {
            if self.logged_in {
                return Ok(0);
            }
            if selector.contains("password") {
                return Ok(usize::from(self.password_visible()));
            }
            if selector.contains("email") || selector.contains("username") {
                return Ok(1);
            }
            Ok(0)
        }
        async fn inner_text(&self, _selector: &str, _timeout_ms: u64) -> Result<Option<String>> {
            Ok(None)
        }
        async fn attribute(&self, _selector: &str, _name: &str) -> Result<Option<String>> {
            Ok(None)
        }
        async fn fill(&mut self, selector: &str, value: &str) -> Result<bool> {
            if selector.contains("password") {
                self.password_filled = Some(value.to_string());
            } else {
                self.username_filled = Some(value.to_string());
            }
            Ok(true)
        }
        async fn click(&mut self, _selector: &str) -> Result<bool> {
            Ok(false)
        }
        async fn click_labeled(&mut self, label: &str) -> Result<bool> {
            if label == "continue" {
                self.advances += 1;
                if self.password_filled.is_some() {
                    self.logged_in = true;
                }
                return Ok(true);
            }
            Ok(false)
        }
        async fn press_enter(&mut self) -> Result<()> {
            Ok(())
        }
        async fn html(&self) -> Result<String> {
            Ok("<html></html>".into())
        }
        async fn url(&self) -> Result<String> {
            Ok("https://x.test/app".into())
        }
        async fn screenshot(&self) -> Result<Vec<u8>> {
            Ok(vec![0x89, 0x50])
        }
        async fn save_session(&self) -> Result<String> {
            Ok("[]".into())
        }
        async fn restore_session(&mut self, _blob: &str) -> Result<()> {
            Ok(())
        }
        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    fn config(dir: &std::path::Path) -> Config {
        let mut cfg = crate::extract::test_config();
        cfg.state_dir = dir.join("state");
        cfg.artifacts_dir = dir.join("artifacts");
        cfg
    }

    #[tokio::test]
    async fn test_one_step_login_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let sink = ArtifactSink::new(&cfg.artifacts_dir);
        let auth = Authenticator::new(&cfg, &sink);

        let mut ctx = FakeSignin::new(false);
        auth.login(&mut ctx).await.expect("login should succeed");
        assert_eq!(ctx.username_filled.as_deref(), Some("user@example.com"));
        assert_eq!(ctx.password_filled.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_two_step_login_succeeds_without_special_config() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let sink = ArtifactSink::new(&cfg.artifacts_dir);
        let auth = Authenticator::new(&cfg, &sink);

        let mut ctx = FakeSignin::new(true);
        auth.login(&mut ctx).await.expect("two-step login should succeed");
        assert!(ctx.advances >= 2, "username and password each advance once");
        assert_eq!(ctx.password_filled.as_deref(), Some("secret"));
    }

    #[tokio::test]
    async fn test_login_persists_session_blob() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let sink = ArtifactSink::new(&cfg.artifacts_dir);
        let auth = Authenticator::new(&cfg, &sink);

        let mut ctx = FakeSignin::new(false);
        auth.login(&mut ctx).await.unwrap();
        assert!(Authenticator::session_path(&cfg).exists());
    }

    #[tokio::test]
    async fn test_failed_login_is_fatal_and_captures_artifacts() {
        struct NeverLoggedIn(FakeSignin);

        #[async_trait]
        impl RenderContext for NeverLoggedIn {
            async fn navigate(&mut self, url: &str, t: u64) -> Result<NavigationResult> {
                self.0.navigate(url, t).await
            }
            async fn wait_for_idle(&mut self, t: u64) -> Result<()> {
                self.0.wait_for_idle(t).await
            }
            async fn count(&self, selector: &str) -> Result<usize> {
                // Login controls never go away: wrong password.
                if selector.contains("email") {
                    return Ok(1);
                }
                self.0.count(selector).await
            }
            async fn inner_text(&self, s: &str, t: u64) -> Result<Option<String>> {
                self.0.inner_text(s, t).await
            }
            async fn attribute(&self, s: &str, n: &str) -> Result<Option<String>> {
                self.0.attribute(s, n).await
            }
            async fn fill(&mut self, s: &str, v: &str) -> Result<bool> {
                self.0.fill(s, v).await
            }
            async fn click(&mut self, s: &str) -> Result<bool> {
                self.0.click(s).await
            }
            async fn click_labeled(&mut self, l: &str) -> Result<bool> {
                self.0.click_labeled(l).await
            }
            async fn press_enter(&mut self) -> Result<()> {
                self.0.press_enter().await
            }
            async fn html(&self) -> Result<String> {
                self.0.html().await
            }
            async fn url(&self) -> Result<String> {
                self.0.url().await
            }
            async fn screenshot(&self) -> Result<Vec<u8>> {
                self.0.screenshot().await
            }
            async fn save_session(&self) -> Result<String> {
                self.0.save_session().await
            }
            async fn restore_session(&mut self, b: &str) -> Result<()> {
                self.0.restore_session(b).await
            }
            async fn close(self: Box<Self>) -> Result<()> {
                Ok(())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path());
        let sink = ArtifactSink::new(&cfg.artifacts_dir);
        let auth = Authenticator::new(&cfg, &sink);

        let mut ctx = NeverLoggedIn(FakeSignin::new(false));
        let err = auth.login(&mut ctx).await.expect_err("login must fail");
        assert!(err.is_fatal());
        assert!(cfg.artifacts_dir.join("page-auth-failure.html").exists());
    }
}
