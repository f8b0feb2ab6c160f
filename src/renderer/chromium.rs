//! Chromium-based renderer using chromiumoxide.

use super::{NavigationResult, RenderContext, Renderer};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::page::{Page, ScreenshotParams};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. DROPWATCH_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("DROPWATCH_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    // 2. ~/.dropwatch/chromium/
    if let Some(home) = dirs::home_dir() {
        let candidates = if cfg!(target_os = "macos") {
            vec![
                home.join(".dropwatch/chromium/chrome-mac-arm64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".dropwatch/chromium/chrome-mac-x64/Google Chrome for Testing.app/Contents/MacOS/Google Chrome for Testing"),
                home.join(".dropwatch/chromium/chrome"),
            ]
        } else {
            vec![
                home.join(".dropwatch/chromium/chrome-linux64/chrome"),
                home.join(".dropwatch/chromium/chrome"),
            ]
        };
        for c in candidates {
            if c.exists() {
                return Some(c);
            }
        }
    }

    // 3. System PATH — prefer an installed Chrome, fall back to Chromium
    if let Ok(path) = which::which("google-chrome") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium") {
        return Some(path);
    }
    if let Ok(path) = which::which("chromium-browser") {
        return Some(path);
    }

    // 4. Common macOS locations
    if cfg!(target_os = "macos") {
        let common =
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}

/// Chromium-based renderer.
pub struct ChromiumRenderer {
    browser: Browser,
}

impl ChromiumRenderer {
    /// Launch a Chromium instance, headless unless configured otherwise.
    pub async fn new(headless: bool) -> Result<Self> {
        let chrome_path = find_chromium()
            .context("Chromium not found. Install Chrome or set DROPWATCH_CHROMIUM_PATH.")?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-background-networking");
        if headless {
            builder = builder.arg("--headless=new");
        } else {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch Chromium")?;

        // Spawn the handler task
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                let _ = event;
            }
        });

        Ok(Self { browser })
    }
}

#[async_trait]
impl Renderer for ChromiumRenderer {
    async fn new_context(&self) -> Result<Box<dyn RenderContext>> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .context("failed to create new page")?;

        Ok(Box::new(ChromiumContext { page }))
    }

    async fn shutdown(&self) -> Result<()> {
        // Browser is dropped when ChromiumRenderer is dropped
        Ok(())
    }
}

/// A single Chromium page context.
pub struct ChromiumContext {
    page: Page,
}

impl ChromiumContext {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: &str) -> Result<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("JS evaluation failed")?;
        result
            .into_value()
            .map_err(|e| anyhow::anyhow!("failed to convert JS result: {e:?}"))
    }
}

#[async_trait]
impl RenderContext for ChromiumContext {
    async fn navigate(&mut self, url: &str, timeout_ms: u64) -> Result<NavigationResult> {
        let start = Instant::now();

        let result = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            self.page.goto(url),
        )
        .await;

        let load_time_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(Ok(_response)) => {
                let _ = self.page.wait_for_navigation().await;

                let final_url = self
                    .page
                    .url()
                    .await
                    .unwrap_or_default()
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| url.to_string());

                Ok(NavigationResult {
                    final_url,
                    load_time_ms,
                })
            }
            Ok(Err(e)) => bail!("navigation failed: {e}"),
            Err(_) => bail!("navigation timed out after {timeout_ms}ms"),
        }
    }

    async fn wait_for_idle(&mut self, timeout_ms: u64) -> Result<()> {
        // chromiumoxide has no first-class network-idle wait. Poll for load
        // completion, then give the client-side router a short settle period.
        let deadline = Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            let state: String = self
                .eval("document.readyState")
                .await
                .unwrap_or_else(|_| "loading".to_string());
            if state == "complete" {
                break;
            }
            if Instant::now() >= deadline {
                bail!("page did not settle within {timeout_ms}ms");
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let settle = Duration::from_millis(700)
            .min(deadline.saturating_duration_since(Instant::now()));
        tokio::time::sleep(settle).await;
        Ok(())
    }

    async fn count(&self, selector: &str) -> Result<usize> {
        let script = format!(
            "document.querySelectorAll('{}').length",
            sanitize_js_string(selector)
        );
        self.eval(&script).await
    }

    async fn inner_text(&self, selector: &str, timeout_ms: u64) -> Result<Option<String>> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                return el ? el.innerText : null;
            }})()"#,
            sanitize_js_string(selector)
        );
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.eval(&script)).await {
            Ok(value) => value,
            Err(_) => bail!("inner_text timed out after {timeout_ms}ms"),
        }
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                return el ? el.getAttribute('{}') : null;
            }})()"#,
            sanitize_js_string(selector),
            sanitize_js_string(name)
        );
        self.eval(&script).await
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (!el) return false;
                el.focus();
                el.value = '{}';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return true;
            }})()"#,
            sanitize_js_string(selector),
            sanitize_js_string(value)
        );
        self.eval(&script).await
    }

    async fn click(&mut self, selector: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const el = document.querySelector('{}');
                if (!el) return false;
                el.click();
                return true;
            }})()"#,
            sanitize_js_string(selector)
        );
        self.eval(&script).await
    }

    async fn click_labeled(&mut self, label: &str) -> Result<bool> {
        let script = format!(
            r#"(() => {{
                const label = '{}'.toLowerCase();
                const controls = document.querySelectorAll(
                    'button, [role=button], input[type=submit]');
                for (const el of controls) {{
                    const text = (el.innerText || el.value || '').toLowerCase();
                    if (text.includes(label)) {{ el.click(); return true; }}
                }}
                return false;
            }})()"#,
            sanitize_js_string(label)
        );
        self.eval(&script).await
    }

    async fn press_enter(&mut self) -> Result<()> {
        // Default-key activation: submit the focused element's form if there
        // is one, else synthesize an Enter keydown on it.
        let script = r#"(() => {
            const el = document.activeElement;
            if (!el) return false;
            if (el.form && el.form.requestSubmit) { el.form.requestSubmit(); return true; }
            el.dispatchEvent(new KeyboardEvent('keydown', { key: 'Enter', bubbles: true }));
            el.dispatchEvent(new KeyboardEvent('keyup', { key: 'Enter', bubbles: true }));
            return true;
        })()"#;
        let _: bool = self.eval(script).await?;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        self.eval("document.documentElement.outerHTML").await
    }

    async fn url(&self) -> Result<String> {
        let url = self
            .page
            .url()
            .await
            .context("failed to get URL")?
            .map(|u| u.to_string())
            .unwrap_or_default();
        Ok(url)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
            .context("failed to capture screenshot")
    }

    async fn save_session(&self) -> Result<String> {
        let cookies = self
            .page
            .get_cookies()
            .await
            .context("failed to read cookies")?;
        serde_json::to_string(&cookies).context("failed to serialize session")
    }

    async fn restore_session(&mut self, blob: &str) -> Result<()> {
        // CDP Cookie records deserialize into CookieParam: the param shape
        // is a subset of the cookie shape and extra fields are ignored.
        let cookies: Vec<CookieParam> =
            serde_json::from_str(blob).context("failed to parse session blob")?;
        self.page
            .set_cookies(cookies)
            .await
            .context("failed to restore cookies")?;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let _ = self.page.close().await;
        Ok(())
    }
}

/// Sanitize a string for safe injection into a JavaScript string literal.
///
/// Escapes all characters that could break out of a JS string context:
/// backslashes, quotes, backticks, newlines, and script-tag brackets.
pub(crate) fn sanitize_js_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 8);
    for ch in s.chars() {
        match ch {
            '\\' => result.push_str("\\\\"),
            '\'' => result.push_str("\\'"),
            '"' => result.push_str("\\\""),
            '`' => result.push_str("\\`"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\0' => {}
            '<' => result.push_str("\\x3c"),
            '>' => result.push_str("\\x3e"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_basic() {
        assert_eq!(sanitize_js_string("input[type=email]"), "input[type=email]");
        assert_eq!(sanitize_js_string("it's"), "it\\'s");
        assert_eq!(sanitize_js_string("a\"b"), "a\\\"b");
    }

    #[test]
    fn test_sanitize_script_breakout() {
        let malicious = r#"</script><script>alert(1)</script>"#;
        let sanitized = sanitize_js_string(malicious);
        assert!(!sanitized.contains("</script>"));
    }

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_chromium_navigate_and_query() {
        let renderer = ChromiumRenderer::new(true)
            .await
            .expect("failed to create renderer");
        let mut ctx = renderer
            .new_context()
            .await
            .expect("failed to create context");

        ctx.navigate("data:text/html,<h1>Hello</h1><p>World</p>", 10_000)
            .await
            .expect("navigation failed");

        assert_eq!(ctx.count("h1").await.unwrap(), 1);
        assert_eq!(
            ctx.inner_text("h1", 2_000).await.unwrap().as_deref(),
            Some("Hello")
        );

        let html = ctx.html().await.expect("html failed");
        assert!(html.contains("<h1>Hello</h1>"));

        ctx.close().await.expect("close failed");
        renderer.shutdown().await.expect("shutdown failed");
    }
}
