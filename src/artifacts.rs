//! Diagnostic artifact persistence.
//!
//! Saves rendered markup and a full-page screenshot for a label (a date, or
//! a failure tag). Strictly best-effort: an artifact that cannot be written
//! is logged and forgotten, never an error for the caller.

use crate::renderer::RenderContext;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Writes page markup and screenshots into the artifacts directory.
pub struct ArtifactSink {
    dir: PathBuf,
}

impl ArtifactSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Capture both markup and screenshot for the current page.
    pub async fn capture(&self, label: &str, ctx: &dyn RenderContext) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "cannot create artifacts dir");
            return;
        }

        match ctx.html().await {
            Ok(html) => self.write(&format!("page-{label}.html"), html.as_bytes()),
            Err(e) => warn!(label, error = %e, "markup capture failed"),
        }
        match ctx.screenshot().await {
            Ok(png) => self.write(&format!("screenshot-{label}.png"), &png),
            Err(e) => warn!(label, error = %e, "screenshot capture failed"),
        }
    }

    fn write(&self, name: &str, data: &[u8]) {
        let path = self.dir.join(sanitize_file_name(name));
        match std::fs::write(&path, data) {
            Ok(()) => debug!(path = %path.display(), "artifact saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "artifact write failed"),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Keep artifact names filesystem-safe regardless of the label's origin.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
