//! Testing utilities: a scripted in-memory session.
//!
//! Useful for exercising the extractor without a browser. The session
//! replays a list of markup snapshots, one per read, repeating the last one
//! once the script runs out.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::session::FeedSession;
use crate::types::SessionError;

#[derive(Debug, Default)]
struct TrackerState {
    scrolls: Vec<i64>,
    reads: usize,
    closes: usize,
    dropped: bool,
}

/// Shared view of what a [`ScriptedSession`] was asked to do.
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    state: Arc<Mutex<TrackerState>>,
}

impl SessionTracker {
    fn with<R>(&self, f: impl FnOnce(&mut TrackerState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// Scroll offsets received, in order.
    pub fn scrolls(&self) -> Vec<i64> {
        self.with(|s| s.scrolls.clone())
    }

    /// Number of markup reads served.
    pub fn reads(&self) -> usize {
        self.with(|s| s.reads)
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.with(|s| s.closes)
    }

    /// Whether the session has been dropped or closed.
    pub fn dropped(&self) -> bool {
        self.with(|s| s.dropped)
    }

    /// Released by either path.
    pub fn released(&self) -> bool {
        self.with(|s| s.closes > 0 || s.dropped)
    }
}

/// A [`FeedSession`] that replays canned markup.
#[derive(Debug)]
pub struct ScriptedSession {
    snapshots: Vec<String>,
    fail_read_at: Option<usize>,
    fail_close: bool,
    tracker: SessionTracker,
}

impl ScriptedSession {
    pub fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots,
            fail_read_at: None,
            fail_close: false,
            tracker: SessionTracker::default(),
        }
    }

    /// Make the `n`th markup read (0-based) fail as if the browser hung.
    pub fn failing_read_at(mut self, n: usize) -> Self {
        self.fail_read_at = Some(n);
        self
    }

    /// Make `close` report an error (the session still counts as closed).
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub fn tracker(&self) -> SessionTracker {
        self.tracker.clone()
    }
}

#[async_trait]
impl FeedSession for ScriptedSession {
    async fn scroll_by(&mut self, pixels: i64) -> Result<(), SessionError> {
        self.tracker.with(|s| s.scrolls.push(pixels));
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String, SessionError> {
        let n = self.tracker.with(|s| {
            s.reads += 1;
            s.reads - 1
        });
        if self.fail_read_at == Some(n) {
            return Err(SessionError::Unresponsive(format!("scripted failure on read {n}")));
        }
        let idx = n.min(self.snapshots.len().saturating_sub(1));
        Ok(self.snapshots.get(idx).cloned().unwrap_or_default())
    }

    async fn close(self: Box<Self>) -> Result<(), SessionError> {
        self.tracker.with(|s| s.closes += 1);
        if self.fail_close {
            return Err(SessionError::Unresponsive("scripted close failure".into()));
        }
        Ok(())
    }
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.tracker.with(|s| s.dropped = true);
    }
}

/// Markup of a page holding one `<article>` per `(permalink, text)` pair.
pub fn feed_page(posts: &[(&str, &str)]) -> String {
    let mut html = String::from("<html><body><main>");
    for (href, text) in posts {
        html.push_str(&format!(
            r#"<article><a href="{href}"><time datetime="2024-01-01T00:00:00Z">Jan 1</time></a><div lang="en">{text}</div></article>"#
        ));
    }
    html.push_str("</main></body></html>");
    html
}
