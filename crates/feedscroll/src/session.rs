//! The browser session seam and its scoped release guard.

use async_trait::async_trait;

use crate::types::SessionError;

/// A live browser tab positioned on the page to extract from.
///
/// The extractor is the only user of the session for the duration of a run:
/// it scrolls and reads markup, nothing else.
#[async_trait]
pub trait FeedSession: Send {
    /// Scroll the page vertically by `pixels`.
    async fn scroll_by(&mut self, pixels: i64) -> Result<(), SessionError>;
    /// Current rendered markup of the whole page.
    async fn current_markup(&mut self) -> Result<String, SessionError>;
    /// Tear down the session and release the browser.
    async fn close(self: Box<Self>) -> Result<(), SessionError>;
}

/// Owns a session for the length of a run and guarantees its release.
///
/// [`release`](Self::release) performs an orderly close. If the guard is
/// dropped without it (the run was cancelled or panicked) the session is
/// dropped in place, which must release its resources on its own.
pub struct SessionGuard {
    session: Option<Box<dyn FeedSession>>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn FeedSession>) -> Self {
        Self {
            session: Some(session),
        }
    }

    /// Borrow the session. Fails once the guard has been released.
    pub fn session(&mut self) -> Result<&mut (dyn FeedSession + 'static), SessionError> {
        self.session.as_deref_mut().ok_or(SessionError::Closed)
    }

    pub fn is_released(&self) -> bool {
        self.session.is_none()
    }

    /// Close the session. Idempotent; close failures are logged, not returned.
    pub async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!("session close failed: {e}");
            } else {
                tracing::debug!("session closed");
            }
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if !self.is_released() {
            tracing::warn!("session dropped without orderly close");
        }
    }
}
