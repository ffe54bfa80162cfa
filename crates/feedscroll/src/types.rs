//! Core data types for extracted posts and extraction settings.

use std::time::Duration;

/// Placeholder stored in any scalar field whose source element was absent
/// or could not be read.
pub const UNKNOWN: &str = "Unknown";

/// One extracted post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: String,
    /// Absolute permalink. Unique within an [`Accumulator`](crate::Accumulator).
    pub url: String,
    pub created_at: String,
    pub text: String,
    /// Raw display text, e.g. "1.2K".
    pub likes: String,
    pub retweets: String,
    pub replies: String,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub links: Vec<String>,
}

impl Record {
    /// A record for `url` with every other field at its fallback value.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            id: UNKNOWN.to_string(),
            url: url.into(),
            created_at: UNKNOWN.to_string(),
            text: UNKNOWN.to_string(),
            likes: UNKNOWN.to_string(),
            retweets: UNKNOWN.to_string(),
            replies: UNKNOWN.to_string(),
            hashtags: Vec::new(),
            mentions: Vec::new(),
            links: Vec::new(),
        }
    }
}

/// Markup markers that tie the generic extractor to one site's page layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    /// Site origin used to resolve relative permalinks.
    pub origin: String,
    /// Tag name of one post container.
    pub post_tag: String,
    /// Substring identifying a post permalink inside an `href`.
    pub permalink_marker: String,
    /// Attribute on the post container carrying the post identifier.
    pub id_attribute: String,
    /// `data-testid` values of the engagement counters.
    pub like_test_id: String,
    pub retweet_test_id: String,
    pub reply_test_id: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            origin: "https://x.com".to_string(),
            post_tag: "article".to_string(),
            permalink_marker: "/status/".to_string(),
            id_attribute: "data-tweet-id".to_string(),
            like_test_id: "like".to_string(),
            retweet_test_id: "retweet".to_string(),
            reply_test_id: "reply".to_string(),
        }
    }
}

impl SiteProfile {
    /// The default profile with a different origin.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }
}

/// Tuning for the scroll-and-extract loop.
#[derive(Debug, Clone)]
pub struct ScrollSettings {
    /// Stop after this long without the accumulator growing.
    pub stall_timeout: Duration,
    /// Vertical pixel offset per scroll.
    pub scroll_step: i64,
    /// Fixed wait after each scroll before the markup is read.
    pub scroll_pause: Duration,
    pub site: SiteProfile,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            stall_timeout: Duration::from_secs(60),
            scroll_step: 3000,
            scroll_pause: Duration::from_secs(5),
            site: SiteProfile::default(),
        }
    }
}

/// Failures of the browser session. Always fatal to an extraction run.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Script execution failed: {0}")]
    Script(String),

    #[error("Session unresponsive: {0}")]
    Unresponsive(String),

    #[error("Session already closed")]
    Closed,
}

/// Why a single field could not be read from a fragment.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("no {0} found in fragment")]
    Missing(&'static str),

    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("cannot resolve '{href}' against '{origin}': {reason}")]
    InvalidUrl {
        href: String,
        origin: String,
        reason: String,
    },
}

impl FieldError {
    /// Missing source elements are the ordinary case and not worth a warning.
    pub fn is_missing(&self) -> bool {
        matches!(self, FieldError::Missing(_))
    }
}

/// Errors that end an extraction run.
#[derive(thiserror::Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Convenience result type.
pub type ExtractResult<T> = Result<T, ExtractError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_with_url_defaults() {
        let r = Record::with_url("https://x.com/a/status/1");
        assert_eq!(r.url, "https://x.com/a/status/1");
        assert_eq!(r.id, UNKNOWN);
        assert_eq!(r.likes, UNKNOWN);
        assert!(r.hashtags.is_empty());
        assert!(r.links.is_empty());
    }

    #[test]
    fn test_scroll_settings_defaults() {
        let s = ScrollSettings::default();
        assert_eq!(s.stall_timeout, Duration::from_secs(60));
        assert_eq!(s.scroll_step, 3000);
        assert_eq!(s.scroll_pause, Duration::from_secs(5));
        assert_eq!(s.site.post_tag, "article");
    }

    #[test]
    fn test_site_profile_with_origin() {
        let p = SiteProfile::with_origin("https://site");
        assert_eq!(p.origin, "https://site");
        assert_eq!(p.permalink_marker, "/status/");
    }

    #[test]
    fn test_session_error_converts() {
        let err: ExtractError = SessionError::Closed.into();
        assert_eq!(err.to_string(), "Session already closed");
    }
}
