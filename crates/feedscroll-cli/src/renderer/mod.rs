//! Browser engine plumbing.
//!
//! Locates a Chromium binary and describes how to launch it. The session
//! type that drives a page lives in [`chromium`].

pub mod chromium;

use std::path::PathBuf;

/// How to launch the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserOptions {
    /// Run without a visible window.
    pub headless: bool,
    /// Explicit Chromium binary; discovered with [`find_chromium`] when unset.
    pub executable: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            executable: None,
            window_width: 1280,
            window_height: 2000,
        }
    }
}

/// Find the Chromium binary path.
pub fn find_chromium() -> Option<PathBuf> {
    // 1. FEEDSCROLL_CHROMIUM_PATH env
    if let Ok(p) = std::env::var("FEEDSCROLL_CHROMIUM_PATH") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
        tracing::warn!("FEEDSCROLL_CHROMIUM_PATH points at a missing file: {p}");
    }

    // 2. System PATH
    for name in [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ] {
        if let Ok(path) = which::which(name) {
            return Some(path);
        }
    }

    // 3. Common macOS location
    if cfg!(target_os = "macos") {
        let common = PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome");
        if common.exists() {
            return Some(common);
        }
    }

    None
}
