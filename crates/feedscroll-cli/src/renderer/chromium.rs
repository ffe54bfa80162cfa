//! Chromium-backed feed session using chromiumoxide.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::js::EvaluationResult;
use chromiumoxide::page::Page;
use feedscroll::{FeedSession, SessionError};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::warn;

use super::{find_chromium, BrowserOptions};

/// Upper bound on any single CDP round trip before the browser counts as hung.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on each shutdown step before the process is killed.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between element lookups while waiting for one to appear.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// One Chromium process with a single page.
///
/// Dropping the session aborts the CDP handler task and drops the browser,
/// which kills the child process. [`FeedSession::close`] does the same in
/// an orderly way.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromiumSession {
    /// Launch Chromium and open a blank page.
    pub async fn launch(opts: &BrowserOptions) -> Result<Self, SessionError> {
        let executable = opts
            .executable
            .clone()
            .or_else(find_chromium)
            .ok_or_else(|| {
                SessionError::Launch(
                    "Chromium not found. Install Chrome or set FEEDSCROLL_CHROMIUM_PATH".into(),
                )
            })?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .window_size(opts.window_width, opts.window_height)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions");
        if !opts.headless {
            builder = builder.with_head();
        }
        let config = builder
            .build()
            .map_err(|e| SessionError::Launch(format!("failed to build browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(format!("failed to launch Chromium: {e}")))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("chromium handler event error: {e}");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(SessionError::Launch(format!("failed to open page: {e}")));
            }
        };

        tracing::debug!(headless = opts.headless, "chromium launched");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Navigate the page and wait for the load to finish.
    pub async fn goto(&self, url: &str) -> Result<(), SessionError> {
        with_timeout("navigation", self.page.goto(url))
            .await?
            .map_err(|e| SessionError::Navigation(format!("{url}: {e}")))?;
        Ok(())
    }

    /// Poll for an element matching `selector` until `timeout` runs out.
    pub async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Element, SessionError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(el) = self.page.find_element(selector).await {
                return Ok(el);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Navigation(format!(
                    "timed out after {}s waiting for {selector}",
                    timeout.as_secs()
                )));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Evaluate a script and decode its return value.
    pub async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, SessionError> {
        let result = with_timeout("script", self.page.evaluate(script))
            .await?
            .map_err(|e| SessionError::Script(e.to_string()))?;
        decode_evaluation(result)
    }

    /// Click a field, type `text` and press Enter.
    pub async fn submit_field(&self, field: &Element, text: &str) -> Result<(), SessionError> {
        let input = |e: CdpError| SessionError::Script(format!("input failed: {e}"));
        field.click().await.map_err(input)?;
        field.type_str(text).await.map_err(input)?;
        field.press_key("Enter").await.map_err(input)?;
        Ok(())
    }

    /// Current page URL, if any.
    pub async fn current_url(&self) -> Result<Option<String>, SessionError> {
        with_timeout("url", self.page.url())
            .await?
            .map_err(|e| SessionError::Script(e.to_string()))
    }
}

#[async_trait]
impl FeedSession for ChromiumSession {
    async fn scroll_by(&mut self, pixels: i64) -> Result<(), SessionError> {
        with_timeout(
            "scroll",
            self.page.evaluate(format!("window.scrollBy(0, {pixels});")),
        )
        .await?
        .map_err(|e| SessionError::Script(format!("scroll failed: {e}")))?;
        Ok(())
    }

    async fn current_markup(&mut self) -> Result<String, SessionError> {
        self.eval("document.documentElement.outerHTML").await
    }

    async fn close(mut self: Box<Self>) -> Result<(), SessionError> {
        let page = self.page.clone();
        if let Err(e) = with_deadline(CLOSE_TIMEOUT, "page close", page.close()).await {
            warn!("{e}");
        }

        let mut result = with_deadline(CLOSE_TIMEOUT, "browser close", self.browser.close())
            .await
            .and_then(|closed| {
                closed
                    .map(|_| ())
                    .map_err(|e| SessionError::Unresponsive(format!("browser close failed: {e}")))
            });
        if result.is_ok() {
            result = with_deadline(CLOSE_TIMEOUT, "browser exit", self.browser.wait())
                .await
                .map(|_| ());
        }
        if result.is_err() {
            warn!("browser did not shut down cleanly, killing the process");
            if let Some(Err(e)) = self.browser.kill().await {
                warn!("browser kill failed: {e}");
            }
        }

        self.handler_task.abort();
        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

/// Decode a script result. A `null` or `undefined` result decodes like JSON
/// `null`, so `Option<T>` targets read it as `None`.
pub fn decode_evaluation<T>(result: EvaluationResult) -> Result<T, SessionError>
where
    T: DeserializeOwned,
{
    let value = result.value().cloned().unwrap_or(serde_json::Value::Null);
    serde_json::from_value(value)
        .map_err(|e| SessionError::Script(format!("failed to decode script result: {e}")))
}

async fn with_timeout<F, T>(what: &str, fut: F) -> Result<T, SessionError>
where
    F: Future<Output = T>,
{
    with_deadline(COMMAND_TIMEOUT, what, fut).await
}

async fn with_deadline<F, T>(limit: Duration, what: &str, fut: F) -> Result<T, SessionError>
where
    F: Future<Output = T>,
{
    tokio::time::timeout(limit, fut).await.map_err(|_| {
        SessionError::Unresponsive(format!(
            "{what} did not answer within {}s",
            limit.as_secs()
        ))
    })
}
