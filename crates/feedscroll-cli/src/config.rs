//! Configuration loading and resolution.
//!
//! Credentials come from the environment (optionally seeded from a `.env`
//! file), everything else from command-line flags. The result is one
//! explicit [`Config`] handed to the provisioner and the extractor; nothing
//! downstream reads the environment again.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, ValueEnum};
use feedscroll::{ScrollSettings, SiteProfile};
use url::Url;

use crate::renderer::BrowserOptions;

/// Problems with the run configuration. Raised before any browser starts.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set. Check your .env file")]
    MissingCredential(String),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Login credentials for one account.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load `EMAIL_<suffix>`, `USERNAME_<suffix>` and `PASSWORD`.
    ///
    /// A `.env` file in the working directory is read first if present;
    /// variables already set in the process win.
    pub fn from_env(suffix: &str) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(suffix, |key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup.
    pub fn from_lookup<F>(suffix: &str, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: String| -> Result<String, ConfigError> {
            match lookup(&key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => Err(ConfigError::MissingCredential(key)),
            }
        };

        Ok(Self {
            email: required(format!("EMAIL_{suffix}"))?,
            username: required(format!("USERNAME_{suffix}"))?,
            password: required("PASSWORD".to_string())?,
        })
    }
}

/// Timeouts and URLs of the sign-in flow.
#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub login_url: String,
    /// Wait for the first identifier field and the password field.
    pub field_timeout: Duration,
    /// Wait for the optional second identifier prompt.
    pub second_prompt_timeout: Duration,
    /// Fixed wait after submitting the password.
    pub settle: Duration,
    /// Wait for the first post on the target page.
    pub feed_timeout: Duration,
}

impl Default for LoginOptions {
    fn default() -> Self {
        Self {
            login_url: "https://x.com/login".to_string(),
            field_timeout: Duration::from_secs(10),
            second_prompt_timeout: Duration::from_secs(5),
            settle: Duration::from_secs(5),
            feed_timeout: Duration::from_secs(10),
        }
    }
}

/// How the result table is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON array of rows.
    Json,
    /// One JSON object per line.
    Jsonl,
    /// Comma-separated columns with a header row.
    Csv,
    /// Tab-separated columns with a header row.
    Table,
}

/// Flags of the `scrape` subcommand.
#[derive(Debug, Clone, Args)]
pub struct ScrapeArgs {
    /// Profile page to extract posts from.
    pub profile_url: String,

    /// Account suffix selecting EMAIL_<SUFFIX> and USERNAME_<SUFFIX>.
    #[arg(long, default_value = "MAIN")]
    pub account: String,

    /// Seconds without new posts before stopping.
    #[arg(long, default_value = "60")]
    pub stall_timeout: u64,

    /// Pixels scrolled per iteration.
    #[arg(long, default_value = "3000")]
    pub scroll_step: i64,

    /// Seconds to wait after each scroll.
    #[arg(long, default_value = "5")]
    pub scroll_pause: u64,

    /// Output format.
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Write the result here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Run Chromium without a window.
    #[arg(long)]
    pub headless: bool,

    /// Sign-in page.
    #[arg(long, default_value = "https://x.com/login")]
    pub login_url: String,

    /// Site origin used to resolve relative permalinks.
    #[arg(long, default_value = "https://x.com")]
    pub origin: String,
}

/// Everything a scrape run needs.
#[derive(Debug, Clone)]
pub struct Config {
    pub target_url: String,
    pub credentials: Credentials,
    pub browser: BrowserOptions,
    pub login: LoginOptions,
    pub scroll: ScrollSettings,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Combine parsed flags with already-loaded credentials.
    pub fn from_args(args: ScrapeArgs, credentials: Credentials) -> Result<Self, ConfigError> {
        let target_url = parse_http_url(&args.profile_url)?;
        let login_url = parse_http_url(&args.login_url)?;
        let origin = parse_http_url(&args.origin)?;

        if args.scroll_pause == 0 {
            return Err(ConfigError::InvalidValue {
                name: "--scroll-pause",
                reason: "must be at least one second".to_string(),
            });
        }
        if args.scroll_step == 0 {
            return Err(ConfigError::InvalidValue {
                name: "--scroll-step",
                reason: "must not be zero".to_string(),
            });
        }

        Ok(Self {
            target_url,
            credentials,
            browser: BrowserOptions {
                headless: args.headless,
                ..BrowserOptions::default()
            },
            login: LoginOptions {
                login_url,
                ..LoginOptions::default()
            },
            scroll: ScrollSettings {
                stall_timeout: Duration::from_secs(args.stall_timeout),
                scroll_step: args.scroll_step,
                scroll_pause: Duration::from_secs(args.scroll_pause),
                site: SiteProfile::with_origin(origin.trim_end_matches('/')),
            },
            format: args.format,
            output: args.output,
        })
    }
}

fn parse_http_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };
    let url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url.to_string()),
        other => Err(invalid(&format!("unsupported scheme '{other}'"))),
    }
}
