//! feedscroll command-line front end.
//!
//! Loads configuration, provisions a signed-in Chromium session on the
//! target profile, runs the core extractor on it and writes the result
//! table.

pub mod config;
pub mod login;
pub mod output;
pub mod renderer;
pub mod scrape_cmd;

pub use config::{Config, ConfigError, Credentials, LoginOptions, OutputFormat, ScrapeArgs};
