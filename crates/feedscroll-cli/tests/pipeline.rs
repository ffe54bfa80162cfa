//! Scrape pipeline tests that need no browser.
//!
//! The Chromium session is replaced by the core crate's scripted session;
//! everything after provisioning runs as in the binary.

use std::collections::HashMap;
use std::time::Duration;

use clap::Parser;
use feedscroll::testing::{feed_page, ScriptedSession};
use feedscroll::{extract_with_stats, TokioClock, COLUMNS};
use feedscroll_cli::output::write_table;
use feedscroll_cli::{Config, ConfigError, Credentials, OutputFormat, ScrapeArgs};

#[derive(Parser)]
struct TestCli {
    #[command(flatten)]
    args: ScrapeArgs,
}

fn config(extra: &[&str]) -> Config {
    let mut argv = vec!["feedscroll", "https://x.com/someone", "--stall-timeout", "10"];
    argv.extend_from_slice(extra);
    let cli = TestCli::try_parse_from(argv).unwrap();
    let creds = Credentials {
        email: "e@example.com".into(),
        username: "someone".into(),
        password: "secret".into(),
    };
    Config::from_args(cli.args, creds).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_scripted_feed_to_table() {
    let cfg = config(&[]);
    let pages = vec![
        feed_page(&[("/someone/status/1", "first #rust")]),
        feed_page(&[("/someone/status/1", "first #rust"), ("/someone/status/2", "second")]),
    ];
    let session = ScriptedSession::new(pages);
    let tracker = session.tracker();

    let out = extract_with_stats(session, &cfg.scroll, TokioClock)
        .await
        .unwrap();

    assert!(tracker.released());
    assert_eq!(out.records.len(), 2);

    let mut buf = Vec::new();
    write_table(&out.records.to_table(), OutputFormat::Table, &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), COLUMNS.join("\t"));
    let row1: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(row1[0], "https://x.com/someone/status/1");
    assert_eq!(row1[1], "2024-01-01T00:00:00Z");
    assert_eq!(row1[2], "first #rust");
    let row2: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(row2[0], "https://x.com/someone/status/2");
    assert!(lines.next().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_configured_timeout_bounds_run() {
    let cfg = config(&["--scroll-pause", "2"]);
    assert_eq!(cfg.scroll.stall_timeout, Duration::from_secs(10));
    let session = ScriptedSession::new(vec![feed_page(&[])]);
    let tracker = session.tracker();

    let start = tokio::time::Instant::now();
    let out = extract_with_stats(session, &cfg.scroll, TokioClock)
        .await
        .unwrap();

    assert!(out.records.is_empty());
    assert!(start.elapsed() >= Duration::from_secs(10));
    assert!(start.elapsed() <= Duration::from_secs(12));
    assert_eq!(tracker.scrolls().len(), 5);
}

#[test]
fn test_missing_credentials_fail_before_browser() {
    let env: HashMap<&str, &str> = [("EMAIL_MAIN", "e@example.com")].into_iter().collect();
    let err = Credentials::from_lookup("MAIN", |k| env.get(k).map(|v| v.to_string())).unwrap_err();
    assert_eq!(err, ConfigError::MissingCredential("USERNAME_MAIN".into()));
    assert_eq!(err.to_string(), "USERNAME_MAIN is not set. Check your .env file");
}
