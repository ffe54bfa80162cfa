//! `feedscroll scrape <url>`: extract a profile's posts.

use anyhow::{Context, Result};
use feedscroll::{extract_with_stats, Extraction, TokioClock};
use tracing::info;

use crate::config::{Config, Credentials, ScrapeArgs};
use crate::{login, output};

/// Run the scrape command.
pub async fn run(args: ScrapeArgs, quiet: bool) -> Result<()> {
    let credentials = Credentials::from_env(&args.account)?;
    let config = Config::from_args(args, credentials)?;

    info!(
        target_url = %config.target_url,
        stall_timeout_s = config.scroll.stall_timeout.as_secs(),
        scroll_step = config.scroll.scroll_step,
        scroll_pause_s = config.scroll.scroll_pause.as_secs(),
        "starting scrape"
    );

    let session = login::provision(&config)
        .await
        .context("failed to prepare browser session")?;
    let extraction = extract_with_stats(session, &config.scroll, TokioClock)
        .await
        .context("extraction aborted")?;

    output::emit(
        &extraction.records.to_table(),
        config.format,
        config.output.as_deref(),
    )?;

    if !quiet {
        eprintln!("{}", summary(&extraction));
    }
    Ok(())
}

/// One-line human summary of a finished run.
pub fn summary(extraction: &Extraction) -> String {
    let stats = &extraction.stats;
    let mut line = format!(
        "{} posts extracted in {} scrolls",
        extraction.records.len(),
        stats.iterations
    );
    if stats.without_permalink > 0 {
        line.push_str(&format!(
            ", {} fragments without permalink skipped",
            stats.without_permalink
        ));
    }
    if stats.field_errors > 0 {
        line.push_str(&format!(", {} field errors", stats.field_errors));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use feedscroll::{Accumulator, ExtractStats, Record};
    use std::time::Duration;

    #[test]
    fn test_summary_mentions_skips_only_when_present() {
        let mut records = Accumulator::new();
        records.merge(vec![Record::with_url("u1"), Record::with_url("u2")]);
        let mut extraction = Extraction {
            records,
            stats: ExtractStats {
                iterations: 7,
                ..ExtractStats::default()
            },
            idle: Duration::from_secs(60),
        };
        assert_eq!(summary(&extraction), "2 posts extracted in 7 scrolls");

        extraction.stats.without_permalink = 3;
        assert_eq!(
            summary(&extraction),
            "2 posts extracted in 7 scrolls, 3 fragments without permalink skipped"
        );
    }
}
