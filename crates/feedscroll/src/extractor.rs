//! The incremental scroll-and-dedupe extraction loop.
//!
//! Each iteration scrolls the session, waits a fixed pause for lazy content
//! to render, snapshots the markup, turns every post fragment into a record
//! and merges the new ones into the accumulator. The loop ends when the
//! accumulator has not grown for `stall_timeout`, or with an error when the
//! session fails. The session is closed on both paths before returning.

use std::time::Duration;

use tracing::{debug, info, trace, warn};

use crate::accumulator::Accumulator;
use crate::fields::{build_record, RecordOutcome};
use crate::markup::Snapshot;
use crate::session::{FeedSession, SessionGuard};
use crate::stall::{Clock, StallDetector, StallStatus, TokioClock};
use crate::types::{ExtractResult, Record, ScrollSettings, SiteProfile};

/// Counters collected over one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Scroll iterations performed.
    pub iterations: usize,
    /// Post fragments seen across all snapshots, duplicates included.
    pub fragments_seen: usize,
    /// Fragments dropped because no permalink could be resolved.
    pub without_permalink: usize,
    /// Fields replaced by their fallback because the source was absent.
    pub fields_missing: usize,
    /// Fields replaced by their fallback because reading them failed.
    pub field_errors: usize,
}

/// Records and counters of a finished run.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub records: Accumulator,
    pub stats: ExtractStats,
    /// How long the accumulator had gone without growing when the run stopped.
    pub idle: Duration,
}

/// Records parsed from one markup snapshot, in fragment order.
#[derive(Debug, Clone, Default)]
pub struct SnapshotBatch {
    pub records: Vec<Record>,
    pub fragments: usize,
    pub without_permalink: usize,
    pub fields_missing: usize,
    pub field_errors: usize,
}

/// Scroll and extract until the feed stalls, using the wall clock.
pub async fn extract<S>(session: S, settings: &ScrollSettings) -> ExtractResult<Accumulator>
where
    S: FeedSession + 'static,
{
    extract_with_clock(session, settings, TokioClock).await
}

/// [`extract`] with an explicit clock for the stall check.
pub async fn extract_with_clock<S, C>(
    session: S,
    settings: &ScrollSettings,
    clock: C,
) -> ExtractResult<Accumulator>
where
    S: FeedSession + 'static,
    C: Clock,
{
    Ok(extract_with_stats(session, settings, clock).await?.records)
}

/// Run the extraction loop and report counters alongside the records.
pub async fn extract_with_stats<S, C>(
    session: S,
    settings: &ScrollSettings,
    clock: C,
) -> ExtractResult<Extraction>
where
    S: FeedSession + 'static,
    C: Clock,
{
    let mut guard = SessionGuard::new(Box::new(session));
    let mut records = Accumulator::new();
    let mut stats = ExtractStats::default();

    let outcome = run_loop(&mut guard, settings, clock, &mut records, &mut stats).await;
    guard.release().await;

    let idle = outcome?;
    info!(
        records = records.len(),
        iterations = stats.iterations,
        "extraction finished"
    );
    Ok(Extraction {
        records,
        stats,
        idle,
    })
}

async fn run_loop<C: Clock>(
    guard: &mut SessionGuard,
    settings: &ScrollSettings,
    clock: C,
    records: &mut Accumulator,
    stats: &mut ExtractStats,
) -> ExtractResult<Duration> {
    let mut stall = StallDetector::new(clock, settings.stall_timeout);

    loop {
        stats.iterations += 1;
        let session = guard.session()?;

        session.scroll_by(settings.scroll_step).await?;
        tokio::time::sleep(settings.scroll_pause).await;
        let markup = session.current_markup().await?;

        let batch = extract_snapshot(&markup, &settings.site);
        stats.fragments_seen += batch.fragments;
        stats.without_permalink += batch.without_permalink;
        stats.fields_missing += batch.fields_missing;
        stats.field_errors += batch.field_errors;

        let fragments = batch.fragments;
        let appended = records.merge(batch.records);
        debug!(
            iteration = stats.iterations,
            fragments,
            appended,
            total = records.len(),
            "scroll iteration"
        );

        match stall.observe(records.len()) {
            StallStatus::Stalled { idle } => {
                info!("no new posts for {}s, stopping", idle.as_secs());
                return Ok(idle);
            }
            StallStatus::Unchanged { idle } => {
                trace!(idle_ms = idle.as_millis() as u64, "no growth");
            }
            StallStatus::Grew => {}
        }
    }
}

/// Parse one snapshot into records, isolating failures per fragment.
pub fn extract_snapshot(markup: &str, site: &SiteProfile) -> SnapshotBatch {
    let snapshot = Snapshot::parse(markup);
    let fragments = match snapshot.fragments(&site.post_tag) {
        Ok(f) => f,
        Err(e) => {
            warn!("cannot query post fragments: {e}");
            return SnapshotBatch::default();
        }
    };

    let mut batch = SnapshotBatch {
        fragments: fragments.len(),
        ..SnapshotBatch::default()
    };

    for (index, fragment) in fragments.iter().enumerate() {
        match build_record(fragment, site) {
            RecordOutcome::Built { record, fallbacks } => {
                for (field, err) in &fallbacks {
                    if err.is_missing() {
                        batch.fields_missing += 1;
                        trace!(url = %record.url, %field, "{err}");
                    } else {
                        batch.field_errors += 1;
                        warn!(url = %record.url, %field, "field extraction failed: {err}");
                    }
                }
                batch.records.push(record);
            }
            RecordOutcome::NoPermalink(err) => {
                batch.without_permalink += 1;
                if err.is_missing() {
                    debug!(fragment = index, "no permalink found, fragment skipped");
                } else {
                    warn!(fragment = index, "permalink unusable, fragment skipped: {err}");
                }
            }
        }
    }

    batch
}
