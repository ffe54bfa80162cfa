//! feedscroll: incremental scroll-and-dedupe extraction of posts from a
//! rendered profile page.
//!
//! The crate has no browser dependency. A caller hands [`extract`] a
//! [`FeedSession`] already positioned on the target page; the extractor
//! scrolls it, parses each markup snapshot and returns the deduplicated
//! records once the feed stops producing new ones.

pub mod accumulator;
pub mod extractor;
pub mod fields;
pub mod markup;
pub mod session;
pub mod stall;
pub mod table;
pub mod testing;
pub mod types;

pub use accumulator::Accumulator;
pub use extractor::{
    extract, extract_snapshot, extract_with_clock, extract_with_stats, ExtractStats, Extraction,
};
pub use session::{FeedSession, SessionGuard};
pub use stall::{Clock, StallDetector, StallStatus, TokioClock};
pub use table::{ResultTable, TableRow, COLUMNS};
pub use types::*;
