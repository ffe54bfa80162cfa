//! Tabular presentation of extracted records.
//!
//! Sequence fields are joined with `", "` here and only here; the records
//! themselves keep them as lists.

use serde::{Deserialize, Serialize};

use crate::types::Record;

/// Output column names, in order.
pub const COLUMNS: [&str; 10] = [
    "Tweet URL",
    "Created At",
    "Text",
    "Tweet ID",
    "Likes",
    "Retweets",
    "Replies",
    "Hashtags",
    "Mentions",
    "URLs",
];

const LIST_SEPARATOR: &str = ", ";

/// One output row. Serializes with the column names in [`COLUMNS`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "Tweet URL")]
    pub url: String,
    #[serde(rename = "Created At")]
    pub created_at: String,
    #[serde(rename = "Text")]
    pub text: String,
    #[serde(rename = "Tweet ID")]
    pub id: String,
    #[serde(rename = "Likes")]
    pub likes: String,
    #[serde(rename = "Retweets")]
    pub retweets: String,
    #[serde(rename = "Replies")]
    pub replies: String,
    #[serde(rename = "Hashtags")]
    pub hashtags: String,
    #[serde(rename = "Mentions")]
    pub mentions: String,
    #[serde(rename = "URLs")]
    pub urls: String,
}

impl TableRow {
    pub fn from_record(r: &Record) -> Self {
        Self {
            url: r.url.clone(),
            created_at: r.created_at.clone(),
            text: r.text.clone(),
            id: r.id.clone(),
            likes: r.likes.clone(),
            retweets: r.retweets.clone(),
            replies: r.replies.clone(),
            hashtags: r.hashtags.join(LIST_SEPARATOR),
            mentions: r.mentions.join(LIST_SEPARATOR),
            urls: r.links.join(LIST_SEPARATOR),
        }
    }
}

/// The extraction result as rows and columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultTable {
    pub rows: Vec<TableRow>,
}

impl ResultTable {
    pub fn from_records(records: &[Record]) -> Self {
        Self {
            rows: records.iter().map(TableRow::from_record).collect(),
        }
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
