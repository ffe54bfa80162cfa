//! Per-field extraction from a single post fragment.
//!
//! Every field is read by its own pure function returning
//! `Result<_, FieldError>`. [`build_record`] composes them and reduces each
//! failure to the field's fallback, so one unreadable field never costs the
//! rest of the record. Only the permalink is load-bearing: without it the
//! fragment yields no record at all.

use url::Url;

use crate::markup::Fragment;
use crate::types::{FieldError, Record, SiteProfile, UNKNOWN};

/// Names of the record fields, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Url,
    CreatedAt,
    Id,
    Likes,
    Retweets,
    Replies,
    Hashtags,
    Mentions,
    Links,
    Text,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Url => "url",
            Self::CreatedAt => "created_at",
            Self::Id => "id",
            Self::Likes => "likes",
            Self::Retweets => "retweets",
            Self::Replies => "replies",
            Self::Hashtags => "hashtags",
            Self::Mentions => "mentions",
            Self::Links => "links",
            Self::Text => "text",
        };
        f.write_str(name)
    }
}

/// Result of turning one fragment into a record.
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// A record was built. `fallbacks` lists the fields that were replaced
    /// by their default, with the reason.
    Built {
        record: Record,
        fallbacks: Vec<(Field, FieldError)>,
    },
    /// No usable permalink; the fragment is dropped.
    NoPermalink(FieldError),
}

/// Build a record from one fragment, isolating per-field failures.
pub fn build_record(fragment: &Fragment<'_>, site: &SiteProfile) -> RecordOutcome {
    let url = match permalink(fragment, site) {
        Ok(url) => url,
        Err(e) => return RecordOutcome::NoPermalink(e),
    };

    let mut fallbacks = Vec::new();
    let mut scalar = |field: Field, res: Result<String, FieldError>| -> String {
        or_fallback(field, res, UNKNOWN.to_string(), &mut fallbacks)
    };

    let id = scalar(Field::Id, post_id(fragment, site));
    let created_at = scalar(Field::CreatedAt, created_at(fragment));
    let text = scalar(Field::Text, text(fragment));
    let likes = scalar(
        Field::Likes,
        engagement(fragment, &site.like_test_id, "like counter"),
    );
    let retweets = scalar(
        Field::Retweets,
        engagement(fragment, &site.retweet_test_id, "retweet counter"),
    );
    let replies = scalar(
        Field::Replies,
        engagement(fragment, &site.reply_test_id, "reply counter"),
    );

    let hashtags = or_fallback(Field::Hashtags, hashtags(fragment), Vec::new(), &mut fallbacks);
    let mentions = or_fallback(Field::Mentions, mentions(fragment), Vec::new(), &mut fallbacks);
    let links = or_fallback(Field::Links, links(fragment), Vec::new(), &mut fallbacks);

    RecordOutcome::Built {
        record: Record {
            id,
            url,
            created_at,
            text,
            likes,
            retweets,
            replies,
            hashtags,
            mentions,
            links,
        },
        fallbacks,
    }
}

/// Reduce a field result to its value, or record the failure and use `default`.
pub fn or_fallback<T>(
    field: Field,
    res: Result<T, FieldError>,
    default: T,
    fallbacks: &mut Vec<(Field, FieldError)>,
) -> T {
    match res {
        Ok(v) => v,
        Err(e) => {
            fallbacks.push((field, e));
            default
        }
    }
}

/// Absolute permalink of the post.
///
/// First `<a href>` whose target contains the permalink marker, resolved
/// against the site origin. Absolute targets on the origin's host are kept
/// as they are; targets on any other host are rejected.
pub fn permalink(fragment: &Fragment<'_>, site: &SiteProfile) -> Result<String, FieldError> {
    let marker = site.permalink_marker.as_str();
    let link = fragment
        .find_first("a[href]", |a| a.attr("href").is_some_and(|h| h.contains(marker)))?
        .ok_or(FieldError::Missing("permalink"))?;
    let href = link.attr("href").ok_or(FieldError::Missing("permalink"))?;
    resolve_url(&site.origin, href)
}

/// Resolve `href` against `origin`. The result must stay on the origin's host.
pub fn resolve_url(origin: &str, href: &str) -> Result<String, FieldError> {
    let invalid = |reason: String| FieldError::InvalidUrl {
        href: href.to_string(),
        origin: origin.to_string(),
        reason,
    };
    let base = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
    let joined = base.join(href).map_err(|e| invalid(e.to_string()))?;
    if joined.host_str() != base.host_str() {
        return Err(invalid(format!(
            "points to host {}",
            joined.host_str().unwrap_or("<none>")
        )));
    }
    Ok(joined.to_string())
}

/// Machine-readable timestamp of the first `<time>` element.
pub fn created_at(fragment: &Fragment<'_>) -> Result<String, FieldError> {
    let time = fragment
        .find_first("time", |_| true)?
        .ok_or(FieldError::Missing("time element"))?;
    time.attr("datetime")
        .map(str::to_string)
        .ok_or(FieldError::Missing("datetime attribute"))
}

/// Post identifier carried on the fragment element itself.
pub fn post_id(fragment: &Fragment<'_>, site: &SiteProfile) -> Result<String, FieldError> {
    fragment
        .attr(&site.id_attribute)
        .map(str::to_string)
        .ok_or(FieldError::Missing("post id attribute"))
}

/// Raw display text of the engagement counter tagged `test_id`.
pub fn engagement(
    fragment: &Fragment<'_>,
    test_id: &str,
    what: &'static str,
) -> Result<String, FieldError> {
    fragment
        .find_first("[data-testid]", |el| el.attr("data-testid") == Some(test_id))?
        .map(|el| el.text())
        .ok_or(FieldError::Missing(what))
}

/// Text of every link whose visible text contains `#`.
pub fn hashtags(fragment: &Fragment<'_>) -> Result<Vec<String>, FieldError> {
    anchor_texts_containing(fragment, '#')
}

/// Text of every link whose visible text contains `@`.
pub fn mentions(fragment: &Fragment<'_>) -> Result<Vec<String>, FieldError> {
    anchor_texts_containing(fragment, '@')
}

/// Target of every link pointing at an `http` URL, verbatim.
pub fn links(fragment: &Fragment<'_>) -> Result<Vec<String>, FieldError> {
    Ok(fragment
        .select_all("a[href]")?
        .iter()
        .filter_map(|a| a.attr("href"))
        .filter(|href| href.contains("http"))
        .map(str::to_string)
        .collect())
}

/// Visible text of the first element carrying a `lang` attribute.
pub fn text(fragment: &Fragment<'_>) -> Result<String, FieldError> {
    fragment
        .find_first("[lang]", |_| true)?
        .map(|el| el.text())
        .ok_or(FieldError::Missing("text element"))
}

fn anchor_texts_containing(
    fragment: &Fragment<'_>,
    needle: char,
) -> Result<Vec<String>, FieldError> {
    Ok(fragment
        .select_all("a")?
        .iter()
        .filter(|a| a.raw_text().contains(needle))
        .map(|a| a.text())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup::Snapshot;

    fn site() -> SiteProfile {
        SiteProfile::with_origin("https://site")
    }

    fn first_outcome(html: &str) -> RecordOutcome {
        let snap = Snapshot::parse(html);
        let frags = snap.fragments("article").unwrap();
        build_record(&frags[0], &site())
    }

    const FULL_POST: &str = r#"
        <article data-tweet-id="1789">
          <a href="/u/a"><span>@a</span></a>
          <a href="/u/a/status/1789"><time datetime="2024-05-01T10:00:00.000Z">May 1</time></a>
          <div lang="en">Learning <a href="/hashtag/rust">#rust</a> with
             <a href="/u/b">@b</a> see <a href="https://t.co/xyz">t.co/xyz</a></div>
          <div data-testid="reply"><span>3</span></div>
          <div data-testid="retweet"><span>12</span></div>
          <div data-testid="like"><span>1.2K</span></div>
        </article>
    "#;

    #[test]
    fn test_full_post() {
        let RecordOutcome::Built { record, fallbacks } = first_outcome(FULL_POST) else {
            panic!("expected a record");
        };
        assert!(fallbacks.is_empty());
        assert_eq!(record.url, "https://site/u/a/status/1789");
        assert_eq!(record.id, "1789");
        assert_eq!(record.created_at, "2024-05-01T10:00:00.000Z");
        assert_eq!(record.text, "Learning #rust with @b see t.co/xyz");
        assert_eq!(record.likes, "1.2K");
        assert_eq!(record.retweets, "12");
        assert_eq!(record.replies, "3");
        assert_eq!(record.hashtags, vec!["#rust"]);
        assert_eq!(record.mentions, vec!["@a", "@b"]);
        assert_eq!(record.links, vec!["https://t.co/xyz"]);
    }

    #[test]
    fn test_missing_fields_fall_back() {
        let html = r#"<article><a href="/u/a/status/1">x</a></article>"#;
        let RecordOutcome::Built { record, fallbacks } = first_outcome(html) else {
            panic!("expected a record");
        };
        assert_eq!(record.url, "https://site/u/a/status/1");
        assert_eq!(record.id, UNKNOWN);
        assert_eq!(record.created_at, UNKNOWN);
        assert_eq!(record.text, UNKNOWN);
        assert_eq!(record.likes, UNKNOWN);
        assert_eq!(record.retweets, UNKNOWN);
        assert_eq!(record.replies, UNKNOWN);
        assert!(record.hashtags.is_empty());
        assert!(record.mentions.is_empty());
        assert!(record.links.is_empty());

        let failed: Vec<Field> = fallbacks.iter().map(|(f, _)| *f).collect();
        assert_eq!(
            failed,
            vec![
                Field::Id,
                Field::CreatedAt,
                Field::Text,
                Field::Likes,
                Field::Retweets,
                Field::Replies
            ]
        );
        assert!(fallbacks.iter().all(|(_, e)| e.is_missing()));
    }

    #[test]
    fn test_time_without_datetime_only_affects_created_at() {
        let html = r#"
            <article data-tweet-id="9">
              <a href="/u/a/status/9"><time>yesterday</time></a>
              <div lang="en">still here</div>
            </article>
        "#;
        let RecordOutcome::Built { record, fallbacks } = first_outcome(html) else {
            panic!("expected a record");
        };
        assert_eq!(record.created_at, UNKNOWN);
        assert_eq!(record.text, "still here");
        assert_eq!(record.id, "9");
        let missing_datetime = FieldError::Missing("datetime attribute");
        assert!(fallbacks
            .iter()
            .any(|(f, e)| *f == Field::CreatedAt && *e == missing_datetime));
    }

    #[test]
    fn test_no_permalink_drops_fragment() {
        let html = r#"<article><a href="/u/a">profile</a><div lang="en">hi</div></article>"#;
        assert!(matches!(
            first_outcome(html),
            RecordOutcome::NoPermalink(FieldError::Missing("permalink"))
        ));
    }

    #[test]
    fn test_absolute_permalink_kept() {
        let html = r#"<article><a href="https://site/u/a/status/5">x</a></article>"#;
        let RecordOutcome::Built { record, .. } = first_outcome(html) else {
            panic!("expected a record");
        };
        assert_eq!(record.url, "https://site/u/a/status/5");
    }

    #[test]
    fn test_foreign_host_permalink_rejected() {
        for href in ["//other.host/u/a/status/1", "https://other.host/u/a/status/1"] {
            let err = resolve_url("https://site", href).unwrap_err();
            assert!(matches!(err, FieldError::InvalidUrl { .. }), "{href}");
        }
        let html = r#"<article><a href="//other.host/u/a/status/1">x</a></article>"#;
        assert!(matches!(
            first_outcome(html),
            RecordOutcome::NoPermalink(FieldError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_first_matching_permalink_wins() {
        let html = r#"
            <article>
              <a href="/u/a/status/1/photo/1">photo</a>
              <a href="/u/a/status/2">other</a>
            </article>
        "#;
        let RecordOutcome::Built { record, .. } = first_outcome(html) else {
            panic!("expected a record");
        };
        assert_eq!(record.url, "https://site/u/a/status/1/photo/1");
    }

    #[test]
    fn test_resolve_url_bad_origin() {
        let err = resolve_url("not a url", "/u/a/status/1").unwrap_err();
        assert!(matches!(err, FieldError::InvalidUrl { .. }));
        assert!(!err.is_missing());
    }

    #[test]
    fn test_bad_origin_drops_fragment() {
        let snap = Snapshot::parse(r#"<article><a href="/u/a/status/1">x</a></article>"#);
        let frags = snap.fragments("article").unwrap();
        let outcome = build_record(&frags[0], &SiteProfile::with_origin("::"));
        assert!(matches!(
            outcome,
            RecordOutcome::NoPermalink(FieldError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_engagement_text_verbatim() {
        let html = r#"<article><div data-testid="like"> 12,345 </div></article>"#;
        let snap = Snapshot::parse(html);
        let frags = snap.fragments("article").unwrap();
        assert_eq!(engagement(&frags[0], "like", "like counter").unwrap(), "12,345");
        assert_eq!(
            engagement(&frags[0], "reply", "reply counter").unwrap_err(),
            FieldError::Missing("reply counter")
        );
    }

    #[test]
    fn test_links_not_deduplicated() {
        let html = r#"
            <article>
              <a href="https://a.example/1">#one</a>
              <a href="https://a.example/1">again</a>
              <a href="/relative">rel</a>
            </article>
        "#;
        let snap = Snapshot::parse(html);
        let frags = snap.fragments("article").unwrap();
        assert_eq!(
            links(&frags[0]).unwrap(),
            vec!["https://a.example/1", "https://a.example/1"]
        );
        assert_eq!(hashtags(&frags[0]).unwrap(), vec!["#one"]);
    }

    #[test]
    fn test_or_fallback_records_reason() {
        let mut fallbacks = Vec::new();
        let v: String = or_fallback(
            Field::Text,
            Err(FieldError::Selector {
                selector: "[".into(),
                reason: "bad".into(),
            }),
            UNKNOWN.to_string(),
            &mut fallbacks,
        );
        assert_eq!(v, UNKNOWN);
        assert_eq!(fallbacks.len(), 1);
        assert_eq!(fallbacks[0].0, Field::Text);

        let ok: Vec<String> =
            or_fallback(Field::Links, Ok(vec!["a".into()]), Vec::new(), &mut fallbacks);
        assert_eq!(ok, vec!["a"]);
        assert_eq!(fallbacks.len(), 1);
    }
}
