//! Thin document-tree layer over `scraper`.
//!
//! The extractor only needs four capabilities from a parsed page: query all
//! elements by tag, find the first element matching a selector and a
//! predicate, read an attribute, and read visible text. Everything else in
//! `scraper` stays behind this module.

use scraper::{ElementRef, Html, Selector};

use crate::types::FieldError;

/// A parsed page snapshot.
pub struct Snapshot {
    document: Html,
}

impl Snapshot {
    /// Parse raw page markup. Parsing is lenient and never fails.
    pub fn parse(markup: &str) -> Self {
        Self {
            document: Html::parse_document(markup),
        }
    }

    /// All post fragments, in document order.
    pub fn fragments(&self, post_tag: &str) -> Result<Vec<Fragment<'_>>, FieldError> {
        let sel = parse_selector(post_tag)?;
        Ok(self
            .document
            .select(&sel)
            .map(|el| Fragment { el })
            .collect())
    }
}

/// One element subtree of a snapshot, usually a single post.
#[derive(Clone, Copy)]
pub struct Fragment<'a> {
    el: ElementRef<'a>,
}

impl<'a> Fragment<'a> {
    /// Every descendant matching `selector`, in document order.
    pub fn select_all(&self, selector: &str) -> Result<Vec<Fragment<'a>>, FieldError> {
        let sel = parse_selector(selector)?;
        Ok(self.el.select(&sel).map(|el| Fragment { el }).collect())
    }

    /// The first descendant matching `selector` for which `predicate` holds.
    pub fn find_first<P>(
        &self,
        selector: &str,
        predicate: P,
    ) -> Result<Option<Fragment<'a>>, FieldError>
    where
        P: Fn(&Fragment<'a>) -> bool,
    {
        let sel = parse_selector(selector)?;
        Ok(self
            .el
            .select(&sel)
            .map(|el| Fragment { el })
            .find(|f| predicate(f)))
    }

    /// Attribute value on this element itself.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.el.value().attr(name)
    }

    /// Visible text, trimmed and whitespace-collapsed.
    pub fn text(&self) -> String {
        self.el
            .text()
            .flat_map(str::split_whitespace)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Visible text exactly as the text nodes hold it.
    pub fn raw_text(&self) -> String {
        self.el.text().collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, FieldError> {
    Selector::parse(selector).map_err(|e| FieldError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
