use anyhow::Result;
use tracing::debug;

use crate::{PageRect, PageRenderer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub page_index: usize,
    pub region: PageRect,
}

/// Hits for one query string plus a cursor that cycles through them.
#[derive(Debug, Default)]
pub struct SearchIndex {
    query: Option<String>,
    hits: Vec<SearchHit>,
    cursor: Option<usize>,
}

impl SearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans every page for `text` and replaces the current hits. Empty text is ignored.
    pub fn query(&mut self, renderer: &dyn PageRenderer, text: &str) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }

        let mut hits = Vec::new();
        for page_index in 0..renderer.page_count() {
            for region in renderer.search(page_index, text)? {
                hits.push(SearchHit { page_index, region });
            }
        }
        debug!(query = text, hits = hits.len(), "search index rebuilt");

        self.hits = hits;
        self.query = Some(text.to_string());
        self.cursor = None;
        Ok(())
    }

    /// True when advancing for `text` has to rescan first.
    pub fn needs_query(&self, text: &str) -> bool {
        self.hits.is_empty() || self.query.as_deref() != Some(text)
    }

    pub fn advance(&mut self, forward: bool) -> Option<SearchHit> {
        let count = self.hits.len();
        if count == 0 {
            return None;
        }
        let next = match (self.cursor, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(current), true) => (current + 1) % count,
            (Some(current), false) => (current + count - 1) % count,
        };
        self.cursor = Some(next);
        self.hits.get(next).copied()
    }

    pub fn clear(&mut self) {
        self.query = None;
        self.hits.clear();
        self.cursor = None;
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn query_text(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Cursor position, `-1` before the first advance or when there are no hits.
    pub fn cursor_position(&self) -> isize {
        self.cursor.map_or(-1, |cursor| cursor as isize)
    }

    pub fn current(&self) -> Option<&SearchHit> {
        self.cursor.and_then(|cursor| self.hits.get(cursor))
    }
}
