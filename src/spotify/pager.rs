use serde_json::Value;

use crate::{Res, error::ServiceError, spotify::client::SpotifyClient, types::Page, warning};

/// Lazy, forward-only walker over a paginated collection.
///
/// Issues one client request per page and advances its offset strictly
/// monotonically; a page that has been consumed is never re-requested.
/// Restarting is only possible by constructing a new paginator. There is no
/// assumed page-count ceiling: collections spanning hundreds or thousands
/// of pages are walked page by page within the client's per-call failure
/// handling.
///
/// Termination: the walk stops when the API stops advertising a `next`
/// page, or when the cumulative record count reaches the reported `total`,
/// whichever comes first. When the two signals disagree, the paginator
/// stops fetching and emits a diagnostic instead of failing.
pub struct Paginator {
    client: SpotifyClient,
    path: String,
    page_size: u32,
    extra: Vec<(String, String)>,
    offset: u64,
    fetched: u64,
    total: Option<u64>,
    done: bool,
}

impl Paginator {
    pub fn new(client: &SpotifyClient, path: impl Into<String>, page_size: u32) -> Self {
        Paginator {
            client: client.clone(),
            path: path.into(),
            page_size,
            extra: Vec::new(),
            offset: 0,
            fetched: 0,
            total: None,
            done: false,
        }
    }

    /// Adds a fixed query parameter to every page request (e.g. a `fields`
    /// projection).
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// The offset the next page request would use.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The collection size reported by the API, once a page has been seen.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Fetches the next page of raw records.
    ///
    /// Returns `Ok(None)` once the collection is exhausted. Errors are the
    /// client's, surfaced after its retry policy has been spent on the page.
    pub async fn next_page(&mut self) -> Res<Option<Vec<Value>>> {
        if self.done {
            return Ok(None);
        }

        let mut query: Vec<(&str, String)> = vec![
            ("limit", self.page_size.to_string()),
            ("offset", self.offset.to_string()),
        ];
        for (key, value) in &self.extra {
            query.push((key.as_str(), value.clone()));
        }

        let raw = self.client.get(&self.path, &query).await?;
        let page: Page = serde_json::from_value(raw)?;

        if page.items.is_empty() {
            // An empty page cannot advance the cursor; stop rather than
            // re-request the same offset forever.
            self.done = true;
            return Ok(None);
        }

        self.offset += page.items.len() as u64;
        self.fetched += page.items.len() as u64;
        if page.total.is_some() {
            self.total = page.total;
        }

        let has_more = page.next.is_some();
        let reached_total = self.total.map(|t| self.fetched >= t).unwrap_or(false);

        if !has_more && !reached_total && self.total.is_some() {
            warning!(
                "{}: server reports {} records but stopped paging after {}; treating collection as exhausted",
                self.path,
                self.total.unwrap_or(0),
                self.fetched
            );
        }
        if has_more && reached_total {
            warning!(
                "{}: next page advertised beyond the reported total of {}; stopping at {}",
                self.path,
                self.total.unwrap_or(0),
                self.fetched
            );
        }

        self.done = !has_more || reached_total;
        Ok(Some(page.items))
    }

    /// Drains the collection into one ordered vector.
    ///
    /// A page failure aborts the walk with
    /// [`ServiceError::PageFetchFailed`], which carries the failed page's
    /// offset and every record gathered before it, so partial results are
    /// recoverable rather than discarded.
    pub async fn fetch_all(&mut self) -> Res<Vec<Value>> {
        let mut records = Vec::new();
        loop {
            let offset = self.offset;
            match self.next_page().await {
                Ok(Some(items)) => records.extend(items),
                Ok(None) => return Ok(records),
                Err(e) => {
                    return Err(ServiceError::PageFetchFailed {
                        offset,
                        partial: records,
                        source: Box::new(e),
                    });
                }
            }
        }
    }
}
