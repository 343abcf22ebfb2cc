use std::marker::PhantomData;

use serde_json::Value;

use super::request::ApiRequest;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Cursor {
    /// `limit` + `offset`.
    Offset(u64),
    /// `limit` + `before`, the timestamp of the oldest entry seen so far.
    Before(Option<String>),
    /// One request returns everything.
    Unpaged,
}

/// Page-cursor state of one listing. Single pass: every page is fetched at
/// most once, when the consumer gets to it.
///
/// Pages are separate requests, so a listing that changes while it is being
/// walked can skip or repeat entries.
pub struct Pager<T> {
    request: ApiRequest<Vec<Value>>,
    cursor: Cursor,
    limit: u32,
    done: bool,
    /// First entry of the previous page, to notice a server ignoring `offset`.
    last_head: Option<Value>,
    _item: PhantomData<fn() -> T>,
}

impl<T> Pager<T> {
    fn with_cursor<U>(request: ApiRequest<U>, cursor: Cursor, limit: u32) -> Self {
        Self {
            request: request.cast(),
            cursor,
            limit,
            done: false,
            last_head: None,
            _item: PhantomData,
        }
    }

    pub(crate) fn offset<U>(request: ApiRequest<U>, limit: u32) -> Self {
        Self::with_cursor(request, Cursor::Offset(0), limit)
    }

    pub(crate) fn before<U>(request: ApiRequest<U>, limit: u32, before: Option<String>) -> Self {
        Self::with_cursor(request, Cursor::Before(before), limit)
    }

    pub(crate) fn unpaged<U>(request: ApiRequest<U>) -> Self {
        Self::with_cursor(request, Cursor::Unpaged, 0)
    }

    /// The request for the next page, `None` once the listing is exhausted.
    pub(crate) fn next_request(&self) -> Option<ApiRequest<Vec<Value>>> {
        if self.done {
            return None;
        }
        let request = self.request.clone();
        Some(match &self.cursor {
            Cursor::Offset(offset) => request.query("limit", self.limit).query("offset", offset),
            Cursor::Before(Some(before)) => request.query("limit", self.limit).query("before", before),
            Cursor::Before(None) => request.query("limit", self.limit),
            Cursor::Unpaged => request,
        })
    }

    /// Moves past `page`, the response to the last [`next_request`](Self::next_request).
    ///
    /// Returns how many of the page's entries belong to the listing.
    pub(crate) fn advance(&mut self, page: &[Value]) -> usize {
        let limit = self.limit as usize;
        let repeated = self.last_head.is_some() && self.last_head.as_ref() == page.first();

        if repeated {
            log::debug!("server ignored the page cursor, ending listing");
            self.done = true;
            return 0;
        }

        match &mut self.cursor {
            Cursor::Unpaged => self.done = true,
            // a short page is the last one; an oversized one means the server
            // sent everything at once
            _ if page.len() != limit => self.done = true,
            Cursor::Offset(offset) => *offset += page.len() as u64,
            Cursor::Before(before) => {
                match page.last().and_then(|entry| entry.get("timestamp")).and_then(Value::as_str) {
                    Some(timestamp) => *before = Some(timestamp.to_string()),
                    None => self.done = true,
                }
            }
        }

        self.last_head = page.first().cloned();
        page.len()
    }
}
