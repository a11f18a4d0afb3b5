//! Lazy, page-at-a-time iteration over list endpoints.
//!
//! [`ListIter`] owns a page buffer and fetches the next page only when the
//! buffer is empty and the last envelope reported `has_more`. The cursor for
//! the next page is the id of the boundary element of the previous one:
//!
//! ```text
//! forward  (starting_after):  page [a b c] has_more -> next starting_after=c
//! backward (ending_before):   page [a b c] has_more -> next ending_before=a
//! ```
//!
//! Elements are yielded in the order the service returns them.
//!
//! # Errors
//!
//! `advance()` returns a plain `bool`. The first failed fetch is stored, every
//! later `advance()` returns `false`, and the failure is read with
//! [`ListIter::err`] after the loop:
//!
//! ```ignore
//! let mut iter = client.invoices().list(&params);
//! while iter.advance().await {
//!     let invoice = iter.current().expect("positioned");
//!     println!("{} {}", invoice.id, invoice.amount);
//! }
//! if let Some(err) = iter.err() {
//!     return Err(err.clone());
//! }
//! ```

use crate::client::Client;
use crate::codec::{ListMeta, Page};
use crate::error::{Error, Result};
use crate::params::{Cursor, Params};
use crate::resource::ApiResource;
use crate::transport::Transport;
use futures::stream::{self, Stream};
use std::collections::VecDeque;

/// Single-pass cursor over a paginated collection.
///
/// Not restartable: build a new iterator to scan again. Advancing takes
/// `&mut self`, so one instance cannot be advanced from two tasks at once;
/// sharing it across tasks requires the caller's own synchronisation.
pub struct ListIter<R: ApiResource, T: Transport> {
    client: Client<T>,
    path: String,
    base: Params,
    backward: bool,
    next_cursor: Option<Cursor>,
    buffer: VecDeque<R>,
    current: Option<R>,
    meta: Option<ListMeta>,
    error: Option<Error>,
}

impl<R: ApiResource, T: Transport> ListIter<R, T> {
    /// Iterator whose first page is fetched on the first `advance()`.
    ///
    /// `base` holds everything that stays fixed across pages (filters,
    /// limit); `cursor` is where the first page starts.
    pub(crate) fn new(client: Client<T>, path: String, base: Params, cursor: Cursor) -> Self {
        ListIter {
            client,
            path,
            base,
            backward: matches!(cursor, Cursor::Before(_)),
            next_cursor: Some(cursor),
            buffer: VecDeque::new(),
            current: None,
            meta: None,
            error: None,
        }
    }

    /// Iterator seeded with a page the caller already holds, such as the
    /// lines embedded in an invoice. Later pages are fetched forward from it.
    pub(crate) fn from_page(client: Client<T>, path: String, base: Params, page: Page<R>) -> Self {
        let mut iter = ListIter::new(client, path, base, Cursor::Start);
        iter.absorb(page);
        iter
    }

    /// Iterator over `page` alone. Nothing is fetched, whatever `has_more` says.
    pub(crate) fn single_page(client: Client<T>, path: String, page: Page<R>) -> Self {
        let mut iter = ListIter::from_page(client, path, Params::new(), page);
        iter.next_cursor = None;
        iter
    }

    /// Iterator that yields nothing and reports `error`.
    pub(crate) fn failed(client: Client<T>, path: String, error: Error) -> Self {
        let mut iter = ListIter::new(client, path, Params::new(), Cursor::Start);
        iter.next_cursor = None;
        iter.error = Some(error);
        iter
    }

    /// Move to the next element, fetching a page if needed.
    ///
    /// Returns `false` once the collection is exhausted or a fetch failed.
    pub async fn advance(&mut self) -> bool {
        if self.error.is_some() {
            self.current = None;
            return false;
        }

        loop {
            if let Some(item) = self.buffer.pop_front() {
                self.current = Some(item);
                return true;
            }

            let Some(cursor) = self.next_cursor.take() else {
                self.current = None;
                return false;
            };

            match self.fetch(&cursor).await {
                Ok(page) => self.absorb(page),
                Err(e) => {
                    warn!(
                        "Listing {} from {} stopped: {}",
                        R::object_name(),
                        self.path,
                        e
                    );
                    self.current = None;
                    self.error = Some(e);
                    return false;
                }
            }
        }
    }

    /// Element at the current position.
    ///
    /// `None` before the first successful `advance()` and after `advance()`
    /// returned `false`.
    pub fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    /// Metadata of the most recently fetched page.
    pub fn meta(&self) -> Option<&ListMeta> {
        self.meta.as_ref()
    }

    /// The fetch error that ended the iteration, if any.
    pub fn err(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Drain the iterator into a vector.
    ///
    /// # Errors
    /// Returns the iteration error; elements read before it are dropped.
    pub async fn collect_all(mut self) -> Result<Vec<R>> {
        let mut items = Vec::new();
        while self.advance().await {
            if let Some(item) = self.current.take() {
                items.push(item);
            }
        }
        match self.error {
            Some(e) => Err(e),
            None => Ok(items),
        }
    }

    /// Adapt into a `Stream` of results. The error, if any, is the last item.
    pub fn into_stream(self) -> impl Stream<Item = Result<R>> {
        stream::unfold(Some(self), |state| async move {
            let mut iter = match state {
                Some(iter) => iter,
                None => return None,
            };

            if iter.advance().await {
                match iter.current.take() {
                    Some(item) => Some((Ok(item), Some(iter))),
                    None => None,
                }
            } else {
                iter.error.take().map(|e| (Err(e), None))
            }
        })
    }

    async fn fetch(&self, cursor: &Cursor) -> Result<Page<R>> {
        let mut params = self.base.clone();
        cursor.append_to(&mut params);
        debug!(
            "» Fetching {} page from {} ({:?})",
            R::object_name(),
            self.path,
            cursor
        );
        self.client.fetch_page(&self.path, params).await
    }

    fn absorb(&mut self, page: Page<R>) {
        let boundary = if self.backward {
            page.data.first()
        } else {
            page.data.last()
        };

        // An empty page cannot provide a cursor, whatever has_more says.
        self.next_cursor = match boundary {
            Some(item) if page.meta.has_more => Some(if self.backward {
                Cursor::Before(item.id().to_string())
            } else {
                Cursor::After(item.id().to_string())
            }),
            _ => None,
        };

        self.buffer.extend(page.data);
        self.meta = Some(page.meta);
    }
}
