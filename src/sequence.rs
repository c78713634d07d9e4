//! Index-addressable view over a one-shot document cursor.

use crate::store::{DocumentCursor, StoreError};
use crate::value::Document;

/// Documents pulled from a forward-only cursor on demand.
///
/// The cache only grows. Index `k` is stable once fetched, and the cursor
/// is dropped as soon as it reports exhaustion; it is never re-queried.
pub struct LazySequence {
    underlying: Option<DocumentCursor>,
    cache: Vec<Document>,
}

impl LazySequence {
    pub fn new(cursor: DocumentCursor) -> Self {
        Self {
            underlying: Some(cursor),
            cache: Vec::new(),
        }
    }

    /// The document at `index`, fetching through the cursor as needed.
    ///
    /// Returns `Ok(None)` once the cursor is exhausted before `index`.
    ///
    /// # Errors
    ///
    /// Propagates a cursor item failure. Documents already cached are kept
    /// and the cursor stays open, so a later call may advance past it.
    pub fn at(&mut self, index: usize) -> Result<Option<&Document>, StoreError> {
        while self.cache.len() <= index {
            let Some(cursor) = self.underlying.as_mut() else {
                break;
            };
            match cursor.next() {
                Some(item) => self.cache.push(item?),
                None => self.underlying = None,
            }
        }
        Ok(self.cache.get(index))
    }

    /// Documents fetched so far, in cursor order.
    pub fn cached(&self) -> &[Document] {
        &self.cache
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub const fn is_exhausted(&self) -> bool {
        self.underlying.is_none()
    }
}

impl std::fmt::Debug for LazySequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazySequence")
            .field("cached", &self.cache.len())
            .field("exhausted", &self.is_exhausted())
            .finish()
    }
}
