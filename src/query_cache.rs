//! Request coordination for the record list: in-flight de-duplication,
//! last-query-wins sequencing, and a bounded LRU of past responses.
//!
//! The app owns one `QueryCache` and routes every list fetch through it, so
//! a stale response can never overwrite state produced by a newer query.

use std::collections::VecDeque;

use crate::query::Query;

/// Outcome of asking the cache to start a fetch for a query.
#[derive(Debug, PartialEq, Eq)]
pub enum FetchPlan<R> {
    /// Cached response; no network call needed.
    Hit(R),
    /// Issue a request tagged with this sequence token.
    Fetch(u64),
    /// An identical query is already in flight; wait for its result.
    InFlight,
}

/// Single-writer fetch coordinator, owned by the app task.
pub struct QueryCache<R> {
    /// Monotonic sequence; only the response carrying the latest token wins.
    seq: u64,
    /// Query currently on the wire, if any.
    in_flight: Option<(u64, Query)>,
    /// Most-recently-used first. Bounded by `capacity`.
    entries: VecDeque<(Query, R)>,
    capacity: usize,
}

impl<R: Clone> QueryCache<R> {
    pub fn new(capacity: usize) -> Self {
        Self {
            seq: 0,
            in_flight: None,
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Decide how to satisfy `query`: replay a cached response, join the
    /// identical in-flight request, or issue a new one (superseding whatever
    /// was in flight before).
    pub fn plan(&mut self, query: &Query) -> FetchPlan<R> {
        if let Some(pos) = self.entries.iter().position(|(q, _)| q == query) {
            // The hit query is now the latest one; orphan whatever request is
            // still on the wire so its response cannot overwrite this state.
            if self.in_flight.take().is_some() {
                self.seq += 1;
            }
            // Refresh recency on hit.
            let entry = self.entries.remove(pos).unwrap_or_else(|| unreachable!());
            self.entries.push_front(entry.clone());
            return FetchPlan::Hit(entry.1);
        }
        if let Some((_, in_flight)) = &self.in_flight
            && in_flight == query
        {
            return FetchPlan::InFlight;
        }
        // A different query supersedes the in-flight one: bump the sequence
        // so the old response fails the token check when it lands.
        self.seq += 1;
        self.in_flight = Some((self.seq, query.clone()));
        FetchPlan::Fetch(self.seq)
    }

    /// Store a response. Returns `true` if the token is still current and
    /// the caller should apply the response to visible state; a stale token
    /// means the result must be discarded.
    pub fn complete(&mut self, token: u64, query: Query, response: R) -> bool {
        if token != self.seq {
            return false;
        }
        self.in_flight = None;
        self.entries.push_front((query, response));
        self.entries.truncate(self.capacity);
        true
    }

    /// Record a failed fetch. Stale failures are ignored the same way.
    pub fn fail(&mut self, token: u64) -> bool {
        if token != self.seq {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Drop everything cached. Called after any mutation of the backing
    /// data set (upload completion, delete-all) so no screen shows records
    /// that no longer exist.
    pub fn invalidate(&mut self) {
        self.entries.clear();
        // Orphan any in-flight request as well; its snapshot predates the
        // mutation.
        if self.in_flight.take().is_some() {
            self.seq += 1;
        }
    }
}
